use anyhow::Result;
use std::path::Path;
use instances::dataset::pizzabot;

pub mod pizzabot_ext;
pub use pizzabot_ext::*;

pub fn get_instance_by_name(name : &str) -> Result<PizzaInstance> {
    pizzabot::dataset()?.load_by_name(name)
}

pub fn get_instance_by_index(idx : usize) -> Result<PizzaInstance> {
    pizzabot::dataset()?.load(idx)
}

/// Resolve a command-line instance argument: an existing file path, a dataset index or a dataset
/// instance name (in that order).
pub fn load_instance(arg: &str) -> Result<PizzaInstance> {
    let path = Path::new(arg);
    if path.is_file() {
        return pizzabot::load_file(path);
    }
    if let Ok(idx) = arg.parse::<usize>() {
        return get_instance_by_index(idx);
    }
    get_instance_by_name(arg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_instance_from_path() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/PizzaBot/instance1.txt");
        let data = load_instance(path).unwrap();
        assert_eq!(data.orders().len(), 2);
        assert_eq!(data.bots().len(), 1);
    }

    #[test]
    fn load_instance_from_dataset() {
        let by_name = load_instance("instance2").unwrap();
        let by_index = load_instance("1").unwrap();
        assert_eq!(by_name.id(), "instance2");
        assert_eq!(by_index.id(), "instance2");
        assert!(load_instance("no-such-instance").is_err());
    }

    #[test]
    fn load_instance_missing_file() {
        assert!(pizzabot::load_file("/non-existent/nowhere.txt").is_err());
    }
}
