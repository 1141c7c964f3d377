use fnv::{FnvHashMap, FnvHashSet};

pub mod data;
pub mod error;
pub mod freshness;
pub mod schedule;
pub mod route;
pub mod solution;
pub mod milp;
pub mod formulation;
pub mod extract;
pub mod evaluate;
pub mod instructions;
pub mod heuristic;
pub mod optimize;
pub mod io;

#[cfg(test)]
pub(crate) mod testing;

pub use error::Error;

pub type Map<K, V> = FnvHashMap<K, V>;
pub type Set<T> = FnvHashSet<T>;

mod logging;
pub use logging::*;
