/// Times as written in the file, in minutes.  May be negative; validation rejects that later.
pub type RawTime = i64;

#[derive(Debug, Clone, PartialEq)]
pub struct RawOrder {
  pub name: String,
  pub restaurant: String,
  pub customer: String,
  pub ready: RawTime,
  pub deadline: Option<RawTime>,
  pub size: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawBot {
  pub name: String,
  pub node: usize,
  pub capacity: i64,
  pub available: Option<RawTime>,
}

/// A PizzaBot instance file, parsed but not yet checked for consistency.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pizzabot {
  pub name: Option<String>,
  pub service_time: Option<RawTime>,
  pub horizon: Option<RawTime>,
  pub nodes: Vec<(usize, Option<(f64, f64)>)>,
  /// Undirected edges
  pub edges: Vec<(usize, usize, RawTime)>,
  /// Directed arcs
  pub arcs: Vec<(usize, usize, RawTime)>,
  pub restaurants: Vec<(String, usize)>,
  pub customers: Vec<(String, usize)>,
  pub orders: Vec<RawOrder>,
  pub bots: Vec<RawBot>,
}
