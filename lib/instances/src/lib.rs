pub use anyhow::Result;

use fnv::FnvHashMap as Map;

pub mod clock;
pub mod dataset;
pub mod graph;
pub mod raw;

mod parsers;
pub use parsers::{ParseInstance, PizzabotFmt, PizzabotStr};

pub use dataset::pizzabot::{
  PizzaInstance,
  InstanceBuilder,
  ValidationError,
  Order,
  Bot,
  Node,
  Time,
  Demand,
};
