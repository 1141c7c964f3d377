use super::*;
use std::convert::TryFrom;
use std::fmt;
use fnv::FnvHashSet as Set;
use itertools::Itertools;
use lazy_static::lazy_static;

use crate::Map;
use crate::graph::{self, ShortestPaths};
use crate::parsers::{ParseInstance, PizzabotFmt};
use crate::raw::{pizzabot::Pizzabot, TryFromRaw};

/// Minutes
pub type Time = i64;
/// Street graph node
pub type Node = u32;
/// Order size / bot capacity
pub type Demand = i32;

pub const DEFAULT_HORIZON: Time = 60;

/// A single delivery: food is prepared at `pickup` and becomes ready at `ready`, which is also
/// when the freshness clock starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
  pub name: String,
  pub pickup: Node,
  pub delivery: Node,
  pub ready: Time,
  /// Latest delivery time
  pub deadline: Option<Time>,
  pub size: Demand,
}

impl Order {
  pub fn new(name: impl Into<String>, pickup: Node, delivery: Node, ready: Time) -> Self {
    Order { name: name.into(), pickup, delivery, ready, deadline: None, size: 1 }
  }

  pub fn with_deadline(mut self, deadline: Time) -> Self {
    self.deadline = Some(deadline);
    self
  }

  pub fn with_size(mut self, size: Demand) -> Self {
    self.size = size;
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bot {
  pub name: String,
  pub start: Node,
  pub capacity: Demand,
  /// Earliest time the bot can leave `start`
  pub available: Time,
}

impl Bot {
  pub fn new(name: impl Into<String>, start: Node, capacity: Demand) -> Self {
    Bot { name: name.into(), start, capacity, available: 0 }
  }

  pub fn with_available(mut self, available: Time) -> Self {
    self.available = available;
    self
  }
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
  UnknownNode { context: String, node: usize },
  UnknownRestaurant { order: String, restaurant: String },
  UnknownCustomer { order: String, customer: String },
  DuplicateName { kind: &'static str, name: String },
  NonPositiveCapacity { bot: String, capacity: Demand },
  NonPositiveSize { order: String, size: Demand },
  DemandOutOfRange { context: String, value: i64 },
  NegativeTime { context: String, time: Time },
  DeadlineBeforeReady { order: String },
  NegativeTravelTime { from: Node, to: Node, time: Time },
  MissingTravelTime { from: Node, to: Node },
  NonZeroSelfTravelTime { node: Node, time: Time },
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    use ValidationError::*;
    match self {
      UnknownNode { context, node } => write!(f, "{} refers to undefined location {}", context, node),
      UnknownRestaurant { order, restaurant } => write!(f, "order {} refers to unknown restaurant {}", order, restaurant),
      UnknownCustomer { order, customer } => write!(f, "order {} refers to unknown customer {}", order, customer),
      DuplicateName { kind, name } => write!(f, "duplicate {} name {}", kind, name),
      NonPositiveCapacity { bot, capacity } => write!(f, "bot {} has non-positive capacity {}", bot, capacity),
      NonPositiveSize { order, size } => write!(f, "order {} has non-positive size {}", order, size),
      DemandOutOfRange { context, value } => write!(f, "{} {} is out of range (at most {})", context, value, Demand::MAX),
      NegativeTime { context, time } => write!(f, "{} is negative ({})", context, time),
      DeadlineBeforeReady { order } => write!(f, "order {} has a deadline before its ready time", order),
      NegativeTravelTime { from, to, time } => write!(f, "travel time {} -> {} is negative ({})", from, to, time),
      MissingTravelTime { from, to } => write!(f, "no travel time from {} to {}", from, to),
      NonZeroSelfTravelTime { node, time } => write!(f, "travel time from {} to itself must be 0 (got {})", node, time),
    }
  }
}

impl std::error::Error for ValidationError {}


/// A validated PizzaBot instance.  Read-only once built.
#[derive(Debug, Clone)]
pub struct PizzaInstance {
  id: String,
  nodes: Vec<Node>,
  coords: Map<Node, (f64, f64)>,
  restaurants: Vec<(String, Node)>,
  customers: Vec<(String, Node)>,
  orders: Vec<Order>,
  bots: Vec<Bot>,
  paths: ShortestPaths,
  service_time: Time,
  horizon: Time,
}

impl PizzaInstance {
  pub fn id(&self) -> &str { &self.id }

  pub fn nodes(&self) -> &[Node] { &self.nodes }

  pub fn coords(&self, node: Node) -> Option<(f64, f64)> { self.coords.get(&node).copied() }

  pub fn restaurants(&self) -> &[(String, Node)] { &self.restaurants }

  pub fn customers(&self) -> &[(String, Node)] { &self.customers }

  pub fn orders(&self) -> &[Order] { &self.orders }

  #[inline]
  pub fn order(&self, o: usize) -> &Order { &self.orders[o] }

  pub fn bots(&self) -> &[Bot] { &self.bots }

  #[inline]
  pub fn bot(&self, b: usize) -> &Bot { &self.bots[b] }

  pub fn order_index(&self, name: &str) -> Option<usize> {
    self.orders.iter().position(|o| o.name == name)
  }

  pub fn bot_index(&self, name: &str) -> Option<usize> {
    self.bots.iter().position(|b| b.name == name)
  }

  /// Minutes spent at every pickup and delivery stop.
  pub fn service_time(&self) -> Time { self.service_time }

  /// Freshness horizon given by the instance file.
  pub fn horizon(&self) -> Time { self.horizon }

  pub fn try_travel_time(&self, from: Node, to: Node) -> Option<Time> {
    if from == to {
      return Some(self.paths.travel_time.get(&(from, to)).copied().unwrap_or(0));
    }
    self.paths.travel_time.get(&(from, to)).copied()
  }

  /// Travel time between two locations used by orders or bots.  Validation guarantees these exist.
  #[inline]
  pub fn travel_time(&self, from: Node, to: Node) -> Time {
    if from == to {
      return 0;
    }
    self.paths.travel_time[&(from, to)]
  }

  /// Nodes passed through from `from` to `to` (excluding `from`, including `to`).
  pub fn path(&self, from: Node, to: Node) -> Vec<Node> {
    self.paths.path(from, to)
  }

  /// Largest travel time between any two locations used by orders or bots.
  pub fn max_travel_time(&self) -> Time {
    let locs = self.key_locations();
    locs.iter()
      .cartesian_product(locs.iter())
      .map(|(&a, &b)| self.travel_time(a, b))
      .max()
      .unwrap_or(0)
  }

  /// Bot starts, pickups and deliveries, sorted and without duplicates.
  pub fn key_locations(&self) -> Vec<Node> {
    key_locations(&self.orders, &self.bots)
  }
}

fn key_locations(orders: &[Order], bots: &[Bot]) -> Vec<Node> {
  bots.iter().map(|b| b.start)
    .chain(orders.iter().flat_map(|o| vec![o.pickup, o.delivery]))
    .sorted()
    .dedup()
    .collect()
}


/// Assembles a [`PizzaInstance`] programmatically.  [`InstanceBuilder::build`] validates.
#[derive(Debug, Clone, Default)]
pub struct InstanceBuilder {
  id: String,
  nodes: Vec<Node>,
  coords: Map<Node, (f64, f64)>,
  restaurants: Vec<(String, Node)>,
  customers: Vec<(String, Node)>,
  orders: Vec<Order>,
  bots: Vec<Bot>,
  paths: ShortestPaths,
  service_time: Time,
  horizon: Option<Time>,
}

impl InstanceBuilder {
  pub fn new(id: impl Into<String>) -> Self {
    InstanceBuilder { id: id.into(), ..Default::default() }
  }

  pub fn nodes(mut self, nodes: impl IntoIterator<Item=Node>) -> Self {
    self.nodes.extend(nodes);
    self
  }

  pub fn coords(mut self, node: Node, xy: (f64, f64)) -> Self {
    self.coords.insert(node, xy);
    self
  }

  /// Directed travel time entry.
  pub fn travel_time(mut self, from: Node, to: Node, time: Time) -> Self {
    self.paths.travel_time.insert((from, to), time);
    self
  }

  pub fn symmetric_travel_time(self, a: Node, b: Node, time: Time) -> Self {
    self.travel_time(a, b, time).travel_time(b, a, time)
  }

  /// Replaces all travel times.
  pub fn shortest_paths(mut self, paths: ShortestPaths) -> Self {
    self.paths = paths;
    self
  }

  pub fn restaurant(mut self, name: impl Into<String>, node: Node) -> Self {
    self.restaurants.push((name.into(), node));
    self
  }

  pub fn customer(mut self, name: impl Into<String>, node: Node) -> Self {
    self.customers.push((name.into(), node));
    self
  }

  pub fn order(mut self, order: Order) -> Self {
    self.orders.push(order);
    self
  }

  pub fn bot(mut self, bot: Bot) -> Self {
    self.bots.push(bot);
    self
  }

  pub fn service_time(mut self, time: Time) -> Self {
    self.service_time = time;
    self
  }

  pub fn horizon(mut self, time: Time) -> Self {
    self.horizon = Some(time);
    self
  }

  pub fn build(self) -> Result<PizzaInstance, ValidationError> {
    let InstanceBuilder { id, nodes, coords, restaurants, customers, orders, bots, mut paths, service_time, horizon } = self;

    let mut known = Set::default();
    for &n in &nodes {
      if !known.insert(n) {
        return Err(ValidationError::DuplicateName { kind: "node", name: n.to_string() });
      }
    }
    let check_node = |context: &dyn Fn() -> String, node: Node| {
      if known.contains(&node) {
        Ok(())
      } else {
        Err(ValidationError::UnknownNode { context: context(), node: node as usize })
      }
    };

    check_unique("restaurant", restaurants.iter().map(|(name, _)| name))?;
    check_unique("customer", customers.iter().map(|(name, _)| name))?;
    check_unique("order", orders.iter().map(|o| &o.name))?;
    check_unique("bot", bots.iter().map(|b| &b.name))?;

    for (name, node) in restaurants.iter().chain(&customers) {
      check_node(&|| format!("place {}", name), *node)?;
    }

    if service_time < 0 {
      return Err(ValidationError::NegativeTime { context: "service time".to_string(), time: service_time });
    }

    for o in &orders {
      check_node(&|| format!("pickup of order {}", o.name), o.pickup)?;
      check_node(&|| format!("delivery of order {}", o.name), o.delivery)?;
      if o.ready < 0 {
        return Err(ValidationError::NegativeTime { context: format!("ready time of order {}", o.name), time: o.ready });
      }
      if o.deadline.map_or(false, |d| d < o.ready) {
        return Err(ValidationError::DeadlineBeforeReady { order: o.name.clone() });
      }
      if o.size <= 0 {
        return Err(ValidationError::NonPositiveSize { order: o.name.clone(), size: o.size });
      }
    }

    for b in &bots {
      check_node(&|| format!("start of bot {}", b.name), b.start)?;
      if b.capacity <= 0 {
        return Err(ValidationError::NonPositiveCapacity { bot: b.name.clone(), capacity: b.capacity });
      }
      if b.available < 0 {
        return Err(ValidationError::NegativeTime { context: format!("availability of bot {}", b.name), time: b.available });
      }
    }

    for (&(from, to), &time) in paths.travel_time.iter().sorted() {
      check_node(&|| "travel time entry".to_string(), from)?;
      check_node(&|| "travel time entry".to_string(), to)?;
      if time < 0 {
        return Err(ValidationError::NegativeTravelTime { from, to, time });
      }
      if from == to && time != 0 {
        return Err(ValidationError::NonZeroSelfTravelTime { node: from, time });
      }
    }

    // Every pair of locations that can follow each other on some route must be connected.
    let locs = key_locations(&orders, &bots);
    for (&a, &b) in locs.iter().cartesian_product(locs.iter()) {
      if a == b {
        paths.travel_time.entry((a, b)).or_insert(0);
      } else if !paths.travel_time.contains_key(&(a, b)) {
        return Err(ValidationError::MissingTravelTime { from: a, to: b });
      }
    }

    Ok(PizzaInstance {
      id,
      nodes,
      coords,
      restaurants,
      customers,
      orders,
      bots,
      paths,
      service_time,
      horizon: horizon.unwrap_or(DEFAULT_HORIZON),
    })
  }
}

fn check_unique<'a>(kind: &'static str, names: impl Iterator<Item=&'a String>) -> Result<(), ValidationError> {
  let mut seen = Set::default();
  for name in names {
    if !seen.insert(name) {
      return Err(ValidationError::DuplicateName { kind, name: name.clone() });
    }
  }
  Ok(())
}


impl TryFromRaw<Pizzabot> for PizzaInstance {
  type Error = ValidationError;

  fn try_from_raw(raw: Pizzabot, id: Cow<str>) -> Result<PizzaInstance, ValidationError> {
    let node_id = |context: &str, n: usize| {
      Node::try_from(n).map_err(|_| ValidationError::UnknownNode { context: context.to_string(), node: n })
    };
    let demand = |context: String, q: i64| {
      Demand::try_from(q).map_err(|_| ValidationError::DemandOutOfRange { context, value: q })
    };

    let nodes: Vec<Node> = raw.nodes.iter()
      .map(|&(n, _)| node_id("node list", n))
      .collect::<Result<_, _>>()?;
    let known: Set<Node> = nodes.iter().copied().collect();

    let paths = if !raw.edges.is_empty() || !raw.arcs.is_empty() {
      let mut arcs = Vec::with_capacity(raw.edges.len() * 2 + raw.arcs.len());
      let undirected = raw.edges.iter().flat_map(|&(u, v, t)| vec![(u, v, t), (v, u, t)]);
      for (u, v, t) in undirected.chain(raw.arcs.iter().copied()) {
        let (u, v) = (node_id("edge", u)?, node_id("edge", v)?);
        for &n in &[u, v] {
          if !known.contains(&n) {
            return Err(ValidationError::UnknownNode { context: "edge".to_string(), node: n as usize });
          }
        }
        if t < 0 {
          return Err(ValidationError::NegativeTravelTime { from: u, to: v, time: t });
        }
        arcs.push((u, v, t));
      }
      graph::shortest_paths(&nodes, &arcs)
    } else if !raw.nodes.is_empty() && raw.nodes.iter().all(|(_, xy)| xy.is_some()) {
      let points: Vec<(Node, (f64, f64))> = nodes.iter().copied()
        .zip(raw.nodes.iter().filter_map(|(_, xy)| *xy))
        .collect();
      graph::euclidean(&points)
    } else {
      ShortestPaths::default()
    };

    let restaurants: Map<&str, Node> = raw.restaurants.iter()
      .map(|(name, n)| Ok((name.as_str(), node_id("restaurant", *n)?)))
      .collect::<Result<_, ValidationError>>()?;
    let customers: Map<&str, Node> = raw.customers.iter()
      .map(|(name, n)| Ok((name.as_str(), node_id("customer", *n)?)))
      .collect::<Result<_, ValidationError>>()?;

    let mut builder = InstanceBuilder::new(raw.name.clone().unwrap_or_else(|| id.into_owned()))
      .nodes(nodes.iter().copied())
      .shortest_paths(paths)
      .service_time(raw.service_time.unwrap_or(0));

    if let Some(h) = raw.horizon {
      builder = builder.horizon(h);
    }

    for (&(n, xy), &node) in raw.nodes.iter().zip(&nodes) {
      debug_assert_eq!(n, node as usize);
      if let Some(xy) = xy {
        builder = builder.coords(node, xy);
      }
    }

    for (name, n) in &raw.restaurants {
      builder = builder.restaurant(name.clone(), node_id("restaurant", *n)?);
    }
    for (name, n) in &raw.customers {
      builder = builder.customer(name.clone(), node_id("customer", *n)?);
    }

    for o in &raw.orders {
      let pickup = *restaurants.get(o.restaurant.as_str())
        .ok_or_else(|| ValidationError::UnknownRestaurant { order: o.name.clone(), restaurant: o.restaurant.clone() })?;
      let delivery = *customers.get(o.customer.as_str())
        .ok_or_else(|| ValidationError::UnknownCustomer { order: o.name.clone(), customer: o.customer.clone() })?;
      let mut order = Order::new(o.name.clone(), pickup, delivery, o.ready).with_size(demand(format!("size of order {}", o.name), o.size)?);
      order.deadline = o.deadline;
      builder = builder.order(order);
    }

    for b in &raw.bots {
      let capacity = demand(format!("capacity of bot {}", b.name), b.capacity)?;
      let bot = Bot::new(b.name.clone(), node_id(&format!("start of bot {}", b.name), b.node)?, capacity)
        .with_available(b.available.unwrap_or(0));
      builder = builder.bot(bot);
    }

    builder.build()
  }
}


/// Instance files under `PizzaBot/` in the data root.
pub enum PizzabotFiles {}

impl InstanceFormat for PizzabotFiles {
  type Instance = PizzaInstance;
  const DIR: &'static str = "PizzaBot";
  const EXTENSION: &'static str = "txt";

  fn load(path: &Path, id: Cow<str>) -> Result<PizzaInstance> {
    load_file_as(path, id)
  }
}

/// Load an instance file from an arbitrary location.  The instance id defaults to the file stem.
pub fn load_file(path: impl AsRef<Path>) -> Result<PizzaInstance> {
  let path = path.as_ref();
  let id = path.file_stem()
    .map(|s| s.to_string_lossy())
    .unwrap_or(Cow::Borrowed("instance"));
  load_file_as(path, id)
}

fn load_file_as(path: &Path, id: Cow<str>) -> Result<PizzaInstance> {
  let raw = Pizzabot::parse(PizzabotFmt(path)).context(format!("failed to load {:?}", path))?;
  let instance = PizzaInstance::try_from_raw(raw, id).context(format!("invalid instance {:?}", path))?;
  Ok(instance)
}

lazy_static!{
  static ref DSET: std::result::Result<Catalog<PizzabotFiles>, String> =
    Catalog::from_env().map_err(|e| format!("{:#}", e));
}

/// The bundled dataset, located through `DATA_ROOT`.
pub fn dataset() -> Result<&'static Catalog<PizzabotFiles>> {
  DSET.as_ref().map_err(|e| anyhow::anyhow!("PizzaBot dataset unavailable: {}", e))
}
