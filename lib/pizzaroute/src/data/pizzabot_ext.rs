pub use instances::{
    PizzaInstance,
    InstanceBuilder,
    Order,
    Bot,
    Node,
    Time,
    Demand,
};

pub type OrderIdx = usize;
pub type BotIdx = usize;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum StopKind {
    Pickup,
    Delivery,
}

/// One visit of a route: collecting or handing over a single order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Stop {
    pub order: OrderIdx,
    pub kind: StopKind,
}

impl Stop {
    #[inline]
    pub fn pickup(order: OrderIdx) -> Self { Stop { order, kind: StopKind::Pickup } }

    #[inline]
    pub fn delivery(order: OrderIdx) -> Self { Stop { order, kind: StopKind::Delivery } }

    #[inline]
    pub fn is_pickup(&self) -> bool { self.kind == StopKind::Pickup }

    #[inline]
    pub fn is_delivery(&self) -> bool { self.kind == StopKind::Delivery }

    /// The other end of the same order.
    #[inline]
    pub fn sibling(&self) -> Stop {
        match self.kind {
            StopKind::Pickup => Stop::delivery(self.order),
            StopKind::Delivery => Stop::pickup(self.order),
        }
    }
}

pub trait PizzaInstanceExt {
    fn stop_location(&self, s: Stop) -> Node;
    /// Change in load when service at `s` finishes.
    fn stop_load(&self, s: Stop) -> Demand;
    /// All pickups (in order index order) followed by all deliveries.
    fn stops(&self) -> Vec<Stop>;
    fn stop_label(&self, s: Stop) -> String;
}

impl PizzaInstanceExt for PizzaInstance {
    #[inline]
    fn stop_location(&self, s: Stop) -> Node {
        let order = self.order(s.order);
        match s.kind {
            StopKind::Pickup => order.pickup,
            StopKind::Delivery => order.delivery,
        }
    }

    #[inline]
    fn stop_load(&self, s: Stop) -> Demand {
        let size = self.order(s.order).size;
        match s.kind {
            StopKind::Pickup => size,
            StopKind::Delivery => -size,
        }
    }

    fn stops(&self) -> Vec<Stop> {
        let n = self.orders().len();
        (0..n).map(Stop::pickup).chain((0..n).map(Stop::delivery)).collect()
    }

    fn stop_label(&self, s: Stop) -> String {
        let sign = if s.is_pickup() { '+' } else { '-' };
        format!("{}{}", sign, self.order(s.order).name)
    }
}
