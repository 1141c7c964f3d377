use itertools::Itertools;

use crate::*;
use crate::data::*;
use crate::schedule::{route_schedule, StopTime};

/// The ordered stops visited by one bot.  Travel between consecutive stops follows shortest paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub bot: BotIdx,
    pub stops: Vec<Stop>,
}

impl Route {
    pub fn new(bot: BotIdx, stops: Vec<Stop>) -> Self {
        Route { bot, stops }
    }

    pub fn empty(bot: BotIdx) -> Self {
        Route { bot, stops: Vec::new() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool { self.stops.is_empty() }

    /// Orders served, in pickup order.
    pub fn orders<'a>(&'a self) -> impl Iterator<Item=OrderIdx> + 'a {
        self.stops.iter().filter(|s| s.is_pickup()).map(|s| s.order)
    }

    /// Load carried after service at each stop.  Summed in `i64` so no sum of `Demand`s overflows.
    pub fn loads(&self, data: &PizzaInstance) -> Vec<i64> {
        self.stops.iter()
            .scan(0i64, |load, &s| { *load += data.stop_load(s) as i64; Some(*load) })
            .collect()
    }

    /// Locations visited, starting with the bot's start node.
    pub fn locations(&self, data: &PizzaInstance) -> Vec<Node> {
        std::iter::once(data.bot(self.bot).start)
            .chain(self.stops.iter().map(|&s| data.stop_location(s)))
            .collect()
    }

    pub fn travel_time(&self, data: &PizzaInstance) -> Time {
        self.locations(data).into_iter()
            .tuple_windows()
            .map(|(i, j)| data.travel_time(i, j))
            .sum()
    }

    fn describe(&self, data: &PizzaInstance) -> String {
        format!("{} [{}]", data.bot(self.bot).name, self.stops.iter().map(|&s| data.stop_label(s)).join(" "))
    }

    /// Checks pickup-before-delivery, single visits, capacity and deadlines, returning the
    /// earliest schedule if all hold.
    pub fn check(&self, data: &PizzaInstance) -> Result<Vec<StopTime>, Error> {
        if self.bot >= data.bots().len() {
            return Err(Error::InfeasibleRoute(format!("no bot with index {}", self.bot)));
        }
        let capacity = data.bot(self.bot).capacity;
        let mut picked = Set::default();
        let mut delivered = Set::default();
        let mut load: i64 = 0;

        for &s in &self.stops {
            if s.order >= data.orders().len() {
                return Err(Error::InfeasibleRoute(format!("no order with index {}", s.order)));
            }
            let name = &data.order(s.order).name;
            match s.kind {
                StopKind::Pickup => {
                    if !picked.insert(s.order) {
                        return Err(Error::InfeasibleRoute(format!("order {} picked up twice on {}", name, self.describe(data))));
                    }
                },
                StopKind::Delivery => {
                    if !picked.contains(&s.order) {
                        return Err(Error::InfeasibleRoute(format!("order {} delivered before pickup on {}", name, self.describe(data))));
                    }
                    if !delivered.insert(s.order) {
                        return Err(Error::InfeasibleRoute(format!("order {} delivered twice on {}", name, self.describe(data))));
                    }
                },
            }
            load += data.stop_load(s) as i64;
            if load > capacity as i64 {
                return Err(Error::InfeasibleRoute(format!("capacity {} exceeded on {}", capacity, self.describe(data))));
            }
        }

        if let Some(o) = picked.iter().find(|o| !delivered.contains(o)) {
            return Err(Error::InfeasibleRoute(format!("order {} never delivered on {}", data.order(*o).name, self.describe(data))));
        }

        let schedule = route_schedule(data, self);
        for (s, st) in self.stops.iter().zip(&schedule) {
            if !s.is_delivery() { continue }
            if let Some(deadline) = data.order(s.order).deadline {
                if st.begin > deadline {
                    return Err(Error::InfeasibleRoute(format!(
                        "order {} delivered at {} after its deadline {}",
                        data.order(s.order).name, instances::clock::format_hm(st.begin), instances::clock::format_hm(deadline)
                    )));
                }
            }
        }
        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use proptest::prelude::*;

    #[test]
    fn valid_route() {
        let data = one_bot_two_orders();
        let route = Route::new(0, vec![Stop::pickup(0), Stop::pickup(1), Stop::delivery(1), Stop::delivery(0)]);
        assert!(route.check(&data).is_ok());
        assert_eq!(route.loads(&data), vec![1, 2, 1, 0]);
        assert_eq!(route.travel_time(&data), 10);
        assert_eq!(route.orders().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn invalid_routes() {
        let data = one_bot_two_orders();
        let check = |stops: Vec<Stop>| Route::new(0, stops).check(&data);
        assert!(check(vec![Stop::delivery(0), Stop::pickup(0)]).is_err());
        assert!(check(vec![Stop::pickup(0), Stop::pickup(0), Stop::delivery(0)]).is_err());
        assert!(check(vec![Stop::pickup(0)]).is_err());
        assert!(check(vec![Stop::pickup(0), Stop::delivery(0), Stop::delivery(0)]).is_err());
        assert!(Route::new(3, vec![]).check(&data).is_err());
    }

    #[test]
    fn capacity_and_deadline() {
        let data = InstanceBuilder::new("tight")
            .nodes(0..2)
            .symmetric_travel_time(0, 1, 10)
            .order(Order::new("A", 0, 1, 0))
            .order(Order::new("B", 0, 1, 0).with_deadline(12))
            .bot(Bot::new("X", 0, 1))
            .build()
            .unwrap();
        let both = Route::new(0, vec![Stop::pickup(0), Stop::pickup(1), Stop::delivery(0), Stop::delivery(1)]);
        assert!(matches!(both.check(&data), Err(Error::InfeasibleRoute(_))));
        let late = Route::new(0, vec![Stop::pickup(0), Stop::delivery(0), Stop::pickup(1), Stop::delivery(1)]);
        assert!(late.check(&data).is_err());
        let ok = Route::new(0, vec![Stop::pickup(1), Stop::delivery(1), Stop::pickup(0), Stop::delivery(0)]);
        assert!(ok.check(&data).is_ok());
    }

    #[test]
    fn capacity_sums_do_not_overflow() {
        let data = InstanceBuilder::new("huge")
            .nodes(0..2)
            .symmetric_travel_time(0, 1, 1)
            .order(Order::new("A", 0, 1, 0).with_size(Demand::MAX))
            .order(Order::new("B", 0, 1, 0).with_size(Demand::MAX))
            .bot(Bot::new("X", 0, Demand::MAX))
            .build()
            .unwrap();
        let both = Route::new(0, vec![Stop::pickup(0), Stop::pickup(1), Stop::delivery(0), Stop::delivery(1)]);
        assert!(matches!(both.check(&data), Err(Error::InfeasibleRoute(_))));
        assert_eq!(both.loads(&data)[1], 2 * Demand::MAX as i64);
        let one_by_one = Route::new(0, vec![Stop::pickup(0), Stop::delivery(0), Stop::pickup(1), Stop::delivery(1)]);
        assert!(one_by_one.check(&data).is_ok());
    }

    proptest! {
        #[test]
        fn random_routes_respect_precedence((data, route) in random_route()) {
            prop_assert!(route.check(&data).is_ok());
            let loads = route.loads(&data);
            prop_assert_eq!(loads.last().copied().unwrap_or(0), 0);
            prop_assert!(loads.iter().all(|&l| l >= 0));
        }
    }
}
