use std::cmp::max;
use tracing::*;

use crate::data::*;
use crate::route::Route;

/// Timing of a single stop.  Waiting happens only at pickups, for the food to become ready.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct StopTime {
    pub arrival: Time,
    /// Service start; equal to `arrival` unless the bot had to wait.
    pub begin: Time,
    pub departure: Time,
}

impl StopTime {
    #[inline]
    pub fn wait(&self) -> Time { self.begin - self.arrival }
}

/// Earliest schedule for visiting `stops` in order, leaving `start` at `start_time`.  Does not
/// check precedence, capacity or deadlines.
#[instrument(level="trace", skip(data))]
pub fn get_schedule(data: &PizzaInstance, start: Node, start_time: Time, stops: &[Stop]) -> Vec<StopTime> {
    let service = data.service_time();
    let mut schedule = Vec::with_capacity(stops.len());
    let mut loc = start;
    let mut t = start_time;

    for &s in stops {
        let next = data.stop_location(s);
        let arrival = t + data.travel_time(loc, next);
        let begin = match s.kind {
            StopKind::Pickup => max(arrival, data.order(s.order).ready),
            StopKind::Delivery => arrival,
        };
        let departure = begin + service;
        schedule.push(StopTime { arrival, begin, departure });
        loc = next;
        t = departure;
    }
    trace!(?schedule);
    return schedule
}

/// Earliest schedule of `route`, starting when its bot becomes available.
#[inline]
pub fn route_schedule(data: &PizzaInstance, route: &Route) -> Vec<StopTime> {
    get_schedule(data, data.bot(route.bot).start, data.bot(route.bot).available, &route.stops)
}

/// Service start time at every stop of `route` when its bot leaves its start at `start_time`.
pub fn arrival_times(data: &PizzaInstance, route: &Route, start_time: Time) -> Vec<Time> {
    get_schedule(data, data.bot(route.bot).start, start_time, &route.stops)
        .into_iter()
        .map(|st| st.begin)
        .collect()
}

/// Time at which the bot finishes its last stop, or becomes available if the route is empty.
pub fn finish_time(data: &PizzaInstance, route: &Route) -> Time {
    route_schedule(data, route).last()
        .map(|st| st.departure)
        .unwrap_or(data.bot(route.bot).available)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_test_logging;
    use crate::testing::{one_bot_two_orders, random_route};
    use proptest::prelude::*;

    #[test]
    fn waits_for_second_order() {
        let _g = init_test_logging(None::<&str>);
        let data = one_bot_two_orders();
        let route = Route::new(0, vec![Stop::pickup(0), Stop::pickup(1), Stop::delivery(0), Stop::delivery(1)]);
        assert_eq!(arrival_times(&data, &route, 0), vec![0, 5, 15, 15]);

        let schedule = route_schedule(&data, &route);
        assert_eq!(schedule[1].arrival, 0);
        assert_eq!(schedule[1].wait(), 5);
        assert_eq!(schedule[2].wait(), 0);
        assert_eq!(finish_time(&data, &route), 15);
    }

    #[test]
    fn empty_route() {
        let data = one_bot_two_orders();
        let route = Route::empty(0);
        assert!(arrival_times(&data, &route, 0).is_empty());
        assert_eq!(finish_time(&data, &route), 0);
    }

    proptest! {
        #[test]
        fn arrival_times_non_decreasing((data, route) in random_route(), start in 0..30i64) {
            let times = arrival_times(&data, &route, start);
            prop_assert_eq!(times.len(), route.stops.len());
            for w in times.windows(2) {
                prop_assert!(w[0] <= w[1]);
            }
            for (s, t) in route.stops.iter().zip(&times) {
                prop_assert!(*t >= start);
                if s.is_pickup() {
                    prop_assert!(*t >= data.order(s.order).ready);
                }
            }
        }

        #[test]
        fn later_start_never_earlier((data, route) in random_route(), start in 0..30i64, delay in 0..30i64) {
            let early = arrival_times(&data, &route, start);
            let late = arrival_times(&data, &route, start + delay);
            for (a, b) in early.iter().zip(&late) {
                prop_assert!(a <= b);
            }
        }
    }
}
