//! Instances and strategies shared by the unit tests.
use proptest::prelude::*;

use crate::data::*;
use crate::formulation::FormulationParams;
use crate::heuristic::insertion;
use crate::route::Route;

/// One bot at the restaurant (node 0), two orders for customers at node 1, ten minutes away.
/// The second order becomes ready five minutes after the first.
pub fn one_bot_two_orders() -> PizzaInstance {
    InstanceBuilder::new("one-bot-two-orders")
        .nodes(0..2)
        .symmetric_travel_time(0, 1, 10)
        .restaurant("R", 0)
        .customer("C", 1)
        .order(Order::new("A", 0, 1, 0))
        .order(Order::new("B", 0, 1, 5))
        .bot(Bot::new("Bot1", 0, 2))
        .horizon(60)
        .build()
        .unwrap()
}

type Parts = (u32, Vec<Time>, Vec<(Node, Node, Time, Demand)>, Vec<(Node, Demand, Time)>, Time);

fn random_parts(max_orders: usize, max_bots: usize, capacity: std::ops::Range<Demand>) -> impl Strategy<Value=Parts> {
    (2..5u32, 1..=max_orders, 1..=max_bots)
        .prop_flat_map(move |(n_nodes, n_orders, n_bots)| {
            let travel = prop::collection::vec(1..15i64, (n_nodes * n_nodes) as usize);
            let orders = prop::collection::vec((0..n_nodes, 0..n_nodes, 0..20i64, 1..3i32), n_orders);
            let bots = prop::collection::vec((0..n_nodes, capacity.clone(), 0..10i64), n_bots);
            (Just(n_nodes), travel, orders, bots, 0..3i64)
        })
}

fn build_random((n_nodes, travel, orders, bots, service): &Parts, deadlines: &[Option<Time>]) -> PizzaInstance {
    let mut builder = InstanceBuilder::new("random")
        .nodes(0..*n_nodes)
        .service_time(*service)
        .horizon(40);
    for i in 0..*n_nodes {
        for j in 0..*n_nodes {
            if i != j {
                builder = builder.travel_time(i, j, travel[(i * n_nodes + j) as usize]);
            }
        }
    }
    for (k, &(p, d, ready, size)) in orders.iter().enumerate() {
        let mut order = Order::new(format!("O{}", k), p, d, ready).with_size(size);
        if let Some(&Some(deadline)) = deadlines.get(k) {
            order = order.with_deadline(deadline);
        }
        builder = builder.order(order);
    }
    for (k, &(start, capacity, available)) in bots.iter().enumerate() {
        builder = builder.bot(Bot::new(format!("B{}", k), start, capacity).with_available(available));
    }
    builder.build().unwrap()
}

/// Complete random travel time matrix, no deadlines.  Every order fits into every bot.
pub fn random_instance(max_orders: usize, max_bots: usize, capacity: std::ops::Range<Demand>) -> impl Strategy<Value=PizzaInstance> {
    random_parts(max_orders, max_bots, capacity).prop_map(|parts| build_random(&parts, &[]))
}

/// Like [`random_instance`], but some orders carry a deadline: their delivery time in a greedy
/// plan plus up to ten minutes of slack.  That plan is returned alongside and meets every deadline.
pub fn random_instance_with_deadlines(max_orders: usize, max_bots: usize, capacity: std::ops::Range<Demand>)
    -> impl Strategy<Value=(PizzaInstance, Vec<Route>)>
{
    random_parts(max_orders, max_bots, capacity)
        .prop_flat_map(|parts| {
            let n = parts.2.len();
            (Just(parts), prop::collection::vec(prop::option::of(0..10i64), n))
        })
        .prop_map(|(parts, slack)| {
            let plain = build_random(&parts, &[]);
            let plan = insertion(&plain, &FormulationParams::default()).unwrap();
            let deadlines: Vec<_> = slack.iter().enumerate()
                .map(|(o, s)| Some(plan.delivery_time(o)? + (*s)?))
                .collect();
            (build_random(&parts, &deadlines), plan.routes().to_vec())
        })
}

/// A route for bot 0 visiting a random subset of orders in a random precedence-respecting order.
/// Capacities are large enough for any such route.
pub fn random_route() -> impl Strategy<Value=(PizzaInstance, Route)> {
    random_instance(4, 1, 8..9)
        .prop_flat_map(|data| {
            let n = data.orders().len();
            let stops: Vec<Stop> = (0..n).flat_map(|o| vec![Stop::pickup(o), Stop::delivery(o)]).collect();
            (Just(data), Just(stops).prop_shuffle(), prop::collection::vec(any::<bool>(), n))
        })
        .prop_map(|(data, shuffled, keep)| {
            let mut seen = vec![false; keep.len()];
            let stops = shuffled.into_iter()
                .filter(|s| keep[s.order])
                .map(|s| {
                    // first visit of an order is its pickup
                    let first = !seen[s.order];
                    seen[s.order] = true;
                    if first { Stop::pickup(s.order) } else { Stop::delivery(s.order) }
                })
                .collect();
            (data, Route::new(0, stops))
        })
}
