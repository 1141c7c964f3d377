//! Greedy cheapest-insertion construction.  Used on its own or to sanity check solver results.
use itertools::Itertools;
use tracing::*;

use crate::*;
use crate::data::*;
use crate::formulation::{default_tie_break, FormulationParams};
use crate::freshness::{freshness, DecayCurve};
use crate::route::Route;
use crate::solution::Solution;

/// Objective contribution of a route: freshness of its orders minus weighted travel time.
/// `None` if the route is infeasible.
fn route_value(data: &PizzaInstance, curve: &DecayCurve, weight: f64, route: &Route) -> Option<f64> {
    let schedule = route.check(data).ok()?;
    let fresh: f64 = route.stops.iter().zip(&schedule)
        .filter(|(s, _)| s.is_delivery())
        .map(|(s, st)| freshness(curve, st.begin, data.order(s.order).ready))
        .sum();
    Some(fresh - weight * route.travel_time(data) as f64)
}

/// Whether some bot can serve order `o` on an otherwise empty route.  An order no bot can serve
/// alone cannot be served at all.
pub fn servable_alone(data: &PizzaInstance, o: OrderIdx) -> bool {
    (0..data.bots().len()).any(|b| Route::new(b, vec![Stop::pickup(o), Stop::delivery(o)]).check(data).is_ok())
}

/// Repeatedly inserts the pending order whose best pickup and delivery positions increase the
/// objective the most.  With unserved orders allowed, stops once no insertion improves it.
#[instrument(level="info", skip(data, params), fields(instance=%data.id()))]
pub fn insertion(data: &PizzaInstance, params: &FormulationParams) -> Result<Solution, Error> {
    params.validate()?;
    let curve = params.curve;
    let weight = params.tie_break.unwrap_or_else(|| default_tie_break(data, &curve));
    let n_bots = data.bots().len();

    let mut routes: Vec<Route> = (0..n_bots).map(Route::empty).collect();
    let mut values = vec![0.0; n_bots];
    let mut pending: Vec<OrderIdx> = (0..data.orders().len())
        .sorted_by_key(|&o| (data.order(o).deadline.unwrap_or(Time::MAX), data.order(o).ready, o))
        .collect();

    while !pending.is_empty() {
        let mut best: Option<(f64, usize, Route)> = None;
        for (k, &o) in pending.iter().enumerate() {
            for b in 0..n_bots {
                let len = routes[b].stops.len();
                for i in 0..=len {
                    for j in (i + 1)..=(len + 1) {
                        let mut candidate = routes[b].clone();
                        candidate.stops.insert(i, Stop::pickup(o));
                        candidate.stops.insert(j, Stop::delivery(o));
                        if let Some(v) = route_value(data, &curve, weight, &candidate) {
                            let gain = v - values[b];
                            if best.as_ref().map_or(true, |(g, _, _)| gain > *g + 1e-12) {
                                best = Some((gain, k, candidate));
                            }
                        }
                    }
                }
            }
        }

        match best {
            Some((gain, k, route)) if !params.allow_unserved || gain > 0.0 => {
                let o = pending.remove(k);
                let b = route.bot;
                trace!(order=%data.order(o).name, bot=%data.bot(b).name, gain);
                values[b] += gain;
                routes[b] = route;
            },
            _ if params.allow_unserved => break,
            _ => {
                let names = pending.iter().map(|&o| data.order(o).name.as_str()).join(", ");
                return Err(Error::InfeasibleRoute(format!("cannot insert orders {} into any route", names)));
            }
        }
    }

    if !pending.is_empty() {
        debug!(unserved=pending.len(), "leaving orders unserved");
    }
    Solution::new(data, routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use proptest::prelude::*;

    fn total_freshness(data: &PizzaInstance, sol: &Solution, curve: &DecayCurve) -> f64 {
        (0..data.orders().len())
            .filter_map(|o| sol.delivery_time(o).map(|t| freshness(curve, t, data.order(o).ready)))
            .sum()
    }

    #[test]
    fn batches_orders_from_the_same_restaurant() {
        let data = one_bot_two_orders();
        let params = FormulationParams::default();
        let sol = insertion(&data, &params).unwrap();
        assert!(sol.is_complete());
        assert_eq!(sol.delivery_time(0), Some(15));
        assert_eq!(sol.delivery_time(1), Some(15));
        assert!((total_freshness(&data, &sol, &params.curve) - 19.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn oversized_order() {
        let data = InstanceBuilder::new("oversized")
            .nodes(0..2)
            .symmetric_travel_time(0, 1, 5)
            .order(Order::new("Big", 0, 1, 0).with_size(3))
            .order(Order::new("Small", 0, 1, 0))
            .bot(Bot::new("X", 0, 2))
            .build()
            .unwrap();
        assert!(!servable_alone(&data, 0));
        assert!(servable_alone(&data, 1));

        let strict = FormulationParams::default();
        assert!(matches!(insertion(&data, &strict), Err(Error::InfeasibleRoute(_))));

        let partial = FormulationParams { allow_unserved: true, ..Default::default() };
        let sol = insertion(&data, &partial).unwrap();
        assert_eq!(sol.unserved().collect::<Vec<_>>(), vec![0]);
        assert_eq!(sol.delivery_time(1), Some(5));
    }

    proptest! {
        #[test]
        fn serves_everything_without_deadlines(data in random_instance(5, 3, 2..4)) {
            let params = FormulationParams::default();
            let sol = insertion(&data, &params).unwrap();
            prop_assert!(sol.is_complete());
            for r in sol.routes() {
                prop_assert!(r.check(&data).is_ok());
                let capacity = data.bot(r.bot).capacity;
                prop_assert!(r.loads(&data).into_iter().all(|l| 0 <= l && l <= capacity as i64));
            }
        }
    }
}
