use std::fmt;
use tracing::*;

use crate::*;
use crate::data::*;
use crate::freshness::{freshness, DecayCurve};
use crate::solution::Solution;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderReport {
    pub order: OrderIdx,
    pub bot: Option<BotIdx>,
    pub pickup: Option<Time>,
    pub delivery: Option<Time>,
    /// Zero for unserved orders.
    pub freshness: f64,
}

/// Scores of a solution recomputed from its routes alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub curve: DecayCurve,
    pub total_freshness: f64,
    pub orders: Vec<OrderReport>,
    pub total_travel_time: Time,
    /// Completion of the last stop over all bots, `None` if nothing is served.
    pub makespan: Option<Time>,
}

impl Evaluation {
    pub fn served(&self) -> usize {
        self.orders.iter().filter(|o| o.bot.is_some()).count()
    }
}

#[instrument(level="debug", skip(data, solution))]
pub fn evaluate(data: &PizzaInstance, solution: &Solution, curve: &DecayCurve) -> Result<Evaluation, Error> {
    curve.validate()?;
    let orders: Vec<_> = data.orders().iter().enumerate()
        .map(|(o, order)| {
            let delivery = solution.delivery_time(o);
            OrderReport {
                order: o,
                bot: solution.bot_of(o),
                pickup: solution.pickup_time(o),
                delivery,
                freshness: delivery.map_or(0.0, |t| freshness(curve, t, order.ready)),
            }
        })
        .collect();

    let makespan = (0..data.bots().len())
        .filter_map(|b| solution.schedule(b).last().map(|st| st.departure))
        .max();

    let evaluation = Evaluation {
        curve: *curve,
        total_freshness: orders.iter().map(|o| o.freshness).sum(),
        orders,
        total_travel_time: solution.total_travel_time(data),
        makespan,
    };
    debug!(total_freshness=evaluation.total_freshness, total_travel_time=evaluation.total_travel_time);
    Ok(evaluation)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// The objective reported by the solver differs from the one recomputed from the routes.
    ObjectiveMismatch { reported: f64, recomputed: f64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ObjectiveMismatch { reported, recomputed } =>
                write!(f, "solver objective {:.6} differs from recomputed objective {:.6}", reported, recomputed),
        }
    }
}

/// Compares objective values with a relative tolerance, logging a warning on mismatch.
pub fn check_objective(reported: f64, recomputed: f64) -> Option<Warning> {
    let tol = 1e-6 * recomputed.abs().max(1.0);
    if (reported - recomputed).abs() <= tol {
        return None
    }
    warn!(reported, recomputed, "objective mismatch");
    Some(Warning::ObjectiveMismatch { reported, recomputed })
}
