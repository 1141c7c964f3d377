use tracing::*;

use crate::*;
use crate::data::*;
use crate::route::Route;
use crate::schedule::StopTime;

/// A validated route plan: one route per bot (possibly empty), every order served at most once.
/// Schedules are derived on construction and the plan cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    routes: Vec<Route>,
    schedules: Vec<Vec<StopTime>>,
    assignment: Vec<Option<BotIdx>>,
}

impl Solution {
    /// Validates `routes` against `data`.  Bots without a route get an empty one; orders not on
    /// any route are unserved.
    #[instrument(level="debug", skip(data, routes))]
    pub fn new(data: &PizzaInstance, routes: Vec<Route>) -> Result<Solution, Error> {
        let mut by_bot: Vec<Option<Route>> = vec![None; data.bots().len()];
        for r in routes {
            if r.bot >= by_bot.len() {
                return Err(Error::InfeasibleRoute(format!("no bot with index {}", r.bot)));
            }
            if by_bot[r.bot].is_some() {
                return Err(Error::InfeasibleRoute(format!("bot {} has more than one route", data.bot(r.bot).name)));
            }
            let b = r.bot;
            by_bot[b] = Some(r);
        }
        let routes: Vec<Route> = by_bot.into_iter()
            .enumerate()
            .map(|(b, r)| r.unwrap_or_else(|| Route::empty(b)))
            .collect();

        let mut assignment = vec![None; data.orders().len()];
        let mut schedules = Vec::with_capacity(routes.len());
        for r in &routes {
            schedules.push(r.check(data)?);
            for o in r.orders() {
                if let Some(other) = assignment[o] {
                    return Err(Error::InfeasibleRoute(format!(
                        "order {} is served by both {} and {}",
                        data.order(o).name, data.bot(other).name, data.bot(r.bot).name
                    )));
                }
                assignment[o] = Some(r.bot);
            }
        }
        Ok(Solution { routes, schedules, assignment })
    }

    /// Fails if some order is unserved.
    pub fn ensure_complete(&self, data: &PizzaInstance) -> Result<(), Error> {
        match self.unserved().next() {
            None => Ok(()),
            Some(o) => Err(Error::InfeasibleRoute(format!("order {} is not served", data.order(o).name))),
        }
    }

    pub fn routes(&self) -> &[Route] { &self.routes }

    #[inline]
    pub fn route(&self, b: BotIdx) -> &Route { &self.routes[b] }

    #[inline]
    pub fn schedule(&self, b: BotIdx) -> &[StopTime] { &self.schedules[b] }

    /// Bot serving order `o`, if any.
    #[inline]
    pub fn bot_of(&self, o: OrderIdx) -> Option<BotIdx> { self.assignment[o] }

    pub fn unserved<'a>(&'a self) -> impl Iterator<Item=OrderIdx> + 'a {
        self.assignment.iter().enumerate().filter(|(_, b)| b.is_none()).map(|(o, _)| o)
    }

    pub fn is_complete(&self) -> bool { self.assignment.iter().all(Option::is_some) }

    pub fn stop_time(&self, s: Stop) -> Option<StopTime> {
        let b = self.assignment[s.order]?;
        self.routes[b].stops.iter()
            .position(|&t| t == s)
            .map(|k| self.schedules[b][k])
    }

    /// Delivery (service start) time of order `o`.
    pub fn delivery_time(&self, o: OrderIdx) -> Option<Time> {
        self.stop_time(Stop::delivery(o)).map(|st| st.begin)
    }

    pub fn pickup_time(&self, o: OrderIdx) -> Option<Time> {
        self.stop_time(Stop::pickup(o)).map(|st| st.begin)
    }

    pub fn total_travel_time(&self, data: &PizzaInstance) -> Time {
        self.routes.iter().map(|r| r.travel_time(data)).sum()
    }
}
