//! Three-index arc formulation: per-bot arc selection, order-to-bot assignment, service start
//! times, visit positions, loads and freshness indicators.
use std::cmp::{max, min};
use std::fmt;
use itertools::Itertools;
use tracing::*;

use crate::*;
use crate::data::*;
use crate::freshness::DecayCurve;
use crate::milp::*;
use crate::solution::Solution;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FormulationParams {
    pub curve: DecayCurve,
    /// Serve a subset of orders instead of declaring the instance infeasible.  Unserved orders
    /// score zero.
    pub allow_unserved: bool,
    /// Weight on total travel time subtracted from the objective.  `None` picks a weight too small
    /// to trade off against any freshness difference.
    pub tie_break: Option<f64>,
}

impl Default for FormulationParams {
    fn default() -> Self {
        FormulationParams { curve: DecayCurve::default(), allow_unserved: false, tie_break: None }
    }
}

impl FormulationParams {
    pub fn validate(&self) -> Result<(), Error> {
        self.curve.validate()?;
        match self.tie_break {
            Some(w) if !(w.is_finite() && w >= 0.0) =>
                Err(Error::Configuration(format!("tie-break weight must be finite and non-negative (got {})", w))),
            _ => Ok(())
        }
    }
}

/// Endpoint of an arc in a bot's network.  Each bot leaves a private depot at its start node and
/// finishes in a private sink reachable at no cost from any delivery.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ArcEnd {
    Depot,
    Visit(Stop),
    Sink,
}

impl fmt::Display for ArcEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArcEnd::Depot => f.write_str("s"),
            ArcEnd::Sink => f.write_str("e"),
            ArcEnd::Visit(s) => write!(f, "{}{}", if s.is_pickup() { 'p' } else { 'd' }, s.order),
        }
    }
}

pub struct Formulation<'a> {
    pub data: &'a PizzaInstance,
    pub params: FormulationParams,
    pub model: Model,
    pub arcs: Map<(BotIdx, ArcEnd, ArcEnd), Var>,
    pub assign: Map<(OrderIdx, BotIdx), Var>,
    pub time: Map<Stop, Var>,
    pub position: Map<Stop, Var>,
    pub load: Map<Stop, Var>,
    pub freshness: Vec<Var>,
    /// Per order, indicators that become 1 once elapsed time exceeds the threshold.
    pub decay: Vec<Vec<(Var, f64)>>,
    pub tie_break: f64,
    time_bounds: Map<Stop, (Time, Time)>,
}

/// Whether travel times between key locations satisfy the triangle inequality.
fn is_metric(data: &PizzaInstance) -> bool {
    let locs = data.key_locations();
    locs.iter().cartesian_product(&locs).cartesian_product(&locs)
        .all(|((&i, &j), &k)| data.travel_time(i, k) <= data.travel_time(i, j) + data.travel_time(j, k))
}

/// Lower and upper bounds on service start at each stop, valid for every earliest schedule.
fn time_bounds(data: &PizzaInstance, allow_unserved: bool) -> Map<Stop, (Time, Time)> {
    let n = data.orders().len() as Time;
    let service = data.service_time();
    let metric = is_metric(data);
    let latest_start = data.bots().iter().map(|b| b.available)
        .chain(data.orders().iter().map(|o| o.ready))
        .max()
        .unwrap_or(0);
    let end_of_horizon = latest_start + 2 * n * (service + data.max_travel_time());
    let first_available = data.bots().iter().map(|b| b.available).min().unwrap_or(0);

    let mut bounds = Map::default();
    for (o, order) in data.orders().iter().enumerate() {
        let (lb_p, lb_d) = if metric {
            let reach = data.bots().iter()
                .map(|b| b.available + data.travel_time(b.start, order.pickup))
                .min()
                .unwrap_or(0);
            let lb_p = max(order.ready, reach);
            (lb_p, lb_p + service + data.travel_time(order.pickup, order.delivery))
        } else {
            let lb_p = max(order.ready, first_available);
            (lb_p, lb_p + service)
        };
        let mut ub_d = max(end_of_horizon, lb_d);
        if let (false, Some(deadline)) = (allow_unserved, order.deadline) {
            ub_d = max(min(ub_d, deadline), lb_d);
        }
        let ub_p = max(lb_p, ub_d - service);
        bounds.insert(Stop::pickup(o), (lb_p, ub_p));
        bounds.insert(Stop::delivery(o), (lb_d, ub_d));
    }
    trace!(metric, end_of_horizon);
    bounds
}

/// Half the smallest freshness difference, spread over the largest possible total travel time.
pub(crate) fn default_tie_break(data: &PizzaInstance, curve: &DecayCurve) -> f64 {
    let travel_bound = (2 * data.orders().len()) as f64 * data.max_travel_time() as f64;
    curve.resolution() / (2.0 * (travel_bound + 1.0))
}

fn arc_allowed(i: ArcEnd, j: ArcEnd) -> bool {
    use ArcEnd::*;
    match (i, j) {
        (Depot, Visit(s)) => s.is_pickup(),
        (Depot, Sink) => true,
        (Visit(s), Visit(t)) => s != t && !(s.is_delivery() && t == s.sibling()),
        (Visit(s), Sink) => s.is_delivery(),
        _ => false,
    }
}

impl<'a> Formulation<'a> {
    #[inline]
    fn location(&self, e: ArcEnd, bot: BotIdx) -> Option<Node> {
        match e {
            ArcEnd::Depot => Some(self.data.bot(bot).start),
            ArcEnd::Visit(s) => Some(self.data.stop_location(s)),
            ArcEnd::Sink => None,
        }
    }

    /// Travel time charged for using arc `(i, j)` with bot `bot`.  Arcs into the sink are free.
    pub fn arc_travel_time(&self, bot: BotIdx, i: ArcEnd, j: ArcEnd) -> Time {
        match (self.location(i, bot), self.location(j, bot)) {
            (Some(a), Some(b)) => self.data.travel_time(a, b),
            _ => 0,
        }
    }

    pub fn time_bounds(&self, s: Stop) -> (Time, Time) { self.time_bounds[&s] }

    #[instrument(level="info", skip(data, params), fields(instance=%data.id()))]
    pub fn build(data: &'a PizzaInstance, params: FormulationParams) -> Result<Formulation<'a>, Error> {
        params.validate()?;
        let n = data.orders().len();
        let n_bots = data.bots().len();
        let stops = data.stops();
        let service = data.service_time();
        let bounds = time_bounds(data, params.allow_unserved);
        let max_capacity = data.bots().iter().map(|b| b.capacity)
            .chain(data.orders().iter().map(|o| o.size))
            .max()
            .unwrap_or(0);
        let big_q = max_capacity as f64;
        let max_position = max(2 * n, 1) as f64;

        let tie_break = params.tie_break.unwrap_or_else(|| default_tie_break(data, &params.curve));

        let mut form = Formulation {
            data,
            params,
            model: Model::new(format!("pizzabot_{}", data.id())),
            arcs: Map::default(),
            assign: Map::default(),
            time: Map::default(),
            position: Map::default(),
            load: Map::default(),
            freshness: Vec::with_capacity(n),
            decay: vec![Vec::new(); n],
            tie_break,
            time_bounds: bounds,
        };

        for o in 0..n {
            for b in 0..n_bots {
                let y = form.model.add_binary(format!("y_o{}_b{}", o, b));
                form.assign.insert((o, b), y);
            }
        }

        for &s in &stops {
            let label = ArcEnd::Visit(s);
            let (lb, ub) = form.time_bounds[&s];
            let t = form.model.add_continuous(format!("t_{}", label), lb as f64, ub as f64);
            let u = form.model.add_continuous(format!("u_{}", label), 1.0, max_position);
            let l = form.model.add_continuous(format!("l_{}", label), 0.0, big_q);
            form.time.insert(s, t);
            form.position.insert(s, u);
            form.load.insert(s, l);
        }

        // Arc variables, skipping arcs no feasible route can use
        let from_ends: Vec<ArcEnd> = std::iter::once(ArcEnd::Depot).chain(stops.iter().map(|&s| ArcEnd::Visit(s))).collect();
        let to_ends: Vec<ArcEnd> = stops.iter().map(|&s| ArcEnd::Visit(s)).chain(std::iter::once(ArcEnd::Sink)).collect();
        for b in 0..n_bots {
            let bot = data.bot(b);
            for &i in &from_ends {
                for &j in &to_ends {
                    if !arc_allowed(i, j) { continue }
                    if let ArcEnd::Visit(t) = j {
                        let (_, ub_j) = form.time_bounds[&t];
                        let earliest = match i {
                            ArcEnd::Visit(s) => form.time_bounds[&s].0 + service,
                            _ => bot.available,
                        } + form.arc_travel_time(b, i, j);
                        if earliest > ub_j { continue }
                        if t.is_pickup() && data.order(t.order).size > bot.capacity { continue }
                        if let (ArcEnd::Visit(s), true) = (i, t.is_pickup()) {
                            if s.is_pickup() && data.order(s.order).size as i64 + data.order(t.order).size as i64 > bot.capacity as i64 { continue }
                        }
                    }
                    let x = form.model.add_binary(format!("x_b{}_{}_{}", b, i, j));
                    form.arcs.insert((b, i, j), x);
                }
            }
        }

        form.add_routing_constraints(&from_ends, &to_ends);
        form.add_timing_constraints();
        form.add_load_constraints(big_q);
        form.add_freshness();

        let travel: LinExpr = form.arcs.iter()
            .sorted_by_key(|(k, _)| **k)
            .map(|(&(b, i, j), &x)| form.arc_travel_time(b, i, j) as f64 * x)
            .sum();
        let objective = form.freshness.iter().copied().sum::<LinExpr>() - form.tie_break * travel;
        form.model.set_objective(objective, ObjSense::Maximize);

        debug!(vars=form.model.vars().len(), integer_vars=form.model.num_integer_vars(), constrs=form.model.constrs().len(), tie_break=form.tie_break);
        Ok(form)
    }

    fn assigned(&self, o: OrderIdx) -> LinExpr {
        (0..self.data.bots().len()).map(|b| self.assign[&(o, b)]).sum()
    }

    fn add_routing_constraints(&mut self, from_ends: &[ArcEnd], to_ends: &[ArcEnd]) {
        let n = self.data.orders().len();
        let allow_unserved = self.params.allow_unserved;

        for o in 0..n {
            let served = self.assigned(o);
            let c = if allow_unserved { served.le(1.0) } else { served.equals(1.0) };
            self.model.add_constr(format!("assign_o{}", o), c);
        }

        for b in 0..self.data.bots().len() {
            let out_of = |form: &Self, i: ArcEnd| -> LinExpr {
                to_ends.iter().filter_map(|&j| form.arcs.get(&(b, i, j)).copied()).sum()
            };
            let into = |form: &Self, j: ArcEnd| -> LinExpr {
                from_ends.iter().filter_map(|&i| form.arcs.get(&(b, i, j)).copied()).sum()
            };

            let c = out_of(self, ArcEnd::Depot).equals(1.0);
            self.model.add_constr(format!("leave_b{}", b), c);
            let c = into(self, ArcEnd::Sink).equals(1.0);
            self.model.add_constr(format!("finish_b{}", b), c);

            for s in self.data.stops() {
                let y = self.assign[&(s.order, b)];
                let label = ArcEnd::Visit(s);
                let c = (into(self, label) - y).equals(0.0);
                self.model.add_constr(format!("in_b{}_{}", b, label), c);
                let c = (out_of(self, label) - y).equals(0.0);
                self.model.add_constr(format!("out_b{}_{}", b, label), c);
            }
        }
    }

    /// Arcs between two stops grouped over bots, in a deterministic order.
    fn stop_arcs(&self) -> Vec<((Stop, Stop), LinExpr)> {
        let mut grouped: Map<(Stop, Stop), Vec<Var>> = Map::default();
        for (&(_, i, j), &x) in &self.arcs {
            if let (ArcEnd::Visit(s), ArcEnd::Visit(t)) = (i, j) {
                grouped.entry((s, t)).or_default().push(x);
            }
        }
        grouped.into_iter()
            .sorted_by_key(|(k, _)| *k)
            .map(|(k, mut xs)| { xs.sort(); (k, xs.into_iter().sum()) })
            .collect()
    }

    fn add_timing_constraints(&mut self) {
        let data = self.data;
        let service = data.service_time();
        let n = data.orders().len();
        let max_position = max(2 * n, 1) as f64;

        for ((s, t), used) in self.stop_arcs() {
            let (_, ub_s) = self.time_bounds[&s];
            let (lb_t, _) = self.time_bounds[&t];
            let gap = service + data.travel_time(data.stop_location(s), data.stop_location(t));
            let big_m = ub_s + gap - lb_t;
            if big_m > 0 {
                let big_m = big_m as f64;
                let c = (self.time[&t] - self.time[&s] - big_m * used.clone()).ge(gap as f64 - big_m);
                self.model.add_constr(format!("time_{}_{}", ArcEnd::Visit(s), ArcEnd::Visit(t)), c);
            }
            let c = (self.position[&t] - self.position[&s] - max_position * used).ge(1.0 - max_position);
            self.model.add_constr(format!("order_{}_{}", ArcEnd::Visit(s), ArcEnd::Visit(t)), c);
        }

        for b in 0..data.bots().len() {
            let bot = data.bot(b);
            for o in 0..n {
                let p = Stop::pickup(o);
                if let Some(&x) = self.arcs.get(&(b, ArcEnd::Depot, ArcEnd::Visit(p))) {
                    let earliest = bot.available + data.travel_time(bot.start, data.stop_location(p));
                    let big_m = earliest - self.time_bounds[&p].0;
                    if big_m > 0 {
                        let big_m = big_m as f64;
                        let c = (LinExpr::from(self.time[&p]) - big_m * x).ge(earliest as f64 - big_m);
                        self.model.add_constr(format!("start_b{}_{}", b, ArcEnd::Visit(p)), c);
                    }
                }
            }
        }

        for (o, order) in data.orders().iter().enumerate() {
            let (p, d) = (Stop::pickup(o), Stop::delivery(o));
            let c = (self.time[&d] - self.time[&p]).ge(service as f64);
            self.model.add_constr(format!("precede_time_o{}", o), c);
            let c = (self.position[&d] - self.position[&p]).ge(1.0);
            self.model.add_constr(format!("precede_pos_o{}", o), c);

            if let Some(deadline) = order.deadline {
                let (_, ub_d) = self.time_bounds[&d];
                if !self.params.allow_unserved {
                    let c = LinExpr::from(self.time[&d]).le(deadline as f64);
                    self.model.add_constr(format!("deadline_o{}", o), c);
                } else if ub_d > deadline {
                    let slack = (ub_d - deadline) as f64;
                    let c = (self.time[&d] + slack * self.assigned(o)).le(ub_d as f64);
                    self.model.add_constr(format!("deadline_o{}", o), c);
                }
            }
        }
    }

    fn add_load_constraints(&mut self, big_q: f64) {
        let data = self.data;
        for ((s, t), used) in self.stop_arcs() {
            let q = data.stop_load(t) as f64;
            let big_m = big_q + q;
            if big_m > 0.0 {
                let c = (self.load[&t] - self.load[&s] - big_m * used).ge(q - big_m);
                self.model.add_constr(format!("load_{}_{}", ArcEnd::Visit(s), ArcEnd::Visit(t)), c);
            }
        }

        for b in 0..data.bots().len() {
            for o in 0..data.orders().len() {
                let p = Stop::pickup(o);
                if let Some(&x) = self.arcs.get(&(b, ArcEnd::Depot, ArcEnd::Visit(p))) {
                    let c = (LinExpr::from(self.load[&p]) - data.stop_load(p) as f64 * x).ge(0.0);
                    self.model.add_constr(format!("start_load_b{}_{}", b, ArcEnd::Visit(p)), c);
                }
            }
        }

        for o in 0..data.orders().len() {
            let p = Stop::pickup(o);
            let mut capacity = LinExpr::new();
            for b in 0..data.bots().len() {
                let mut q = data.bot(b).capacity as f64;
                if self.params.allow_unserved { q -= big_q }
                capacity.add_term(q, self.assign[&(o, b)]);
            }
            if self.params.allow_unserved { capacity.add_constant(big_q); }
            let c = LinExpr::from(self.load[&p]).le(capacity);
            self.model.add_constr(format!("capacity_o{}", o), c);
        }
    }

    fn add_freshness(&mut self) {
        let data = self.data;
        for (o, order) in data.orders().iter().enumerate() {
            let f = self.model.add_continuous(format!("f_o{}", o), 0.0, 1.0);
            self.freshness.push(f);
            let d = Stop::delivery(o);
            let t = self.time[&d];
            let ready = order.ready as f64;
            let max_elapsed = (self.time_bounds[&d].1 - order.ready) as f64;

            match self.params.curve {
                DecayCurve::Linear { horizon } => {
                    let h = horizon as f64;
                    // f <= 1 - elapsed/h, relaxed once the order is spoiled
                    let big_m = max_elapsed / h - 1.0;
                    let mut rhs = LinExpr::constant(1.0 + ready / h);
                    if big_m > 0.0 {
                        let z = self.model.add_binary(format!("z_o{}", o));
                        self.decay[o].push((z, h));
                        rhs = rhs + big_m * z;
                        let c = (f + z).le(1.0);
                        self.model.add_constr(format!("spoiled_o{}", o), c);
                    }
                    let c = (f + (1.0 / h) * t).le(rhs);
                    self.model.add_constr(format!("fresh_o{}", o), c);
                },
                DecayCurve::Stepped { horizon, steps } => {
                    let mut dropped = LinExpr::new();
                    for k in 0..steps {
                        let threshold = (k as Time * horizon) as f64 / steps as f64;
                        if max_elapsed <= threshold { break }
                        let w = self.model.add_binary(format!("w_o{}_{}", o, k));
                        self.decay[o].push((w, threshold));
                        let c = (LinExpr::from(t) - (max_elapsed - threshold) * w).le(ready + threshold);
                        self.model.add_constr(format!("step_o{}_{}", o, k), c);
                        dropped.add_term(1.0 / steps as f64, w);
                    }
                    let c = (f + dropped).le(1.0);
                    self.model.add_constr(format!("fresh_o{}", o), c);
                },
            }

            if self.params.allow_unserved {
                let c = (f - self.assigned(o)).le(0.0);
                self.model.add_constr(format!("unserved_o{}", o), c);
            }
        }
    }

    /// Objective value the model assigns to a plan with the given totals.
    pub fn objective_of(&self, total_freshness: f64, total_travel_time: Time) -> f64 {
        total_freshness - self.tie_break * total_travel_time as f64
    }

    /// Variable values representing `solution`.  Fails if the solution uses an arc the model
    /// excludes.
    pub fn encode(&self, solution: &Solution) -> Result<Vec<f64>, Error> {
        let data = self.data;
        let mut values = vec![0.0; self.model.vars().len()];
        let mut delivered_at = vec![None; data.orders().len()];

        for route in solution.routes() {
            let b = route.bot;
            let ends = std::iter::once(ArcEnd::Depot)
                .chain(route.stops.iter().map(|&s| ArcEnd::Visit(s)))
                .chain(std::iter::once(ArcEnd::Sink));
            for (i, j) in ends.tuple_windows() {
                match self.arcs.get(&(b, i, j)) {
                    Some(x) => values[x.index()] = 1.0,
                    None => return Err(Error::InfeasibleRoute(format!("arc {} -> {} of bot {} is excluded from the model", i, j, data.bot(b).name))),
                }
            }
            let loads = route.loads(data);
            for (k, (&s, st)) in route.stops.iter().zip(solution.schedule(b)).enumerate() {
                values[self.time[&s].index()] = st.begin as f64;
                values[self.position[&s].index()] = (k + 1) as f64;
                values[self.load[&s].index()] = loads[k] as f64;
                if s.is_delivery() {
                    delivered_at[s.order] = Some(st.begin);
                }
            }
            for o in route.orders() {
                values[self.assign[&(o, b)].index()] = 1.0;
            }
        }

        for o in solution.unserved() {
            let (p, d) = (Stop::pickup(o), Stop::delivery(o));
            values[self.time[&p].index()] = self.time_bounds[&p].0 as f64;
            values[self.time[&d].index()] = self.time_bounds[&d].0 as f64;
            values[self.position[&p].index()] = 1.0;
            values[self.position[&d].index()] = 2.0;
        }

        for (o, order) in data.orders().iter().enumerate() {
            let t = delivered_at[o].unwrap_or(self.time_bounds[&Stop::delivery(o)].0);
            let elapsed = (t - order.ready) as f64;
            for &(v, threshold) in &self.decay[o] {
                values[v.index()] = if elapsed > threshold { 1.0 } else { 0.0 };
            }
            values[self.freshness[o].index()] = match delivered_at[o] {
                Some(t) => crate::freshness::freshness(&self.params.curve, t, order.ready),
                None => 0.0,
            };
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic::insertion;
    use crate::route::Route;
    use crate::testing::*;
    use proptest::prelude::*;

    #[test]
    fn builds_well_formed_model() {
        let data = one_bot_two_orders();
        let form = Formulation::build(&data, FormulationParams::default()).unwrap();
        form.model.check_well_formed().unwrap();
        assert_eq!(form.freshness.len(), 2);
        assert!(form.arcs.contains_key(&(0, ArcEnd::Depot, ArcEnd::Sink)));
        assert!(!form.arcs.contains_key(&(0, ArcEnd::Depot, ArcEnd::Visit(Stop::delivery(0)))));
        assert!(!form.arcs.contains_key(&(0, ArcEnd::Visit(Stop::delivery(0)), ArcEnd::Visit(Stop::pickup(0)))));
        assert!(!form.arcs.contains_key(&(0, ArcEnd::Visit(Stop::pickup(0)), ArcEnd::Sink)));
    }

    #[test]
    fn rejects_bad_parameters() {
        let data = one_bot_two_orders();
        let params = FormulationParams { curve: DecayCurve::Linear { horizon: 0 }, ..Default::default() };
        assert!(matches!(Formulation::build(&data, params), Err(Error::Configuration(_))));
        let params = FormulationParams { tie_break: Some(-1.0), ..Default::default() };
        assert!(matches!(Formulation::build(&data, params), Err(Error::Configuration(_))));
    }

    #[test]
    fn encodes_known_plan() {
        let data = one_bot_two_orders();
        let form = Formulation::build(&data, FormulationParams::default()).unwrap();
        let sol = Solution::new(&data, vec![
            Route::new(0, vec![Stop::pickup(0), Stop::pickup(1), Stop::delivery(0), Stop::delivery(1)])
        ]).unwrap();
        let values = form.encode(&sol).unwrap();
        assert_eq!(form.model.violations(&values, 1e-6), Vec::<String>::new());
        let expected = form.objective_of(0.75 + (1.0 - 10.0 / 60.0), 10);
        assert!((form.model.objective_value(&values) - expected).abs() < 1e-9);
    }

    fn any_params() -> impl Strategy<Value=FormulationParams> {
        (prop_oneof![
            (5..50i64).prop_map(|horizon| DecayCurve::Linear { horizon }),
            (5..50i64, 1..5u32).prop_map(|(horizon, steps)| DecayCurve::Stepped { horizon, steps }),
        ], any::<bool>())
            .prop_map(|(curve, allow_unserved)| FormulationParams { curve, allow_unserved, tie_break: None })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]
        #[test]
        fn feasible_plans_satisfy_model(data in random_instance(4, 2, 2..4), params in any_params()) {
            let form = Formulation::build(&data, params).unwrap();
            prop_assert!(form.model.check_well_formed().is_ok());
            let sol = insertion(&data, &params).unwrap();
            let values = form.encode(&sol).unwrap();
            prop_assert_eq!(form.model.violations(&values, 1e-6), Vec::<String>::new());

            let total: f64 = (0..data.orders().len())
                .filter_map(|o| sol.delivery_time(o).map(|t| crate::freshness::freshness(&params.curve, t, data.order(o).ready)))
                .sum();
            let expected = form.objective_of(total, sol.total_travel_time(&data));
            prop_assert!((form.model.objective_value(&values) - expected).abs() < 1e-6);
        }

        #[test]
        fn deadline_plans_satisfy_model((data, routes) in random_instance_with_deadlines(4, 2, 2..4), params in any_params()) {
            let form = Formulation::build(&data, params).unwrap();
            let witness = Solution::new(&data, routes).unwrap();
            let values = form.encode(&witness).unwrap();
            prop_assert_eq!(form.model.violations(&values, 1e-6), Vec::<String>::new());

            let partial = FormulationParams { allow_unserved: true, ..params };
            let sol = insertion(&data, &partial).unwrap();
            for o in 0..data.orders().len() {
                if let (Some(t), Some(deadline)) = (sol.delivery_time(o), data.order(o).deadline) {
                    prop_assert!(t <= deadline);
                }
            }
            let form = Formulation::build(&data, partial).unwrap();
            let values = form.encode(&sol).unwrap();
            prop_assert_eq!(form.model.violations(&values, 1e-6), Vec::<String>::new());
        }
    }
}
