use itertools::Itertools;
use tracing::*;

use crate::*;
use crate::data::*;
use crate::formulation::{ArcEnd, Formulation};
use crate::route::Route;
use crate::solution::Solution;

const THRESHOLD: f64 = 0.5;

#[inline]
fn selected(values: &[f64], v: milp::Var) -> bool {
    values[v.index()] > THRESHOLD
}

fn log_assignment(form: &Formulation, values: &[f64]) {
    let nonzero = form.model.vars().iter().zip(values)
        .filter(|(_, &x)| x.abs() > 1e-9)
        .map(|(v, x)| format!("{}={}", v.name, x))
        .join(" ");
    error!(assignment=%nonzero, "solver assignment does not decode into routes");
}

/// Routes selected by `values`: for each bot, follow chosen arcs from its depot until the sink.
/// Times are recomputed from the routes rather than read from the solver.
#[instrument(level="debug", skip(form, values))]
pub fn extract_solution(form: &Formulation, values: &[f64]) -> Result<Solution, Error> {
    let result = decode(form, values);
    if result.is_err() {
        log_assignment(form, values);
    }
    result
}

fn decode(form: &Formulation, values: &[f64]) -> Result<Solution, Error> {
    let data = form.data;
    if values.len() != form.model.vars().len() {
        return Err(Error::Extraction(format!("expected {} values, got {}", form.model.vars().len(), values.len())));
    }

    let mut successors: Map<(BotIdx, ArcEnd), Vec<ArcEnd>> = Map::default();
    for (&(b, i, j), &x) in &form.arcs {
        if selected(values, x) {
            successors.entry((b, i)).or_default().push(j);
        }
    }

    let mut routes = Vec::with_capacity(data.bots().len());
    let mut visited = Set::default();
    for b in 0..data.bots().len() {
        let name = &data.bot(b).name;
        let mut stops = Vec::new();
        let mut current = ArcEnd::Depot;
        loop {
            let next = match successors.remove(&(b, current)) {
                None => return Err(Error::Extraction(format!("route of bot {} stops at {}", name, current))),
                Some(next) if next.len() > 1 => return Err(Error::Extraction(format!(
                    "route of bot {} branches at {} into {}", name, current, next.iter().sorted().join(", ")
                ))),
                Some(next) => next[0],
            };
            match next {
                ArcEnd::Sink => break,
                ArcEnd::Visit(s) => {
                    if !visited.insert(s) {
                        return Err(Error::Extraction(format!("stop {} visited more than once", data.stop_label(s))));
                    }
                    stops.push(s);
                    current = next;
                },
                ArcEnd::Depot => unreachable!("no arcs enter a depot"),
            }
        }
        routes.push(Route::new(b, stops));
    }

    // anything left over is a cycle detached from every depot
    if let Some(&(b, i)) = successors.keys().sorted().next() {
        return Err(Error::Extraction(format!("bot {} has a subtour through {}", data.bot(b).name, i)));
    }

    for ((o, b), &y) in form.assign.iter().sorted_by_key(|(k, _)| **k) {
        let on_route = routes[*b].stops.contains(&Stop::pickup(*o));
        if selected(values, y) != on_route {
            return Err(Error::Extraction(format!(
                "assignment of order {} to bot {} disagrees with the routes", data.order(*o).name, data.bot(*b).name
            )));
        }
    }

    let solution = Solution::new(data, routes).map_err(|e| Error::Extraction(e.to_string()))?;
    if !form.params.allow_unserved {
        solution.ensure_complete(data).map_err(|e| Error::Extraction(e.to_string()))?;
    }
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::FormulationParams;
    use crate::heuristic::insertion;
    use crate::testing::*;
    use proptest::prelude::*;

    fn set(form: &Formulation, values: &mut [f64], b: BotIdx, i: ArcEnd, j: ArcEnd, x: f64) {
        values[form.arcs[&(b, i, j)].index()] = x;
    }

    #[test]
    fn detects_broken_assignments() {
        let _g = init_test_logging(None::<&str>);
        let data = one_bot_two_orders();
        let form = Formulation::build(&data, FormulationParams::default()).unwrap();
        let sol = insertion(&data, &form.params).unwrap();
        let good = form.encode(&sol).unwrap();
        assert_eq!(extract_solution(&form, &good).unwrap(), sol);

        let mut branching = good.clone();
        set(&form, &mut branching, 0, ArcEnd::Depot, ArcEnd::Sink, 1.0);
        assert!(matches!(extract_solution(&form, &branching), Err(Error::Extraction(_))));

        let mut dead_end = vec![0.0; good.len()];
        for (&(b, i, j), &x) in &form.arcs {
            if i == ArcEnd::Depot && good[x.index()] > 0.5 {
                set(&form, &mut dead_end, b, i, j, 0.9);
            }
        }
        assert!(matches!(extract_solution(&form, &dead_end), Err(Error::Extraction(_))));

        let (p0, d0) = (ArcEnd::Visit(Stop::pickup(0)), ArcEnd::Visit(Stop::delivery(0)));
        let (p1, d1) = (ArcEnd::Visit(Stop::pickup(1)), ArcEnd::Visit(Stop::delivery(1)));
        let mut subtour = vec![0.0; good.len()];
        set(&form, &mut subtour, 0, ArcEnd::Depot, ArcEnd::Sink, 1.0);
        set(&form, &mut subtour, 0, p0, p1, 1.0);
        set(&form, &mut subtour, 0, p1, d0, 1.0);
        set(&form, &mut subtour, 0, d0, d1, 1.0);
        set(&form, &mut subtour, 0, d1, p0, 1.0);
        assert!(matches!(extract_solution(&form, &subtour), Err(Error::Extraction(_))));
    }

    #[test]
    fn rejects_unserved_when_not_allowed() {
        let data = one_bot_two_orders();
        let form = Formulation::build(&data, FormulationParams::default()).unwrap();
        let mut values = vec![0.0; form.model.vars().len()];
        values[form.arcs[&(0, ArcEnd::Depot, ArcEnd::Sink)].index()] = 1.0;
        assert!(matches!(extract_solution(&form, &values), Err(Error::Extraction(_))));

        let partial = FormulationParams { allow_unserved: true, ..Default::default() };
        let form = Formulation::build(&data, partial).unwrap();
        let mut values = vec![0.0; form.model.vars().len()];
        values[form.arcs[&(0, ArcEnd::Depot, ArcEnd::Sink)].index()] = 1.0;
        let sol = extract_solution(&form, &values).unwrap();
        assert_eq!(sol.unserved().count(), 2);
    }

    proptest! {
        #[test]
        fn encode_extract_agree(data in random_instance(4, 2, 2..4)) {
            let params = FormulationParams::default();
            let form = Formulation::build(&data, params).unwrap();
            let sol = insertion(&data, &params).unwrap();
            let values = form.encode(&sol).unwrap();
            prop_assert_eq!(extract_solution(&form, &values).unwrap(), sol);
        }
    }
}
