//! End-to-end optimization: formulate, solve, extract, evaluate.
use anyhow::Result;
use tracing::*;

use crate::*;
use crate::data::*;
use crate::evaluate::{check_objective, evaluate, Evaluation, Warning};
use crate::extract::extract_solution;
use crate::formulation::{Formulation, FormulationParams};
use crate::heuristic::{insertion, servable_alone};
use crate::milp::{MilpSolver, SolveParams, SolveStatus};
use crate::solution::Solution;

#[derive(Debug, Clone)]
pub struct Report {
    pub solution: Solution,
    pub evaluation: Evaluation,
    pub status: SolveStatus,
    /// Objective reported by the solver, including the travel-time tie-break.
    pub solver_objective: Option<f64>,
    pub warnings: Vec<Warning>,
}

impl Report {
    pub fn is_optimal(&self) -> bool { self.status == SolveStatus::Optimal }
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Solved(Report),
    /// Proven that no plan serves every order within the constraints.
    Infeasible,
    /// A limit was reached without finding a plan.
    Inconclusive,
}

impl Outcome {
    pub fn report(&self) -> Option<&Report> {
        match self {
            Outcome::Solved(r) => Some(r),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Solved(r) if r.is_optimal() => "optimal",
            Outcome::Solved(_) => "feasible",
            Outcome::Infeasible => "infeasible",
            Outcome::Inconclusive => "inconclusive",
        }
    }
}

/// Solves an already built formulation.  Solver failures and undecodable solver output are
/// errors; infeasibility and exhausted limits are outcomes.
#[instrument(level="info", skip(form, solver, params), fields(instance=%form.data.id(), solver=solver.name()))]
pub fn solve_formulation(form: &Formulation, solver: &dyn MilpSolver, params: &SolveParams) -> Result<Outcome> {
    if let Some(c) = form.model.trivially_infeasible() {
        info!(constraint=%c.name, "infeasible before solving");
        return Ok(Outcome::Infeasible)
    }

    let out = solver.solve(&form.model, params)?;
    let values = match (out.status, out.values) {
        (SolveStatus::Infeasible, _) => return Ok(Outcome::Infeasible),
        (SolveStatus::TimeLimitNoSolution, _) => return Ok(Outcome::Inconclusive),
        (status, None) => anyhow::bail!("solver reported {:?} without variable values", status),
        (_, Some(values)) => values,
    };

    let solution = extract_solution(form, &values)?;
    let evaluation = evaluate(form.data, &solution, &form.params.curve)?;
    let recomputed = form.objective_of(evaluation.total_freshness, evaluation.total_travel_time);
    let reported = out.objective.unwrap_or_else(|| form.model.objective_value(&values));
    let warnings: Vec<_> = check_objective(reported, recomputed).into_iter().collect();

    info!(status=?out.status, total_freshness=evaluation.total_freshness, served=evaluation.served());
    Ok(Outcome::Solved(Report { solution, evaluation, status: out.status, solver_objective: Some(reported), warnings }))
}

/// Builds the MILP for `data` and solves it.
pub fn optimize(data: &PizzaInstance, params: FormulationParams, solver: &dyn MilpSolver, solve_params: &SolveParams) -> Result<Outcome> {
    let form = Formulation::build(data, params)?;
    solve_formulation(&form, solver, solve_params)
}

/// Greedy insertion without a solver.  Infeasibility is only claimed when some order cannot be
/// served even on its own.
#[instrument(level="info", skip(data, params), fields(instance=%data.id()))]
pub fn optimize_heuristic(data: &PizzaInstance, params: FormulationParams) -> Result<Outcome> {
    params.validate()?;
    if !params.allow_unserved {
        if let Some(o) = (0..data.orders().len()).find(|&o| !servable_alone(data, o)) {
            info!(order=%data.order(o).name, "order cannot be served by any bot");
            return Ok(Outcome::Infeasible)
        }
    }
    let solution = match insertion(data, &params) {
        Ok(s) => s,
        Err(Error::InfeasibleRoute(reason)) => {
            info!(%reason, "heuristic failed");
            return Ok(Outcome::Inconclusive)
        },
        Err(e) => return Err(e.into()),
    };
    let evaluation = evaluate(data, &solution, &params.curve)?;
    Ok(Outcome::Solved(Report {
        solution,
        evaluation,
        status: SolveStatus::Feasible { gap: None },
        solver_objective: None,
        warnings: Vec::new(),
    }))
}
