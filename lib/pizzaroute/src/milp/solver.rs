use std::time::Duration;
use anyhow::Result;

use super::Model;

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SolveParams {
    /// Wall-clock limit; `None` solves to completion.
    pub time_limit: Option<Duration>,
    /// Relative optimality gap at which the search may stop.
    pub mip_gap: Option<f64>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SolveStatus {
    /// Proven optimal (within the requested gap).
    Optimal,
    /// A limit was hit with an incumbent available.
    Feasible { gap: Option<f64> },
    /// Proven to have no feasible solution.
    Infeasible,
    /// A limit was hit before any feasible solution was found.
    TimeLimitNoSolution,
}

impl SolveStatus {
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible { .. })
    }

    pub fn gap(&self) -> Option<f64> {
        match *self {
            SolveStatus::Optimal => Some(0.0),
            SolveStatus::Feasible { gap } => gap,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Indexed by [`super::Var::index`]; present exactly when `status` has a solution.
    pub values: Option<Vec<f64>>,
    pub objective: Option<f64>,
}

impl SolveOutcome {
    pub fn without_solution(status: SolveStatus) -> Self {
        debug_assert!(!status.has_solution());
        SolveOutcome { status, values: None, objective: None }
    }

    pub fn with_solution(status: SolveStatus, values: Vec<f64>, objective: f64) -> Self {
        SolveOutcome { status, values: Some(values), objective: Some(objective) }
    }
}

/// A MILP backend.  Errors are reserved for backend failures; infeasibility and limits are
/// reported through [`SolveStatus`].
pub trait MilpSolver: Sync {
    fn name(&self) -> &str;

    fn solve(&self, model: &Model, params: &SolveParams) -> Result<SolveOutcome>;
}
