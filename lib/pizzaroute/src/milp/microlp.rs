//! Pure-Rust branch-and-bound backend via `good_lp`'s microlp solver.
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use anyhow::{anyhow, Context, Result};
use good_lp::{Expression, ProblemVariables, ResolutionError, Solution as _, SolverModel, Variable, variable};
use good_lp::solvers::microlp::microlp;
use tracing::*;

use super::*;

/// Live solver threads, capped at `max`.  A thread keeps its slot until microlp returns, even
/// after its caller gave up waiting.
#[derive(Debug)]
struct WorkerSlots {
    max: usize,
    live: Mutex<usize>,
    freed: Condvar,
    abandoned: Mutex<Vec<JoinHandle<()>>>,
}

struct Slot(Arc<WorkerSlots>);

impl Drop for Slot {
    fn drop(&mut self) {
        *self.0.count() -= 1;
        self.0.freed.notify_all();
    }
}

impl WorkerSlots {
    fn new(max: usize) -> Arc<Self> {
        Arc::new(WorkerSlots { max: max.max(1), live: Mutex::new(0), freed: Condvar::new(), abandoned: Mutex::new(Vec::new()) })
    }

    fn count(&self) -> MutexGuard<'_, usize> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until fewer than `max` solver threads are alive.
    fn acquire(self: &Arc<Self>) -> Slot {
        let mut live = self.count();
        while *live >= self.max {
            live = self.freed.wait(live).unwrap_or_else(PoisonError::into_inner);
        }
        *live += 1;
        Slot(Arc::clone(self))
    }

    fn abandon(&self, handle: JoinHandle<()>) {
        let mut abandoned = self.abandoned.lock().unwrap_or_else(PoisonError::into_inner);
        abandoned.retain(|h| !h.is_finished());
        abandoned.push(handle);
    }

    fn join_abandoned(&self) {
        let handles: Vec<_> = self.abandoned.lock().unwrap_or_else(PoisonError::into_inner).drain(..).collect();
        for h in handles {
            let id = h.thread().id();
            if h.join().is_err() {
                warn!(thread=?id, "abandoned solver thread panicked");
            }
        }
    }
}

/// microlp has no time limit or cancellation of its own.  Each search runs on its own thread and
/// the caller stops waiting once the limit expires.  The abandoned search runs to completion in
/// the background but keeps its worker slot, so at most `max_workers` searches ever run at once;
/// [`MicroLpSolver::wait_idle`] joins them.
#[derive(Debug, Clone)]
pub struct MicroLpSolver {
    slots: Arc<WorkerSlots>,
}

impl Default for MicroLpSolver {
    /// One worker per thread of the current rayon pool.
    fn default() -> Self {
        Self::with_max_workers(rayon::current_num_threads())
    }
}

impl MicroLpSolver {
    pub fn with_max_workers(max_workers: usize) -> Self {
        MicroLpSolver { slots: WorkerSlots::new(max_workers) }
    }

    /// Solver threads currently alive, including abandoned ones.
    pub fn live_workers(&self) -> usize {
        *self.slots.count()
    }

    /// Joins every search abandoned at a time limit.
    pub fn wait_idle(&self) {
        self.slots.join_abandoned();
    }
}

fn to_expression(e: &LinExpr, handles: &[Variable]) -> Expression {
    let mut expr = Expression::from(e.offset());
    for (v, c) in e.terms() {
        expr.add_mul(*c, handles[v.index()]);
    }
    expr
}

fn run(model: &Model) -> std::result::Result<Vec<f64>, ResolutionError> {
    let mut vars = ProblemVariables::new();
    let handles: Vec<Variable> = model.vars().iter()
        .map(|v| {
            let def = match v.vtype {
                VarType::Binary => variable().binary(),
                VarType::Integer => variable().integer().min(v.lb).max(v.ub),
                VarType::Continuous => variable().min(v.lb).max(v.ub),
            };
            vars.add(def.name(v.name.clone()))
        })
        .collect();

    let objective = to_expression(model.objective(), &handles);
    let mut problem = match model.sense() {
        ObjSense::Maximize => vars.maximise(objective),
        ObjSense::Minimize => vars.minimise(objective),
    }.using(microlp);

    for c in model.constrs() {
        let lhs = to_expression(&c.lhs, &handles);
        let constraint = match c.sense {
            ConstrSense::Le => lhs.leq(c.rhs),
            ConstrSense::Ge => lhs.geq(c.rhs),
            ConstrSense::Eq => lhs.eq(c.rhs),
        };
        problem.add_constraint(constraint);
    }

    let solution = problem.solve()?;
    Ok(handles.iter().map(|&h| solution.value(h)).collect())
}

impl MilpSolver for MicroLpSolver {
    fn name(&self) -> &str { "microlp" }

    #[instrument(level="info", skip(self, model), fields(model=%model.name(), vars=model.vars().len(), constrs=model.constrs().len()))]
    fn solve(&self, model: &Model, params: &SolveParams) -> Result<SolveOutcome> {
        if params.mip_gap.map_or(false, |g| g > 0.0) {
            debug!("microlp always solves to optimality, ignoring the gap");
        }
        let slot = self.slots.acquire();
        let start = Instant::now();
        let (tx, rx) = mpsc::channel();
        let owned = model.clone();
        let handle = thread::Builder::new()
            .name("microlp".to_string())
            .spawn(move || {
                let _slot = slot;
                tx.send(run(&owned)).ok();
            })
            .context("failed to spawn solver thread")?;

        let received = match params.time_limit {
            Some(limit) => match rx.recv_timeout(limit) {
                Ok(r) => Ok(r),
                Err(RecvTimeoutError::Timeout) => {
                    info!(elapsed=?start.elapsed(), thread=?handle.thread().id(), "time limit reached without a solution, search continues in the background");
                    self.slots.abandon(handle);
                    return Ok(SolveOutcome::without_solution(SolveStatus::TimeLimitNoSolution))
                },
                Err(RecvTimeoutError::Disconnected) => Err(()),
            },
            None => rx.recv().map_err(|_| ()),
        };
        handle.join().map_err(|_| anyhow!("solver thread panicked"))?;
        let result = received.map_err(|_| anyhow!("solver thread terminated unexpectedly"))?;

        match result {
            Ok(values) => {
                let objective = model.objective_value(&values);
                info!(elapsed=?start.elapsed(), objective, "optimal");
                Ok(SolveOutcome::with_solution(SolveStatus::Optimal, values, objective))
            },
            Err(ResolutionError::Infeasible) => {
                info!(elapsed=?start.elapsed(), "infeasible");
                Ok(SolveOutcome::without_solution(SolveStatus::Infeasible))
            },
            Err(e) => Err(anyhow!("microlp failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn solves_knapsack() {
        let mut m = Model::new("knapsack");
        let x: Vec<_> = (0..3).map(|i| m.add_binary(format!("x{}", i))).collect();
        m.add_constr("weight", (3.0 * x[0] + 4.0 * x[1] + 2.0 * x[2]).le(6.0));
        m.set_objective(5.0 * x[0] + 6.0 * x[1] + 3.0 * x[2], ObjSense::Maximize);

        let out = MicroLpSolver::default().solve(&m, &SolveParams::default()).unwrap();
        assert_eq!(out.status, SolveStatus::Optimal);
        assert!((out.objective.unwrap() - 9.0).abs() < 1e-6);
        let values = out.values.unwrap();
        assert!(m.violations(&values, 1e-6).is_empty());
    }

    #[test]
    fn reports_infeasible() {
        let mut m = Model::new("infeasible");
        let x = m.add_binary("x");
        let y = m.add_binary("y");
        m.add_constr("both", (x + y).ge(3.0));
        m.set_objective(LinExpr::from(x), ObjSense::Minimize);
        let out = MicroLpSolver::default().solve(&m, &SolveParams { time_limit: Some(Duration::from_secs(30)), mip_gap: None }).unwrap();
        assert_eq!(out.status, SolveStatus::Infeasible);
        assert!(out.values.is_none());
    }

    fn knapsack() -> Model {
        let mut m = Model::new("knapsack");
        let x: Vec<_> = (0..3).map(|i| m.add_binary(format!("x{}", i))).collect();
        m.add_constr("weight", (3.0 * x[0] + 4.0 * x[1] + 2.0 * x[2]).le(6.0));
        m.set_objective(5.0 * x[0] + 6.0 * x[1] + 3.0 * x[2], ObjSense::Maximize);
        m
    }

    #[test]
    fn finished_solve_leaves_no_worker() {
        let solver = MicroLpSolver::with_max_workers(2);
        for _ in 0..3 {
            let out = solver.solve(&knapsack(), &SolveParams::default()).unwrap();
            assert_eq!(out.status, SolveStatus::Optimal);
            assert_eq!(solver.live_workers(), 0);
        }
    }

    #[test]
    fn abandoned_workers_are_joined() {
        let solver = MicroLpSolver::with_max_workers(1);
        let params = SolveParams { time_limit: Some(Duration::ZERO), mip_gap: None };
        for _ in 0..3 {
            let out = solver.solve(&knapsack(), &params).unwrap();
            assert!(matches!(out.status, SolveStatus::Optimal | SolveStatus::TimeLimitNoSolution));
            assert!(solver.live_workers() <= 1);
        }
        solver.wait_idle();
        assert_eq!(solver.live_workers(), 0);
    }

    #[test]
    fn slots_block_at_capacity() {
        use std::sync::atomic::{AtomicBool, Ordering};
        let slots = WorkerSlots::new(1);
        let first = slots.acquire();
        let acquired = Arc::new(AtomicBool::new(false));
        let waiter = {
            let slots = Arc::clone(&slots);
            let acquired = Arc::clone(&acquired);
            thread::spawn(move || {
                let _second = slots.acquire();
                acquired.store(true, Ordering::SeqCst);
            })
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!acquired.load(Ordering::SeqCst));
        drop(first);
        waiter.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
        assert_eq!(*slots.count(), 0);
    }
}
