use feedsolve_core::requirements::Requirements;
use feedsolve_core::selection::Selections;
use feedsolve_util::errors::SolveResult;

use crate::Solver;

/// Runs `primary`; if it fails to find a solution, runs `secondary` instead.
///
/// Only solver failures ([`SolveError::is_solver_failure`]) trigger the
/// fallback. Cancellation, bad arguments and feed errors pass straight through.
///
/// [`SolveError::is_solver_failure`]: feedsolve_util::errors::SolveError::is_solver_failure
#[derive(Debug, Clone)]
pub struct FallbackSolver<P, S> {
    primary: P,
    secondary: S,
}

impl<P: Solver, S: Solver> FallbackSolver<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: Solver, S: Solver> Solver for FallbackSolver<P, S> {
    fn solve_with_staleness(&self, requirements: &Requirements) -> SolveResult<(Selections, bool)> {
        match self.primary.solve_with_staleness(requirements) {
            Err(e) if e.is_solver_failure() => {
                tracing::debug!("primary solver failed ({e}), falling back");
                self.secondary.solve_with_staleness(requirements)
            }
            other => other,
        }
    }
}
