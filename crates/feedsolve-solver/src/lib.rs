//! Dependency solver engine: turns [`Requirements`] into [`Selections`].
//!
//! Strategies implement [`Solver`]:
//!
//! - [`backtracking::BacktrackingSolver`]: exhaustive search, consistent results
//! - [`simple::SimpleSolver`]: best candidate per interface, tree-shaped graphs only
//! - [`fallback::FallbackSolver`]: try one strategy, fall back to another
//! - [`external::ExternalSolver`]: delegate to a helper process

use feedsolve_core::requirements::Requirements;
use feedsolve_core::selection::Selections;
use feedsolve_util::errors::SolveResult;

pub mod backtracking;
pub mod cancel;
pub mod candidate;
pub mod external;
pub mod fallback;
pub mod graph;
pub mod provider;
pub mod rank;
pub mod report;
pub mod run;
pub mod simple;
pub mod visited;

/// A strategy for solving requirements.
///
/// Implementations keep no state between calls and may be shared across threads.
pub trait Solver: Send + Sync {
    /// Solve and report whether any consulted feed was stale.
    fn solve_with_staleness(&self, requirements: &Requirements) -> SolveResult<(Selections, bool)>;

    fn solve(&self, requirements: &Requirements) -> SolveResult<Selections> {
        self.solve_with_staleness(requirements)
            .map(|(selections, _)| selections)
    }
}

impl<T: Solver + ?Sized> Solver for Box<T> {
    fn solve_with_staleness(&self, requirements: &Requirements) -> SolveResult<(Selections, bool)> {
        (**self).solve_with_staleness(requirements)
    }
}
