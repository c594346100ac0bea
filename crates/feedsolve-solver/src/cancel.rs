use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use feedsolve_util::errors::{SolveError, SolveResult};

/// Cooperative cancellation flag shared between a caller and a running solve.
///
/// Clones observe the same flag. Solvers check it once per recursive step.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> SolveResult<()> {
        if self.is_cancelled() {
            Err(SolveError::Cancelled)
        } else {
            Ok(())
        }
    }
}
