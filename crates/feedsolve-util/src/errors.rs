use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all solver operations.
#[derive(Debug, Error, Diagnostic)]
pub enum SolveError {
    /// No assignment of implementations satisfies the requirements.
    #[error("No solution found for {interface}{report}")]
    #[diagnostic(help("Check the version constraints and stability policy of the listed candidates"))]
    NoSolution { interface: String, report: String },

    /// The selected strategy cannot handle a construct found in a feed.
    #[error("Unsupported by this solver: {message}")]
    Unsupported { message: String },

    /// A requested command does not exist on the chosen implementation.
    #[error("Implementation of {interface} has no command '{command}'")]
    MissingCommand { interface: String, command: String },

    /// The requirements were rejected before any search started.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The feed provider failed to deliver a feed.
    #[error("Failed to load feed {uri}: {message}")]
    Feed { uri: String, message: String },

    /// The caller requested cancellation.
    #[error("Solving was cancelled")]
    Cancelled,

    /// An out-of-process solver could not be run or produced garbage.
    #[error("External solver failed: {message}")]
    External { message: String },

    /// Malformed version, version range or architecture string.
    #[error("Parse error: {message}")]
    #[diagnostic(help("Versions look like 1.2-rc3, ranges like 1.0..!2.0 | !1.5"))]
    Parse { message: String },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SolveError {
    /// `true` for the "expected failure" kinds a fallback strategy may recover from.
    pub fn is_solver_failure(&self) -> bool {
        matches!(
            self,
            Self::NoSolution { .. } | Self::Unsupported { .. } | Self::MissingCommand { .. }
        )
    }

    pub fn no_solution(interface: impl Into<String>) -> Self {
        Self::NoSolution {
            interface: interface.into(),
            report: String::new(),
        }
    }
}

/// Convenience alias used throughout the solver crates.
pub type SolveResult<T> = Result<T, SolveError>;
