use thiserror::Error;

/**
 * The ways a decision can fail. Infeasibility is not among them: it is a legitimate outcome and is reported
 * as a decision.
 */
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// The configured deadline passed before a decision was reached.
    #[error("the deadline passed before a decision was reached")]
    Timeout,

    /// Numerical corruption of the tableau; the instance cannot be trusted any more.
    #[error("unable to decide: {0}")]
    Unstable(String),

    /// Branch-and-bound recursed deeper than the configured limit.
    #[error("branch-and-bound exceeded the depth limit of {0}")]
    DepthLimit(usize),

    /// The caller broke the usage contract of the solver.
    #[error("contract violation: {0}")]
    Contract(String),
}

impl SolverError {
    pub fn unstable(message: impl Into<String>) -> Self {
        Self::Unstable(message.into())
    }

    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract(message.into())
    }
}
