use std::time::{Duration, Instant};

use super::solver_error::SolverError;

/**
 * A point in time after which cooperative work gives up. Checked at every pivot and at every branch.
 */
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub fn never() -> Self {
        Self { at: None }
    }

    /// A deadline `timeout` from now, or none if no timeout is given.
    pub fn after(timeout: Option<Duration>) -> Self {
        Self {
            at: timeout.map(|timeout| Instant::now() + timeout),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    pub fn check(&self) -> Result<(), SolverError> {
        if self.is_expired() {
            Err(SolverError::Timeout)
        } else {
            Ok(())
        }
    }
}
