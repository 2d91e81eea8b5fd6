//! Structured outcome of one invocation.

use std::time::Duration;

use crate::error::RunError;

/// How an invocation ended.
#[derive(Debug)]
pub enum Outcome {
    /// The process ran to completion. `-1` means it was terminated by a
    /// signal.
    Completed {
        /// Exit code reported by the process.
        exit_code: i32,
    },
    /// The process could not be started, waited on, or was cancelled.
    FailedToExecute(RunError),
}

/// Everything captured from one invocation of the mirroring binary.
#[derive(Debug)]
pub struct ExecutionResult {
    /// How the invocation ended.
    pub outcome: Outcome,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Wall-clock time from dispatch to completion.
    pub duration: Duration,
}

impl ExecutionResult {
    /// Exit code, if the process ran to completion.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self.outcome {
            Outcome::Completed { exit_code } => Some(exit_code),
            Outcome::FailedToExecute(_) => None,
        }
    }

    /// Execution error, if the process did not run to completion.
    #[must_use]
    pub const fn error(&self) -> Option<&RunError> {
        match &self.outcome {
            Outcome::Completed { .. } => None,
            Outcome::FailedToExecute(err) => Some(err),
        }
    }

    /// Whether the process ran to completion and exited with code 0.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.outcome, Outcome::Completed { exit_code: 0 })
    }

    /// Converts into a `Result`, keeping the captured output on the `Ok`
    /// side for completed processes regardless of exit code.
    ///
    /// # Errors
    ///
    /// Returns the execution error if the process did not run to completion.
    pub fn into_result(self) -> Result<Self, RunError> {
        match self.outcome {
            Outcome::FailedToExecute(err) => Err(err),
            Outcome::Completed { .. } => Ok(self),
        }
    }
}
