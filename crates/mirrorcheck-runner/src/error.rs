//! Reasons an invocation of the mirroring binary did not run to completion.

use thiserror::Error;

/// Failure to execute the mirroring binary.
///
/// A process that ran and exited non-zero is not an error; see
/// [`Outcome::Completed`](crate::result::Outcome::Completed).
#[derive(Debug, Error)]
pub enum RunError {
    /// The process could not be spawned or waited on.
    #[error("failed to execute {program}: {source}")]
    Execution {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The cancellation token fired before the process exited.
    #[error("execution of {program} was cancelled before it exited")]
    Cancelled {
        /// Program that was invoked.
        program: String,
    },
}
