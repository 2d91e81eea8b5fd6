//! Harness errors: infrastructure failures and failed checks.

use std::path::PathBuf;

use mirrorcheck_common::error::MirrorcheckError;
use mirrorcheck_registry::RegistryError;
use mirrorcheck_runner::RunError;
use thiserror::Error;

/// Anything that can make a scenario fail.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Configuration or filesystem failure.
    #[error(transparent)]
    Common(#[from] MirrorcheckError),

    /// Registry lifecycle or query failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The mirroring binary did not run to completion.
    #[error("{step}: {source}\nstdout: {stdout}\nstderr: {stderr}")]
    Execution {
        /// Scenario step that ran the binary.
        step: String,
        /// Why the binary did not complete.
        source: RunError,
        /// Output captured before the failure.
        stdout: String,
        /// Error output captured before the failure.
        stderr: String,
    },

    /// The mirroring binary exited non-zero.
    #[error("{step} failed with exit code {exit_code}:\nstdout: {stdout}\nstderr: {stderr}")]
    CommandFailed {
        /// Scenario step that ran the binary.
        step: String,
        /// Exit code reported.
        exit_code: i32,
        /// Captured output.
        stdout: String,
        /// Captured error output.
        stderr: String,
    },

    /// An expected directory is absent.
    #[error("missing directory: {path}")]
    MissingDirectory {
        /// Directory that should exist.
        path: PathBuf,
    },

    /// No mirror archive was produced.
    #[error("no tar archive found in {dir}")]
    MissingArchive {
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// A mirror archive exists but is empty.
    #[error("empty tar: {path}")]
    EmptyArchive {
        /// Empty archive.
        path: PathBuf,
    },

    /// The registry catalog is empty.
    #[error("registry has no repositories")]
    EmptyCatalog,

    /// No repository name contains the expected fragment.
    #[error("missing repository {expected:?}, got: {actual:?}")]
    MissingRepository {
        /// Fragment that was looked for.
        expected: String,
        /// Repositories present in the catalog.
        actual: Vec<String>,
    },
}

/// Convenience alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
