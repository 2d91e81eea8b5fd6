//! Registry lifecycle and query errors.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while managing or querying the local registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry configuration file does not exist.
    #[error("registry config not found at {path}: {source}")]
    ConfigNotFound {
        /// Configuration path that was checked.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The registry subprocess could not be spawned.
    #[error("failed to start registry {program}: {source}")]
    ProcessStart {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The health endpoint never answered 200 within the budget.
    #[error("registry at {url} not ready after {timeout:?}")]
    ReadinessTimeout {
        /// Health URL that was polled.
        url: String,
        /// Budget that elapsed.
        timeout: Duration,
    },

    /// An HTTP request could not be constructed.
    #[error("failed to create request for {url}: {source}")]
    RequestBuild {
        /// Target URL.
        url: String,
        /// Underlying client error.
        source: reqwest::Error,
    },

    /// The catalog request failed before a response arrived.
    #[error("failed to query catalog at {url}: {source}")]
    Query {
        /// Target URL.
        url: String,
        /// Underlying client error.
        source: reqwest::Error,
    },

    /// The catalog answered with a status other than 200.
    #[error("catalog returned status {status}")]
    HttpStatus {
        /// Status code observed.
        status: u16,
    },

    /// The catalog body was not a valid catalog document.
    #[error("failed to decode catalog: {source}")]
    Decode {
        /// Underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The registry storage directory could not be removed.
    #[error("failed to remove registry storage {path}: {source}")]
    Cleanup {
        /// Storage directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Waiting for the registry process to exit failed.
    #[error("failed to wait for registry process: {source}")]
    Wait {
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The registry process exited on its own.
    #[error("registry process exited unexpectedly ({status})")]
    RegistryExited {
        /// Exit status description.
        status: String,
    },

    /// The registry's cancellation token fired during an operation.
    #[error("registry {operation} cancelled")]
    Cancelled {
        /// Operation that was interrupted.
        operation: &'static str,
    },

    /// `stop` was called on a registry that was already stopped.
    #[error("registry already stopped")]
    AlreadyStopped,
}

/// Convenience alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
