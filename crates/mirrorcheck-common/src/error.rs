//! Shared error type for the mirrorcheck workspace.
//!
//! The runner, registry, and harness crates each define their own
//! domain-specific error enum; this one covers configuration and
//! filesystem concerns they all share.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum MirrorcheckError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required file or directory was not found.
    #[error("{kind} not found: {path}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Path that was expected to exist.
        path: PathBuf,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, MirrorcheckError>;
