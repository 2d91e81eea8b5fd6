//! # mirrorcheck-runner
//!
//! Invokes the mirroring binary under test and captures its outcome.
//!
//! - **Modes**: argument shapes for mirror-to-disk, disk-to-mirror, and
//!   mirror-to-mirror.
//! - **Runner**: spawns the binary bound to a cancellation token and
//!   collects stdout, stderr, exit code, and duration.
//!
//! A non-zero exit is a normal outcome the caller inspects; only failing to
//! run the binary at all is reported as an error.
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use mirrorcheck_runner::CommandRunner;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() {
//! let runner = CommandRunner::from_env();
//! let token = CancellationToken::new();
//! let result = runner
//!     .mirror_to_disk(&token, Path::new("isc.yaml"), Path::new("/tmp/work"), &["--remove-signatures=true"])
//!     .await;
//! if let Some(err) = result.error() {
//!     tracing::error!(error = %err, stderr = %result.stderr, "oc-mirror did not run");
//! }
//! # }
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod error;
pub mod mode;
pub mod result;
pub mod runner;

pub use error::RunError;
pub use mode::MirrorMode;
pub use result::{ExecutionResult, Outcome};
pub use runner::CommandRunner;
