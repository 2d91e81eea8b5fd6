//! # mirrorcheck-registry
//!
//! Runs a local container registry as a subprocess for the duration of a
//! test and reads its catalog.
//!
//! Lifecycle: [`RegistryProcess::start`] spawns `registry serve <config>`,
//! [`RegistryProcess::wait_ready`] polls `GET /v2/` until it answers 200,
//! [`RegistryProcess::list_repositories`] reads `GET /v2/_catalog`, and
//! [`RegistryProcess::stop`] terminates the process and deletes its storage.
//!
//! The storage directory defaults to the fixed `/tmp/docker` used by the
//! suite's registry configuration, so concurrently running registries with
//! default options share it and race during cleanup.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod catalog;
pub mod error;
pub mod process;
pub mod sink;
pub mod state;

pub use error::{RegistryError, Result};
pub use process::{RegistryOptions, RegistryProcess};
pub use sink::{CaptureBuffer, OutputSink};
pub use state::RegistryState;
