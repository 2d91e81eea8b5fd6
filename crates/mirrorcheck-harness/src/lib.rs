//! # mirrorcheck-harness
//!
//! Drives the oc-mirror integration scenarios on top of the runner and
//! registry crates.
//!
//! - **Fixtures**: [`SuiteFixture`](fixture::SuiteFixture) built once per
//!   run, [`ScenarioFixture`](fixture::ScenarioFixture) set up and torn
//!   down around each scenario.
//! - **Work dirs**: temporary directories seeded with release signatures.
//! - **Checks**: exit status, working-dir layout, mirror archives, and
//!   registry contents.
//! - **Scenarios**: mirror-to-disk followed by disk-to-mirror, and
//!   mirror-to-mirror.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod checks;
pub mod error;
pub mod fixture;
pub mod scenario;
pub mod workdir;

pub use error::{HarnessError, Result};
pub use fixture::{ScenarioFixture, SuiteFixture};
pub use scenario::{Scenario, ScenarioReport};
