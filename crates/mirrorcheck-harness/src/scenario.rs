//! The oc-mirror happy-path scenarios.

use std::fmt;
use std::time::{Duration, Instant};

use mirrorcheck_common::constants;

use crate::checks::{
    expect_command_success, expect_repositories_exist, expect_tar_archive_exists,
    expect_working_dir_structure,
};
use crate::error::Result;
use crate::fixture::{ScenarioFixture, SuiteFixture};

/// Flag dropping signatures so unsigned test images mirror cleanly.
pub const REMOVE_SIGNATURES: &str = "--remove-signatures=true";

/// Flag allowing the plain-HTTP local registry as a destination.
pub const DEST_TLS_VERIFY_OFF: &str = "--dest-tls-verify=false";

/// Repository fragments the happy-path image set must produce.
pub const EXPECTED_REPOSITORIES: [&str; 3] = [
    "openshifttest/hello-openshift",
    "openshift/release",
    "stefanprodan/podinfo",
];

/// A scenario the harness can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Mirror to a local archive, then push the archive to the registry.
    MirrorToDiskThenDiskToMirror,
    /// Mirror straight into the registry.
    MirrorToMirror,
}

impl Scenario {
    /// Every scenario, in run order.
    pub const ALL: [Self; 2] = [Self::MirrorToDiskThenDiskToMirror, Self::MirrorToMirror];

    /// Runs the scenario with its own registry and work dir.
    ///
    /// The fixture is torn down whether or not the scenario passed; a
    /// scenario failure takes precedence over a teardown failure.
    ///
    /// # Errors
    ///
    /// Returns the first setup, execution, check, or teardown failure.
    pub async fn run(self, suite: &SuiteFixture) -> Result<ScenarioReport> {
        tracing::info!(scenario = %self, "scenario starting");
        let started = Instant::now();
        let fixture = ScenarioFixture::set_up(suite).await?;

        let outcome = match self {
            Self::MirrorToDiskThenDiskToMirror => {
                mirror_to_disk_then_disk_to_mirror(suite, &fixture).await
            }
            Self::MirrorToMirror => mirror_to_mirror(suite, &fixture).await,
        };

        let torn_down = fixture.tear_down().await;
        let repositories = outcome?;
        torn_down?;

        let report = ScenarioReport {
            scenario: self,
            repositories,
            duration: started.elapsed(),
        };
        tracing::info!(scenario = %self, duration = ?report.duration, "scenario passed");
        Ok(report)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MirrorToDiskThenDiskToMirror => write!(f, "mirrorToDisk + diskToMirror"),
            Self::MirrorToMirror => write!(f, "mirrorToMirror"),
        }
    }
}

/// What a passing scenario observed.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    /// Scenario that ran.
    pub scenario: Scenario,
    /// Registry catalog after the scenario.
    pub repositories: Vec<String>,
    /// Wall-clock time including setup and teardown.
    pub duration: Duration,
}

async fn mirror_to_disk_then_disk_to_mirror(
    suite: &SuiteFixture,
    fixture: &ScenarioFixture,
) -> Result<Vec<String>> {
    let isc = suite.config().image_set_config(constants::ISC_HAPPY_PATH);
    let work_dir = fixture.work_dir();

    let result = suite
        .runner()
        .mirror_to_disk(suite.token(), &isc, work_dir, &[REMOVE_SIGNATURES])
        .await;
    let _ = expect_command_success("mirrorToDisk", result)?;
    expect_working_dir_structure(work_dir, &constants::WORKING_DIR_LAYOUT)?;
    let _ = expect_tar_archive_exists(work_dir)?;

    let result = suite
        .runner()
        .disk_to_mirror(
            suite.token(),
            &isc,
            work_dir,
            &fixture.registry().endpoint(),
            &[REMOVE_SIGNATURES, DEST_TLS_VERIFY_OFF],
        )
        .await;
    let _ = expect_command_success("diskToMirror", result)?;

    let repositories = fixture.registry().list_repositories().await?;
    expect_repositories_exist(&repositories, &EXPECTED_REPOSITORIES)?;
    Ok(repositories)
}

async fn mirror_to_mirror(suite: &SuiteFixture, fixture: &ScenarioFixture) -> Result<Vec<String>> {
    let isc = suite.config().image_set_config(constants::ISC_HAPPY_PATH);
    let work_dir = fixture.work_dir();

    let result = suite
        .runner()
        .mirror_to_mirror(
            suite.token(),
            &isc,
            work_dir,
            &fixture.registry().endpoint(),
            &[REMOVE_SIGNATURES, DEST_TLS_VERIFY_OFF],
        )
        .await;
    let _ = expect_command_success("mirrorToMirror", result)?;
    expect_working_dir_structure(work_dir, &constants::WORKING_DIR_LAYOUT)?;

    let repositories = fixture.registry().list_repositories().await?;
    expect_repositories_exist(&repositories, &EXPECTED_REPOSITORIES)?;
    Ok(repositories)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_lists_both_scenarios_in_order() {
        assert_eq!(
            Scenario::ALL,
            [Scenario::MirrorToDiskThenDiskToMirror, Scenario::MirrorToMirror]
        );
    }

    #[test]
    fn display_names_match_suite_descriptions() {
        assert_eq!(
            Scenario::MirrorToDiskThenDiskToMirror.to_string(),
            "mirrorToDisk + diskToMirror"
        );
        assert_eq!(Scenario::MirrorToMirror.to_string(), "mirrorToMirror");
    }
}
