//! End-to-end scenario tests.
//!
//! The default tests drive the scenarios against shell-script stand-ins
//! for `oc-mirror` and `registry`, with a `wiremock` server playing the
//! registry's HTTP API. The `#[ignore]`d tests at the bottom need the real
//! binaries and artifacts (`OC_MIRROR_BINARY`, `ARTIFACTS_DIR`) and network
//! access: run them with `cargo test -- --ignored`.

#![cfg(unix)]
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mirrorcheck_common::config::HarnessConfig;
use mirrorcheck_harness::scenario::EXPECTED_REPOSITORIES;
use mirrorcheck_harness::{HarnessError, Scenario, SuiteFixture};
use mirrorcheck_registry::RegistryError;
use mirrorcheck_runner::RunError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mirrors the layout and archive naming of the real tool closely enough
/// for the checks: `--from` pushes, `--workspace` mirrors directly, and a
/// bare `file://` destination writes an archive.
const FAKE_OC_MIRROR: &str = r#"
[ -n "$OCP_SIGNATURE_VERIFICATION_PK" ] || { echo "signature key not set" >&2; exit 2; }
mode=m2d
dir=""
while [ $# -gt 0 ]; do
  case "$1" in
    --from) mode=d2m; dir="${2#file://}"; shift ;;
    --workspace) mode=m2m; dir="${2#file://}"; shift ;;
    file://*) dir="${1#file://}" ;;
  esac
  shift
done
if [ "$mode" != d2m ]; then
  for d in hold-release release-images operator-catalogs helm cluster-resources signatures logs; do
    mkdir -p "$dir/working-dir/$d"
  done
fi
if [ "$mode" = m2d ]; then
  printf 'archive' > "$dir/mirror_000001.tar"
fi
echo "$mode done"
"#;

struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let keys = dir.path().join("artifacts/keys");
        std::fs::create_dir_all(&keys).expect("keys dir");
        std::fs::write(keys.join("release-pk.asc"), "pk").expect("public key");
        std::fs::write(keys.join("sha256-f817aa-1"), "sig").expect("signature");
        std::fs::write(
            dir.path().join("artifacts/registry-config.yaml"),
            "version: 0.1\n",
        )
        .expect("registry config");
        Self { dir }
    }

    fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    fn storage(&self) -> PathBuf {
        self.dir.path().join("storage")
    }

    fn config(&self, oc_mirror: &Path, port: u16) -> HarnessConfig {
        let mut config = HarnessConfig::from_artifacts_dir(self.dir.path().join("artifacts"));
        config.binary = oc_mirror.to_path_buf();
        config.registry_binary = self.script("registry", "exec sleep 30");
        config.registry_host = "127.0.0.1".into();
        config.registry_port = port;
        config.storage_dir = self.storage();
        config.ready_timeout = Duration::from_secs(5);
        config.suite_timeout = Duration::from_secs(60);
        config
    }
}

async fn registry_api(server: &MockServer, health: u16, repositories: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/v2/"))
        .respond_with(ResponseTemplate::new(health))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/_catalog"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "repositories": repositories })),
        )
        .mount(server)
        .await;
}

fn full_catalog() -> Vec<&'static str> {
    vec![
        "openshifttest/hello-openshift",
        "openshift/release",
        "openshift/release-images",
        "stefanprodan/podinfo",
    ]
}

// ── Passing runs ─────────────────────────────────────────────────────

#[tokio::test]
async fn disk_round_trip_scenario_passes() {
    let sandbox = Sandbox::new();
    let server = MockServer::start().await;
    registry_api(&server, 200, &full_catalog()).await;
    let oc_mirror = sandbox.script("oc-mirror", FAKE_OC_MIRROR);

    let suite = SuiteFixture::new(sandbox.config(&oc_mirror, server.address().port()));
    let report = Scenario::MirrorToDiskThenDiskToMirror
        .run(&suite)
        .await
        .expect("scenario");

    assert_eq!(report.scenario, Scenario::MirrorToDiskThenDiskToMirror);
    for expected in EXPECTED_REPOSITORIES {
        assert!(report.repositories.iter().any(|r| r.contains(expected)));
    }
}

#[tokio::test]
async fn direct_mirror_scenario_passes() {
    let sandbox = Sandbox::new();
    let server = MockServer::start().await;
    registry_api(&server, 200, &full_catalog()).await;
    let oc_mirror = sandbox.script("oc-mirror", FAKE_OC_MIRROR);

    let suite = SuiteFixture::new(sandbox.config(&oc_mirror, server.address().port()));
    let report = Scenario::MirrorToMirror.run(&suite).await.expect("scenario");
    assert_eq!(report.repositories.len(), 4);
}

#[tokio::test]
async fn scenarios_run_back_to_back_on_one_suite() {
    let sandbox = Sandbox::new();
    let server = MockServer::start().await;
    registry_api(&server, 200, &full_catalog()).await;
    let oc_mirror = sandbox.script("oc-mirror", FAKE_OC_MIRROR);

    let suite = SuiteFixture::new(sandbox.config(&oc_mirror, server.address().port()));
    for scenario in Scenario::ALL {
        let _ = scenario.run(&suite).await.expect("scenario");
    }
}

#[tokio::test]
async fn teardown_removes_registry_storage() {
    let sandbox = Sandbox::new();
    let server = MockServer::start().await;
    registry_api(&server, 200, &full_catalog()).await;
    let oc_mirror = sandbox.script("oc-mirror", FAKE_OC_MIRROR);
    std::fs::create_dir_all(sandbox.storage().join("docker/registry")).expect("storage");

    let suite = SuiteFixture::new(sandbox.config(&oc_mirror, server.address().port()));
    let _ = Scenario::MirrorToMirror.run(&suite).await.expect("scenario");
    assert!(!sandbox.storage().exists());
}

// ── Failing runs ─────────────────────────────────────────────────────

#[tokio::test]
async fn non_zero_exit_fails_with_captured_output_and_still_tears_down() {
    let sandbox = Sandbox::new();
    let server = MockServer::start().await;
    registry_api(&server, 200, &full_catalog()).await;
    let oc_mirror = sandbox.script("oc-mirror", "echo pulling\necho 'manifest unknown' >&2\nexit 1");
    std::fs::create_dir_all(sandbox.storage()).expect("storage");

    let suite = SuiteFixture::new(sandbox.config(&oc_mirror, server.address().port()));
    let err = Scenario::MirrorToDiskThenDiskToMirror
        .run(&suite)
        .await
        .unwrap_err();

    match err {
        HarnessError::CommandFailed {
            step,
            exit_code,
            stdout,
            stderr,
        } => {
            assert_eq!(step, "mirrorToDisk");
            assert_eq!(exit_code, 1);
            assert_eq!(stdout.trim(), "pulling");
            assert_eq!(stderr.trim(), "manifest unknown");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!sandbox.storage().exists());
}

#[tokio::test]
async fn missing_archive_fails_disk_round_trip() {
    let sandbox = Sandbox::new();
    let server = MockServer::start().await;
    registry_api(&server, 200, &full_catalog()).await;
    let oc_mirror = sandbox.script(
        "oc-mirror",
        &FAKE_OC_MIRROR.replace("printf 'archive' > \"$dir/mirror_000001.tar\"", ":"),
    );

    let suite = SuiteFixture::new(sandbox.config(&oc_mirror, server.address().port()));
    let err = Scenario::MirrorToDiskThenDiskToMirror
        .run(&suite)
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::MissingArchive { .. }));
}

#[tokio::test]
async fn missing_repository_fails_with_catalog_contents() {
    let sandbox = Sandbox::new();
    let server = MockServer::start().await;
    registry_api(&server, 200, &["openshift/release"]).await;
    let oc_mirror = sandbox.script("oc-mirror", FAKE_OC_MIRROR);

    let suite = SuiteFixture::new(sandbox.config(&oc_mirror, server.address().port()));
    let err = Scenario::MirrorToMirror.run(&suite).await.unwrap_err();
    match err {
        HarnessError::MissingRepository { expected, actual } => {
            assert_eq!(expected, "openshifttest/hello-openshift");
            assert_eq!(actual, vec!["openshift/release".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn empty_catalog_fails() {
    let sandbox = Sandbox::new();
    let server = MockServer::start().await;
    registry_api(&server, 200, &[]).await;
    let oc_mirror = sandbox.script("oc-mirror", FAKE_OC_MIRROR);

    let suite = SuiteFixture::new(sandbox.config(&oc_mirror, server.address().port()));
    let err = Scenario::MirrorToMirror.run(&suite).await.unwrap_err();
    assert!(matches!(err, HarnessError::EmptyCatalog));
}

#[tokio::test]
async fn registry_that_never_becomes_ready_fails_setup() {
    let sandbox = Sandbox::new();
    let server = MockServer::start().await;
    registry_api(&server, 503, &full_catalog()).await;
    let oc_mirror = sandbox.script("oc-mirror", FAKE_OC_MIRROR);

    let mut config = sandbox.config(&oc_mirror, server.address().port());
    config.ready_timeout = Duration::from_millis(400);
    let suite = SuiteFixture::new(config);

    let err = Scenario::MirrorToMirror.run(&suite).await.unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Registry(RegistryError::ReadinessTimeout { .. })
    ));
}

#[tokio::test]
async fn suite_deadline_cancels_a_hung_mirror_run() {
    let sandbox = Sandbox::new();
    let server = MockServer::start().await;
    registry_api(&server, 200, &full_catalog()).await;
    let oc_mirror = sandbox.script("oc-mirror", "echo started\nexec sleep 30");

    let mut config = sandbox.config(&oc_mirror, server.address().port());
    config.suite_timeout = Duration::from_secs(2);
    let suite = SuiteFixture::new(config);

    let err = Scenario::MirrorToMirror.run(&suite).await.unwrap_err();
    match err {
        HarnessError::Execution { source, stdout, .. } => {
            assert!(matches!(source, RunError::Cancelled { .. }));
            assert_eq!(stdout.trim(), "started");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(suite.token().is_cancelled());
}

#[tokio::test]
async fn missing_mirror_binary_is_execution_error() {
    let sandbox = Sandbox::new();
    let server = MockServer::start().await;
    registry_api(&server, 200, &full_catalog()).await;

    let suite = SuiteFixture::new(
        sandbox.config(Path::new("/nonexistent/oc-mirror-12345"), server.address().port()),
    );
    let err = Scenario::MirrorToMirror.run(&suite).await.unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Execution {
            source: RunError::Execution { .. },
            ..
        }
    ));
}

// ── Real binaries ────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "needs oc-mirror, registry, artifacts, and network access"]
async fn real_mirror_to_disk_then_disk_to_mirror() {
    let config = HarnessConfig::from_env();
    config.validate().expect("artifacts present");
    let suite = SuiteFixture::new(config);
    let report = Scenario::MirrorToDiskThenDiskToMirror
        .run(&suite)
        .await
        .expect("scenario");
    assert!(!report.repositories.is_empty());
}

#[tokio::test]
#[ignore = "needs oc-mirror, registry, artifacts, and network access"]
async fn real_mirror_to_mirror() {
    let config = HarnessConfig::from_env();
    config.validate().expect("artifacts present");
    let suite = SuiteFixture::new(config);
    let report = Scenario::MirrorToMirror.run(&suite).await.expect("scenario");
    assert!(!report.repositories.is_empty());
}
