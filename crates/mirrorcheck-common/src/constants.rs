//! Well-known names, paths, and timings shared by the harness.

use std::time::Duration;

/// Default name of the mirroring binary, resolved through `PATH`.
pub const DEFAULT_MIRROR_BINARY: &str = "oc-mirror";

/// Default name of the registry binary, resolved through `PATH`.
pub const DEFAULT_REGISTRY_BINARY: &str = "registry";

/// Subcommand passed to the registry binary before the config path.
pub const REGISTRY_SERVE_SUBCOMMAND: &str = "serve";

/// Fixed on-disk storage used by the registry configuration shipped with
/// the suite. Deleted wholesale when a registry is stopped.
pub const DEFAULT_REGISTRY_STORAGE_DIR: &str = "/tmp/docker";

/// Host the local registry is reached on.
pub const DEFAULT_REGISTRY_HOST: &str = "localhost";

/// Port the local registry listens on.
pub const DEFAULT_REGISTRY_PORT: u16 = 5000;

/// Registry health probe path.
pub const HEALTH_PATH: &str = "/v2/";

/// Registry catalog path.
pub const CATALOG_PATH: &str = "/v2/_catalog";

/// Interval between readiness probes.
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Per-request timeout for registry HTTP calls.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Grace period between SIGTERM and SIGKILL when stopping the registry.
pub const REGISTRY_STOP_GRACE: Duration = Duration::from_secs(2);

/// Default budget for the registry to become ready.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default budget for a whole suite run.
pub const DEFAULT_SUITE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Environment variable overriding the mirroring binary path.
pub const ENV_MIRROR_BINARY: &str = "OC_MIRROR_BINARY";

/// Environment variable pointing at the artifacts root.
pub const ENV_ARTIFACTS_DIR: &str = "ARTIFACTS_DIR";

/// Environment variable the mirroring tool reads its release signing key from.
pub const ENV_SIGNATURE_KEY: &str = "OCP_SIGNATURE_VERIFICATION_PK";

/// Registry configuration file name under the artifacts root.
pub const REGISTRY_CONFIG_FILE: &str = "registry-config.yaml";

/// Key directory name under the artifacts root.
pub const KEYS_DIR: &str = "keys";

/// Release signing public key file name inside the key directory.
pub const SIGNATURE_KEY_FILE: &str = "release-pk.asc";

/// Image set configurations used by the scenarios.
pub const ISC_DIR: &str = "testdata/imagesetconfigs";

/// Image set configuration for the happy-path scenarios.
pub const ISC_HAPPY_PATH: &str = "isc-happy-path.yaml";

/// Fragment identifying the release signature files copied into a work dir.
pub const SIGNATURE_FILE_MARKER: &str = "f817";

/// Prefix of temporary work directories.
pub const WORK_DIR_PREFIX: &str = "oc-mirror-test-";

/// Directory the mirroring tool populates inside a work dir.
pub const WORKING_DIR: &str = "working-dir";

/// Subdirectories expected in the working dir after a successful mirror.
pub const WORKING_DIR_LAYOUT: [&str; 7] = [
    "hold-release",
    "release-images",
    "operator-catalogs",
    "helm",
    "cluster-resources",
    "signatures",
    "logs",
];

/// Archive file name prefix produced by mirror-to-disk.
pub const ARCHIVE_PREFIX: &str = "mirror_";

/// Archive file name suffix produced by mirror-to-disk.
pub const ARCHIVE_SUFFIX: &str = ".tar";

/// Application name used in CLI output.
pub const APP_NAME: &str = "mirrorcheck";
