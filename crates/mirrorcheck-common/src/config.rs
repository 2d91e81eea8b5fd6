//! Harness configuration model.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{MirrorcheckError, Result};

/// Everything a suite run needs to locate binaries, fixtures, and the
/// local registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Mirroring binary to invoke.
    pub binary: PathBuf,
    /// Root holding the registry config and key material.
    pub artifacts_dir: PathBuf,
    /// Registry configuration file.
    pub registry_config: PathBuf,
    /// Directory holding image set configurations.
    pub isc_dir: PathBuf,
    /// Directory holding release signing keys and signatures.
    pub keys_dir: PathBuf,
    /// Registry binary to launch.
    pub registry_binary: PathBuf,
    /// Host the local registry is reached on.
    pub registry_host: String,
    /// Port the local registry listens on.
    pub registry_port: u16,
    /// Storage directory the registry writes to, removed on stop.
    pub storage_dir: PathBuf,
    /// Budget for the registry to become ready.
    #[serde(rename = "ready_timeout_ms", with = "duration_millis")]
    pub ready_timeout: Duration,
    /// Budget for a whole suite run.
    #[serde(rename = "suite_timeout_ms", with = "duration_millis")]
    pub suite_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::from_artifacts_dir(".")
    }
}

impl HarnessConfig {
    /// Builds a configuration whose fixture paths live under `artifacts_dir`.
    #[must_use]
    pub fn from_artifacts_dir(artifacts_dir: impl Into<PathBuf>) -> Self {
        let artifacts_dir = artifacts_dir.into();
        Self {
            binary: PathBuf::from(constants::DEFAULT_MIRROR_BINARY),
            registry_config: artifacts_dir.join(constants::REGISTRY_CONFIG_FILE),
            isc_dir: PathBuf::from(constants::ISC_DIR),
            keys_dir: artifacts_dir.join(constants::KEYS_DIR),
            registry_binary: PathBuf::from(constants::DEFAULT_REGISTRY_BINARY),
            registry_host: constants::DEFAULT_REGISTRY_HOST.to_string(),
            registry_port: constants::DEFAULT_REGISTRY_PORT,
            storage_dir: PathBuf::from(constants::DEFAULT_REGISTRY_STORAGE_DIR),
            ready_timeout: constants::DEFAULT_READY_TIMEOUT,
            suite_timeout: constants::DEFAULT_SUITE_TIMEOUT,
            artifacts_dir,
        }
    }

    /// Reads `ARTIFACTS_DIR` and `OC_MIRROR_BINARY` from the environment.
    ///
    /// Without `ARTIFACTS_DIR` the artifacts are expected two levels above
    /// the current directory, where a crate's integration tests run from.
    #[must_use]
    pub fn from_env() -> Self {
        let artifacts_dir = non_empty_env(constants::ENV_ARTIFACTS_DIR)
            .map_or_else(|| PathBuf::from("../.."), PathBuf::from);
        let mut config = Self::from_artifacts_dir(artifacts_dir);
        if let Some(binary) = non_empty_env(constants::ENV_MIRROR_BINARY) {
            config.binary = PathBuf::from(binary);
        }
        config
    }

    /// Path of the release signing public key handed to the mirroring tool.
    #[must_use]
    pub fn signature_key(&self) -> PathBuf {
        self.keys_dir.join(constants::SIGNATURE_KEY_FILE)
    }

    /// Path of an image set configuration inside [`Self::isc_dir`].
    #[must_use]
    pub fn image_set_config(&self, name: &str) -> PathBuf {
        self.isc_dir.join(name)
    }

    /// Environment assignments the mirroring tool needs on every run.
    #[must_use]
    pub fn runner_env(&self) -> Vec<(String, String)> {
        vec![(
            constants::ENV_SIGNATURE_KEY.to_string(),
            self.signature_key().display().to_string(),
        )]
    }

    /// Checks that the registry config and key directory exist.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for the first missing path, or `Config` if a
    /// timeout is zero.
    pub fn validate(&self) -> Result<()> {
        require(&self.registry_config, "registry config")?;
        require(&self.keys_dir, "key directory")?;
        if self.ready_timeout.is_zero() || self.suite_timeout.is_zero() {
            return Err(MirrorcheckError::Config {
                message: "timeouts must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Serializes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn require(path: &Path, kind: &'static str) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(MirrorcheckError::NotFound {
            kind,
            path: path.to_path_buf(),
        })
    }
}

/// Whole milliseconds, so sub-second timeouts survive a round trip.
mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_derive_from_artifacts_dir() {
        let config = HarnessConfig::from_artifacts_dir("/srv/artifacts");
        assert_eq!(
            config.registry_config,
            PathBuf::from("/srv/artifacts/registry-config.yaml")
        );
        assert_eq!(config.keys_dir, PathBuf::from("/srv/artifacts/keys"));
        assert_eq!(
            config.signature_key(),
            PathBuf::from("/srv/artifacts/keys/release-pk.asc")
        );
        assert_eq!(config.registry_port, 5000);
        assert_eq!(config.registry_binary, PathBuf::from("registry"));
        assert_eq!(config.registry_host, "localhost");
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/docker"));
    }

    #[test]
    fn image_set_config_joins_isc_dir() {
        let config = HarnessConfig::default();
        assert_eq!(
            config.image_set_config("isc-happy-path.yaml"),
            PathBuf::from("testdata/imagesetconfigs/isc-happy-path.yaml")
        );
    }

    #[test]
    fn runner_env_points_at_signature_key() {
        let config = HarnessConfig::from_artifacts_dir("/a");
        let env = config.runner_env();
        assert_eq!(env.len(), 1);
        assert_eq!(env[0].0, "OCP_SIGNATURE_VERIFICATION_PK");
        assert_eq!(env[0].1, "/a/keys/release-pk.asc");
    }

    #[test]
    fn validate_reports_missing_registry_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = HarnessConfig::from_artifacts_dir(dir.path());
        let err = config.validate().expect_err("config is missing");
        assert!(matches!(
            err,
            MirrorcheckError::NotFound {
                kind: "registry config",
                ..
            }
        ));
    }

    #[test]
    fn validate_accepts_complete_artifacts_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("registry-config.yaml"), "version: 0.1\n").expect("write");
        std::fs::create_dir(dir.path().join("keys")).expect("mkdir");
        let config = HarnessConfig::from_artifacts_dir(dir.path());
        config.validate().expect("valid");
    }

    #[test]
    fn validate_rejects_zero_timeouts() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("registry-config.yaml"), "").expect("write");
        std::fs::create_dir(dir.path().join("keys")).expect("mkdir");
        let mut config = HarnessConfig::from_artifacts_dir(dir.path());
        config.ready_timeout = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(MirrorcheckError::Config { .. })
        ));
    }

    #[test]
    fn json_writes_timeouts_in_milliseconds() {
        let config = HarnessConfig::from_artifacts_dir("/a");
        let json = config.to_json().expect("serialize");
        assert!(json.contains("\"ready_timeout_ms\": 30000"));
        assert!(json.contains("\"suite_timeout_ms\": 1800000"));
        let back: HarnessConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
    }

    #[test]
    fn sub_second_timeout_survives_json_and_stays_valid() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("registry-config.yaml"), "").expect("write");
        std::fs::create_dir(dir.path().join("keys")).expect("mkdir");
        let mut config = HarnessConfig::from_artifacts_dir(dir.path());
        config.ready_timeout = Duration::from_millis(400);

        let json = config.to_json().expect("serialize");
        let back: HarnessConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.ready_timeout, Duration::from_millis(400));
        back.validate().expect("valid");
    }
}
