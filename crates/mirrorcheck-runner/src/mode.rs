//! Argument shapes for the three mirroring modes.
//!
//! Each mode has a fixed prefix ending in `--v2`; caller flags are only
//! ever appended after it so the positional destination cannot move.

use std::path::{Path, PathBuf};

/// Scheme for local directories.
const FILE_SCHEME: &str = "file://";
/// Scheme for registry destinations.
const DOCKER_SCHEME: &str = "docker://";
/// Flag selecting the v2 workflow, always required.
const V2_FLAG: &str = "--v2";

/// One of the three ways the mirroring tool moves images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorMode {
    /// Remote registry to a local archive directory.
    MirrorToDisk {
        /// Image set configuration.
        config: PathBuf,
        /// Directory receiving the archive and working dir.
        dest_dir: PathBuf,
    },
    /// Local archive directory to a registry.
    DiskToMirror {
        /// Image set configuration.
        config: PathBuf,
        /// Directory produced by a previous mirror-to-disk run.
        source_dir: PathBuf,
        /// Destination registry as `host:port[/path]`.
        dest_registry: String,
    },
    /// Remote registry to another registry, via a workspace directory.
    MirrorToMirror {
        /// Image set configuration.
        config: PathBuf,
        /// Workspace directory for intermediate artifacts.
        workspace: PathBuf,
        /// Destination registry as `host:port[/path]`.
        dest_registry: String,
    },
}

impl MirrorMode {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MirrorToDisk { .. } => "mirror-to-disk",
            Self::DiskToMirror { .. } => "disk-to-mirror",
            Self::MirrorToMirror { .. } => "mirror-to-mirror",
        }
    }

    /// Builds the argument vector, appending `extra` after the fixed prefix.
    #[must_use]
    pub fn args<S: AsRef<str>>(&self, extra: &[S]) -> Vec<String> {
        let mut args = match self {
            Self::MirrorToDisk { config, dest_dir } => vec![
                "--config".to_string(),
                path_arg(config),
                file_url(dest_dir),
                V2_FLAG.to_string(),
            ],
            Self::DiskToMirror {
                config,
                source_dir,
                dest_registry,
            } => vec![
                "--config".to_string(),
                path_arg(config),
                "--from".to_string(),
                file_url(source_dir),
                docker_url(dest_registry),
                V2_FLAG.to_string(),
            ],
            Self::MirrorToMirror {
                config,
                workspace,
                dest_registry,
            } => vec![
                "--config".to_string(),
                path_arg(config),
                "--workspace".to_string(),
                file_url(workspace),
                docker_url(dest_registry),
                V2_FLAG.to_string(),
            ],
        };
        args.extend(extra.iter().map(|s| s.as_ref().to_string()));
        args
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

fn file_url(path: &Path) -> String {
    format!("{FILE_SCHEME}{}", path.display())
}

fn docker_url(registry: &str) -> String {
    format!("{DOCKER_SCHEME}{registry}")
}
