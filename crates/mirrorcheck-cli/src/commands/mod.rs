//! CLI command definitions and dispatch.

pub mod config;
pub mod preflight;
pub mod run;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use mirrorcheck_common::config::HarnessConfig;
use mirrorcheck_common::constants;
use mirrorcheck_harness::Scenario;

/// mirrorcheck: integration checks for the oc-mirror image mirroring tool.
#[derive(Parser, Debug)]
#[command(name = "mirrorcheck", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the registry config and key material.
    #[arg(long, global = true, env = constants::ENV_ARTIFACTS_DIR, default_value = ".")]
    pub artifacts_dir: PathBuf,

    /// Mirroring binary to test.
    #[arg(
        long,
        global = true,
        env = constants::ENV_MIRROR_BINARY,
        default_value = constants::DEFAULT_MIRROR_BINARY
    )]
    pub binary: PathBuf,

    /// Port for the local registry.
    #[arg(long, global = true, default_value_t = constants::DEFAULT_REGISTRY_PORT)]
    pub port: u16,

    /// Seconds to wait for the registry to answer its health probe.
    #[arg(long, global = true, default_value_t = constants::DEFAULT_READY_TIMEOUT.as_secs())]
    pub ready_timeout_secs: u64,
}

impl Cli {
    /// Resolves the harness configuration from the global flags.
    #[must_use]
    pub fn config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::from_artifacts_dir(&self.artifacts_dir);
        config.binary.clone_from(&self.binary);
        config.registry_port = self.port;
        config.ready_timeout = Duration::from_secs(self.ready_timeout_secs);
        config
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mirror to disk, then push the archive to a local registry.
    #[command(name = "m2d-d2m")]
    MirrorToDiskThenDiskToMirror,
    /// Mirror directly into a local registry.
    #[command(name = "m2m")]
    MirrorToMirror,
    /// Run every scenario in order.
    All(run::AllArgs),
    /// Check that binaries and artifacts are in place.
    Preflight,
    /// Print the resolved configuration as JSON.
    Config,
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command fails.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config();
    match cli.command {
        Command::MirrorToDiskThenDiskToMirror => {
            run::execute(config, &[Scenario::MirrorToDiskThenDiskToMirror], false).await
        }
        Command::MirrorToMirror => run::execute(config, &[Scenario::MirrorToMirror], false).await,
        Command::All(args) => run::execute(config, &Scenario::ALL, args.keep_going).await,
        Command::Preflight => preflight::execute(&config),
        Command::Config => config::execute(&config),
    }
}
