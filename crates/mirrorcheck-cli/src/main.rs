//! # mirrorcheck: oc-mirror integration checks
//!
//! Starts a throwaway registry, drives the mirroring binary through its
//! modes, and verifies what it produced.

mod commands;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    commands::execute(cli).await
}
