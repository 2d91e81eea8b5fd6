//! `mirrorcheck m2d-d2m | m2m | all`: Run mirroring scenarios.

use clap::Args;
use mirrorcheck_common::config::HarnessConfig;
use mirrorcheck_harness::{Scenario, SuiteFixture};

use crate::output;

/// Arguments for the `all` command.
#[derive(Args, Debug)]
pub struct AllArgs {
    /// Run the remaining scenarios after a failure.
    #[arg(long)]
    pub keep_going: bool,
}

/// Runs `scenarios` in order against a single suite fixture.
///
/// Ctrl-C cancels the suite token, which stops the running binary and the
/// registry before the scenario reports its failure.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any scenario fails.
pub async fn execute(
    config: HarnessConfig,
    scenarios: &[Scenario],
    keep_going: bool,
) -> anyhow::Result<()> {
    config.validate()?;
    let suite = SuiteFixture::new(config);

    let interrupt = suite.token().clone();
    let _ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling suite");
            interrupt.cancel();
        }
    });

    let mut failed = 0usize;
    let mut ran = 0usize;
    for &scenario in scenarios {
        ran += 1;
        match scenario.run(&suite).await {
            Ok(report) => {
                println!("{}", output::passed(&scenario.to_string(), report.duration));
                for repo in &report.repositories {
                    println!("    {repo}");
                }
            }
            Err(e) => {
                failed += 1;
                println!("{}", output::failed(&scenario.to_string()));
                println!("    {e}");
                if !keep_going {
                    break;
                }
            }
        }
    }

    println!("{}", output::summary(ran, failed, scenarios.len()));
    if failed > 0 {
        anyhow::bail!("{failed} of {ran} scenarios failed");
    }
    Ok(())
}
