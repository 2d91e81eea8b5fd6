//! `mirrorcheck config`: Print the resolved configuration.

use mirrorcheck_common::config::HarnessConfig;

/// Executes the `config` command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized.
pub fn execute(config: &HarnessConfig) -> anyhow::Result<()> {
    println!("{}", config.to_json()?);
    Ok(())
}
