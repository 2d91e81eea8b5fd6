//! `mirrorcheck preflight`: Check binaries and artifacts before a run.

use std::path::{Path, PathBuf};

use mirrorcheck_common::config::HarnessConfig;

use crate::output;

/// Executes the `preflight` command.
///
/// Resolves both binaries through `PATH` and validates the artifact
/// layout, reporting every problem rather than stopping at the first.
///
/// # Errors
///
/// Returns an error if any check fails.
pub fn execute(config: &HarnessConfig) -> anyhow::Result<()> {
    let mut problems = 0usize;

    for (label, binary) in [
        ("mirroring binary", &config.binary),
        ("registry binary", &config.registry_binary),
    ] {
        match resolve(binary) {
            Ok(path) => println!("{}", output::check_ok(label, &path.display().to_string())),
            Err(e) => {
                problems += 1;
                println!("{}", output::check_failed(label, &e.to_string()));
            }
        }
    }

    match config.validate() {
        Ok(()) => println!(
            "{}",
            output::check_ok("artifacts", &config.artifacts_dir.display().to_string())
        ),
        Err(e) => {
            problems += 1;
            println!("{}", output::check_failed("artifacts", &e.to_string()));
        }
    }

    let key = config.signature_key();
    if key.is_file() {
        println!("{}", output::check_ok("signature key", &key.display().to_string()));
    } else {
        problems += 1;
        println!(
            "{}",
            output::check_failed("signature key", &format!("not found: {}", key.display()))
        );
    }

    if problems > 0 {
        anyhow::bail!("preflight found {problems} problem(s)");
    }
    tracing::info!("preflight passed");
    Ok(())
}

/// Resolves `binary` through `PATH`, or checks it directly when it
/// contains a path separator.
fn resolve(binary: &Path) -> Result<PathBuf, which::Error> {
    which::which(binary)
}
