//! Checks applied to what a mirroring run left behind.

use std::path::{Path, PathBuf};

use mirrorcheck_common::constants;
use mirrorcheck_common::error::MirrorcheckError;
use mirrorcheck_runner::{ExecutionResult, Outcome};

use crate::error::{HarnessError, Result};

/// Requires that `result` ran to completion with exit code 0.
///
/// # Errors
///
/// Returns `Execution` if the binary did not run, or `CommandFailed` with
/// the captured output if it exited non-zero.
pub fn expect_command_success(step: &str, result: ExecutionResult) -> Result<ExecutionResult> {
    match result.outcome {
        Outcome::Completed { exit_code: 0 } => Ok(result),
        Outcome::Completed { exit_code } => Err(HarnessError::CommandFailed {
            step: step.to_string(),
            exit_code,
            stdout: result.stdout,
            stderr: result.stderr,
        }),
        Outcome::FailedToExecute(source) => Err(HarnessError::Execution {
            step: step.to_string(),
            source,
            stdout: result.stdout,
            stderr: result.stderr,
        }),
    }
}

/// Requires `<work_dir>/working-dir` and each of `expected` inside it.
///
/// # Errors
///
/// Returns `MissingDirectory` for the first directory that is absent.
pub fn expect_working_dir_structure<S: AsRef<str>>(work_dir: &Path, expected: &[S]) -> Result<()> {
    let working_dir = work_dir.join(constants::WORKING_DIR);
    require_dir(&working_dir)?;
    for dir in expected {
        require_dir(&working_dir.join(dir.as_ref()))?;
    }
    Ok(())
}

/// Requires at least one `mirror_*.tar` in `work_dir`, all non-empty.
/// Returns the archives found, sorted by name.
///
/// # Errors
///
/// Returns `MissingArchive` if none exist, `EmptyArchive` for a zero-byte
/// archive, or an I/O error if the directory cannot be read.
pub fn expect_tar_archive_exists(work_dir: &Path) -> Result<Vec<PathBuf>> {
    let archives = find_archives(work_dir)?;
    if archives.is_empty() {
        return Err(HarnessError::MissingArchive {
            dir: work_dir.to_path_buf(),
        });
    }
    for archive in &archives {
        let size = std::fs::metadata(archive)
            .map_err(|e| MirrorcheckError::Io {
                path: archive.clone(),
                source: e,
            })?
            .len();
        if size == 0 {
            return Err(HarnessError::EmptyArchive {
                path: archive.clone(),
            });
        }
    }
    Ok(archives)
}

/// Requires a non-empty catalog in which every `expected` fragment occurs
/// in some repository name.
///
/// # Errors
///
/// Returns `EmptyCatalog` or `MissingRepository`.
pub fn expect_repositories_exist<S: AsRef<str>>(repos: &[String], expected: &[S]) -> Result<()> {
    if repos.is_empty() {
        return Err(HarnessError::EmptyCatalog);
    }
    for fragment in expected {
        let fragment = fragment.as_ref();
        if !repos.iter().any(|repo| repo.contains(fragment)) {
            return Err(HarnessError::MissingRepository {
                expected: fragment.to_string(),
                actual: repos.to_vec(),
            });
        }
    }
    Ok(())
}

fn require_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(HarnessError::MissingDirectory {
            path: path.to_path_buf(),
        })
    }
}

fn find_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| MirrorcheckError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut archives = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| MirrorcheckError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(constants::ARCHIVE_PREFIX) && name.ends_with(constants::ARCHIVE_SUFFIX) {
            archives.push(entry.path());
        }
    }
    archives.sort();
    Ok(archives)
}
