//! Temporary work directories seeded with release signatures.

use std::path::{Path, PathBuf};

use mirrorcheck_common::constants;
use mirrorcheck_common::error::MirrorcheckError;
use tempfile::TempDir;

use crate::error::{HarnessError, Result};

/// A scratch directory the mirroring tool writes into, removed on drop.
#[derive(Debug)]
pub struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    /// Creates a work dir and copies the release signatures from `keys_dir`
    /// into `working-dir/signatures`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or `keys_dir`
    /// cannot be read or copied from.
    pub fn create(keys_dir: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(constants::WORK_DIR_PREFIX)
            .tempdir()
            .map_err(|e| io_error(std::env::temp_dir(), e))?;

        let signatures = dir.path().join(constants::WORKING_DIR).join("signatures");
        std::fs::create_dir_all(&signatures).map_err(|e| io_error(signatures.clone(), e))?;

        let copied = copy_signatures(keys_dir, &signatures)?;
        tracing::debug!(
            work_dir = %dir.path().display(),
            signatures = copied,
            "work dir ready"
        );
        Ok(Self { dir })
    }

    /// Root of the work dir, passed to the mirroring tool.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The `working-dir` the mirroring tool populates.
    #[must_use]
    pub fn working_dir(&self) -> PathBuf {
        self.dir.path().join(constants::WORKING_DIR)
    }

    /// Removes the work dir now, reporting failures instead of ignoring them.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| HarnessError::from(io_error(path, e)))
    }
}

/// Copies every file whose name contains the release signature marker.
fn copy_signatures(keys_dir: &Path, dest: &Path) -> Result<usize> {
    let entries = std::fs::read_dir(keys_dir).map_err(|e| io_error(keys_dir.to_path_buf(), e))?;
    let mut copied = 0;
    for entry in entries {
        let entry = entry.map_err(|e| io_error(keys_dir.to_path_buf(), e))?;
        let name = entry.file_name();
        if !name
            .to_string_lossy()
            .contains(constants::SIGNATURE_FILE_MARKER)
        {
            continue;
        }
        let target = dest.join(&name);
        let _ = std::fs::copy(entry.path(), &target).map_err(|e| io_error(target.clone(), e))?;
        copied += 1;
    }
    Ok(copied)
}

fn io_error(path: PathBuf, source: std::io::Error) -> MirrorcheckError {
    MirrorcheckError::Io { path, source }
}
