//! Write-to-temp-then-rename file replacement

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;

/// Temp path used while staging a replacement for `path`
fn temp_path(path: &Path) -> PathBuf {
    path.with_extension("tmp")
}

/// A fully written replacement file that has not been moved into place yet.
///
/// Dropping an uncommitted write removes the temp file, leaving the target untouched.
#[derive(Debug)]
pub struct StagedWrite {
    temp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedWrite {
    /// Write `contents` to a temp file next to `target` and flush it to disk
    pub fn stage(target: &Path, contents: &[u8]) -> Result<Self> {
        // Constructed first so a failed write still cleans up the temp file
        let staged = Self {
            temp: temp_path(target),
            target: target.to_path_buf(),
            committed: false,
        };

        let mut file = File::create(&staged.temp)?;
        file.write_all(contents)?;
        file.sync_all()?;

        Ok(staged)
    }

    /// Atomically move the staged file over the target
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.temp, &self.target)?;
        self.committed = true;
        debug!("Committed {:?}", self.target);
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed && self.temp.exists() {
            if let Err(e) = fs::remove_file(&self.temp) {
                warn!("Failed to remove temp file {:?}: {}", self.temp, e);
            }
        }
    }
}

/// Replace `path` with `contents` so readers see either the old or the new file
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    StagedWrite::stage(path, contents)?.commit()
}
