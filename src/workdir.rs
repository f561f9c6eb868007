//! Working-directory lifecycle for the extracted archive.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::Result;

/// Name prefix shared by every working directory this tool creates.
const PREFIX: &str = "epub-replenish.";

/// Exclusive staging directory for one input file.
///
/// Removed when dropped, on every exit path out of per-file processing.
pub struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    /// Sweep stale working directories left behind by aborted runs, then
    /// create a fresh one under the system temp dir.
    pub fn create() -> Result<Self> {
        sweep_stale();
        let dir = tempfile::Builder::new().prefix(PREFIX).tempdir()?;
        debug!(dir = %dir.path().display(), "working directory created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        debug!(dir = %self.dir.path().display(), "removing working directory");
    }
}

/// Remove leftover prefixed directories in the system temp dir. Runs before
/// the current directory is created, so everything matching is stale.
fn sweep_stale() {
    let tmp = std::env::temp_dir();
    let Ok(entries) = fs::read_dir(&tmp) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(PREFIX) {
            continue;
        }
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        match fs::remove_dir_all(&path) {
            Ok(()) => debug!(dir = %path.display(), "swept stale working directory"),
            Err(e) => {
                warn!(dir = %path.display(), "could not sweep stale working directory: {e}")
            }
        }
    }
}
