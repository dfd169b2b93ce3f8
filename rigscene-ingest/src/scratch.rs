//! Run-scoped scratch space.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// A scratch directory that is removed, recursively, when dropped.
///
/// Because removal happens in `Drop`, the directory is released on every
/// exit path of the run that owns it, including early `?` returns.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a scratch directory under the system temp dir.
    pub fn create(prefix: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        debug!("Created scratch dir {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Create a scratch directory under `parent`.
    pub fn create_in(parent: &Path, prefix: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(parent)?;
        debug!("Created scratch dir {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Remove the directory now and report failures.
    pub fn close(self) -> io::Result<()> {
        debug!("Removing scratch dir {}", self.dir.path().display());
        self.dir.close()
    }
}
