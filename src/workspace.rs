//! Temporary workspace management
//!
//! Every subprocess execution gets its own uniquely named scratch directory
//! holding the generated source file. The directory is removed when the
//! workspace is dropped, which covers every exit path: success, timeout,
//! fault, or panic during the case. Unique naming (random suffix, not a
//! timestamp) is what lets concurrent judge invocations share the system
//! temp directory without locking.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Scratch directory for one subprocess execution.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("tai-judge-")
            .tempdir()
            .context("failed to create judge workspace")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the (already harnessed) submission source into the workspace.
    pub fn write_source(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(file_name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write source file {}", path.display()))?;
        Ok(path)
    }
}
