//! Temporary source trees on disk

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use super::DescriptorBuilder;
use crate::constants::DEFAULT_CONFIG_FILE;

/// A source tree rooted in a temporary directory.
///
/// The directory is removed when the workspace is dropped.
pub struct TestWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl TestWorkspace {
    /// Create an empty workspace.
    pub fn new() -> Result<Self> {
        super::init_test_logging(None);

        let temp_dir = TempDir::new()?;
        let root = crate::utils::absolutize(temp_dir.path())?;
        Ok(Self {
            temp_dir,
            root,
        })
    }

    /// Absolute path of `relative` inside the workspace.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write_file(&self, relative: &str, content: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Render `descriptor` to `relative`.
    pub fn write_descriptor(&self, relative: &str, descriptor: &DescriptorBuilder) -> Result<PathBuf> {
        self.write_file(relative, descriptor.build())
    }

    /// Create an empty directory.
    pub fn create_dir(&self, relative: &str) -> Result<PathBuf> {
        let path = self.path(relative);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Write the default configuration file at the workspace root.
    pub fn write_config(&self, content: &str) -> Result<PathBuf> {
        self.write_file(DEFAULT_CONFIG_FILE, content)
    }

    /// Read a file inside the workspace as text.
    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.path(relative);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Whether `relative` exists.
    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }
}
