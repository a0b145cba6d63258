//! File system utilities
//!
//! Atomic writes for generated solution files, text and TOML reading with
//! path context and change-aware binary copies.
//!
//! # Examples
//!
//! ```rust,no_run
//! use slngen_cli::utils::fs::{ensure_dir, write_with_bom};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! ensure_dir(Path::new("out"))?;
//! write_with_bom(Path::new("out/All.sln"), "\r\nMicrosoft Visual Studio Solution File\r\n")?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::SlnError;

/// UTF-8 byte order mark written at the start of solution files.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// Fails when the path exists but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Safely writes a string to a file using [`atomic_write`].
pub fn safe_write(path: &Path, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Atomically writes bytes to a file.
///
/// The content goes to a temporary file in the target directory first, is
/// synced, then persisted over the target. Readers never observe a partially
/// written file. Parent directories are created when missing.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_dir(&parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(&parent)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;

    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file for: {}", path.display()))?;
    temp.as_file().sync_all().with_context(|| "Failed to sync file to disk")?;

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace file: {}", path.display()))?;

    Ok(())
}

/// Writes text prefixed with the UTF-8 byte order mark.
pub fn write_with_bom(path: &Path, content: &str) -> Result<()> {
    let mut bytes = Vec::with_capacity(UTF8_BOM.len() + content.len());
    bytes.extend_from_slice(UTF8_BOM);
    bytes.extend_from_slice(content.as_bytes());
    atomic_write(path, &bytes)
}

/// Reads a text file, naming the path on failure.
pub fn read_text_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Reads and deserializes a TOML file.
pub fn read_toml_file<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = read_text_file(path)?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Copies `src` to `dst` unless `dst` already has the same size and
/// modification time.
///
/// The copy carries the source modification time over, so a second call
/// with unchanged input is a no-op. Returns whether a copy happened.
pub fn copy_if_changed(src: &Path, dst: &Path) -> Result<bool> {
    let src_meta = fs::metadata(src).with_context(|| SlnError::FileSystemError {
        operation: "read metadata".to_string(),
        path: src.display().to_string(),
    })?;
    let src_modified = src_meta.modified().ok();

    if let Ok(dst_meta) = fs::metadata(dst)
        && dst_meta.len() == src_meta.len()
        && dst_meta.modified().ok() == src_modified
    {
        return Ok(false);
    }

    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }

    fs::copy(src, dst).with_context(|| SlnError::FileSystemError {
        operation: format!("copy from {}", src.display()),
        path: dst.display().to_string(),
    })?;

    if let Some(modified) = src_modified {
        let file = fs::OpenOptions::new()
            .write(true)
            .open(dst)
            .with_context(|| format!("Failed to open copied file: {}", dst.display()))?;
        file.set_modified(modified)
            .with_context(|| format!("Failed to set modification time: {}", dst.display()))?;
    }

    Ok(true)
}
