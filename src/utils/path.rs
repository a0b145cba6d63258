//! Path helpers for descriptor-relative resolution
//!
//! Descriptors store Windows style paths (`..\Common\bin\Debug\`). These
//! helpers convert them to host paths, resolve them lexically, and derive the
//! case-insensitive keys the loader indexes by.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Convert a path written inside a descriptor to a host path.
///
/// Backslashes become the host separator. Surrounding whitespace is trimmed.
pub fn from_msbuild(value: &str) -> PathBuf {
    let trimmed = value.trim();
    if std::path::MAIN_SEPARATOR == '\\' {
        PathBuf::from(trimmed)
    } else {
        PathBuf::from(trimmed.replace('\\', "/"))
    }
}

/// Collapse `.` and `..` components without touching the file system.
///
/// `..` above the root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    result.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    result.pop();
                } else if !result.has_root() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

/// Join `relative` onto `base` (unless it is already absolute) and normalize.
pub fn resolve(base: &Path, relative: &Path) -> PathBuf {
    if relative.is_absolute() {
        normalize(relative)
    } else {
        normalize(&base.join(relative))
    }
}

/// Make a path absolute against the current directory, lexically.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to make path absolute: {}", path.display()))?;
    Ok(normalize(&absolute))
}

/// Case-insensitive identity key for a path.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

/// Render a path with backslash separators, as solution files expect.
pub fn to_backslashes(path: &Path) -> String {
    path.to_string_lossy().replace('/', "\\")
}

/// Whether `path` has the given extension, ignoring case.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}
