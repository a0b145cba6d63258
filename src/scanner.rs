//! File discovery under source and third-party folders
//!
//! [`FileScanner`] finds files whose name matches a glob, recursively, and
//! remembers the answer per folder and pattern for the rest of the run. File
//! names are matched case-insensitively (`*.dll` finds `Foo.DLL`), matching
//! the file systems descriptors are written for.
//!
//! ```rust,no_run
//! use slngen_cli::scanner::FileScanner;
//! use std::path::PathBuf;
//!
//! # fn example() -> anyhow::Result<()> {
//! let scanner = FileScanner::new();
//! let descriptors = scanner.scan("*.csproj", &[PathBuf::from("src")])?;
//! println!("found {} descriptors", descriptors.len());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use dashmap::DashMap;
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::core::SlnError;
use crate::utils::path::{self, path_key};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Recursive, cached file-name glob search.
#[derive(Debug, Default)]
pub struct FileScanner {
    cache: DashMap<String, Arc<Vec<PathBuf>>>,
}

impl FileScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Files under every folder in `dirs` whose name matches `pattern`.
    ///
    /// Results keep folder order; each folder's files are sorted. A file
    /// reachable from two folders is listed once.
    pub fn scan(&self, pattern: &str, dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for dir in dirs {
            for file in self.scan_dir(pattern, dir)?.iter() {
                if seen.insert(path_key(file)) {
                    files.push(file.clone());
                }
            }
        }
        Ok(files)
    }

    /// Files under `dir` whose name matches `pattern`, cached per folder.
    pub fn scan_dir(&self, pattern: &str, dir: &Path) -> Result<Arc<Vec<PathBuf>>> {
        let dir = path::absolutize(dir)?;
        let key = format!("{}|{}", path_key(&dir), pattern.to_lowercase());
        if let Some(cached) = self.cache.get(&key) {
            trace!("Scan cache hit for '{}' in {}", pattern, dir.display());
            return Ok(Arc::clone(cached.value()));
        }

        if !dir.is_dir() {
            return Err(SlnError::FolderNotFound {
                path: dir.display().to_string(),
            }
            .into());
        }

        let matcher = Pattern::new(pattern).with_context(|| format!("Invalid glob pattern: {pattern}"))?;
        debug!("Searching for pattern '{}' in {}", pattern, dir.display());

        let mut files: Vec<PathBuf> = WalkDir::new(&dir)
            .follow_links(false)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| matcher.matches_with(&entry.file_name().to_string_lossy(), MATCH_OPTIONS))
            .map(walkdir::DirEntry::into_path)
            .collect();
        files.sort();

        debug!("Found {} matches for pattern '{}' in {}", files.len(), pattern, dir.display());
        let files = Arc::new(files);
        self.cache.insert(key, Arc::clone(&files));
        Ok(files)
    }

    /// Number of cached folder scans.
    #[must_use]
    pub fn cached_scans(&self) -> usize {
        self.cache.len()
    }
}

/// Resolve a folder: absolute paths as-is, relative ones against each search root
/// folder in turn, then the current directory.
pub fn locate_folder(folder: &Path, search_roots: &[PathBuf]) -> Result<PathBuf> {
    locate(folder, search_roots, Path::is_dir).ok_or_else(|| {
        SlnError::FolderNotFound {
            path: folder.display().to_string(),
        }
        .into()
    })
}

/// Resolve a file the same way as [`locate_folder`].
pub fn locate_file(file: &Path, search_roots: &[PathBuf]) -> Result<PathBuf> {
    locate(file, search_roots, Path::is_file).ok_or_else(|| {
        SlnError::FileNotFound {
            path: file.display().to_string(),
        }
        .into()
    })
}

fn locate(target: &Path, search_roots: &[PathBuf], exists: fn(&Path) -> bool) -> Option<PathBuf> {
    if target.is_absolute() {
        let normalized = path::normalize(target);
        return exists(&normalized).then_some(normalized);
    }

    search_roots
        .iter()
        .map(|search_root| path::resolve(search_root, target))
        .chain(path::absolutize(target).ok())
        .find(|candidate| exists(candidate))
}
