//! Framework (system) assembly recognition
//!
//! References to platform assemblies are never build dependencies. They are
//! recognized by name: a fixed set of core assemblies, every `*.dll` found in
//! the framework installation folders, and configurable name prefixes.

use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{
    BUILTIN_SYSTEM_ASSEMBLIES, DEFAULT_FRAMEWORK_PREFIXES, FRAMEWORK_SUBFOLDERS,
    PROGRAM_FILES_VARIABLES, THIRD_PARTY_PATTERN,
};
use crate::scanner::FileScanner;

/// Names and prefixes of framework assemblies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemAssemblies {
    names: HashSet<String>,
    prefixes: Vec<String>,
}

impl Default for SystemAssemblies {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SystemAssemblies {
    /// Core assembly names and the default prefixes; no folders scanned.
    #[must_use]
    pub fn builtin() -> Self {
        let prefixes: Vec<String> = DEFAULT_FRAMEWORK_PREFIXES.iter().map(|p| (*p).to_string()).collect();
        Self::with_prefixes(&prefixes)
    }

    /// Core assembly names with custom prefixes.
    #[must_use]
    pub fn with_prefixes(prefixes: &[String]) -> Self {
        Self {
            names: BUILTIN_SYSTEM_ASSEMBLIES.iter().map(|n| n.to_lowercase()).collect(),
            prefixes: prefixes.iter().filter(|p| !p.is_empty()).map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Scan the framework installation folders found on this machine, then
    /// every folder in `extra_folders`.
    ///
    /// Missing installation folders are skipped; a missing extra folder fails.
    pub fn discover(scanner: &FileScanner, extra_folders: &[PathBuf], prefixes: &[String]) -> Result<Self> {
        let mut assemblies = Self::with_prefixes(prefixes);

        for folder in installation_folders() {
            assemblies.add_folder(scanner, &folder)?;
        }
        for folder in extra_folders {
            assemblies.add_folder(scanner, folder)?;
        }

        debug!("Recognizing {} framework assemblies", assemblies.len());
        Ok(assemblies)
    }

    /// Add the file stem of every `*.dll` under `folder`.
    pub fn add_folder(&mut self, scanner: &FileScanner, folder: &Path) -> Result<usize> {
        let files = scanner.scan_dir(THIRD_PARTY_PATTERN, folder)?;
        let before = self.names.len();
        for file in files.iter() {
            if let Some(stem) = file.file_stem() {
                self.names.insert(stem.to_string_lossy().to_lowercase());
            }
        }
        Ok(self.names.len() - before)
    }

    /// Recognize one more assembly name.
    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_lowercase());
    }

    /// Whether a reference with this (resolved) include is a framework assembly.
    #[must_use]
    pub fn is_system(&self, include: &str) -> bool {
        let include = include.to_lowercase();
        self.names.contains(&include) || self.prefixes.iter().any(|prefix| include.starts_with(prefix))
    }

    /// Number of known assembly names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Framework folders that exist on this machine.
fn installation_folders() -> Vec<PathBuf> {
    let mut folders = Vec::new();
    for variable in PROGRAM_FILES_VARIABLES {
        let Some(root) = std::env::var_os(variable).map(PathBuf::from) else {
            continue;
        };
        for sub in FRAMEWORK_SUBFOLDERS {
            let folder = root.join(sub);
            if folder.is_dir() && !folders.contains(&folder) {
                folders.push(folder);
            }
        }
    }
    if let Some(windows) = std::env::var_os("windir").map(PathBuf::from) {
        let cache = windows.join("assembly");
        if cache.is_dir() {
            folders.push(cache);
        }
    }
    folders
}
