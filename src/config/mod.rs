//! Configuration for slngen
//!
//! A run is described by one TOML file (`slngen.toml` by default) that names
//! the source tree, where to look for descriptors and third-party binaries,
//! the resolution policy, and named groups of root projects.
//!
//! ```toml
//! root = "."
//! source-folders = ["src"]
//! third-party-folders = ["packages"]
//! append-to-solution = "# Generated by slngen"
//!
//! [policy]
//! when-contains-project-references = "fail"
//! assembly-key-file = "keys/acme.snk"
//!
//! [[groups]]
//! name = "web"
//! projects = ["Acme.Web", "tools/Acme.Migrate/Acme.Migrate.csproj"]
//!
//! [[groups]]
//! name = "everything"
//! groups = ["web", "services"]
//! ```
//!
//! Loading happens in two steps. [`ToolkitConfig::load`] deserializes the file
//! as written; [`ToolkitConfig::resolve`] turns it into a [`ResolvedConfig`]
//! with absolute, existing folders and flattened groups. Every check that
//! can fail for a bad configuration happens in the second step, before any
//! descriptor is read.

pub mod groups;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::DEFAULT_FRAMEWORK_PREFIXES;
use crate::policy::ResolutionPolicy;
use crate::scanner::{locate_file, locate_folder};
use crate::utils::fs::read_toml_file;
use crate::utils::path;

pub use groups::{GroupSet, ProjectGroup};

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_framework_prefixes() -> Vec<String> {
    DEFAULT_FRAMEWORK_PREFIXES.iter().map(|p| (*p).to_string()).collect()
}

/// The configuration file as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToolkitConfig {
    /// Source root, relative to the configuration file's directory.
    pub root: PathBuf,

    /// Folders searched for descriptors. Empty means the root.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub source_folders: Vec<PathBuf>,

    /// Folders whose `*.dll` files are third-party binaries.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub third_party_folders: Vec<PathBuf>,

    /// Extra folders whose `*.dll` files are framework assemblies.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub framework_folders: Vec<PathBuf>,

    /// Assembly-name prefixes of framework assemblies.
    pub framework_prefixes: Vec<String>,

    /// Line emitted after the fixed solution header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append_to_solution: Option<String>,

    /// Default destination of `copy-third-parties`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binaries_output: Option<PathBuf>,

    pub policy: ResolutionPolicy,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<ProjectGroup>,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            source_folders: Vec::new(),
            third_party_folders: Vec::new(),
            framework_folders: Vec::new(),
            framework_prefixes: default_framework_prefixes(),
            append_to_solution: None,
            binaries_output: None,
            policy: ResolutionPolicy::default(),
            groups: Vec::new(),
        }
    }
}

/// A configuration with every path made absolute and checked.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The configuration file itself.
    pub config_path: PathBuf,
    pub root: PathBuf,
    pub source_folders: Vec<PathBuf>,
    pub third_party_folders: Vec<PathBuf>,
    pub framework_folders: Vec<PathBuf>,
    pub framework_prefixes: Vec<String>,
    pub append_to_solution: Option<String>,
    /// Not required to exist yet.
    pub binaries_output: Option<PathBuf>,
    /// Policy with `required-project-files` and `assembly-key-file` absolute.
    pub policy: ResolutionPolicy,
    pub groups: GroupSet,
}

impl ResolvedConfig {
    /// Directory holding the configuration file.
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_path.parent().map(Path::to_path_buf).unwrap_or_default()
    }
}

impl ToolkitConfig {
    /// Read and deserialize a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        read_toml_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    /// Parse configuration text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    /// Load `path` and resolve it in one step.
    pub fn load_resolved(path: &Path) -> Result<ResolvedConfig> {
        let config_path = path::absolutize(path)?;
        Self::load(&config_path)?.resolve(&config_path)
    }

    /// Make every path absolute against the source root and flatten groups.
    ///
    /// `config_path` is the file this configuration was read from; the root
    /// is relative to its directory.
    pub fn resolve(self, config_path: &Path) -> Result<ResolvedConfig> {
        let config_path = path::absolutize(config_path)?;
        let config_dir = config_path.parent().map(Path::to_path_buf).unwrap_or_default();

        let root = locate_folder(&path::from_msbuild(&self.root.to_string_lossy()), std::slice::from_ref(&config_dir))
            .context("Source root folder not found")?;
        let search_roots = [root.clone()];
        info!("Source root folder is: {}", root.display());

        let mut source_folders = locate_folders(&self.source_folders, &search_roots)?;
        if source_folders.is_empty() {
            source_folders.push(root.clone());
        }
        let third_party_folders = locate_folders(&self.third_party_folders, &search_roots)?;
        let framework_folders = locate_folders(&self.framework_folders, &search_roots)?;

        let mut policy = self.policy;
        policy.required_project_files = policy
            .required_project_files
            .iter()
            .map(|file| locate_file(&path::from_msbuild(&file.to_string_lossy()), &search_roots))
            .collect::<Result<Vec<_>>>()
            .context("Required project file not found")?;
        policy.assembly_key_file = policy
            .assembly_key_file
            .as_deref()
            .map(|file| locate_file(&path::from_msbuild(&file.to_string_lossy()), &search_roots))
            .transpose()
            .context("Assembly key file not found")?;

        let binaries_output = self
            .binaries_output
            .as_deref()
            .map(|folder| path::resolve(&root, &path::from_msbuild(&folder.to_string_lossy())));

        let groups = GroupSet::flatten(&self.groups)?;
        debug!(
            "Configuration has {} source folders, {} third-party folders, {} groups",
            source_folders.len(),
            third_party_folders.len(),
            groups.len()
        );

        Ok(ResolvedConfig {
            config_path,
            root,
            source_folders,
            third_party_folders,
            framework_folders,
            framework_prefixes: self.framework_prefixes,
            append_to_solution: self.append_to_solution,
            binaries_output,
            policy,
            groups,
        })
    }

    /// A commented sample configuration for `slngen init`.
    #[must_use]
    pub fn example() -> String {
        r##"# slngen configuration
#
# Paths are relative to `root`, which is relative to this file.
root = "."

# Folders searched for *.csproj descriptors (default: the root).
source-folders = ["src"]

# Folders holding third-party binaries. References to *.dll files found
# here are listed in the solution's .thirdparties sidecar.
third-party-folders = []

# Extra folders whose *.dll files are framework assemblies.
# framework-folders = ["tools/reference-assemblies"]

# References whose name starts with one of these are framework assemblies.
framework-prefixes = ["Microsoft."]

# Line added after the solution header.
# append-to-solution = "# Generated by slngen"

# Destination of `slngen copy-third-parties`.
# binaries-output = "bin"

# How loading and walking react to anomalies: "accept", "warn" or "fail".
[policy]
when-contains-file-references = "accept"
when-contains-project-references = "warn"
when-reference-not-resolved = "fail"
when-reference-resolved-in-different-location = "warn"
when-required-file-not-found = "warn"
when-key-file-not-found = "accept"
# required-project-files = ["src/Shared/AssemblyVersion.cs"]
# assembly-key-file = "keys/acme.snk"

# Root projects, by assembly name or descriptor path.
[[groups]]
name = "all"
projects = []

# Groups can include other groups.
# [[groups]]
# name = "everything"
# groups = ["all"]
"##
        .to_string()
    }
}

fn locate_folders(folders: &[PathBuf], search_roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut located: Vec<PathBuf> = Vec::with_capacity(folders.len());
    for folder in folders {
        let folder = locate_folder(&path::from_msbuild(&folder.to_string_lossy()), search_roots)?;
        if !located.iter().any(|existing| path::path_key(existing) == path::path_key(&folder)) {
            located.push(folder);
        }
    }
    Ok(located)
}
