//! Reference walking: dependency closures, direct dependencies, third parties
//!
//! [`ReferenceWalker`] classifies every reference of a project as one of:
//!
//! 1. **Third-party** - the expected binary is a `*.dll` found under a search root
//!    folder. Recorded in the [`ThirdPartyUsage`] accumulator, never walked.
//! 2. **Framework** - the include names a known system assembly or starts with
//!    a framework prefix. Ignored.
//! 3. **Project** - resolved to a loaded project by identifier (project and
//!    platform-application references) or by output path (file references),
//!    falling back to a same-named `.dll`/`.exe` in the referencing project's
//!    own output folder.
//!
//! Closures recurse through project dependencies depth first; each
//! dependency's own closure precedes it, so a closure lists dependencies
//! before their dependents. Results are memoized per project identifier in a
//! [`WalkerCache`] owned by the caller, one table for closures and one for
//! direct dependencies. Cycle detection uses a visiting stack local to each
//! walk, so concurrent walks over one cache never see each other's paths.

pub mod system;

use anyhow::Result;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::constants::THIRD_PARTY_PATTERN;
use crate::core::SlnError;
use crate::loader::ProjectLoader;
use crate::policy::{PolicyRule, ResolutionPolicy};
use crate::project::{Project, ProjectId, Reference};
use crate::scanner::FileScanner;
use crate::utils::path::path_key;

pub use system::SystemAssemblies;

/// Project identifiers in first-insertion order without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosureSet {
    order: Vec<ProjectId>,
    members: HashSet<ProjectId>,
}

impl ClosureSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` unless already present. Returns whether it was added.
    pub fn insert(&mut self, id: ProjectId) -> bool {
        if self.members.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn contains(&self, id: &ProjectId) -> bool {
        self.members.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProjectId> {
        self.order.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ProjectId] {
        &self.order
    }
}

impl Extend<ProjectId> for ClosureSet {
    fn extend<I: IntoIterator<Item = ProjectId>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}

impl<'a> IntoIterator for &'a ClosureSet {
    type Item = &'a ProjectId;
    type IntoIter = std::slice::Iter<'a, ProjectId>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

/// Third-party binaries used by a walk, deduplicated case-insensitively and
/// kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThirdPartyUsage {
    files: BTreeMap<String, PathBuf>,
}

impl ThirdPartyUsage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a binary. Returns whether it was new.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        let key = path_key(&path);
        if self.files.contains_key(&key) {
            return false;
        }
        self.files.insert(key, path);
        true
    }

    /// Merge another accumulator into this one.
    pub fn merge(&mut self, other: &Self) {
        for path in other.files.values() {
            self.insert(path.clone());
        }
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(&path_key(path))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Recorded paths in case-insensitive order.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.values()
    }
}

/// Memoized result for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkEntry {
    /// Dependencies (never the project itself). For closures, each
    /// dependency's own dependencies come before it.
    pub dependencies: Vec<ProjectId>,
    /// Third-party binaries used by the project, and for closures by every
    /// dependency.
    pub third_parties: ThirdPartyUsage,
}

/// `*.dll` files found under a set of search root folders, keyed case-insensitively.
#[derive(Debug, Default)]
pub struct ThirdPartyIndex {
    files: HashMap<String, PathBuf>,
}

impl ThirdPartyIndex {
    /// The scanned path matching `path`, if any.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&PathBuf> {
        self.files.get(&path_key(path))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Memo tables shared by every walk of a run.
#[derive(Debug, Default)]
pub struct WalkerCache {
    closures: DashMap<ProjectId, Arc<WalkEntry>>,
    direct: DashMap<ProjectId, Arc<WalkEntry>>,
    third_party_files: DashMap<String, Arc<ThirdPartyIndex>>,
}

impl WalkerCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoized closure of a project, if already computed.
    #[must_use]
    pub fn closure(&self, id: &ProjectId) -> Option<Arc<WalkEntry>> {
        self.closures.get(id).map(|e| Arc::clone(e.value()))
    }

    /// Memoized direct dependencies of a project, if already computed.
    #[must_use]
    pub fn direct(&self, id: &ProjectId) -> Option<Arc<WalkEntry>> {
        self.direct.get(id).map(|e| Arc::clone(e.value()))
    }

    #[must_use]
    pub fn closure_count(&self) -> usize {
        self.closures.len()
    }

    #[must_use]
    pub fn direct_count(&self) -> usize {
        self.direct.len()
    }

    #[must_use]
    pub fn third_party_index_count(&self) -> usize {
        self.third_party_files.len()
    }

    /// Forget every memoized result.
    pub fn clear(&self) {
        self.closures.clear();
        self.direct.clear();
        self.third_party_files.clear();
    }
}

/// Computes dependency closures over a loaded project set.
pub struct ReferenceWalker<'a> {
    policy: &'a ResolutionPolicy,
    loader: &'a ProjectLoader,
    system: &'a SystemAssemblies,
    scanner: &'a FileScanner,
    cache: &'a WalkerCache,
}

impl<'a> ReferenceWalker<'a> {
    #[must_use]
    pub const fn new(
        policy: &'a ResolutionPolicy,
        loader: &'a ProjectLoader,
        system: &'a SystemAssemblies,
        scanner: &'a FileScanner,
        cache: &'a WalkerCache,
    ) -> Self {
        Self {
            policy,
            loader,
            system,
            scanner,
            cache,
        }
    }

    /// The loader projects are resolved against.
    #[must_use]
    pub const fn loader(&self) -> &'a ProjectLoader {
        self.loader
    }

    /// Every project needed to build `roots` (loading them if necessary),
    /// dependencies first, each root after its own dependencies.
    ///
    /// Third-party binaries used anywhere in the closure are added to `used`.
    pub fn walk_closure<P: AsRef<Path>>(
        &self,
        roots: &[P],
        third_party_dirs: &[PathBuf],
        used: &mut ThirdPartyUsage,
    ) -> Result<ClosureSet> {
        let index = self.third_party_index(third_party_dirs)?;
        let mut closure = ClosureSet::new();

        for root in roots {
            let project = self.loader.load(self.policy, root.as_ref())?;
            let mut visiting = Vec::new();
            let entry = self.closure_of(&project, &index, &mut visiting)?;
            closure.extend(entry.dependencies.iter().copied());
            closure.insert(project.id);
            used.merge(&entry.third_parties);
        }

        debug!("Closure of {} roots has {} projects", roots.len(), closure.len());
        Ok(closure)
    }

    /// Projects `project` references directly, in reference order.
    pub fn walk_direct(
        &self,
        project: &Project,
        third_party_dirs: &[PathBuf],
        used: &mut ThirdPartyUsage,
    ) -> Result<Vec<ProjectId>> {
        if let Some(cached) = self.cache.direct(&project.id) {
            used.merge(&cached.third_parties);
            return Ok(cached.dependencies.clone());
        }

        let index = self.third_party_index(third_party_dirs)?;
        let (projects, third_parties) = self.classify(project, &index)?;
        let entry = Arc::new(WalkEntry {
            dependencies: projects.iter().map(|p| p.id).collect(),
            third_parties,
        });
        let entry = Arc::clone(self.cache.direct.entry(project.id).or_insert(entry).value());

        used.merge(&entry.third_parties);
        Ok(entry.dependencies.clone())
    }

    fn closure_of(
        &self,
        project: &Arc<Project>,
        index: &ThirdPartyIndex,
        visiting: &mut Vec<Arc<Project>>,
    ) -> Result<Arc<WalkEntry>> {
        if let Some(cached) = self.cache.closure(&project.id) {
            trace!("Closure cache hit for {}", project.assembly_name);
            return Ok(cached);
        }

        if visiting.iter().any(|p| p.id == project.id) {
            let mut chain: Vec<String> =
                visiting.iter().map(|p| p.descriptor_path.display().to_string()).collect();
            chain.push(project.descriptor_path.display().to_string());
            return Err(SlnError::CircularReference {
                chain,
            }
            .into());
        }

        visiting.push(Arc::clone(project));
        let computed = self.compute_closure(project, index, visiting);
        visiting.pop();

        let entry = Arc::new(computed?);
        Ok(Arc::clone(self.cache.closures.entry(project.id).or_insert(entry).value()))
    }

    fn compute_closure(
        &self,
        project: &Project,
        index: &ThirdPartyIndex,
        visiting: &mut Vec<Arc<Project>>,
    ) -> Result<WalkEntry> {
        let (projects, mut third_parties) = self.classify(project, index)?;
        let mut dependencies = ClosureSet::new();

        for dependency in &projects {
            let entry = self.closure_of(dependency, index, visiting)?;
            dependencies.extend(entry.dependencies.iter().copied());
            dependencies.insert(dependency.id);
            third_parties.merge(&entry.third_parties);
        }

        Ok(WalkEntry {
            dependencies: dependencies.order,
            third_parties,
        })
    }

    /// Sort the references of `project` into project dependencies and
    /// third-party binaries.
    fn classify(
        &self,
        project: &Project,
        index: &ThirdPartyIndex,
    ) -> Result<(Vec<Arc<Project>>, ThirdPartyUsage)> {
        let mut projects: Vec<Arc<Project>> = Vec::new();
        let mut third_parties = ThirdPartyUsage::new();

        for reference in &project.references {
            if let Some(file) = index.get(&reference.resolved_hint_path) {
                third_parties.insert(file.clone());
                continue;
            }
            if self.system.is_system(&reference.resolved_include) {
                continue;
            }
            if let Some(dependency) = self.resolve_project(project, reference)?
                && !projects.iter().any(|p| p.id == dependency.id)
            {
                projects.push(dependency);
            }
        }

        Ok((projects, third_parties))
    }

    fn resolve_project(&self, project: &Project, reference: &Reference) -> Result<Option<Arc<Project>>> {
        let direct = if reference.kind.resolves_by_id() {
            reference.target.and_then(|id| self.loader.get_by_id(&id))
        } else {
            self.loader.get_by_output_path(&reference.resolved_hint_path)
        };
        if direct.is_some() {
            return Ok(direct);
        }

        let output_dir = project.resolved_output.parent().map(Path::to_path_buf).unwrap_or_default();
        let fallback = ["dll", "exe"].iter().find_map(|extension| {
            let candidate = output_dir.join(format!("{}.{extension}", reference.resolved_include));
            self.loader.get_by_output_path(&candidate)
        });

        match fallback {
            None => {
                self.policy.enforce(PolicyRule::ReferenceNotResolved, || {
                    format!(
                        "Reference {} was not resolved.\nProject {}.\nExpected location = {}",
                        reference.resolved_include,
                        project.descriptor_path.display(),
                        reference.resolved_hint_path.display()
                    )
                })?;
                Ok(None)
            }
            Some(found) => {
                self.policy.enforce(PolicyRule::ReferenceResolvedInDifferentLocation, || {
                    format!(
                        "Reference {} was not resolved.\nProject {}.\nExpected location = {}\nHowever it was found in project output folder {}.",
                        reference.resolved_include,
                        project.descriptor_path.display(),
                        reference.resolved_hint_path.display(),
                        output_dir.display()
                    )
                })?;
                Ok(Some(found))
            }
        }
    }

    /// The `*.dll` files under `dirs`, scanned once per distinct folder list.
    fn third_party_index(&self, dirs: &[PathBuf]) -> Result<Arc<ThirdPartyIndex>> {
        if dirs.is_empty() {
            return Ok(Arc::new(ThirdPartyIndex::default()));
        }

        let key = dirs.iter().map(|d| path_key(d)).collect::<Vec<_>>().join(":");
        if let Some(index) = self.cache.third_party_files.get(&key) {
            return Ok(Arc::clone(index.value()));
        }

        let files = self.scanner.scan(THIRD_PARTY_PATTERN, dirs)?;
        let index = Arc::new(ThirdPartyIndex {
            files: files.into_iter().map(|f| (path_key(&f), f)).collect(),
        });
        debug!("Indexed {} third-party binaries under {} folders", index.len(), dirs.len());
        Ok(Arc::clone(self.cache.third_party_files.entry(key).or_insert(index).value()))
    }
}
