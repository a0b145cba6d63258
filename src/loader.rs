//! Project loading and indexing
//!
//! [`ProjectLoader`] owns every [`Project`] loaded during a run. Loading is
//! idempotent per descriptor path: the second `load` of the same file returns
//! the same `Arc<Project>` without re-reading it.
//!
//! Three secondary indices (identifier, resolved output path, assembly name)
//! are filled as projects register. Each must be unique across the loader; a
//! collision is fatal and names both descriptors. All path and name keys are
//! case-insensitive.
//!
//! # Concurrency
//!
//! Indices are `DashMap`s, so lookups never block each other. Registration
//! takes a short mutex so the uniqueness check and the four inserts happen as
//! one step; parsing happens outside it. [`ProjectLoader::preload_parallel`]
//! parses a batch on the blocking pool and registers the results in input
//! order, which keeps duplicate reporting deterministic.

use anyhow::{Context, Result};
use dashmap::DashMap;
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::core::SlnError;
use crate::policy::{Behavior, PolicyRule, ResolutionPolicy};
use crate::project::{
    DeclaredReference, Project, ProjectDescriptor, ProjectId, ProjectReader, Reference,
    ReferenceKind, XmlProjectReader,
};
use crate::utils::path::{self, path_key};

/// Loaded projects and their lookup indices.
pub struct ProjectLoader {
    reader: Arc<dyn ProjectReader>,
    projects: DashMap<String, Arc<Project>>,
    by_id: DashMap<ProjectId, Arc<Project>>,
    by_output: DashMap<String, Arc<Project>>,
    by_assembly: DashMap<String, Arc<Project>>,
    registration: Mutex<()>,
}

impl Default for ProjectLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProjectLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectLoader").field("projects", &self.projects.len()).finish()
    }
}

impl ProjectLoader {
    /// A loader using [`XmlProjectReader`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_reader(Arc::new(XmlProjectReader::new()))
    }

    /// A loader using a custom descriptor reader.
    #[must_use]
    pub fn with_reader(reader: Arc<dyn ProjectReader>) -> Self {
        Self {
            reader,
            projects: DashMap::new(),
            by_id: DashMap::new(),
            by_output: DashMap::new(),
            by_assembly: DashMap::new(),
            registration: Mutex::new(()),
        }
    }

    /// Number of loaded projects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Look up a project by identifier.
    #[must_use]
    pub fn get_by_id(&self, id: &ProjectId) -> Option<Arc<Project>> {
        self.by_id.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Look up a project by the path of the binary it produces.
    #[must_use]
    pub fn get_by_output_path(&self, output: &Path) -> Option<Arc<Project>> {
        self.by_output
            .get(&path_key(&path::normalize(output)))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Look up a project by assembly name, ignoring case.
    #[must_use]
    pub fn get_by_assembly_name(&self, assembly_name: &str) -> Option<Arc<Project>> {
        self.by_assembly
            .get(&assembly_name.to_lowercase())
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Every loaded project, ordered by descriptor path.
    #[must_use]
    pub fn projects(&self) -> Vec<Arc<Project>> {
        let mut projects: Vec<Arc<Project>> =
            self.projects.iter().map(|entry| Arc::clone(entry.value())).collect();
        projects.sort_by(|a, b| a.descriptor_path.cmp(&b.descriptor_path));
        projects
    }

    /// Load the descriptor at `path`, or return the already loaded project.
    ///
    /// Platform-application references are loaded recursively before the
    /// project registers.
    pub fn load(&self, policy: &ResolutionPolicy, path: &Path) -> Result<Arc<Project>> {
        let mut loading = Vec::new();
        self.load_tracked(policy, path, &mut loading)
    }

    /// Load a batch of descriptors in order, returning how many were processed.
    ///
    /// The first failure aborts the batch as [`SlnError::ProjectLoadFailed`]
    /// with the underlying error as its cause.
    pub fn preload_all<P: AsRef<Path>>(&self, policy: &ResolutionPolicy, paths: &[P]) -> Result<usize> {
        let started = Instant::now();
        for path in paths {
            let path = path.as_ref();
            self.load(policy, path).with_context(|| SlnError::ProjectLoadFailed {
                path: path.display().to_string(),
            })?;
        }
        info!("Loaded {} projects in {} ms", paths.len(), started.elapsed().as_millis());
        Ok(paths.len())
    }

    /// Parse a batch of descriptors concurrently, then register them in input
    /// order.
    pub async fn preload_parallel(&self, policy: &ResolutionPolicy, paths: &[PathBuf]) -> Result<usize> {
        let started = Instant::now();

        let tasks = paths.iter().map(|path| {
            let reader = Arc::clone(&self.reader);
            let path = path.clone();
            tokio::task::spawn_blocking(move || {
                let absolute = path::absolutize(&path)?;
                reader.read(&absolute)
            })
        });
        let parsed = try_join_all(tasks).await.context("Failed to join descriptor parse tasks")?;

        for (path, descriptor) in paths.iter().zip(parsed) {
            let wrap = || SlnError::ProjectLoadFailed {
                path: path.display().to_string(),
            };
            let descriptor = descriptor.with_context(wrap)?;
            if self.projects.contains_key(&path_key(&descriptor.path)) {
                continue;
            }
            let mut loading = Vec::new();
            self.build(policy, descriptor, &mut loading).with_context(wrap)?;
        }

        info!(
            "Loaded {} projects in parallel in {} ms",
            paths.len(),
            started.elapsed().as_millis()
        );
        Ok(paths.len())
    }

    fn load_tracked(
        &self,
        policy: &ResolutionPolicy,
        path: &Path,
        loading: &mut Vec<PathBuf>,
    ) -> Result<Arc<Project>> {
        let absolute = path::absolutize(path)?;
        let key = path_key(&absolute);
        if let Some(existing) = self.projects.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }

        if loading.iter().any(|p| path_key(p) == key) {
            let mut chain: Vec<String> = loading.iter().map(|p| p.display().to_string()).collect();
            chain.push(absolute.display().to_string());
            return Err(SlnError::CircularPlatformReference {
                chain,
            }
            .into());
        }

        let descriptor = self.reader.read(&absolute)?;
        self.build(policy, descriptor, loading)
    }

    fn build(
        &self,
        policy: &ResolutionPolicy,
        descriptor: ProjectDescriptor,
        loading: &mut Vec<PathBuf>,
    ) -> Result<Arc<Project>> {
        let location = descriptor.path.display().to_string();

        if descriptor.id.is_nil() {
            return Err(SlnError::MalformedDescriptor {
                path: location,
                reason: "Property ProjectGuid is empty".to_string(),
            }
            .into());
        }
        if descriptor.root_namespace.trim().is_empty() {
            return Err(SlnError::MalformedDescriptor {
                path: location,
                reason: "Property RootNamespace is empty".to_string(),
            }
            .into());
        }

        let directory = descriptor.directory();
        let resolved_key_file = descriptor
            .key_file
            .as_deref()
            .map(|key| path::resolve(&directory, &path::from_msbuild(key)));
        check_key_file(policy, &location, resolved_key_file.as_deref())?;
        check_reference_presence(policy, &location, &descriptor)?;
        check_required_files(policy, &location, &directory, &descriptor)?;

        loading.push(descriptor.path.clone());
        let references = descriptor
            .references
            .iter()
            .map(|declared| self.resolve_reference(policy, &descriptor, declared, loading))
            .collect::<Result<Vec<_>>>();
        loading.pop();
        let references = references?;

        let project = Project {
            id: descriptor.id,
            assembly_name: descriptor.assembly_name,
            root_namespace: descriptor.root_namespace,
            output_type: descriptor.output_type,
            output_folder: descriptor.output_folder,
            resolved_output: descriptor.resolved_output,
            descriptor_path: descriptor.path,
            key_file: descriptor.key_file,
            resolved_key_file,
            references,
            included_files: descriptor.included_files,
            is_launcher: descriptor.is_launcher,
        };

        self.register(project)
    }

    fn resolve_reference(
        &self,
        policy: &ResolutionPolicy,
        descriptor: &ProjectDescriptor,
        declared: &DeclaredReference,
        loading: &mut Vec<PathBuf>,
    ) -> Result<Reference> {
        let directory = descriptor.directory();

        if declared.kind == ReferenceKind::PlatformApplication {
            let target_path = declared
                .hint_path
                .as_deref()
                .map(|hint| path::resolve(&directory, &path::from_msbuild(hint)))
                .ok_or_else(|| SlnError::MalformedDescriptor {
                    path: descriptor.path.display().to_string(),
                    reason: "platform-application entry without a descriptor path".to_string(),
                })?;
            let target = self.load_tracked(policy, &target_path, loading)?;
            return Ok(Reference {
                kind: declared.kind,
                target: declared.target,
                include: target.assembly_name.clone(),
                resolved_include: target.resolved_output.display().to_string(),
                hint_path: declared.hint_path.clone(),
                resolved_hint_path: target.resolved_output.clone(),
            });
        }

        let include = declared.include.clone().unwrap_or_default();
        let resolved_include = resolve_include(&include).to_string();
        let resolved_hint_path = resolve_hint_path(
            declared.hint_path.as_deref(),
            &resolved_include,
            &directory,
            &descriptor.output_folder,
        );

        Ok(Reference {
            kind: declared.kind,
            target: declared.target,
            include,
            resolved_include,
            hint_path: declared.hint_path.clone(),
            resolved_hint_path,
        })
    }

    fn register(&self, project: Project) -> Result<Arc<Project>> {
        let _guard = self.registration.lock().unwrap_or_else(PoisonError::into_inner);

        let key = path_key(&project.descriptor_path);
        if let Some(existing) = self.projects.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }

        let output_key = path_key(&project.resolved_output);
        let assembly_key = project.assembly_name.to_lowercase();

        let collisions = [
            ("ID", project.id.to_string(), self.by_id.get(&project.id).map(|e| Arc::clone(e.value()))),
            (
                "output path",
                project.resolved_output.display().to_string(),
                self.by_output.get(&output_key).map(|e| Arc::clone(e.value())),
            ),
            (
                "assembly name",
                project.assembly_name.clone(),
                self.by_assembly.get(&assembly_key).map(|e| Arc::clone(e.value())),
            ),
        ];
        for (property, value, existing) in collisions {
            if let Some(existing) = existing {
                return Err(SlnError::DuplicateProject {
                    property: property.to_string(),
                    value,
                    first: existing.descriptor_path.display().to_string(),
                    second: project.descriptor_path.display().to_string(),
                }
                .into());
            }
        }

        let project = Arc::new(project);
        self.by_id.insert(project.id, Arc::clone(&project));
        self.by_output.insert(output_key, Arc::clone(&project));
        self.by_assembly.insert(assembly_key, Arc::clone(&project));
        self.projects.insert(key, Arc::clone(&project));

        debug!(
            project = %project.assembly_name,
            id = %project.id,
            path = %project.descriptor_path.display(),
            "Registered project"
        );
        Ok(project)
    }
}

/// Strip any version, culture or token suffix: everything from the first comma.
pub fn resolve_include(include: &str) -> &str {
    match include.find(',') {
        Some(index) if index > 0 => include[..index].trim(),
        _ => include.trim(),
    }
}

/// Absolute path of the binary a reference expects.
///
/// No hint path means the referencing project's own output folder. A hint
/// path that is not a binary is treated as a folder holding `{include}.dll`.
pub fn resolve_hint_path(
    hint_path: Option<&str>,
    resolved_include: &str,
    directory: &Path,
    output_folder: &Path,
) -> PathBuf {
    let hint = hint_path.map(str::trim).filter(|h| !h.is_empty());
    let base = match hint {
        Some(hint) => path::resolve(directory, &path::from_msbuild(&hint.replace("&amp;", "&"))),
        None => output_folder.to_path_buf(),
    };

    if path::has_extension(&base, "dll") || path::has_extension(&base, "exe") {
        base
    } else {
        base.join(format!("{resolved_include}.dll"))
    }
}

fn check_key_file(policy: &ResolutionPolicy, location: &str, resolved: Option<&Path>) -> Result<()> {
    let expected = policy.assembly_key_file.as_deref();
    match resolved {
        None => policy.enforce(PolicyRule::KeyFileNotFound, || match expected {
            Some(expected) => format!("Project {location} does not have key file {}!", expected.display()),
            None => format!("Project {location} does not have a key file!"),
        }),
        Some(resolved) => match expected {
            Some(expected) if path_key(resolved) != path_key(expected) => {
                policy.enforce(PolicyRule::KeyFileNotFound, || {
                    format!(
                        "Project {location} has key file {} but in wrong location {}!",
                        expected.display(),
                        resolved.display()
                    )
                })
            }
            _ => Ok(()),
        },
    }
}

fn check_reference_presence(
    policy: &ResolutionPolicy,
    location: &str,
    descriptor: &ProjectDescriptor,
) -> Result<()> {
    let files = descriptor.count_of(ReferenceKind::File);
    if files > 0 {
        policy.enforce(PolicyRule::ContainsFileReferences, || {
            format!("Project {location} contains {files} file references!")
        })?;
    }

    let projects = descriptor.count_of(ReferenceKind::Project);
    if projects > 0 {
        policy.enforce(PolicyRule::ContainsProjectReferences, || {
            format!("Project {location} contains {projects} project references!")
        })?;
    }

    // Platform-application entries are reported, never rejected.
    let applications = descriptor.count_of(ReferenceKind::PlatformApplication);
    if applications > 0 && policy.behavior(PolicyRule::ContainsProjectReferences) == Behavior::Warn {
        warn!("Project {location} contains {applications} platform-application references!");
    }
    Ok(())
}

fn check_required_files(
    policy: &ResolutionPolicy,
    location: &str,
    directory: &Path,
    descriptor: &ProjectDescriptor,
) -> Result<()> {
    if policy.required_project_files.is_empty() {
        return Ok(());
    }

    let mut by_file_name = std::collections::HashMap::new();
    for file in &descriptor.included_files {
        let include = path::from_msbuild(&file.include);
        if let Some(name) = include.file_name() {
            by_file_name.insert(name.to_string_lossy().to_lowercase(), include);
        }
    }

    for required in &policy.required_project_files {
        let Some(name) = required.file_name() else {
            continue;
        };
        let included = by_file_name
            .get(&name.to_string_lossy().to_lowercase())
            .map(|include| path::resolve(directory, include));

        match included {
            None => policy.enforce(PolicyRule::RequiredFileNotFound, || {
                format!("Project {location} does not include required file {}!", required.display())
            })?,
            Some(found) if path_key(&found) != path_key(required) => {
                policy.enforce(PolicyRule::RequiredFileNotFound, || {
                    format!(
                        "Project {location} includes required file {} but in wrong location {}!",
                        required.display(),
                        found.display()
                    )
                })?;
            }
            Some(_) => {}
        }
    }
    Ok(())
}
