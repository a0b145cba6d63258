//! Run context tying configuration, loading, walking and output together
//!
//! [`SolutionGenerator`] owns every cache a run uses: the project loader, the
//! file scanner, the framework assembly index and the walker's memo tables.
//! Nothing is process-global, so two generators never share state.
//!
//! A typical run:
//!
//! ```rust,no_run
//! use slngen_cli::config::ToolkitConfig;
//! use slngen_cli::generator::SolutionGenerator;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ToolkitConfig::load_resolved(Path::new("slngen.toml"))?;
//! let generator = SolutionGenerator::new(config)?;
//! generator.load_sources().await?;
//! let roots = generator.select_roots(&["web".to_string()], &[])?;
//! let report = generator.generate_solution(&roots, Path::new("/repo/Web.sln"), true)?;
//! println!("{} projects", report.project_count);
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ResolvedConfig;
use crate::constants::DESCRIPTOR_PATTERN;
use crate::core::SlnError;
use crate::loader::ProjectLoader;
use crate::project::Project;
use crate::resolver::{ReferenceWalker, SystemAssemblies, ThirdPartyUsage, WalkerCache};
use crate::scanner::{FileScanner, locate_file};
use crate::solution::{
    CopyReport, SolutionSynthesizer, copy_to_folder, render_third_parties, sidecar_path,
    with_companions,
};
use crate::utils::fs::write_with_bom;
use crate::utils::path;

/// What `generate_solution` wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub solution_path: PathBuf,
    pub project_count: usize,
    /// Third-party files listed in the sidecar, `.dep` companions included.
    pub third_parties: Vec<PathBuf>,
    /// Set when a sidecar was written.
    pub sidecar_path: Option<PathBuf>,
}

/// Everything one run needs.
pub struct SolutionGenerator {
    config: ResolvedConfig,
    loader: ProjectLoader,
    scanner: FileScanner,
    system: SystemAssemblies,
    cache: WalkerCache,
}

impl SolutionGenerator {
    /// Build a run context, scanning framework folders once.
    pub fn new(config: ResolvedConfig) -> Result<Self> {
        let scanner = FileScanner::new();
        let system = SystemAssemblies::discover(&scanner, &config.framework_folders, &config.framework_prefixes)?;
        Ok(Self {
            config,
            loader: ProjectLoader::new(),
            scanner,
            system,
            cache: WalkerCache::new(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    #[must_use]
    pub const fn loader(&self) -> &ProjectLoader {
        &self.loader
    }

    #[must_use]
    pub const fn scanner(&self) -> &FileScanner {
        &self.scanner
    }

    #[must_use]
    pub const fn cache(&self) -> &WalkerCache {
        &self.cache
    }

    fn walker(&self) -> ReferenceWalker<'_> {
        ReferenceWalker::new(&self.config.policy, &self.loader, &self.system, &self.scanner, &self.cache)
    }

    /// Discover every descriptor under the source folders and load them all.
    ///
    /// Returns the number of descriptors loaded.
    pub async fn load_sources(&self) -> Result<usize> {
        let descriptors = self.scanner.scan(DESCRIPTOR_PATTERN, &self.config.source_folders)?;
        info!("Preloading {} project files...", descriptors.len());
        let started = Instant::now();
        let loaded = self.loader.preload_parallel(&self.config.policy, &descriptors).await?;
        info!(
            "Source load completed in {} ms. Loaded project files = {}",
            started.elapsed().as_millis(),
            loaded
        );
        Ok(loaded)
    }

    /// Map project selectors to descriptor paths.
    ///
    /// A selector ending in `.csproj` is a descriptor path relative to the
    /// source root; anything else is an assembly name of a loaded project.
    pub fn resolve_roots(&self, selectors: &[String]) -> Result<Vec<PathBuf>> {
        let mut roots: Vec<PathBuf> = Vec::with_capacity(selectors.len());
        for selector in selectors {
            let descriptor = if path::has_extension(Path::new(selector), "csproj") {
                locate_file(&path::from_msbuild(selector), std::slice::from_ref(&self.config.root))?
            } else {
                self.loader
                    .get_by_assembly_name(selector)
                    .map(|project| project.descriptor_path.clone())
                    .ok_or_else(|| SlnError::ProjectNotFound {
                        assembly_name: selector.clone(),
                    })?
            };
            if !roots.iter().any(|existing| path::path_key(existing) == path::path_key(&descriptor)) {
                roots.push(descriptor);
            }
        }
        Ok(roots)
    }

    /// Roots named by `groups` (all groups when empty) or, when given,
    /// by `projects` together with any explicitly named groups.
    pub fn select_roots(&self, groups: &[String], projects: &[String]) -> Result<Vec<PathBuf>> {
        let mut selectors = Vec::new();
        if projects.is_empty() || !groups.is_empty() {
            info!("Processing groups: {}", if groups.is_empty() { "<all>".to_string() } else { groups.join(";") });
            selectors.extend(self.config.groups.select(groups)?);
        }
        selectors.extend(projects.iter().cloned());

        let roots = self.resolve_roots(&selectors)?;
        info!("Files configured for solution generation:");
        for root in &roots {
            info!("   {}", root.display());
        }
        Ok(roots)
    }

    /// Render the solution for `roots`, then write it and (when third
    /// parties are used and `write_sidecar` is set) its sidecar.
    ///
    /// Nothing is written if loading or walking fails.
    pub fn generate_solution(
        &self,
        roots: &[PathBuf],
        solution_path: &Path,
        write_sidecar: bool,
    ) -> Result<GenerationReport> {
        let started = Instant::now();
        let solution_path = path::absolutize(solution_path)?;

        let mut used = ThirdPartyUsage::new();
        let solution = SolutionSynthesizer::new()
            .with_custom_header(self.config.append_to_solution.as_deref())
            .synthesize(
                &self.walker(),
                roots,
                &solution_path,
                &self.config.third_party_folders,
                &mut used,
            )?;
        let third_parties = with_companions(&used);

        info!(
            "Writing solution with {} projects to file {}",
            solution.project_count(),
            solution_path.display()
        );
        write_with_bom(&solution_path, &solution.content)?;

        let mut sidecar = None;
        if write_sidecar && !third_parties.is_empty() {
            info!("Third parties used in solution:");
            for file in &third_parties {
                info!("   {}", file.display());
            }
            let target = sidecar_path(&solution_path);
            write_with_bom(&target, &render_third_parties(&self.config.root, &third_parties))?;
            sidecar = Some(target);
        }

        info!("Solution generated in {} ms", started.elapsed().as_millis());
        Ok(GenerationReport {
            solution_path,
            project_count: solution.project_count(),
            third_parties,
            sidecar_path: sidecar,
        })
    }

    /// Loaded projects outside the closure of `roots`, ordered by path.
    pub fn find_unused_projects(&self, roots: &[PathBuf]) -> Result<Vec<Arc<Project>>> {
        let mut used = ThirdPartyUsage::new();
        let closure = self.walker().walk_closure(roots, &self.config.third_party_folders, &mut used)?;

        let unused: Vec<Arc<Project>> = self
            .loader
            .projects()
            .into_iter()
            .filter(|project| !closure.contains(&project.id))
            .collect();
        for project in &unused {
            debug!("Not used: {}", project.descriptor_path.display());
        }
        info!("Found {} unused projects", unused.len());
        Ok(unused)
    }

    /// Copy the third-party binaries used by the closure of `roots` into
    /// `output`.
    pub fn copy_third_parties(&self, roots: &[PathBuf], output: &Path) -> Result<CopyReport> {
        let mut used = ThirdPartyUsage::new();
        self.walker().walk_closure(roots, &self.config.third_party_folders, &mut used)?;

        let files = with_companions(&used);
        info!("Copying {} third-party files to {}", files.len(), output.display());
        let report = copy_to_folder(&files, output)?;
        if !report.failed.is_empty() {
            warn!("{} files could not be copied", report.failed.len());
        }
        info!("Copied {} files, {} already up to date", report.copied, report.up_to_date);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolkitConfig;
    use crate::test_utils::{DescriptorBuilder, TestWorkspace};

    fn layout(workspace: &TestWorkspace) -> (DescriptorBuilder, DescriptorBuilder, DescriptorBuilder) {
        workspace.write_file("packages/log4net/log4net.dll", "binary").unwrap();
        let core = DescriptorBuilder::library("Acme.Core")
            .file_reference("log4net, Version=1.2.10.0", Some("..\\..\\packages\\log4net\\log4net.dll"))
            .file_reference("System.Data", None);
        let web = DescriptorBuilder::exe("Acme.Web").project_reference(&core, "..\\Core\\Core.csproj");
        let orphan = DescriptorBuilder::library("Acme.Orphan");
        workspace.write_descriptor("src/Core/Core.csproj", &core).unwrap();
        workspace.write_descriptor("src/Web/Web.csproj", &web).unwrap();
        workspace.write_descriptor("src/Orphan/Orphan.csproj", &orphan).unwrap();
        workspace
            .write_config(
                r#"
source-folders = ["src"]
third-party-folders = ["packages"]

[[groups]]
name = "web"
projects = ["Acme.Web"]

[[groups]]
name = "orphan"
projects = ["src/Orphan/Orphan.csproj"]
"#,
            )
            .unwrap();
        (core, web, orphan)
    }

    async fn generator(workspace: &TestWorkspace) -> SolutionGenerator {
        let config = ToolkitConfig::load_resolved(&workspace.path("slngen.toml")).unwrap();
        let generator = SolutionGenerator::new(config).unwrap();
        assert_eq!(generator.load_sources().await.unwrap(), 3);
        generator
    }

    #[tokio::test]
    async fn test_generate_solution_and_sidecar() {
        let workspace = TestWorkspace::new().unwrap();
        let (core, web, _) = layout(&workspace);
        let generator = generator(&workspace).await;

        let roots = generator.select_roots(&["web".to_string()], &[]).unwrap();
        assert_eq!(roots, vec![workspace.path("src/Web/Web.csproj")]);

        let report = generator.generate_solution(&roots, &workspace.path("out/Web.sln"), true).unwrap();
        assert_eq!(report.project_count, 2);
        assert_eq!(report.third_parties, vec![workspace.path("packages/log4net/log4net.dll")]);
        assert_eq!(report.sidecar_path, Some(workspace.path("out/Web.sln.thirdparties")));

        let bytes = std::fs::read(workspace.path("out/Web.sln")).unwrap();
        assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert!(text.contains(&format!("\"..\\src\\Core\\Core.csproj\", \"{}\"", core.project_id())));
        assert!(text.contains(&format!("\"..\\src\\Web\\Web.csproj\", \"{}\"", web.project_id())));
        assert!(!text.contains("Orphan"));

        let sidecar = workspace.read("out/Web.sln.thirdparties").unwrap();
        assert!(sidecar.contains("Include=\"$(RootDir)\\packages\\log4net\\log4net.dll\""));
        assert_eq!(generator.cache().closure_count(), 2);
    }

    #[tokio::test]
    async fn test_sidecar_can_be_skipped() {
        let workspace = TestWorkspace::new().unwrap();
        layout(&workspace);
        let generator = generator(&workspace).await;

        let roots = generator.select_roots(&[], &["Acme.Web".to_string()]).unwrap();
        let report = generator.generate_solution(&roots, &workspace.path("Web.sln"), false).unwrap();
        assert!(report.sidecar_path.is_none());
        assert!(!workspace.exists("Web.sln.thirdparties"));
    }

    #[tokio::test]
    async fn test_unknown_assembly_name() {
        let workspace = TestWorkspace::new().unwrap();
        layout(&workspace);
        let generator = generator(&workspace).await;

        let error = generator.resolve_roots(&["Acme.Missing".to_string()]).unwrap_err();
        assert_eq!(
            error.downcast_ref::<SlnError>(),
            Some(&SlnError::ProjectNotFound {
                assembly_name: "Acme.Missing".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_find_unused_projects() {
        let workspace = TestWorkspace::new().unwrap();
        let (_, _, orphan) = layout(&workspace);
        let generator = generator(&workspace).await;

        let roots = generator.select_roots(&["web".to_string()], &[]).unwrap();
        let unused = generator.find_unused_projects(&roots).unwrap();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].id, orphan.project_id());

        let all = generator.select_roots(&[], &[]).unwrap();
        assert_eq!(all.len(), 2);
        assert!(generator.find_unused_projects(&all).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_copy_third_parties() {
        let workspace = TestWorkspace::new().unwrap();
        layout(&workspace);
        workspace.write_file("packages/log4net/log4net.dep", "deps").unwrap();
        let generator = generator(&workspace).await;

        let roots = generator.select_roots(&["web".to_string()], &[]).unwrap();
        let report = generator.copy_third_parties(&roots, &workspace.path("bin")).unwrap();
        assert_eq!(report.copied, 2);
        assert!(workspace.exists("bin/log4net.dll"));
        assert!(workspace.exists("bin/log4net.dep"));

        let again = generator.copy_third_parties(&roots, &workspace.path("bin")).unwrap();
        assert_eq!(again.copied, 0);
        assert_eq!(again.up_to_date, 2);
    }

    #[tokio::test]
    async fn test_nothing_written_when_walk_fails() {
        let workspace = TestWorkspace::new().unwrap();
        let broken = DescriptorBuilder::exe("Acme.Broken").file_reference("Acme.Gone", Some("..\\lib\\Acme.Gone.dll"));
        workspace.write_descriptor("src/Broken/Broken.csproj", &broken).unwrap();
        workspace.write_config("source-folders = [\"src\"]\n").unwrap();
        let config = ToolkitConfig::load_resolved(&workspace.path("slngen.toml")).unwrap();
        let generator = SolutionGenerator::new(config).unwrap();
        generator.load_sources().await.unwrap();

        let roots = generator.resolve_roots(&["Acme.Broken".to_string()]).unwrap();
        assert!(generator.generate_solution(&roots, &workspace.path("Broken.sln"), true).is_err());
        assert!(!workspace.exists("Broken.sln"));
    }
}
