//! Solution file synthesis
//!
//! [`SolutionSynthesizer`] turns the closure of a set of root projects into
//! the text of a Visual Studio solution:
//!
//! ```text
//! <fixed header lines>
//! <optional custom line>
//! Project("{FAE04EC0-...}") = "App", "src\App\App.csproj", "{A1...}"
//! 	ProjectSection(ProjectDependencies) = postProject
//! 		{C3...} = {C3...}
//! 	EndProjectSection
//! EndProject
//! Global
//! 	GlobalSection(SolutionConfigurationPlatforms) = preSolution
//! 	...
//! 	GlobalSection(ProjectConfigurationPlatforms) = postSolution
//! 	...
//! EndGlobal
//! ```
//!
//! Projects appear in closure order (dependencies before dependents). The
//! dependency section of each project lists its direct dependencies that are
//! also closure members. Output is byte-identical for identical input.

pub mod third_party;

use anyhow::Result;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};

use crate::constants::{
    CSHARP_PROJECT_TYPE, PROJECT_PLATFORM, SOLUTION_CONFIGURATIONS, SOLUTION_HEADER,
    SOLUTION_LINE_ENDING, SOLUTION_PLATFORMS,
};
use crate::core::SlnError;
use crate::project::ProjectId;
use crate::resolver::{ReferenceWalker, ThirdPartyUsage};
use crate::utils::path::to_backslashes;

pub use third_party::{CopyReport, copy_to_folder, render_third_parties, sidecar_path, with_companions};

/// A rendered solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSolution {
    /// Full file text, CRLF terminated.
    pub content: String,
    /// Closure members, in the order they were written.
    pub projects: Vec<ProjectId>,
}

impl GeneratedSolution {
    /// Number of projects in the solution.
    #[must_use]
    pub fn project_count(&self) -> usize {
        self.projects.len()
    }
}

/// Renders solution text from a reference walk.
#[derive(Debug, Clone, Default)]
pub struct SolutionSynthesizer {
    custom_header: Option<String>,
}

impl SolutionSynthesizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `text` after the fixed header. Blank text is ignored.
    #[must_use]
    pub fn with_custom_header(mut self, text: Option<&str>) -> Self {
        self.custom_header = text.filter(|t| !t.trim().is_empty()).map(str::to_string);
        self
    }

    /// Walk `roots` and render the solution to be written at `solution_path`.
    ///
    /// Third-party binaries used by the closure are added to `used`.
    pub fn synthesize<P: AsRef<Path>>(
        &self,
        walker: &ReferenceWalker<'_>,
        roots: &[P],
        solution_path: &Path,
        third_party_dirs: &[PathBuf],
        used: &mut ThirdPartyUsage,
    ) -> Result<GeneratedSolution> {
        let closure = walker.walk_closure(roots, third_party_dirs, used)?;
        let loader = walker.loader();
        let mut out = LineWriter::default();

        for line in SOLUTION_HEADER {
            out.line(line);
        }
        if let Some(custom) = &self.custom_header {
            out.line(custom);
        }

        for id in &closure {
            let project = loader.get_by_id(id).ok_or_else(|| SlnError::Other {
                message: format!("Project {id} is in the closure but not loaded"),
            })?;

            let location = relative_path(solution_path, &project.descriptor_path);
            let name = project
                .descriptor_path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            out.line(format!("Project(\"{CSHARP_PROJECT_TYPE}\") = \"{name}\", \"{location}\", \"{id}\""));

            let dependencies: Vec<ProjectId> = walker
                .walk_direct(&project, third_party_dirs, used)?
                .into_iter()
                .filter(|dependency| dependency != id && closure.contains(dependency))
                .collect();
            if !dependencies.is_empty() {
                out.line("\tProjectSection(ProjectDependencies) = postProject");
                for dependency in &dependencies {
                    out.line(format!("\t\t{dependency} = {dependency}"));
                }
                out.line("\tEndProjectSection");
            }
            trace!("Added {} with {} dependencies", project.assembly_name, dependencies.len());

            out.line("EndProject");
        }

        out.line("Global");
        out.line("\tGlobalSection(SolutionConfigurationPlatforms) = preSolution");
        for configuration in SOLUTION_CONFIGURATIONS {
            for platform in SOLUTION_PLATFORMS {
                out.line(format!("\t\t{configuration}|{platform} = {configuration}|{platform}"));
            }
        }
        out.line("\tEndGlobalSection");

        out.line("\tGlobalSection(ProjectConfigurationPlatforms) = postSolution");
        for id in &closure {
            for configuration in SOLUTION_CONFIGURATIONS {
                for platform in SOLUTION_PLATFORMS {
                    out.line(format!(
                        "\t\t{id}.{configuration}|{platform}.ActiveCfg = {configuration}|{PROJECT_PLATFORM}"
                    ));
                    out.line(format!(
                        "\t\t{id}.{configuration}|{platform}.Build.0 = {configuration}|{PROJECT_PLATFORM}"
                    ));
                }
            }
        }
        out.line("\tEndGlobalSection");
        out.line("EndGlobal");

        debug!("Created solution with {} projects", closure.len());
        Ok(GeneratedSolution {
            content: out.text,
            projects: closure.as_slice().to_vec(),
        })
    }
}

#[derive(Default)]
struct LineWriter {
    text: String,
}

impl LineWriter {
    fn line(&mut self, line: impl AsRef<str>) {
        self.text.push_str(line.as_ref());
        self.text.push_str(SOLUTION_LINE_ENDING);
    }
}

/// Path of `file` relative to the directory of `anchor`, backslash separated.
///
/// Shared leading directories are compared case-insensitively. When either
/// path is relative, or the two do not share a root, `file` is returned
/// unchanged.
#[must_use]
pub fn relative_path(anchor: &Path, file: &Path) -> String {
    if !anchor.is_absolute() || !file.is_absolute() {
        return to_backslashes(file);
    }
    let Some(file_name) = file.file_name() else {
        return to_backslashes(file);
    };

    let anchor_nodes = directory_nodes(anchor);
    let file_nodes = directory_nodes(file);
    let same_root = matches!(
        (anchor_nodes.first(), file_nodes.first()),
        (Some(a), Some(b)) if a.eq_ignore_ascii_case(b)
    );
    if !same_root {
        return to_backslashes(file);
    }

    let common = anchor_nodes
        .iter()
        .zip(&file_nodes)
        .take_while(|(a, b)| a.to_lowercase() == b.to_lowercase())
        .count();

    let mut relative = String::new();
    for _ in common..anchor_nodes.len() {
        relative.push_str("..\\");
    }
    for node in &file_nodes[common..] {
        relative.push_str(node);
        relative.push('\\');
    }
    relative.push_str(&file_name.to_string_lossy());
    relative
}

fn directory_nodes(path: &Path) -> Vec<String> {
    path.parent()
        .map(|parent| {
            parent
                .components()
                .filter(|component| !matches!(component, Component::CurDir))
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}
