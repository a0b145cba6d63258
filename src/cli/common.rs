//! Shared plumbing for the subcommands

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::ToolkitConfig;
use crate::generator::SolutionGenerator;
use crate::utils::path;

/// A subcommand that runs against a configuration file.
pub trait CommandExecutor: Sized {
    /// Execute the command with the configuration at `config_path`.
    fn execute_from_path(
        self,
        config_path: PathBuf,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Root project selection shared by the commands that walk the graph.
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Group to include (repeatable). No group and no project selects every group.
    #[arg(short = 'g', long = "group", value_name = "GROUP")]
    pub groups: Vec<String>,

    /// Project to include by assembly name or descriptor path (repeatable).
    #[arg(short = 'p', long = "project", value_name = "PROJECT")]
    pub projects: Vec<String>,
}

/// A loaded run: the resolved configuration with every source descriptor
/// loaded, plus the selected roots.
pub struct CommandContext {
    pub config_path: PathBuf,
    pub generator: SolutionGenerator,
    pub roots: Vec<PathBuf>,
}

impl CommandContext {
    /// Resolve the configuration, load every descriptor and select roots.
    pub async fn load(config_path: &Path, selection: &Selection) -> Result<Self> {
        if !config_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file {} not found. Run 'slngen init' to create one.",
                config_path.display()
            ));
        }
        let config_path = path::absolutize(config_path)?;
        info!("Using configuration file: {}", config_path.display());

        let config = ToolkitConfig::load_resolved(&config_path)?;
        let generator = SolutionGenerator::new(config)?;
        generator.load_sources().await?;
        let roots = generator
            .select_roots(&selection.groups, &selection.projects)
            .context("Failed to select root projects")?;

        Ok(Self {
            config_path,
            generator,
            roots,
        })
    }

    /// Directory holding the configuration file.
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_path.parent().map(Path::to_path_buf).unwrap_or_default()
    }

    /// `target` made absolute against the configuration directory.
    #[must_use]
    pub fn resolve_output(&self, target: &Path) -> PathBuf {
        path::resolve(&self.config_dir(), target)
    }
}
