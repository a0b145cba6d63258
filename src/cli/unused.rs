//! List loaded projects that no selected root needs.

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::common::{CommandContext, CommandExecutor, Selection};
use crate::project::{Project, ProjectId};

/// Command to find unused projects.
#[derive(Args, Debug)]
pub struct UnusedCommand {
    #[command(flatten)]
    pub selection: Selection,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text")]
    pub format: String,
}

#[derive(Debug, Serialize)]
struct UnusedProject {
    name: String,
    id: ProjectId,
    path: PathBuf,
}

impl From<&Project> for UnusedProject {
    fn from(project: &Project) -> Self {
        Self {
            name: project.assembly_name.clone(),
            id: project.id,
            path: project.descriptor_path.clone(),
        }
    }
}

impl UnusedCommand {
    fn validate_arguments(&self) -> Result<()> {
        match self.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(anyhow!("Invalid format '{other}'. Valid formats are: text, json")),
        }
    }
}

impl CommandExecutor for UnusedCommand {
    async fn execute_from_path(self, config_path: PathBuf) -> Result<()> {
        self.validate_arguments()?;
        let context = CommandContext::load(&config_path, &self.selection).await?;

        let unused: Vec<UnusedProject> = context
            .generator
            .find_unused_projects(&context.roots)?
            .iter()
            .map(|project| UnusedProject::from(project.as_ref()))
            .collect();

        if self.format == "json" {
            println!("{}", serde_json::to_string_pretty(&unused)?);
            return Ok(());
        }

        if unused.is_empty() {
            println!("{} Every loaded project is used", "✓".green());
            return Ok(());
        }
        println!("{}", "Not used projects:".yellow());
        for project in &unused {
            println!("  {}", project.path.display());
        }
        println!("Found {} unused projects", unused.len());
        Ok(())
    }
}
