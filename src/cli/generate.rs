//! Generate a solution for selected root projects.
//!
//! ```bash
//! # Every project needed to build the "web" group
//! slngen generate -g web -o Web.sln
//!
//! # Two projects by assembly name, no third-party sidecar
//! slngen generate -p Acme.Web -p Acme.Tools -o out/Tools.sln --no-sidecar
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::{CommandContext, CommandExecutor, Selection};

/// Command to generate a solution file.
#[derive(Args, Debug)]
pub struct GenerateCommand {
    #[command(flatten)]
    pub selection: Selection,

    /// Solution file to write, relative to the configuration file's directory
    #[arg(short, long, value_name = "SLN")]
    pub output: PathBuf,

    /// Do not write the `.thirdparties` sidecar
    #[arg(long)]
    pub no_sidecar: bool,
}

impl CommandExecutor for GenerateCommand {
    async fn execute_from_path(self, config_path: PathBuf) -> Result<()> {
        let context = CommandContext::load(&config_path, &self.selection).await?;
        let output = context.resolve_output(&self.output);

        let report = context.generator.generate_solution(&context.roots, &output, !self.no_sidecar)?;

        println!(
            "{} Generated {} with {} projects",
            "✓".green(),
            report.solution_path.display(),
            report.project_count
        );
        if let Some(sidecar) = &report.sidecar_path {
            println!("  {} third-party files listed in {}", report.third_parties.len(), sidecar.display());
        }
        Ok(())
    }
}
