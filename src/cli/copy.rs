//! Copy the third-party binaries a selection uses into one folder.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::{CommandContext, CommandExecutor, Selection};
use crate::core::SlnError;

/// Command to copy third-party binaries.
#[derive(Args, Debug)]
pub struct CopyThirdPartiesCommand {
    #[command(flatten)]
    pub selection: Selection,

    /// Destination folder (defaults to `binaries-output` from the configuration)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for CopyThirdPartiesCommand {
    async fn execute_from_path(self, config_path: PathBuf) -> Result<()> {
        let context = CommandContext::load(&config_path, &self.selection).await?;
        let output = match &self.output {
            Some(output) => context.resolve_output(output),
            None => context.generator.config().binaries_output.clone().ok_or_else(|| SlnError::ConfigError {
                message: "no output folder given and `binaries-output` is not configured".to_string(),
            })?,
        };

        let report = context.generator.copy_third_parties(&context.roots, &output)?;

        println!(
            "{} Copied {} files to {} ({} already up to date)",
            "✓".green(),
            report.copied,
            output.display(),
            report.up_to_date
        );
        if !report.failed.is_empty() {
            println!("{} {} files could not be copied:", "!".yellow(), report.failed.len());
            for file in &report.failed {
                println!("  {}", file.display());
            }
        }
        Ok(())
    }
}
