//! Write a starter configuration file.

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::CommandExecutor;
use crate::config::ToolkitConfig;
use crate::utils::fs::safe_write;

/// Command to create `slngen.toml`.
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Overwrite an existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

impl CommandExecutor for InitCommand {
    async fn execute_from_path(self, config_path: PathBuf) -> Result<()> {
        if config_path.exists() && !self.force {
            return Err(anyhow!(
                "Configuration already exists at {}. Use --force to overwrite",
                config_path.display()
            ));
        }

        safe_write(&config_path, &ToolkitConfig::example())?;

        println!("{} Initialized {}", "✓".green(), config_path.display());
        println!("\n{}", "Next steps:".cyan());
        println!("  List your root projects under {}", "[[groups]]".bright_white());
        println!("  Then run {}", "slngen generate -g all -o All.sln".bright_white());
        Ok(())
    }
}
