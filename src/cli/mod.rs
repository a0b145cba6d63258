//! Command-line interface for slngen
//!
//! Each subcommand lives in its own module and implements
//! [`common::CommandExecutor`]. All of them read one configuration file
//! (`slngen.toml` unless `--config` says otherwise).
//!
//! # Commands
//!
//! - `generate` - Write a solution for selected root projects
//! - `unused` - List projects no selected root needs
//! - `copy-third-parties` - Copy used third-party binaries into a folder
//! - `init` - Create a starter configuration
//!
//! # Logging
//!
//! `RUST_LOG` wins when set. Otherwise `--verbose` logs at debug level,
//! `--quiet` only reports errors, and the default is info. Log output goes
//! to stderr so command output on stdout stays clean.

mod copy;
pub mod common;
mod generate;
mod init;
mod unused;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::constants::DEFAULT_CONFIG_FILE;
use common::CommandExecutor;

/// Main CLI structure for slngen.
#[derive(Parser, Debug)]
#[command(
    name = "slngen",
    about = "Generate Visual Studio solutions from project dependency graphs",
    version,
    long_about = "slngen loads every project descriptor under a source tree, walks the references of \
                  the selected root projects and writes a solution containing exactly the projects \
                  needed to build them."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (default: slngen.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a solution file
    Generate(generate::GenerateCommand),

    /// List loaded projects that the selected roots do not need
    Unused(unused::UnusedCommand),

    /// Copy the third-party binaries used by the selected roots
    CopyThirdParties(copy::CopyThirdPartiesCommand),

    /// Create a starter configuration file
    Init(init::InitCommand),
}

impl Cli {
    /// Install logging and run the selected command.
    pub async fn execute(self) -> Result<()> {
        self.init_logging();
        let config_path = self.config_path();

        match self.command {
            Commands::Generate(cmd) => cmd.execute_from_path(config_path).await,
            Commands::Unused(cmd) => cmd.execute_from_path(config_path).await,
            Commands::CopyThirdParties(cmd) => cmd.execute_from_path(config_path).await,
            Commands::Init(cmd) => cmd.execute_from_path(config_path).await,
        }
    }

    /// Configuration file this invocation uses.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Filter directive derived from the verbosity flags.
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.log_level())
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}
