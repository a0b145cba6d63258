//! slngen - subset solution generation for MSBuild source trees
//!
//! slngen loads every project descriptor (`*.csproj`) under a source tree,
//! resolves the references between them and writes a Visual Studio solution
//! containing exactly the projects needed to build a set of root projects.
//! Binaries found in third-party folders are kept out of the graph and listed
//! in a `.thirdparties` sidecar instead.
//!
//! # Architecture Overview
//!
//! Data flows one way through four stages:
//!
//! 1. [`project::reader`] parses one descriptor into a [`project::Project`]
//! 2. [`loader::ProjectLoader`] owns the loaded projects, enforces identity
//!    uniqueness and applies the [`policy::ResolutionPolicy`]
//! 3. [`resolver::ReferenceWalker`] computes transitive closures and direct
//!    dependencies, classifying each reference as project, system or third party
//! 4. [`solution::SolutionSynthesizer`] renders the closure as solution text
//!
//! [`generator::SolutionGenerator`] ties the stages together for one run,
//! and [`cli`] exposes them as the `slngen` binary.
//!
//! # Configuration (slngen.toml)
//!
//! ```toml
//! root = "."
//! source-folders = ["src"]
//! third-party-folders = ["packages"]
//!
//! [policy]
//! when-reference-not-resolved = "fail"
//!
//! [[groups]]
//! name = "web"
//! projects = ["Acme.Web", "Acme.Web.Tests"]
//! ```
//!
//! # Library Example
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
//!
//! let roots = generator.select_roots(&["web".to_string()], &[])?;
//! let report = generator.generate_solution(&roots, Path::new("Web.sln"), true)?;
//! println!("{} projects", report.project_count);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod generator;
pub mod loader;
pub mod policy;
pub mod project;
pub mod resolver;
pub mod scanner;
pub mod solution;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
