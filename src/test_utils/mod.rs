//! Test utilities for slngen
//!
//! Helpers for writing tests against real files on disk:
//! - [`DescriptorBuilder`] renders project descriptors
//! - [`TestWorkspace`] lays out a source tree in a temporary directory
//! - [`init_test_logging`] routes `tracing` output to the test harness
//!
//! # Example
//!
//! ```rust,no_run
//! use slngen_cli::test_utils::{DescriptorBuilder, TestWorkspace};
//!
//! let workspace = TestWorkspace::new().unwrap();
//! let core = DescriptorBuilder::library("Acme.Core");
//! let app = DescriptorBuilder::exe("Acme.App").project_reference(&core, "../Core/Core.csproj");
//! workspace.write_descriptor("src/Core/Core.csproj", &core).unwrap();
//! workspace.write_descriptor("src/App/App.csproj", &app).unwrap();
//! ```

pub mod descriptor;
pub mod workspace;

pub use descriptor::DescriptorBuilder;
pub use workspace::TestWorkspace;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=slngen_cli=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
