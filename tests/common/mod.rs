//! Common test utilities for slngen integration tests
//!
//! A [`SampleTree`] lays out a small source tree with a third-party folder and
//! a configuration file; [`run_slngen`] runs the built binary against it.

// Not every test module uses every helper
#![allow(dead_code)]

use anyhow::{Context, Result};
use slngen_cli::project::ProjectId;
use slngen_cli::test_utils::{DescriptorBuilder, TestWorkspace};
use std::path::Path;
use std::process::Command;

/// Configuration used by [`SampleTree`].
pub const SAMPLE_CONFIG: &str = r#"source-folders = ["src"]
third-party-folders = ["packages"]

[[groups]]
name = "web"
projects = ["Acme.Web"]

[[groups]]
name = "tools"
projects = ["Acme.Tools"]

[[groups]]
name = "everything"
groups = ["web", "tools"]
"#;

/// Five projects and one third-party package:
///
/// ```text
/// Acme.Web   -> Acme.Data -> Acme.Core -> Vendor.Json.dll (third party)
/// Acme.Tools -> Acme.Core
/// Acme.Orphan
/// ```
pub struct SampleTree {
    pub workspace: TestWorkspace,
    pub core: ProjectId,
    pub data: ProjectId,
    pub web: ProjectId,
    pub tools: ProjectId,
    pub orphan: ProjectId,
}

impl SampleTree {
    pub fn new() -> Result<Self> {
        let workspace = TestWorkspace::new()?;
        workspace.write_file("packages/Vendor.Json/Vendor.Json.dll", "json")?;
        workspace.write_file("packages/Vendor.Json/Vendor.Json.dep", "deps")?;
        workspace.write_file("packages/Vendor.Xml/Vendor.Xml.dll", "xml")?;

        let core = DescriptorBuilder::library("Acme.Core")
            .file_reference("System", None)
            .file_reference(
                "Vendor.Json, Version=9.0.0.0, Culture=neutral",
                Some("..\\..\\packages\\Vendor.Json\\Vendor.Json.dll"),
            );
        let data = DescriptorBuilder::library("Acme.Data")
            .file_reference("System.Data", None)
            .project_reference(&core, "..\\Core\\Core.csproj");
        let web = DescriptorBuilder::exe("Acme.Web").project_reference(&data, "..\\Data\\Data.csproj");
        let tools = DescriptorBuilder::exe("Acme.Tools").project_reference(&core, "..\\Core\\Core.csproj");
        let orphan = DescriptorBuilder::library("Acme.Orphan");

        workspace.write_descriptor("src/Core/Core.csproj", &core)?;
        workspace.write_descriptor("src/Data/Data.csproj", &data)?;
        workspace.write_descriptor("src/Web/Web.csproj", &web)?;
        workspace.write_descriptor("src/Tools/Tools.csproj", &tools)?;
        workspace.write_descriptor("src/Orphan/Orphan.csproj", &orphan)?;
        workspace.write_config(SAMPLE_CONFIG)?;

        Ok(Self {
            workspace,
            core: core.project_id(),
            data: data.project_id(),
            web: web.project_id(),
            tools: tools.project_id(),
            orphan: orphan.project_id(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.workspace.root
    }

    /// Run slngen with the tree root as working directory.
    pub fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        run_slngen(self.root(), args)
    }
}

/// Captured output of one slngen invocation.
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Assert the command succeeded
    pub fn assert_success(&self) -> &Self {
        assert!(self.success, "Command failed with code {:?}\nStderr: {}", self.code, self.stderr);
        self
    }

    /// Assert the command failed with exit status 1
    pub fn assert_failure(&self) -> &Self {
        assert_eq!(self.code, Some(1), "Expected exit status 1\nStdout: {}\nStderr: {}", self.stdout, self.stderr);
        self
    }

    /// Assert stdout contains the given text
    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(self.stdout.contains(text), "Expected stdout to contain '{text}'\nActual stdout: {}", self.stdout);
        self
    }

    /// Assert stderr contains the given text
    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(self.stderr.contains(text), "Expected stderr to contain '{text}'\nActual stderr: {}", self.stderr);
        self
    }
}

/// Run the slngen binary in `dir`.
pub fn run_slngen(dir: &Path, args: &[&str]) -> Result<CommandOutput> {
    let output = Command::new(env!("CARGO_BIN_EXE_slngen"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .context("Failed to run slngen")?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        success: output.status.success(),
        code: output.status.code(),
    })
}

/// Solution lines without the byte-order mark, split on CRLF.
pub fn solution_lines(content: &str) -> Vec<&str> {
    content.trim_start_matches('\u{feff}').split("\r\n").collect()
}
