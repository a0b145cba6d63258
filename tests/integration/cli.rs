use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::common::{SampleTree, run_slngen, solution_lines};

fn slngen() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_slngen"));
    command.env("NO_COLOR", "1").env_remove("RUST_LOG");
    command
}

#[test]
fn test_generate_writes_solution_and_sidecar() {
    let tree = SampleTree::new().unwrap();

    let output = tree.run(&["generate", "-g", "web", "-o", "Web.sln"]).unwrap();
    output.assert_success().assert_stdout_contains("✓ Generated").assert_stdout_contains("with 3 projects");

    let bytes = std::fs::read(tree.workspace.path("Web.sln")).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"), "solution starts with a byte order mark");
    let content = String::from_utf8(bytes).unwrap();
    assert!(content.ends_with("EndGlobal\r\n"));
    assert!(!content.replace("\r\n", "").contains('\n'), "every line ends with CRLF");
    assert_eq!(solution_lines(&content).iter().filter(|l| l.starts_with("Project(")).count(), 3);

    assert!(tree.workspace.exists("Web.sln.thirdparties"));
}

#[test]
fn test_generate_without_sidecar() {
    let tree = SampleTree::new().unwrap();

    slngen()
        .current_dir(tree.root())
        .args(["generate", "-p", "Acme.Tools", "-o", "out/Tools.sln", "--no-sidecar"])
        .assert()
        .success()
        .stdout(predicate::str::contains("with 2 projects"));

    let content = tree.workspace.read("out/Tools.sln").unwrap();
    assert!(content.contains("\"Tools\", \"..\\src\\Tools\\Tools.csproj\""));
    assert!(content.contains(&tree.core.to_string()));
    assert!(!tree.workspace.exists("out/Tools.sln.thirdparties"));
}

#[test]
fn test_config_flag_resolves_output_against_config_dir() {
    let tree = SampleTree::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let config = tree.workspace.path("slngen.toml");

    slngen()
        .current_dir(elsewhere.path())
        .args(["-c", config.to_str().unwrap(), "generate", "-g", "tools", "-o", "Tools.sln"])
        .assert()
        .success();

    assert!(tree.workspace.exists("Tools.sln"));
    assert!(!elsewhere.path().join("Tools.sln").exists());
}

#[test]
fn test_unused_as_json() {
    let tree = SampleTree::new().unwrap();

    let output = tree.run(&["unused", "-g", "web", "--format", "json"]).unwrap();
    output.assert_success();

    let entries: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    let mut names: Vec<&str> =
        entries.as_array().unwrap().iter().map(|entry| entry["name"].as_str().unwrap()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Acme.Orphan", "Acme.Tools"]);

    let tools = entries.as_array().unwrap().iter().find(|entry| entry["name"] == "Acme.Tools").unwrap();
    assert_eq!(tools["id"], tree.tools.to_string());
}

#[test]
fn test_unused_rejects_unknown_format() {
    let tree = SampleTree::new().unwrap();
    tree.run(&["unused", "--format", "yaml"])
        .unwrap()
        .assert_failure()
        .assert_stderr_contains("Invalid format 'yaml'");
}

#[test]
fn test_copy_third_parties_command() {
    let tree = SampleTree::new().unwrap();

    slngen()
        .current_dir(tree.root())
        .args(["copy-third-parties", "-g", "web", "-o", "deploy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Copied 2 files"));

    assert!(tree.workspace.exists("deploy/Vendor.Json.dll"));
    assert!(tree.workspace.exists("deploy/Vendor.Json.dep"));
}

#[test]
fn test_unknown_group_suggests_closest_name() {
    let tree = SampleTree::new().unwrap();

    tree.run(&["generate", "-g", "tool", "-o", "Tools.sln"])
        .unwrap()
        .assert_failure()
        .assert_stderr_contains("Group with name tool not found in configuration")
        .assert_stderr_contains("Did you mean 'tools'?");
    assert!(!tree.workspace.exists("Tools.sln"));
}

#[test]
fn test_missing_config_points_to_init() {
    let temp_dir = TempDir::new().unwrap();

    slngen()
        .current_dir(temp_dir.path())
        .args(["generate", "-o", "All.sln"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("slngen init"));
}

#[test]
fn test_init_then_refuse_overwrite() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_slngen(temp_dir.path(), &["init"]).unwrap();
    output.assert_success().assert_stdout_contains("Initialized");
    let content = std::fs::read_to_string(temp_dir.path().join("slngen.toml")).unwrap();
    assert!(content.contains("[[groups]]"));

    run_slngen(temp_dir.path(), &["init"]).unwrap().assert_failure().assert_stderr_contains("--force");
    run_slngen(temp_dir.path(), &["init", "--force"]).unwrap().assert_success();
}

#[test]
fn test_verbose_and_quiet_conflict() {
    slngen().args(["--verbose", "--quiet", "init"]).assert().failure();
}
