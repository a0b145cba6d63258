use slngen_cli::config::ToolkitConfig;
use slngen_cli::generator::SolutionGenerator;
use std::collections::HashSet;

use crate::common::{SampleTree, solution_lines};

async fn load(tree: &SampleTree) -> SolutionGenerator {
    let config = ToolkitConfig::load_resolved(&tree.workspace.path("slngen.toml")).unwrap();
    let generator = SolutionGenerator::new(config).unwrap();
    assert_eq!(generator.load_sources().await.unwrap(), 5);
    generator
}

fn project_lines<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    lines.iter().copied().filter(|line| line.starts_with("Project(")).collect()
}

#[tokio::test]
async fn test_group_generates_closure_in_dependency_order() {
    let tree = SampleTree::new().unwrap();
    let generator = load(&tree).await;

    let roots = generator.select_roots(&["web".to_string()], &[]).unwrap();
    let report = generator.generate_solution(&roots, &tree.workspace.path("out/Web.sln"), true).unwrap();
    assert_eq!(report.project_count, 3);

    let content = tree.workspace.read("out/Web.sln").unwrap();
    let lines = solution_lines(&content);
    assert_eq!(lines[1], "Microsoft Visual Studio Solution File, Format Version 12.00");

    let projects = project_lines(&lines);
    assert_eq!(projects.len(), 3);
    assert!(projects[0].contains("\"Core\", \"..\\src\\Core\\Core.csproj\""));
    assert!(projects[1].contains("\"Data\", \"..\\src\\Data\\Data.csproj\""));
    assert!(projects[2].contains("\"Web\", \"..\\src\\Web\\Web.csproj\""));
    assert!(!content.contains("Tools.csproj"));
    assert!(!content.contains("Orphan.csproj"));

    // Core has no project dependencies; Data and Web have one each.
    assert_eq!(content.matches("ProjectSection(ProjectDependencies) = postProject").count(), 2);
    assert!(content.contains(&format!("\t\t{} = {}\r\n", tree.core, tree.core)));
    assert!(content.contains(&format!("\t\t{} = {}\r\n", tree.data, tree.data)));
    assert_eq!(content.matches(".ActiveCfg = ").count(), 3 * 8);
}

#[tokio::test]
async fn test_sidecar_lists_third_parties_with_companions() {
    let tree = SampleTree::new().unwrap();
    let generator = load(&tree).await;

    let roots = generator.select_roots(&["web".to_string()], &[]).unwrap();
    let report = generator.generate_solution(&roots, &tree.workspace.path("Web.sln"), true).unwrap();

    assert_eq!(report.sidecar_path, Some(tree.workspace.path("Web.sln.thirdparties")));
    assert_eq!(
        report.third_parties,
        vec![
            tree.workspace.path("packages/Vendor.Json/Vendor.Json.dep"),
            tree.workspace.path("packages/Vendor.Json/Vendor.Json.dll"),
        ]
    );

    let sidecar = tree.workspace.read("Web.sln.thirdparties").unwrap();
    assert!(sidecar.contains("<ThirdPartyFiles Include=\"$(RootDir)\\packages\\Vendor.Json\\Vendor.Json.dll\" />"));
    assert!(sidecar.contains("<ThirdPartyFiles Include=\"$(RootDir)\\packages\\Vendor.Json\\Vendor.Json.dep\" />"));
    assert!(!sidecar.contains("Vendor.Xml"));
}

#[tokio::test]
async fn test_no_group_selects_every_group() {
    let tree = SampleTree::new().unwrap();
    let generator = load(&tree).await;

    let roots = generator.select_roots(&[], &[]).unwrap();
    assert_eq!(roots.len(), 2, "nested group members are deduplicated");

    let report = generator.generate_solution(&roots, &tree.workspace.path("All.sln"), true).unwrap();
    assert_eq!(report.project_count, 4);
    let content = tree.workspace.read("All.sln").unwrap();
    assert_eq!(content.matches("\"Core\", ").count(), 1);
    assert!(content.contains("\"Tools\", \"src\\Tools\\Tools.csproj\""));
}

#[tokio::test]
async fn test_projects_combine_with_named_groups() {
    let tree = SampleTree::new().unwrap();
    let generator = load(&tree).await;

    let only_project = generator.select_roots(&[], &["Acme.Tools".to_string()]).unwrap();
    assert_eq!(only_project, vec![tree.workspace.path("src/Tools/Tools.csproj")]);

    let combined = generator
        .select_roots(&["web".to_string()], &["src/Orphan/Orphan.csproj".to_string()])
        .unwrap();
    assert_eq!(
        combined,
        vec![tree.workspace.path("src/Web/Web.csproj"), tree.workspace.path("src/Orphan/Orphan.csproj")]
    );
}

#[tokio::test]
async fn test_generation_is_deterministic_and_memoized() {
    let tree = SampleTree::new().unwrap();
    let generator = load(&tree).await;
    let roots = generator.select_roots(&["everything".to_string()], &[]).unwrap();

    generator.generate_solution(&roots, &tree.workspace.path("First.sln"), false).unwrap();
    let closures = generator.cache().closure_count();
    assert_eq!(closures, 4);

    generator.generate_solution(&roots, &tree.workspace.path("Second.sln"), false).unwrap();
    assert_eq!(generator.cache().closure_count(), closures);
    assert_eq!(tree.workspace.read("First.sln").unwrap(), tree.workspace.read("Second.sln").unwrap());
    assert!(!tree.workspace.exists("First.sln.thirdparties"));
}

#[tokio::test]
async fn test_unused_projects_exclude_the_closure() {
    let tree = SampleTree::new().unwrap();
    let generator = load(&tree).await;
    let roots = generator.select_roots(&["web".to_string()], &[]).unwrap();

    let unused: HashSet<String> = generator
        .find_unused_projects(&roots)
        .unwrap()
        .iter()
        .map(|project| project.assembly_name.clone())
        .collect();
    assert_eq!(unused, HashSet::from(["Acme.Tools".to_string(), "Acme.Orphan".to_string()]));
}

#[tokio::test]
async fn test_copy_third_parties_skips_unchanged_files() {
    let tree = SampleTree::new().unwrap();
    let generator = load(&tree).await;
    let roots = generator.select_roots(&["tools".to_string()], &[]).unwrap();
    let output = tree.workspace.path("deploy");

    let first = generator.copy_third_parties(&roots, &output).unwrap();
    assert_eq!(first.copied, 2);
    assert!(first.failed.is_empty());
    assert_eq!(tree.workspace.read("deploy/Vendor.Json.dll").unwrap(), "json");
    assert_eq!(tree.workspace.read("deploy/Vendor.Json.dep").unwrap(), "deps");
    assert!(!tree.workspace.exists("deploy/Vendor.Xml.dll"));

    let second = generator.copy_third_parties(&roots, &output).unwrap();
    assert_eq!(second.copied, 0);
    assert_eq!(second.up_to_date, 2);
}

#[tokio::test]
async fn test_custom_header_follows_fixed_header() {
    let tree = SampleTree::new().unwrap();
    tree.workspace
        .write_config(&format!("append-to-solution = \"# Generated by the nightly build\"\n{}", crate::common::SAMPLE_CONFIG))
        .unwrap();
    let generator = load(&tree).await;
    let roots = generator.select_roots(&["tools".to_string()], &[]).unwrap();

    generator.generate_solution(&roots, &tree.workspace.path("Tools.sln"), false).unwrap();
    let content = tree.workspace.read("Tools.sln").unwrap();
    let lines = solution_lines(&content);
    assert_eq!(lines[4], "MinimumVisualStudioVersion = 10.0.40219.1");
    assert_eq!(lines[5], "# Generated by the nightly build");
    assert!(lines[6].starts_with("Project("));
}
