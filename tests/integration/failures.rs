use slngen_cli::config::ToolkitConfig;
use slngen_cli::core::SlnError;
use slngen_cli::generator::SolutionGenerator;
use slngen_cli::policy::PolicyRule;
use slngen_cli::test_utils::{DescriptorBuilder, TestWorkspace};

fn find_error<'a>(err: &'a anyhow::Error, matches: impl Fn(&SlnError) -> bool) -> Option<&'a SlnError> {
    err.chain().filter_map(|cause| cause.downcast_ref::<SlnError>()).find(|e| matches(e))
}

fn generator(workspace: &TestWorkspace) -> anyhow::Result<SolutionGenerator> {
    let config = ToolkitConfig::load_resolved(&workspace.path("slngen.toml"))?;
    SolutionGenerator::new(config)
}

#[tokio::test]
async fn test_cycle_aborts_without_writing_anything() {
    let workspace = TestWorkspace::new().unwrap();
    let a = DescriptorBuilder::exe("Acme.A");
    let b = DescriptorBuilder::library("Acme.B").project_reference(&a, "..\\A\\A.csproj");
    let c = DescriptorBuilder::exe("Acme.C").project_reference(&b, "..\\B\\B.csproj");
    let a = a.project_reference(&b, "..\\B\\B.csproj");
    workspace.write_descriptor("A/A.csproj", &a).unwrap();
    workspace.write_descriptor("B/B.csproj", &b).unwrap();
    workspace.write_descriptor("C/C.csproj", &c).unwrap();
    workspace.write_config("").unwrap();

    let generator = generator(&workspace).unwrap();
    generator.load_sources().await.unwrap();

    let roots = generator.resolve_roots(&["Acme.A".to_string()]).unwrap();
    let err = generator.generate_solution(&roots, &workspace.path("A.sln"), true).unwrap_err();
    let Some(SlnError::CircularReference { chain }) =
        find_error(&err, |e| matches!(e, SlnError::CircularReference { .. }))
    else {
        panic!("expected a circular reference, got {err:#}");
    };
    assert_eq!(chain.len(), 3);
    assert!(chain[0].ends_with("A.csproj"));
    assert!(chain[1].ends_with("B.csproj"));
    assert!(chain[2].ends_with("A.csproj"));
    assert!(!workspace.exists("A.sln"));

    // A root outside the cycle that reaches it fails too.
    let roots = generator.resolve_roots(&["Acme.C".to_string()]).unwrap();
    let err = generator.generate_solution(&roots, &workspace.path("C.sln"), true).unwrap_err();
    assert!(find_error(&err, |e| matches!(e, SlnError::CircularReference { .. })).is_some());
    assert!(!workspace.exists("C.sln"));
}

#[tokio::test]
async fn test_duplicate_assembly_name_names_both_descriptors() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.write_descriptor("One/One.csproj", &DescriptorBuilder::library("Acme.Core")).unwrap();
    workspace.write_descriptor("Two/Two.csproj", &DescriptorBuilder::library("Acme.Core")).unwrap();
    workspace.write_config("").unwrap();

    let generator = generator(&workspace).unwrap();
    let err = generator.load_sources().await.unwrap_err();

    let Some(SlnError::DuplicateProject { property, first, second, .. }) =
        find_error(&err, |e| matches!(e, SlnError::DuplicateProject { .. }))
    else {
        panic!("expected a duplicate project, got {err:#}");
    };
    assert_eq!(property, "assembly name");
    let both = format!("{first} {second}");
    assert!(both.contains("One.csproj"));
    assert!(both.contains("Two.csproj"));
}

#[tokio::test]
async fn test_unresolved_reference_respects_policy() {
    let workspace = TestWorkspace::new().unwrap();
    let app = DescriptorBuilder::exe("Acme.App").file_reference("Acme.Missing", Some("..\\lib\\Acme.Missing.dll"));
    workspace.write_descriptor("App/App.csproj", &app).unwrap();
    workspace.write_config("").unwrap();

    let strict = generator(&workspace).unwrap();
    strict.load_sources().await.unwrap();
    let roots = strict.resolve_roots(&["Acme.App".to_string()]).unwrap();
    let err = strict.generate_solution(&roots, &workspace.path("App.sln"), true).unwrap_err();
    assert!(
        find_error(&err, |e| matches!(
            e,
            SlnError::PolicyViolation {
                rule: PolicyRule::ReferenceNotResolved,
                ..
            }
        ))
        .is_some()
    );
    assert!(format!("{err:#}").contains("Reference Acme.Missing was not resolved"));
    assert!(!workspace.exists("App.sln"));

    workspace.write_config("[policy]\nwhen-reference-not-resolved = \"warn\"\n").unwrap();
    let lenient = generator(&workspace).unwrap();
    lenient.load_sources().await.unwrap();
    let report = lenient.generate_solution(&roots, &workspace.path("App.sln"), true).unwrap();
    assert_eq!(report.project_count, 1);
    assert!(report.sidecar_path.is_none());
}

#[tokio::test]
async fn test_missing_third_party_folder_is_fatal() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.write_config("third-party-folders = [\"packages\"]\n").unwrap();

    let err = generator(&workspace).err().expect("configuration should not resolve");
    assert!(find_error(&err, |e| matches!(e, SlnError::FolderNotFound { .. })).is_some());
}

#[tokio::test]
async fn test_malformed_descriptor_fails_the_load() {
    let workspace = TestWorkspace::new().unwrap();
    workspace
        .write_file(
            "Broken/Broken.csproj",
            "<Project xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\"><PropertyGroup><OutputType>Library</OutputType></PropertyGroup></Project>",
        )
        .unwrap();
    workspace.write_config("").unwrap();

    let generator = generator(&workspace).unwrap();
    let err = generator.load_sources().await.unwrap_err();
    assert!(find_error(&err, |e| matches!(e, SlnError::MalformedDescriptor { .. })).is_some());
    assert!(generator.loader().is_empty());
}
