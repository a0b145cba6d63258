//! Project descriptor reading
//!
//! [`XmlProjectReader`] parses one descriptor into a [`ProjectDescriptor`]:
//! identity properties, output location and the declared (still unresolved)
//! references. It knows nothing about other projects; cross-project
//! resolution happens in the loader.
//!
//! Elements are matched by local name anywhere in the document, in the
//! MSBuild namespace or in no namespace. For single-valued properties the
//! first occurrence in document order wins, so conditional property groups
//! never override the unconditional one that precedes them.

use anyhow::Result;
use roxmltree::{Document, Node};
use std::path::{Path, PathBuf};
use tracing::trace;

use super::{OutputType, ProjectId, ReferenceKind};
use crate::constants::{MSBUILD_NAMESPACE, TEST_NAME_MARKER, WEB_CONFIG_FILE};
use crate::core::SlnError;
use crate::utils::{fs::read_text_file, path};

/// Reads descriptors from disk or from already loaded text.
pub trait ProjectReader: Send + Sync {
    /// Parse descriptor `content` that was read from `path`.
    fn parse(&self, path: &Path, content: &str) -> Result<ProjectDescriptor>;

    /// Read and parse the descriptor at `path`.
    fn read(&self, path: &Path) -> Result<ProjectDescriptor> {
        let content = read_text_file(path)?;
        self.parse(path, &content)
    }
}

/// A reference exactly as the descriptor declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredReference {
    pub kind: ReferenceKind,
    /// `Include` attribute; absent for platform-application entries.
    pub include: Option<String>,
    /// `HintPath` child, or the descriptor path of a platform-application entry.
    pub hint_path: Option<String>,
    /// `Project` child or platform-application identifier.
    pub target: Option<ProjectId>,
}

/// A `Compile` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedFile {
    pub include: String,
    /// `Link` child; present when the file is linked from outside the project.
    pub link: Option<String>,
}

/// Everything read from one descriptor, before cross-project resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    pub path: PathBuf,
    pub id: ProjectId,
    pub assembly_name: String,
    pub root_namespace: String,
    pub output_type: OutputType,
    pub output_folder: PathBuf,
    pub resolved_output: PathBuf,
    pub key_file: Option<String>,
    /// File references, then project references, then platform-application entries.
    pub references: Vec<DeclaredReference>,
    pub included_files: Vec<IncludedFile>,
    pub is_launcher: bool,
}

impl ProjectDescriptor {
    /// Directory holding the descriptor.
    #[must_use]
    pub fn directory(&self) -> PathBuf {
        self.path.parent().map(PathBuf::from).unwrap_or_default()
    }

    /// Number of declared references of `kind`.
    #[must_use]
    pub fn count_of(&self, kind: ReferenceKind) -> usize {
        self.references.iter().filter(|r| r.kind == kind).count()
    }
}

/// Self-contained descriptor reader built on `roxmltree`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlProjectReader;

impl XmlProjectReader {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ProjectReader for XmlProjectReader {
    fn parse(&self, path: &Path, content: &str) -> Result<ProjectDescriptor> {
        let content = content.trim_start_matches('\u{feff}');
        let document = Document::parse(content).map_err(|e| malformed(path, e.to_string()))?;

        let id_text = required_value(&document, path, "ProjectGuid")?;
        let id: ProjectId = id_text
            .parse()
            .map_err(|e| malformed(path, format!("Property [ProjectGuid] is not a GUID: {e}")))?;

        let root_namespace = required_value(&document, path, "RootNamespace")?;
        let output_type: OutputType = required_value(&document, path, "OutputType")?
            .parse()
            .map_err(|e: String| malformed(path, e))?;

        let assembly_name = single_value(&document, "AssemblyName")
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| root_namespace.clone());

        let directory = path.parent().map(PathBuf::from).unwrap_or_default();
        let output_folder = match single_value(&document, "OutputPath") {
            Some(output_path) if !output_path.is_empty() => {
                path::resolve(&directory, &path::from_msbuild(&output_path))
            }
            _ => path::normalize(&directory),
        };
        let resolved_output =
            output_folder.join(format!("{assembly_name}.{}", output_type.extension()));

        let key_file = single_value(&document, "AssemblyOriginatorKeyFile").filter(|k| !k.is_empty());

        let mut references = item_references(&document, path, "Reference", ReferenceKind::File)?;
        references.extend(item_references(&document, path, "ProjectReference", ReferenceKind::Project)?);
        if let Some(list) = single_value(&document, "SilverlightApplicationList") {
            references.extend(parse_platform_applications(&list).map_err(|e| malformed(path, e))?);
        }

        let included_files = document
            .descendants()
            .filter(|n| is_msbuild_element(n, "Compile"))
            .filter_map(|n| {
                n.attribute("Include").map(|include| IncludedFile {
                    include: include.to_string(),
                    link: child_value(&n, "Link"),
                })
            })
            .collect();

        let is_launcher = output_type.is_executable()
            || directory.join(WEB_CONFIG_FILE).is_file()
            || assembly_name.to_lowercase().contains(TEST_NAME_MARKER);

        trace!(
            path = %path.display(),
            id = %id,
            references = references.len(),
            "Parsed project descriptor"
        );

        Ok(ProjectDescriptor {
            path: path.to_path_buf(),
            id,
            assembly_name,
            root_namespace,
            output_type,
            output_folder,
            resolved_output,
            key_file,
            references,
            included_files,
            is_launcher,
        })
    }
}

/// Parse a packed platform-application list: `id|path` entries separated by
/// commas. Entries with fewer than two parts are ignored.
pub fn parse_platform_applications(list: &str) -> Result<Vec<DeclaredReference>, String> {
    let mut references = Vec::new();
    for entry in list.split(',').filter(|e| !e.is_empty()) {
        let parts: Vec<&str> = entry.split('|').collect();
        if parts.len() < 2 {
            continue;
        }
        let target: ProjectId = parts[0]
            .parse()
            .map_err(|e| format!("invalid platform-application identifier '{}': {e}", parts[0].trim()))?;
        references.push(DeclaredReference {
            kind: ReferenceKind::PlatformApplication,
            include: None,
            hint_path: Some(parts[1].trim().to_string()),
            target: Some(target),
        });
    }
    Ok(references)
}

fn item_references(
    document: &Document<'_>,
    path: &Path,
    element: &str,
    kind: ReferenceKind,
) -> Result<Vec<DeclaredReference>> {
    document
        .descendants()
        .filter(|n| is_msbuild_element(n, element))
        .map(|node| -> Result<DeclaredReference> {
            let target = match child_value(&node, "Project") {
                Some(text) if kind == ReferenceKind::Project => Some(text.parse::<ProjectId>().map_err(|e| {
                    malformed(path, format!("ProjectReference target '{text}' is not a GUID: {e}"))
                })?),
                _ => None,
            };
            Ok(DeclaredReference {
                kind,
                include: node.attribute("Include").map(str::to_string),
                hint_path: child_value(&node, "HintPath"),
                target,
            })
        })
        .collect()
}

fn is_msbuild_element(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && matches!(node.tag_name().namespace(), None | Some(MSBUILD_NAMESPACE))
}

fn text_of(node: &Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn child_value(node: &Node<'_, '_>, name: &str) -> Option<String> {
    node.children().find(|n| is_msbuild_element(n, name)).map(|n| text_of(&n))
}

fn single_value(document: &Document<'_>, name: &str) -> Option<String> {
    document.descendants().find(|n| is_msbuild_element(n, name)).map(|n| text_of(&n))
}

fn required_value(document: &Document<'_>, path: &Path, name: &str) -> Result<String> {
    match single_value(document, name) {
        None => Err(malformed(path, format!("Property [{name}] not found"))),
        Some(value) if value.is_empty() => Err(malformed(path, format!("Property [{name}] is empty"))),
        Some(value) => Ok(value),
    }
}

fn malformed(path: &Path, reason: impl Into<String>) -> anyhow::Error {
    SlnError::MalformedDescriptor {
        path: path.display().to_string(),
        reason: reason.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LIBRARY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="4.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <ProjectGuid>{0f4e7c36-6b45-4b2b-9e3a-7d4f6c8b1a20}</ProjectGuid>
    <OutputType>Library</OutputType>
    <RootNamespace>Acme.Core</RootNamespace>
    <OutputPath>..\bin\Debug\</OutputPath>
    <AssemblyOriginatorKeyFile>..\keys\acme.snk</AssemblyOriginatorKeyFile>
  </PropertyGroup>
  <PropertyGroup Condition="'$(Configuration)' == 'Release'">
    <OutputPath>..\bin\Release\</OutputPath>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="log4net, Version=1.2.10.0, Culture=neutral">
      <HintPath>..\packages\log4net.dll</HintPath>
    </Reference>
    <Reference Include="System.Xml" />
  </ItemGroup>
  <ItemGroup>
    <ProjectReference Include="..\Util\Util.csproj">
      <Project>{11111111-2222-3333-4444-555555555555}</Project>
      <Name>Util</Name>
    </ProjectReference>
  </ItemGroup>
  <ItemGroup>
    <Compile Include="Class1.cs" />
    <Compile Include="..\Shared\AssemblyVersion.cs">
      <Link>Properties\AssemblyVersion.cs</Link>
    </Compile>
  </ItemGroup>
</Project>"#;

    #[cfg(unix)]
    #[test]
    fn test_parse_library_descriptor() {
        let path = Path::new("/src/Core/Core.csproj");
        let descriptor = XmlProjectReader::new().parse(path, LIBRARY).unwrap();

        assert_eq!(descriptor.id.to_string(), "{0F4E7C36-6B45-4B2B-9E3A-7D4F6C8B1A20}");
        assert_eq!(descriptor.assembly_name, "Acme.Core");
        assert_eq!(descriptor.output_type, OutputType::Library);
        assert_eq!(descriptor.output_folder, PathBuf::from("/src/bin/Debug"));
        assert_eq!(descriptor.resolved_output, PathBuf::from("/src/bin/Debug/Acme.Core.dll"));
        assert_eq!(descriptor.key_file.as_deref(), Some("..\\keys\\acme.snk"));
        assert!(!descriptor.is_launcher);

        assert_eq!(descriptor.references.len(), 3);
        assert_eq!(descriptor.count_of(ReferenceKind::File), 2);
        assert_eq!(descriptor.references[0].hint_path.as_deref(), Some("..\\packages\\log4net.dll"));
        assert_eq!(descriptor.references[1].hint_path, None);

        let project_ref = &descriptor.references[2];
        assert_eq!(project_ref.kind, ReferenceKind::Project);
        assert_eq!(
            project_ref.target.unwrap().to_string(),
            "{11111111-2222-3333-4444-555555555555}"
        );

        assert_eq!(descriptor.included_files.len(), 2);
        assert_eq!(
            descriptor.included_files[1].link.as_deref(),
            Some("Properties\\AssemblyVersion.cs")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_exe_output_and_assembly_name() {
        let content = r#"<Project xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <ProjectGuid>{22222222-2222-2222-2222-222222222222}</ProjectGuid>
    <OutputType>Exe</OutputType>
    <RootNamespace>Acme.Tool</RootNamespace>
    <AssemblyName>acmetool</AssemblyName>
  </PropertyGroup>
</Project>"#;
        let descriptor = XmlProjectReader::new().parse(Path::new("/src/Tool/Tool.csproj"), content).unwrap();

        assert_eq!(descriptor.resolved_output, PathBuf::from("/src/Tool/acmetool.exe"));
        assert!(descriptor.is_launcher);
    }

    #[test]
    fn test_descriptor_without_namespace_is_accepted() {
        let content = r"<Project>
  <PropertyGroup>
    <ProjectGuid>33333333-3333-3333-3333-333333333333</ProjectGuid>
    <OutputType>Library</OutputType>
    <RootNamespace>Acme.Tests</RootNamespace>
  </PropertyGroup>
</Project>";
        let descriptor = XmlProjectReader::new().parse(Path::new("Tests.csproj"), content).unwrap();
        assert_eq!(descriptor.assembly_name, "Acme.Tests");
        assert!(descriptor.is_launcher, "test assemblies are launchers");
    }

    #[test]
    fn test_foreign_namespace_is_ignored() {
        let content = r#"<Project xmlns="urn:other">
  <PropertyGroup>
    <ProjectGuid>33333333-3333-3333-3333-333333333333</ProjectGuid>
    <OutputType>Library</OutputType>
    <RootNamespace>Acme</RootNamespace>
  </PropertyGroup>
</Project>"#;
        let error = XmlProjectReader::new().parse(Path::new("X.csproj"), content).unwrap_err();
        assert!(error.to_string().contains("Property [ProjectGuid] not found"));
    }

    #[test]
    fn test_missing_and_empty_required_properties() {
        let empty_namespace = r"<Project><PropertyGroup>
    <ProjectGuid>33333333-3333-3333-3333-333333333333</ProjectGuid>
    <OutputType>Library</OutputType>
    <RootNamespace>  </RootNamespace>
</PropertyGroup></Project>";
        let error = XmlProjectReader::new().parse(Path::new("X.csproj"), empty_namespace).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SlnError>(),
            Some(SlnError::MalformedDescriptor { reason, .. }) if reason == "Property [RootNamespace] is empty"
        ));

        let bad_type = r"<Project><PropertyGroup>
    <ProjectGuid>33333333-3333-3333-3333-333333333333</ProjectGuid>
    <OutputType>Module</OutputType>
    <RootNamespace>Acme</RootNamespace>
</PropertyGroup></Project>";
        assert!(XmlProjectReader::new().parse(Path::new("X.csproj"), bad_type).is_err());

        assert!(XmlProjectReader::new().parse(Path::new("X.csproj"), "<Project>").is_err());
    }

    #[test]
    fn test_web_config_marks_launcher() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Web.config"), "<configuration/>").unwrap();
        let content = r"<Project><PropertyGroup>
    <ProjectGuid>44444444-4444-4444-4444-444444444444</ProjectGuid>
    <OutputType>Library</OutputType>
    <RootNamespace>Acme.Site</RootNamespace>
</PropertyGroup></Project>";

        let descriptor = XmlProjectReader::new()
            .parse(&temp.path().join("Site.csproj"), content)
            .unwrap();
        assert!(descriptor.is_launcher);
    }

    #[test]
    fn test_parse_platform_applications() {
        let list = "{55555555-5555-5555-5555-555555555555}|..\\Client\\Client.csproj|ClientBin|False,,broken,\
                    66666666-6666-6666-6666-666666666666|..\\Other\\Other.csproj";
        let references = parse_platform_applications(list).unwrap();

        assert_eq!(references.len(), 2);
        assert!(references.iter().all(|r| r.kind == ReferenceKind::PlatformApplication));
        assert_eq!(references[0].hint_path.as_deref(), Some("..\\Client\\Client.csproj"));
        assert_eq!(
            references[1].target.unwrap().to_string(),
            "{66666666-6666-6666-6666-666666666666}"
        );

        assert!(parse_platform_applications("nope|path").is_err());
    }
}
