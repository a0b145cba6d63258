//! Project descriptor fixtures

use std::fmt::{self, Write};

use crate::constants::MSBUILD_NAMESPACE;
use crate::project::ProjectId;

/// Builder rendering a project descriptor document.
///
/// Paths are written exactly as given, so tests can use either `/` or `\`.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    id: ProjectId,
    root_namespace: String,
    assembly_name: Option<String>,
    output_type: String,
    output_path: Option<String>,
    key_file: Option<String>,
    file_references: Vec<(String, Option<String>)>,
    project_references: Vec<(String, ProjectId)>,
    platform_applications: Vec<(ProjectId, String)>,
    compile_items: Vec<(String, Option<String>)>,
}

impl DescriptorBuilder {
    /// A library with a random identifier; `name` is the root namespace.
    pub fn library(name: &str) -> Self {
        Self {
            id: ProjectId::new_random(),
            root_namespace: name.to_string(),
            assembly_name: None,
            output_type: "Library".to_string(),
            output_path: Some("bin".to_string()),
            key_file: None,
            file_references: Vec::new(),
            project_references: Vec::new(),
            platform_applications: Vec::new(),
            compile_items: Vec::new(),
        }
    }

    /// A console executable.
    pub fn exe(name: &str) -> Self {
        Self::library(name).output_type("Exe")
    }

    /// The identifier this descriptor declares.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.id
    }

    /// Assembly name the descriptor resolves to.
    #[must_use]
    pub fn name(&self) -> &str {
        self.assembly_name.as_deref().unwrap_or(&self.root_namespace)
    }

    #[must_use]
    pub const fn id(mut self, id: ProjectId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn assembly_name(mut self, name: &str) -> Self {
        self.assembly_name = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn root_namespace(mut self, name: &str) -> Self {
        self.root_namespace = name.to_string();
        self
    }

    #[must_use]
    pub fn output_type(mut self, output_type: &str) -> Self {
        self.output_type = output_type.to_string();
        self
    }

    /// Output folder relative to the descriptor; `None` omits `OutputPath`.
    #[must_use]
    pub fn output_path(mut self, path: Option<&str>) -> Self {
        self.output_path = path.map(str::to_string);
        self
    }

    #[must_use]
    pub fn key_file(mut self, path: &str) -> Self {
        self.key_file = Some(path.to_string());
        self
    }

    /// Add `<Reference Include=..>` with an optional `HintPath`.
    #[must_use]
    pub fn file_reference(mut self, include: &str, hint_path: Option<&str>) -> Self {
        self.file_references.push((include.to_string(), hint_path.map(str::to_string)));
        self
    }

    /// Add a `ProjectReference` to `target`, located at `path`.
    #[must_use]
    pub fn project_reference(mut self, target: &Self, path: &str) -> Self {
        self.project_references.push((path.to_string(), target.id));
        self
    }

    /// Add a `ProjectReference` with an explicit target identifier.
    #[must_use]
    pub fn project_reference_id(mut self, path: &str, target: ProjectId) -> Self {
        self.project_references.push((path.to_string(), target));
        self
    }

    /// Add a platform-application entry pointing at the descriptor at `path`.
    #[must_use]
    pub fn platform_application(mut self, target: &Self, path: &str) -> Self {
        self.platform_applications.push((target.id, path.to_string()));
        self
    }

    /// Add a `Compile` item with an optional `Link`.
    #[must_use]
    pub fn compile(mut self, include: &str, link: Option<&str>) -> Self {
        self.compile_items.push((include.to_string(), link.map(str::to_string)));
        self
    }

    /// Render the descriptor XML.
    #[must_use]
    pub fn build(&self) -> String {
        let mut xml = String::new();
        let _ = self.write_to(&mut xml);
        xml
    }

    fn write_to(&self, xml: &mut String) -> fmt::Result {
        writeln!(xml, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
        writeln!(xml, "<Project ToolsVersion=\"4.0\" xmlns=\"{MSBUILD_NAMESPACE}\">")?;
        writeln!(xml, "  <PropertyGroup>")?;
        writeln!(xml, "    <ProjectGuid>{}</ProjectGuid>", self.id)?;
        writeln!(xml, "    <OutputType>{}</OutputType>", self.output_type)?;
        writeln!(xml, "    <RootNamespace>{}</RootNamespace>", escape(&self.root_namespace))?;
        if let Some(name) = &self.assembly_name {
            writeln!(xml, "    <AssemblyName>{}</AssemblyName>", escape(name))?;
        }
        if let Some(path) = &self.output_path {
            writeln!(xml, "    <OutputPath>{}</OutputPath>", escape(path))?;
        }
        if let Some(key) = &self.key_file {
            writeln!(xml, "    <AssemblyOriginatorKeyFile>{}</AssemblyOriginatorKeyFile>", escape(key))?;
        }
        if !self.platform_applications.is_empty() {
            let list: Vec<String> = self
                .platform_applications
                .iter()
                .map(|(id, path)| format!("{id}|{path}|ClientBin|False"))
                .collect();
            writeln!(xml, "    <SilverlightApplicationList>{}</SilverlightApplicationList>", escape(&list.join(",")))?;
        }
        writeln!(xml, "  </PropertyGroup>")?;

        if !self.file_references.is_empty() {
            writeln!(xml, "  <ItemGroup>")?;
            for (include, hint) in &self.file_references {
                match hint {
                    Some(hint) => writeln!(
                        xml,
                        "    <Reference Include=\"{}\">\n      <HintPath>{}</HintPath>\n    </Reference>",
                        escape(include),
                        escape(hint)
                    )?,
                    None => writeln!(xml, "    <Reference Include=\"{}\" />", escape(include))?,
                }
            }
            writeln!(xml, "  </ItemGroup>")?;
        }

        if !self.project_references.is_empty() {
            writeln!(xml, "  <ItemGroup>")?;
            for (path, id) in &self.project_references {
                writeln!(
                    xml,
                    "    <ProjectReference Include=\"{}\">\n      <Project>{id}</Project>\n    </ProjectReference>",
                    escape(path)
                )?;
            }
            writeln!(xml, "  </ItemGroup>")?;
        }

        if !self.compile_items.is_empty() {
            writeln!(xml, "  <ItemGroup>")?;
            for (include, link) in &self.compile_items {
                match link {
                    Some(link) => writeln!(
                        xml,
                        "    <Compile Include=\"{}\">\n      <Link>{}</Link>\n    </Compile>",
                        escape(include),
                        escape(link)
                    )?,
                    None => writeln!(xml, "    <Compile Include=\"{}\" />", escape(include))?,
                }
            }
            writeln!(xml, "  </ItemGroup>")?;
        }

        writeln!(xml, "</Project>")
    }
}

fn escape(value: &str) -> String {
    value.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}
