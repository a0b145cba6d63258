//! Project model: build units, their references and identifiers
//!
//! A [`Project`] is created by the [`ProjectLoader`](crate::loader::ProjectLoader)
//! from a [`ProjectDescriptor`] produced by a [`ProjectReader`]. Every path on
//! a loaded project is absolute and lexically normalized; nothing on it changes
//! after loading.
//!
//! # Reference kinds
//!
//! | Kind | Declared as | Resolved by |
//! |---|---|---|
//! | [`ReferenceKind::File`] | `<Reference Include=".."><HintPath>` | expected output path |
//! | [`ReferenceKind::Project`] | `<ProjectReference><Project>{guid}` | project identifier |
//! | [`ReferenceKind::PlatformApplication`] | `<SilverlightApplicationList>id\|path,..` | project identifier |

pub mod reader;

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

pub use reader::{DeclaredReference, IncludedFile, ProjectDescriptor, ProjectReader, XmlProjectReader};

/// Stable 128-bit project identifier.
///
/// Displays in the braced upper-case form solution files use:
/// `{0F4E7C36-6B45-4B2B-9E3A-7D4F6C8B1A20}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// A fresh random identifier.
    #[must_use]
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Whether this is the all-zero identifier.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for ProjectId {
    type Err = uuid::Error;

    /// Accepts braced, hyphenated, simple and URN forms in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hyphenated = self.0.hyphenated().to_string().to_uppercase();
        write!(f, "{{{hyphenated}}}")
    }
}

impl Serialize for ProjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Kind of binary a project produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputType {
    Exe,
    WinExe,
    Library,
}

impl OutputType {
    /// Extension of the produced binary, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Exe | Self::WinExe => "exe",
            Self::Library => "dll",
        }
    }

    /// Whether the output is directly runnable.
    #[must_use]
    pub const fn is_executable(self) -> bool {
        matches!(self, Self::Exe | Self::WinExe)
    }
}

impl FromStr for OutputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exe" => Ok(Self::Exe),
            "winexe" => Ok(Self::WinExe),
            "library" => Ok(Self::Library),
            other => Err(format!("unknown OutputType '{other}'")),
        }
    }
}

/// How a reference names its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    /// Assembly reference resolved through its hint path.
    File,
    /// Project-to-project reference resolved by identifier.
    Project,
    /// Legacy packed platform-application entry resolved by identifier.
    PlatformApplication,
}

impl ReferenceKind {
    /// Whether the walker resolves this kind by project identifier.
    #[must_use]
    pub const fn resolves_by_id(self) -> bool {
        matches!(self, Self::Project | Self::PlatformApplication)
    }
}

/// A resolved dependency edge of a loaded [`Project`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: ReferenceKind,
    /// Target identifier for project and platform-application references.
    pub target: Option<ProjectId>,
    /// Include text as declared (assembly name of the target for
    /// platform-application references).
    pub include: String,
    /// Include text up to the first comma (no version, culture or token).
    pub resolved_include: String,
    /// Hint path as declared.
    pub hint_path: Option<String>,
    /// Absolute path of the binary this reference expects.
    pub resolved_hint_path: PathBuf,
}

/// One loaded build unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub assembly_name: String,
    pub root_namespace: String,
    pub output_type: OutputType,
    /// Absolute output directory.
    pub output_folder: PathBuf,
    /// Absolute path of the produced binary.
    pub resolved_output: PathBuf,
    /// Absolute descriptor location; the loader's identity key.
    pub descriptor_path: PathBuf,
    /// Signing key as declared.
    pub key_file: Option<String>,
    /// Signing key resolved against the descriptor directory.
    pub resolved_key_file: Option<PathBuf>,
    /// References in descriptor order: file, project, platform-application.
    pub references: Vec<Reference>,
    pub included_files: Vec<IncludedFile>,
    pub is_launcher: bool,
}

impl Project {
    /// Directory holding the descriptor.
    #[must_use]
    pub fn directory(&self) -> PathBuf {
        self.descriptor_path.parent().map(PathBuf::from).unwrap_or_default()
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.assembly_name, self.descriptor_path.display())
    }
}
