//! Constants shared across the slngen codebase.
//!
//! Descriptor namespace, fixed solution header lines, file names and the
//! defaults used when the configuration leaves a value out.

/// XML namespace of project descriptors and the third-party sidecar.
pub const MSBUILD_NAMESPACE: &str = "http://schemas.microsoft.com/developer/msbuild/2003";

/// Project type marker written for every solution entry (C# project).
pub const CSHARP_PROJECT_TYPE: &str = "{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}";

/// Fixed lines opening every generated solution, in order.
///
/// The first line is intentionally empty.
pub const SOLUTION_HEADER: [&str; 5] = [
    "",
    "Microsoft Visual Studio Solution File, Format Version 12.00",
    "# Visual Studio 14",
    "VisualStudioVersion = 14.0.24720.0",
    "MinimumVisualStudioVersion = 10.0.40219.1",
];

/// Build configurations listed in the global sections.
pub const SOLUTION_CONFIGURATIONS: [&str; 2] = ["Debug", "Release"];

/// Platforms listed in the global sections, per configuration.
pub const SOLUTION_PLATFORMS: [&str; 4] = ["Any CPU", "Mixed Platforms", "X64", "x86"];

/// Platform every project configuration maps to.
pub const PROJECT_PLATFORM: &str = "Any CPU";

/// Line terminator of generated solution files.
pub const SOLUTION_LINE_ENDING: &str = "\r\n";

/// Suffix appended to the solution path for the third-party sidecar.
pub const THIRD_PARTIES_SUFFIX: &str = ".thirdparties";

/// MSBuild property prefixed to sidecar entries.
pub const ROOT_DIR_PROPERTY: &str = "$(RootDir)";

/// Glob used to discover project descriptors under source folders.
pub const DESCRIPTOR_PATTERN: &str = "*.csproj";

/// Glob used to discover binaries under third-party folders.
pub const THIRD_PARTY_PATTERN: &str = "*.dll";

/// Companion file copied next to each third-party binary when present.
pub const DEPENDENCY_COMPANION_EXTENSION: &str = "dep";

/// Web deployment descriptor that marks a project as a launcher.
pub const WEB_CONFIG_FILE: &str = "Web.config";

/// Assembly-name fragment that marks a project as a launcher.
pub const TEST_NAME_MARKER: &str = "test";

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "slngen.toml";

/// Assembly-name prefixes treated as framework references by default.
pub const DEFAULT_FRAMEWORK_PREFIXES: [&str; 1] = ["Microsoft."];

/// Framework assemblies recognized without scanning any folder.
pub const BUILTIN_SYSTEM_ASSEMBLIES: [&str; 11] = [
    "mscorlib",
    "System",
    "System.Core",
    "System.Data",
    "System.Xml",
    "System.Xml.Linq",
    "WindowsBase",
    "PresentationCore",
    "PresentationFramework",
    "netstandard",
    "Accessibility",
];

/// Sub-folders of the program-files directories holding reference assemblies.
pub const FRAMEWORK_SUBFOLDERS: [&str; 4] = [
    "Reference Assemblies",
    "Microsoft.NET",
    "Microsoft SDKs",
    "Microsoft Visual Studio 10.0/Common7/IDE/PublicAssemblies",
];

/// Environment variables naming program-files directories.
pub const PROGRAM_FILES_VARIABLES: [&str; 2] = ["ProgramFiles(x86)", "ProgramFiles"];
