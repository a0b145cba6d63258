//! Error handling for slngen
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`SlnError`]) for every failure the engine can
//!    report, so callers and tests can match on the failure kind.
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions
//!    for the command-line front end.
//!
//! Library functions return [`anyhow::Result`] and raise [`SlnError`] values
//! through `?`. Context added with [`anyhow::Context`] names the file being
//! processed; the typed root cause stays reachable through
//! [`anyhow::Error::downcast_ref`] or [`anyhow::Error::root_cause`].
//!
//! # Error Categories
//!
//! - **Descriptors**: [`SlnError::MalformedDescriptor`], [`SlnError::DuplicateProject`]
//! - **Graph**: [`SlnError::CircularReference`], [`SlnError::CircularPlatformReference`]
//! - **Policy**: [`SlnError::PolicyViolation`]
//! - **Selection**: [`SlnError::ProjectNotFound`], [`SlnError::GroupNotFound`],
//!   [`SlnError::NoProjectsSelected`]
//! - **File system**: [`SlnError::FolderNotFound`], [`SlnError::FileNotFound`],
//!   [`SlnError::FileSystemError`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use slngen_cli::core::{SlnError, user_friendly_error};
//!
//! let error = SlnError::ProjectNotFound {
//!     assembly_name: "Acme.Web".to_string(),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::policy::PolicyRule;

/// The main error type for slngen operations
///
/// Each variant describes one failure mode of loading, walking or rendering.
/// Every variant is fatal when it reaches the command line; policy warnings
/// never become errors (they are logged instead).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlnError {
    /// A required descriptor property is missing, empty or unparsable.
    #[error("Malformed project descriptor {path}: {reason}")]
    MalformedDescriptor {
        /// Descriptor location
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// Two descriptors share an identifier, output path or assembly name.
    #[error("Duplicated project {property} = {value}\nlocation = {first}\nlocation = {second}")]
    DuplicateProject {
        /// Which identity property collided ("ID", "output path", "assembly name")
        property: String,
        /// The colliding value
        value: String,
        /// Descriptor that was registered first
        first: String,
        /// Descriptor that tried to register the same value
        second: String,
    },

    /// The reference walk revisited a project that is still being visited.
    ///
    /// `chain` holds descriptor paths in discovery order and ends with the
    /// revisited project.
    #[error("Circular reference detected!\nProjects:\n{}", .chain.join("\n"))]
    CircularReference {
        /// Visiting path, ending with the revisited project
        chain: Vec<String>,
    },

    /// Platform-application references that load each other.
    #[error("Circular platform-application reference detected!\nProjects:\n{}", .chain.join("\n"))]
    CircularPlatformReference {
        /// Loading path, ending with the revisited descriptor
        chain: Vec<String>,
    },

    /// A resolution-policy knob set to `fail` was triggered.
    #[error("{message}")]
    PolicyViolation {
        /// The knob that fired
        rule: PolicyRule,
        /// Human readable description naming the project
        message: String,
    },

    /// No loaded project has the requested assembly name.
    #[error("Project by assembly name {assembly_name} not found")]
    ProjectNotFound {
        /// Requested assembly name
        assembly_name: String,
    },

    /// A group referenced on the command line or by another group is undefined.
    #[error("Group with name {name} not found in configuration")]
    GroupNotFound {
        /// Requested group name
        name: String,
        /// Closest defined group name, if any is similar enough
        suggestion: Option<String>,
    },

    /// Two groups in the configuration share a name.
    #[error("Configuration invalid! Duplicated group name = {name}")]
    DuplicateGroup {
        /// Duplicated group name
        name: String,
    },

    /// Groups include each other.
    #[error("Group definitions include each other: {}", .chain.join(" -> "))]
    CircularGroup {
        /// Group names in inclusion order, ending with the revisited group
        chain: Vec<String>,
    },

    /// The selected groups contain no projects.
    #[error("Chosen groups do not have configured projects. Groups: {groups}")]
    NoProjectsSelected {
        /// Selected group names joined with `;`
        groups: String,
    },

    /// A folder that must exist does not.
    #[error("Folder [{path}] does not exist")]
    FolderNotFound {
        /// Folder that was looked up
        path: String,
    },

    /// A file that must exist does not.
    #[error("File [{path}] does not exist")]
    FileNotFound {
        /// File that was looked up
        path: String,
    },

    /// A file-system operation failed.
    #[error("File system error: {operation} ({path})")]
    FileSystemError {
        /// What was being attempted
        operation: String,
        /// Path involved
        path: String,
    },

    /// Configuration content is invalid.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// Wrapper raised by batch loading; the cause is the error's source chain.
    #[error("Unable to load project [{path}]")]
    ProjectLoadFailed {
        /// Descriptor that failed to load
        path: String,
    },

    /// Anything else.
    #[error("{message}")]
    Other {
        /// Message to show
        message: String,
    },
}

/// Error wrapper carrying a suggestion and details for terminal display.
///
/// # Examples
///
/// ```rust,no_run
/// use slngen_cli::core::{ErrorContext, SlnError};
///
/// let context = ErrorContext::new(SlnError::FolderNotFound {
///     path: "packages".to_string(),
/// })
/// .with_suggestion("Create the folder or fix third-party-folders in slngen.toml");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: SlnError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: SlnError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error (shown in green).
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error (shown in yellow).
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with actionable suggestions.
///
/// Recognizes [`SlnError`] anywhere in the chain (outermost first),
/// [`std::io::Error`] and [`toml::de::Error`]; everything else is rendered
/// with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    // Batch-load wrappers are only useful as a prefix; prefer the typed cause.
    let typed = error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<SlnError>())
        .find(|e| !matches!(e, SlnError::ProjectLoadFailed { .. }));

    if let Some(sln_error) = typed {
        let context = create_error_context(sln_error);
        return match error.downcast_ref::<SlnError>() {
            Some(outer @ SlnError::ProjectLoadFailed { .. }) => {
                let details = context.details.clone().unwrap_or_default();
                let details = if details.is_empty() {
                    outer.to_string()
                } else {
                    format!("{outer}. {details}")
                };
                context.with_details(details)
            }
            _ => context,
        };
    }

    if let Some(io_error) = error.chain().find_map(|cause| cause.downcast_ref::<std::io::Error>()) {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(SlnError::FileSystemError {
                    operation: "file access".to_string(),
                    path: error.to_string(),
                })
                .with_suggestion("Check file ownership and permissions of the source tree and output folder")
                .with_details(io_error.to_string());
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(SlnError::FileSystemError {
                    operation: "file access".to_string(),
                    path: error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct")
                .with_details(io_error.to_string());
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.chain().find_map(|cause| cause.downcast_ref::<toml::de::Error>()) {
        return ErrorContext::new(SlnError::ConfigError {
            message: error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of the configuration file. Verify quotes, brackets and key names")
        .with_details(toml_error.to_string());
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(SlnError::Other {
        message,
    })
}

/// Map each [`SlnError`] variant to a context with tailored suggestions.
fn create_error_context(error: &SlnError) -> ErrorContext {
    let context = ErrorContext::new(error.clone());
    match error {
        SlnError::MalformedDescriptor { .. } => context
            .with_suggestion("Make sure the descriptor declares ProjectGuid, RootNamespace and OutputType")
            .with_details("Descriptors are read from the MSBuild 2003 XML namespace"),

        SlnError::DuplicateProject { property, .. } => context
            .with_suggestion(format!(
                "Give each project a unique {property}, or exclude one of the two descriptors from source-folders"
            ))
            .with_details("Project ID, output path and assembly name must be unique across the source tree"),

        SlnError::CircularReference { .. } | SlnError::CircularPlatformReference { .. } => context
            .with_suggestion("Remove one of the references listed above to break the cycle")
            .with_details("Projects cannot depend on themselves directly or indirectly"),

        SlnError::PolicyViolation { rule, .. } => context.with_suggestion(format!(
            "Fix the descriptor, or relax '{}' in the [policy] section of slngen.toml",
            rule.config_key()
        )),

        SlnError::ProjectNotFound { .. } => context
            .with_suggestion("Check the assembly name in the group definition and that its descriptor lives under source-folders"),

        SlnError::GroupNotFound { suggestion, .. } => match suggestion {
            Some(candidate) => context.with_suggestion(format!("Did you mean '{candidate}'?")),
            None => context.with_suggestion("List the groups defined with [[groups]] in slngen.toml"),
        },

        SlnError::DuplicateGroup { .. } | SlnError::CircularGroup { .. } => {
            context.with_suggestion("Fix the [[groups]] definitions in slngen.toml")
        }

        SlnError::NoProjectsSelected { .. } => {
            context.with_suggestion("Add projects to the chosen groups or pick other groups with --group")
        }

        SlnError::FolderNotFound { .. } | SlnError::FileNotFound { .. } => context
            .with_suggestion("Paths in slngen.toml are resolved against 'root', then the current directory"),

        SlnError::FileSystemError { .. } => {
            context.with_suggestion("Check that the path exists and is accessible")
        }

        SlnError::ConfigError { .. } => context.with_suggestion("Run 'slngen init' to see an example configuration"),

        SlnError::ProjectLoadFailed { .. } | SlnError::Other { .. } => context,
    }
}
