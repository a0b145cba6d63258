//! Resolution policy: how loading and walking react to descriptor anomalies
//!
//! Six independent knobs, each set to [`Behavior::Accept`], [`Behavior::Warn`]
//! or [`Behavior::Fail`]. The policy is read-only once constructed; the loader
//! and walker only ever call [`ResolutionPolicy::enforce`].
//!
//! ```toml
//! [policy]
//! when-contains-project-references = "fail"
//! when-reference-not-resolved = "warn"
//! assembly-key-file = "keys/acme.snk"
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

use crate::core::SlnError;

/// Reaction to a triggered rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    /// Silently continue.
    #[default]
    #[serde(alias = "valid")]
    Accept,
    /// Log a warning and continue.
    Warn,
    /// Abort with [`SlnError::PolicyViolation`].
    Fail,
}

/// The anomalies a [`ResolutionPolicy`] governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyRule {
    /// The descriptor declares file (assembly) references.
    ContainsFileReferences,
    /// The descriptor declares project references.
    ContainsProjectReferences,
    /// A reference matched no loaded project.
    ReferenceNotResolved,
    /// A reference resolved somewhere other than its hint path.
    ReferenceResolvedInDifferentLocation,
    /// A required linked file is missing or linked from elsewhere.
    RequiredFileNotFound,
    /// The signing key file is missing or not the expected one.
    KeyFileNotFound,
}

impl PolicyRule {
    /// Key of this rule in the `[policy]` configuration table.
    #[must_use]
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::ContainsFileReferences => "when-contains-file-references",
            Self::ContainsProjectReferences => "when-contains-project-references",
            Self::ReferenceNotResolved => "when-reference-not-resolved",
            Self::ReferenceResolvedInDifferentLocation => {
                "when-reference-resolved-in-different-location"
            }
            Self::RequiredFileNotFound => "when-required-file-not-found",
            Self::KeyFileNotFound => "when-key-file-not-found",
        }
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

/// Configured reactions plus the reference files some checks compare against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolutionPolicy {
    pub when_contains_file_references: Behavior,
    pub when_contains_project_references: Behavior,
    pub when_reference_not_resolved: Behavior,
    pub when_reference_resolved_in_different_location: Behavior,
    pub when_required_file_not_found: Behavior,
    pub when_key_file_not_found: Behavior,
    /// Files every descriptor must link (by file name) from these locations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_project_files: Vec<PathBuf>,
    /// Expected signing key; when unset only the presence of a key is checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assembly_key_file: Option<PathBuf>,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            when_contains_file_references: Behavior::Accept,
            when_contains_project_references: Behavior::Warn,
            when_reference_not_resolved: Behavior::Fail,
            when_reference_resolved_in_different_location: Behavior::Warn,
            when_required_file_not_found: Behavior::Warn,
            when_key_file_not_found: Behavior::Accept,
            required_project_files: Vec::new(),
            assembly_key_file: None,
        }
    }
}

impl ResolutionPolicy {
    /// A policy that accepts every anomaly.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            when_contains_file_references: Behavior::Accept,
            when_contains_project_references: Behavior::Accept,
            when_reference_not_resolved: Behavior::Accept,
            when_reference_resolved_in_different_location: Behavior::Accept,
            when_required_file_not_found: Behavior::Accept,
            when_key_file_not_found: Behavior::Accept,
            ..Self::default()
        }
    }

    /// The behavior configured for `rule`.
    #[must_use]
    pub const fn behavior(&self, rule: PolicyRule) -> Behavior {
        match rule {
            PolicyRule::ContainsFileReferences => self.when_contains_file_references,
            PolicyRule::ContainsProjectReferences => self.when_contains_project_references,
            PolicyRule::ReferenceNotResolved => self.when_reference_not_resolved,
            PolicyRule::ReferenceResolvedInDifferentLocation => {
                self.when_reference_resolved_in_different_location
            }
            PolicyRule::RequiredFileNotFound => self.when_required_file_not_found,
            PolicyRule::KeyFileNotFound => self.when_key_file_not_found,
        }
    }

    /// Apply the configured behavior for a triggered rule.
    ///
    /// The message is built lazily so accepted anomalies cost nothing.
    pub fn enforce<F>(&self, rule: PolicyRule, message: F) -> Result<()>
    where
        F: FnOnce() -> String,
    {
        match self.behavior(rule) {
            Behavior::Accept => Ok(()),
            Behavior::Warn => {
                warn!(rule = %rule, "{}", message());
                Ok(())
            }
            Behavior::Fail => Err(SlnError::PolicyViolation {
                rule,
                message: message(),
            }
            .into()),
        }
    }
}
