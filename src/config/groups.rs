//! Named groups of root projects
//!
//! A group lists projects directly, includes other groups, or both. Group
//! names and project entries compare case-insensitively. Flattening happens
//! once when the configuration is resolved; later selection only looks up
//! the flattened lists.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strsim::levenshtein;

use crate::core::SlnError;

/// A `[[groups]]` entry as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectGroup {
    pub name: String,
    /// Assembly names or descriptor paths relative to the source root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,
    /// Names of groups whose projects this group includes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

/// Flattened groups in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSet {
    groups: Vec<(String, Vec<String>)>,
}

impl GroupSet {
    /// Expand group inclusions. Each flattened list keeps the first
    /// occurrence of every project.
    pub fn flatten(groups: &[ProjectGroup]) -> Result<Self> {
        let mut seen = HashSet::new();
        for group in groups {
            if !seen.insert(group.name.to_lowercase()) {
                return Err(SlnError::DuplicateGroup {
                    name: group.name.clone(),
                }
                .into());
            }
        }

        let mut flattened = Vec::with_capacity(groups.len());
        for group in groups {
            let mut stack = Vec::new();
            let mut projects = Vec::new();
            collect(groups, group, &mut stack, &mut projects)?;
            flattened.push((group.name.clone(), dedupe(projects)));
        }
        Ok(Self {
            groups: flattened,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group names in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.groups.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Flattened projects of one group.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, projects)| projects.as_slice())
    }

    /// Union of the selected groups' projects, first occurrence kept.
    ///
    /// No names selects every group.
    pub fn select(&self, names: &[String]) -> Result<Vec<String>> {
        let mut projects = Vec::new();
        if names.is_empty() {
            for (_, members) in &self.groups {
                projects.extend(members.iter().cloned());
            }
        } else {
            for name in names {
                let members = self.get(name).ok_or_else(|| SlnError::GroupNotFound {
                    name: name.clone(),
                    suggestion: suggest(name, self.names()),
                })?;
                projects.extend(members.iter().cloned());
            }
        }

        let projects = dedupe(projects);
        if projects.is_empty() {
            let groups = if names.is_empty() { self.names().join(";") } else { names.join(";") };
            return Err(SlnError::NoProjectsSelected {
                groups,
            }
            .into());
        }
        Ok(projects)
    }
}

fn collect<'g>(
    groups: &'g [ProjectGroup],
    group: &'g ProjectGroup,
    stack: &mut Vec<&'g str>,
    projects: &mut Vec<String>,
) -> Result<()> {
    if stack.iter().any(|name| name.eq_ignore_ascii_case(&group.name)) {
        let mut chain: Vec<String> = stack.iter().map(|name| (*name).to_string()).collect();
        chain.push(group.name.clone());
        return Err(SlnError::CircularGroup {
            chain,
        }
        .into());
    }

    stack.push(&group.name);
    projects.extend(group.projects.iter().map(|p| p.trim().to_string()).filter(|p| !p.is_empty()));
    for included in &group.groups {
        let target = groups
            .iter()
            .find(|candidate| candidate.name.eq_ignore_ascii_case(included))
            .ok_or_else(|| SlnError::GroupNotFound {
                name: included.clone(),
                suggestion: suggest(included, groups.iter().map(|g| g.name.as_str())),
            })?;
        collect(groups, target, stack, projects)?;
    }
    stack.pop();
    Ok(())
}

fn dedupe(projects: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    projects.into_iter().filter(|p| seen.insert(p.to_lowercase())).collect()
}

/// The defined name closest to `name`, if it is close enough to be a typo.
fn suggest<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let target = name.to_lowercase();
    candidates
        .into_iter()
        .map(|candidate| (levenshtein(&target, &candidate.to_lowercase()), candidate))
        .filter(|(distance, _)| *distance <= (target.len() / 3).max(2))
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.to_string())
}
