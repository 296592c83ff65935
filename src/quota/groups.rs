//! Declarative grouping tables for the project-quota and CLI quota services.
//!
//! The tables live in `quota_groups.yaml` and are parsed once per process. A
//! host may install a replacement table (loaded from its own YAML file) before
//! the first lookup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

const DEFAULT_GROUPS_YAML: &str = include_str!("../../quota_groups.yaml");

static ACTIVE_TABLES: OnceLock<GroupTables> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTables {
    pub antigravity: Vec<ProjectGroupDefinition>,
    pub gemini_cli: CliGroupTable,
}

/// Group of the project-quota service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectGroupDefinition {
    pub id: String,
    pub label: String,
    pub members: Vec<MemberPattern>,
    /// Use the first member's display name instead of `label`
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub label_from_model: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliGroupTable {
    /// Canonical model id -> accepted spellings
    pub aliases: BTreeMap<String, Vec<String>>,
    pub groups: Vec<CliGroupDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliGroupDefinition {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred: Option<String>,
    pub members: Vec<String>,
}

/// An exact model identifier, or a prefix when written with a trailing `*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MemberPattern {
    Exact(String),
    Prefix(String),
}

impl From<String> for MemberPattern {
    fn from(raw: String) -> Self {
        match raw.strip_suffix('*') {
            Some(prefix) => MemberPattern::Prefix(prefix.to_string()),
            None => MemberPattern::Exact(raw),
        }
    }
}

impl From<MemberPattern> for String {
    fn from(pattern: MemberPattern) -> Self {
        match pattern {
            MemberPattern::Exact(id) => id,
            MemberPattern::Prefix(prefix) => format!("{}*", prefix),
        }
    }
}

impl MemberPattern {
    pub fn is_exact(&self) -> bool {
        matches!(self, MemberPattern::Exact(_))
    }

    /// Case-insensitive match against a model identifier.
    pub fn matches(&self, identifier: &str) -> bool {
        let identifier = identifier.to_lowercase();
        match self {
            MemberPattern::Exact(id) => id.to_lowercase() == identifier,
            MemberPattern::Prefix(prefix) => identifier.starts_with(&prefix.to_lowercase()),
        }
    }
}

impl GroupTables {
    /// Parses and validates a YAML grouping table.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let tables: Self =
            serde_yaml::from_str(yaml).context("Failed to parse grouping tables as YAML")?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read grouping tables: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid grouping tables: {}", path.display()))
    }

    /// The tables compiled into the binary.
    pub fn embedded() -> Self {
        serde_yaml::from_str(DEFAULT_GROUPS_YAML)
            .expect("Failed to parse embedded quota_groups.yaml - this is a bug in the file")
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for group in &self.antigravity {
            if !seen.insert(group.id.as_str()) {
                anyhow::bail!("Duplicate project quota group id '{}'", group.id);
            }
            if group.members.is_empty() {
                anyhow::bail!("Project quota group '{}' has no members", group.id);
            }
        }

        let mut seen = HashSet::new();
        for group in &self.gemini_cli.groups {
            if !seen.insert(group.id.as_str()) {
                anyhow::bail!("Duplicate CLI quota group id '{}'", group.id);
            }
            if group.members.is_empty() {
                anyhow::bail!("CLI quota group '{}' has no members", group.id);
            }
            if let Some(preferred) = &group.preferred {
                if !group.members.contains(preferred) {
                    anyhow::bail!(
                        "CLI quota group '{}' prefers '{}' which is not a member",
                        group.id,
                        preferred
                    );
                }
            }
        }
        Ok(())
    }

    /// Index of the project group owning `identifier`.
    ///
    /// Exact members win over prefix members; ties go to the earlier group.
    pub fn project_group_index(&self, identifier: &str) -> Option<usize> {
        let find = |exact: bool| {
            self.antigravity.iter().position(|group| {
                group
                    .members
                    .iter()
                    .any(|m| m.is_exact() == exact && m.matches(identifier))
            })
        };
        find(true).or_else(|| find(false))
    }

    /// Canonical CLI model id for a raw spelling.
    ///
    /// Strips a `models/` prefix and a `_vertex` suffix before the alias lookup.
    pub fn canonical_cli_model_id(&self, raw: &str) -> Option<String> {
        let lowered = raw.trim().to_lowercase();
        let stripped = lowered.strip_prefix("models/").unwrap_or(&lowered);
        let stripped = stripped.strip_suffix("_vertex").unwrap_or(stripped);
        if stripped.is_empty() {
            return None;
        }
        self.gemini_cli
            .aliases
            .iter()
            .find(|(canonical, aliases)| {
                canonical.as_str() == stripped || aliases.iter().any(|a| a.to_lowercase() == stripped)
            })
            .map(|(canonical, _)| canonical.clone())
    }

    /// Index of the CLI group containing a canonical model id.
    pub fn cli_group_index(&self, canonical_id: &str) -> Option<usize> {
        self.gemini_cli
            .groups
            .iter()
            .position(|group| group.members.iter().any(|m| m == canonical_id))
    }
}

/// Installs replacement tables. Fails if tables were already in use.
pub fn install(tables: GroupTables) -> Result<()> {
    ACTIVE_TABLES
        .set(tables)
        .map_err(|_| anyhow::anyhow!("Grouping tables are already initialised"))
}

/// The process-wide tables, defaulting to the embedded ones.
pub fn active() -> &'static GroupTables {
    ACTIVE_TABLES.get_or_init(GroupTables::embedded)
}

#[cfg(test)]
#[path = "tests/groups_tests.rs"]
mod tests;
