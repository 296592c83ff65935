//! Project-quota service: per-model quota entries folded into display groups.

use super::groups::{GroupTables, ProjectGroupDefinition};
use super::types::ProjectQuotaGroup;
use super::values::{
    normalize_quota_fraction, normalize_string_value, parse_payload, pick, pick_object,
};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Project used when the credential file does not name one.
pub const DEFAULT_ANTIGRAVITY_PROJECT_ID: &str = "bamboo-precept-lgxtn";

/// Candidate endpoints, tried in order.
pub const ANTIGRAVITY_QUOTA_URLS: [&str; 3] = [
    "https://daily-cloudcode-pa.googleapis.com/v1internal:fetchAvailableModels",
    "https://daily-cloudcode-pa.sandbox.googleapis.com/v1internal:fetchAvailableModels",
    "https://cloudcode-pa.googleapis.com/v1internal:fetchAvailableModels",
];

/// One model entry after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelQuotaEntry {
    pub id: String,
    pub display_name: Option<String>,
    pub remaining_fraction: f64,
    pub reset_time: Option<String>,
}

/// Reads one `{displayName?, quotaInfo|quota_info}` entry.
///
/// An entry without a fraction counts as exhausted when it still reports a
/// reset time; otherwise it carries no usable quota and is skipped.
pub fn parse_model_entry(id: &str, entry: &Value) -> Option<ModelQuotaEntry> {
    let entry = entry.as_object()?;
    let quota_info = pick_object(entry, &["quotaInfo", "quota_info"])?;

    let reset_time = normalize_string_value(pick(quota_info, &["resetTime", "reset_time"]));
    let remaining_fraction = normalize_quota_fraction(pick(
        quota_info,
        &["remainingFraction", "remaining_fraction", "remaining"],
    ))
    .or_else(|| reset_time.as_ref().map(|_| 0.0))?;

    Some(ModelQuotaEntry {
        id: id.to_string(),
        display_name: normalize_string_value(entry.get("displayName")),
        remaining_fraction,
        reset_time,
    })
}

fn owning_group(tables: &GroupTables, entry: &ModelQuotaEntry) -> Option<usize> {
    tables.project_group_index(&entry.id).or_else(|| {
        entry
            .display_name
            .as_deref()
            .and_then(|name| tables.project_group_index(name))
    })
}

struct GroupAccumulator<'a> {
    definition: &'a ProjectGroupDefinition,
    members: BTreeSet<String>,
    first_display_name: Option<String>,
    remaining_fraction: f64,
    reset_time: Option<String>,
}

impl<'a> GroupAccumulator<'a> {
    fn new(definition: &'a ProjectGroupDefinition) -> Self {
        Self {
            definition,
            members: BTreeSet::new(),
            first_display_name: None,
            remaining_fraction: 1.0,
            reset_time: None,
        }
    }

    fn absorb(&mut self, entry: ModelQuotaEntry) {
        if self.members.is_empty() {
            self.first_display_name = entry.display_name.clone();
        }
        self.remaining_fraction = self.remaining_fraction.min(entry.remaining_fraction);
        if entry.reset_time.is_some() {
            self.reset_time = entry.reset_time;
        }
        self.members.insert(entry.id);
    }

    fn finish(self) -> Option<ProjectQuotaGroup> {
        if self.members.is_empty() {
            return None;
        }
        let label = if self.definition.label_from_model {
            self.first_display_name
                .unwrap_or_else(|| self.definition.label.clone())
        } else {
            self.definition.label.clone()
        };
        Some(ProjectQuotaGroup {
            id: self.definition.id.clone(),
            label,
            member_identifiers: self.members,
            remaining_fraction: self.remaining_fraction,
            reset_time: self.reset_time,
        })
    }
}

/// Folds a `model id -> entry` mapping into groups, in table order.
///
/// The lowest fraction governs a group and the last reset time seen wins.
/// Models owned by no group are dropped, as are groups with no members.
pub fn build_antigravity_quota_groups_with(
    tables: &GroupTables,
    models: &Map<String, Value>,
) -> Vec<ProjectQuotaGroup> {
    let mut accumulators: Vec<GroupAccumulator<'_>> =
        tables.antigravity.iter().map(GroupAccumulator::new).collect();

    for (id, raw) in models {
        let Some(entry) = parse_model_entry(id, raw) else {
            continue;
        };
        match owning_group(tables, &entry) {
            Some(index) => accumulators[index].absorb(entry),
            None => tracing::debug!(model = %entry.id, "no quota group for model, dropping"),
        }
    }

    accumulators
        .into_iter()
        .filter_map(GroupAccumulator::finish)
        .collect()
}

pub fn build_antigravity_quota_groups(models: &Map<String, Value>) -> Vec<ProjectQuotaGroup> {
    build_antigravity_quota_groups_with(super::groups::active(), models)
}

/// The `models` object of a response, if it has one.
pub fn extract_models(body: Option<&Value>, body_text: Option<&str>) -> Option<Map<String, Value>> {
    let payload = parse_payload(body, body_text)?;
    match payload.get("models") {
        Some(Value::Object(models)) => Some(models.clone()),
        _ => None,
    }
}

fn project_id_in(obj: &Map<String, Value>) -> Option<String> {
    normalize_string_value(pick(obj, &["project_id", "projectId"]))
}

/// Project id from a credential file: top level, then `installed`, then `web`.
///
/// Falls back to `default_project` for blank, malformed or project-less files.
pub fn resolve_project_id(credential_text: &str, default_project: &str) -> String {
    let trimmed = credential_text.trim();
    if trimmed.is_empty() {
        return default_project.to_string();
    }
    let Ok(Value::Object(parsed)) = serde_json::from_str::<Value>(trimmed) else {
        return default_project.to_string();
    };

    project_id_in(&parsed)
        .or_else(|| parsed.get("installed").and_then(Value::as_object).and_then(project_id_in))
        .or_else(|| parsed.get("web").and_then(Value::as_object).and_then(project_id_in))
        .unwrap_or_else(|| default_project.to_string())
}

#[cfg(test)]
#[path = "tests/antigravity_tests.rs"]
mod tests;
