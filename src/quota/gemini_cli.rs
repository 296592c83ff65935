//! CLI quota service: raw buckets canonicalised per model, then grouped.

use super::groups::{CliGroupDefinition, GroupTables};
use super::types::{CliQuotaBucket, ParsedCliBucket};
use super::values::{
    normalize_number_value, normalize_quota_fraction, normalize_string_value, parse_payload, pick,
};
use serde_json::{Map, Value};

pub const GEMINI_CLI_QUOTA_URL: &str =
    "https://cloudcode-pa.googleapis.com/v1internal:retrieveUserQuota";

/// Fraction to assume when the bucket does not report one.
///
/// A non-positive amount means exhausted. With no amount, a pending reset means
/// the bucket is counting down from empty. Otherwise nothing is known.
pub fn fallback_fraction(remaining_amount: Option<f64>, reset_time: Option<&str>) -> Option<f64> {
    match remaining_amount {
        Some(amount) => (amount <= 0.0).then_some(0.0),
        None => reset_time.map(|_| 0.0),
    }
}

/// Normalizes one raw bucket; `None` when its model has no canonical id.
pub fn parse_cli_bucket(tables: &GroupTables, raw: &Value) -> Option<ParsedCliBucket> {
    let bucket = raw.as_object()?;
    let raw_model = normalize_string_value(pick(bucket, &["modelId", "model_id"]))?;
    let model_id = tables.canonical_cli_model_id(&raw_model)?;

    let remaining_amount =
        normalize_number_value(pick(bucket, &["remainingAmount", "remaining_amount"]));
    let reset_time = normalize_string_value(pick(bucket, &["resetTime", "reset_time"]));
    let remaining_fraction =
        normalize_quota_fraction(pick(bucket, &["remainingFraction", "remaining_fraction"]))
            .or_else(|| fallback_fraction(remaining_amount, reset_time.as_deref()));

    Some(ParsedCliBucket {
        model_id,
        token_type: normalize_string_value(pick(bucket, &["tokenType", "token_type"])),
        remaining_fraction,
        remaining_amount,
        reset_time,
    })
}

/// Parses every bucket of a `{buckets: [...]}` payload.
pub fn parse_cli_buckets(tables: &GroupTables, payload: &Map<String, Value>) -> Vec<ParsedCliBucket> {
    let Some(buckets) = payload.get("buckets").and_then(Value::as_array) else {
        return Vec::new();
    };
    buckets
        .iter()
        .filter_map(|raw| {
            let parsed = parse_cli_bucket(tables, raw);
            if parsed.is_none() {
                tracing::debug!(bucket = %raw, "dropping CLI bucket without canonical model id");
            }
            parsed
        })
        .collect()
}

fn min_option(current: Option<f64>, next: Option<f64>) -> Option<f64> {
    match (current, next) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

struct BucketAccumulator<'a> {
    definition: &'a CliGroupDefinition,
    token_type: Option<String>,
    members: Vec<String>,
    remaining_fraction: Option<f64>,
    min_amount: Option<f64>,
    preferred_amount: Option<f64>,
    reset_time: Option<String>,
}

impl<'a> BucketAccumulator<'a> {
    fn new(definition: &'a CliGroupDefinition, token_type: Option<String>) -> Self {
        Self {
            definition,
            token_type,
            members: Vec::new(),
            remaining_fraction: None,
            min_amount: None,
            preferred_amount: None,
            reset_time: None,
        }
    }

    fn absorb(&mut self, bucket: ParsedCliBucket) {
        self.remaining_fraction = min_option(self.remaining_fraction, bucket.remaining_fraction);
        self.min_amount = min_option(self.min_amount, bucket.remaining_amount);
        if self.definition.preferred.as_deref() == Some(bucket.model_id.as_str()) {
            self.preferred_amount = bucket.remaining_amount.or(self.preferred_amount);
        }
        if bucket.reset_time.is_some() {
            self.reset_time = bucket.reset_time;
        }
        if !self.members.contains(&bucket.model_id) {
            self.members.push(bucket.model_id);
        }
    }

    fn finish(self) -> CliQuotaBucket {
        let id = match &self.token_type {
            Some(token_type) => format!("{}-{}", self.definition.id, token_type.to_lowercase()),
            None => self.definition.id.clone(),
        };
        CliQuotaBucket {
            id,
            label: self.definition.label.clone(),
            remaining_fraction: self.remaining_fraction,
            remaining_amount: self.preferred_amount.or(self.min_amount),
            reset_time: self.reset_time,
            token_type: self.token_type,
            member_model_ids: self.members,
        }
    }
}

/// Groups parsed buckets per (group, token type), in table order.
///
/// The lowest fraction governs and the last reset time seen wins. The
/// preferred model's amount is shown when it reported one.
pub fn build_gemini_cli_quota_buckets_with(
    tables: &GroupTables,
    buckets: Vec<ParsedCliBucket>,
) -> Vec<CliQuotaBucket> {
    let groups = &tables.gemini_cli.groups;
    let mut per_group: Vec<Vec<BucketAccumulator<'_>>> = groups.iter().map(|_| Vec::new()).collect();

    for bucket in buckets {
        let Some(index) = tables.cli_group_index(&bucket.model_id) else {
            tracing::debug!(model = %bucket.model_id, "no quota group for CLI model, dropping");
            continue;
        };
        let slots = &mut per_group[index];
        let position = slots
            .iter()
            .position(|slot| slot.token_type == bucket.token_type);
        let slot = match position {
            Some(position) => &mut slots[position],
            None => {
                slots.push(BucketAccumulator::new(&groups[index], bucket.token_type.clone()));
                let last = slots.len() - 1;
                &mut slots[last]
            }
        };
        slot.absorb(bucket);
    }

    per_group
        .into_iter()
        .flatten()
        .map(BucketAccumulator::finish)
        .collect()
}

pub fn build_gemini_cli_quota_buckets(buckets: Vec<ParsedCliBucket>) -> Vec<CliQuotaBucket> {
    build_gemini_cli_quota_buckets_with(super::groups::active(), buckets)
}

/// Parses and groups a raw response body.
pub fn normalize_gemini_cli_quota_with(
    tables: &GroupTables,
    body: Option<&Value>,
    body_text: Option<&str>,
) -> Vec<CliQuotaBucket> {
    let Some(payload) = parse_payload(body, body_text) else {
        return Vec::new();
    };
    build_gemini_cli_quota_buckets_with(tables, parse_cli_buckets(tables, &payload))
}

pub fn normalize_gemini_cli_quota(body: Option<&Value>, body_text: Option<&str>) -> Vec<CliQuotaBucket> {
    normalize_gemini_cli_quota_with(super::groups::active(), body, body_text)
}

#[cfg(test)]
#[path = "tests/gemini_cli_tests.rs"]
mod tests;
