//! Value coercion primitives shared by every provider normalizer.
//!
//! Upstream payloads are loosely typed: numbers arrive as strings, keys come in
//! both snake_case and camelCase, and blank strings stand in for "missing".
//! Everything here turns a raw `serde_json::Value` into either a clean value or
//! `None`, never an error.

use serde_json::{Map, Value};

/// Keys read for the Codex plan type, camelCase first.
///
/// Every other dual-named field is read snake_case first; the plan type is the
/// one field where the usage API's camelCase spelling wins.
pub const CODEX_PLAN_TYPE_KEYS: [&str; 2] = ["planType", "plan_type"];

/// Returns the first non-null value among `keys`, in order.
///
/// Mirrors a `a ?? b` chain: a present-but-invalid value (e.g. `""`) still wins
/// over a later key.
pub fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

/// Like [`pick`], but only yields JSON objects.
pub fn pick_object<'a>(
    obj: &'a Map<String, Value>,
    keys: &[&str],
) -> Option<&'a Map<String, Value>> {
    pick(obj, keys).and_then(Value::as_object)
}

/// Trimmed, non-empty string or `None`.
pub fn normalize_string_value(value: Option<&Value>) -> Option<String> {
    let trimmed = value?.as_str()?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Finite number from a JSON number or numeric string.
pub fn normalize_number_value(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Number clamped into `[0, 1]`.
pub fn normalize_quota_fraction(value: Option<&Value>) -> Option<f64> {
    normalize_number_value(value).map(clamp_fraction)
}

// Adding zero turns -0.0 into 0.0.
pub fn clamp_fraction(value: f64) -> f64 {
    value.clamp(0.0, 1.0) + 0.0
}

pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0) + 0.0
}

/// Parses `"NN.N%"` (or a bare number string) into a float.
pub fn parse_percent_string(raw: Option<&str>) -> Option<f64> {
    let cleaned = raw?.trim().replacen('%', "", 1);
    let value = cleaned.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Auth index as a non-empty string; integral numbers are accepted too.
pub fn normalize_auth_index_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => Some(n.to_string()),
        other => normalize_string_value(Some(other)),
    }
}

/// Subscription tier reported by the Codex usage API.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Plus,
    Team,
    Free,
    #[serde(untagged)]
    Other(String),
}

impl PlanType {
    /// Message key for the known tiers.
    pub fn label_key(&self) -> Option<&'static str> {
        match self {
            PlanType::Plus => Some("codex_quota.plan_plus"),
            PlanType::Team => Some("codex_quota.plan_team"),
            PlanType::Free => Some("codex_quota.plan_free"),
            PlanType::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PlanType::Plus => "plus",
            PlanType::Team => "team",
            PlanType::Free => "free",
            PlanType::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps the known tiers case-insensitively; anything else passes through trimmed.
pub fn normalize_plan_type(value: Option<&Value>) -> Option<PlanType> {
    let raw = normalize_string_value(value)?;
    Some(match raw.to_lowercase().as_str() {
        "plus" => PlanType::Plus,
        "team" => PlanType::Team,
        "free" => PlanType::Free,
        _ => PlanType::Other(raw),
    })
}

/// Decodes a JSON `body` or falls back to parsing `body_text`.
///
/// Returns the top-level object, if the payload is one.
pub fn parse_payload(body: Option<&Value>, body_text: Option<&str>) -> Option<Map<String, Value>> {
    match body {
        Some(Value::Object(map)) => return Some(map.clone()),
        Some(Value::String(text)) => return parse_object_text(text),
        Some(Value::Null) | None => {}
        Some(_) => return None,
    }
    parse_object_text(body_text?)
}

fn parse_object_text(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/values_tests.rs"]
mod tests;
