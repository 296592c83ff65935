//! Coding-assistant usage API: rate-limit window classification.
//!
//! A rate-limit object carries up to two raw windows. They are classified by
//! their duration rather than by position, since the API does not promise that
//! `primary` is the short one.

use super::types::{CodexQuota, UsageWindow};
use super::values::{
    clamp_percent, normalize_number_value, normalize_plan_type, pick, pick_object, PlanType,
    CODEX_PLAN_TYPE_KEYS,
};
use crate::usage_reset::{ResetTimestamp, NO_RESET_LABEL};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

pub const FIVE_HOUR_SECONDS: f64 = 18_000.0;
pub const WEEK_SECONDS: f64 = 604_800.0;

struct WindowSlot {
    id: &'static str,
    label_key: &'static str,
}

const CODE_FIVE_HOUR: WindowSlot = WindowSlot {
    id: "five-hour",
    label_key: "codex_quota.primary_window",
};
const CODE_WEEKLY: WindowSlot = WindowSlot {
    id: "weekly",
    label_key: "codex_quota.secondary_window",
};
const CODE_REVIEW_FIVE_HOUR: WindowSlot = WindowSlot {
    id: "code-review-five-hour",
    label_key: "codex_quota.code_review_primary_window",
};
const CODE_REVIEW_WEEKLY: WindowSlot = WindowSlot {
    id: "code-review-weekly",
    label_key: "codex_quota.code_review_secondary_window",
};

pub type RawWindow = Map<String, Value>;

/// Raw windows sorted into their slots.
#[derive(Debug, Default)]
pub struct ClassifiedWindows<'a> {
    pub five_hour: Option<&'a RawWindow>,
    pub weekly: Option<&'a RawWindow>,
}

fn window_seconds(window: &RawWindow) -> Option<f64> {
    normalize_number_value(pick(window, &["limit_window_seconds", "limitWindowSeconds"]))
}

/// Assigns the first 5-hour and the first weekly window; other durations are dropped.
pub fn classify_windows(limit: Option<&Map<String, Value>>) -> ClassifiedWindows<'_> {
    let mut classified = ClassifiedWindows::default();
    let Some(limit) = limit else {
        return classified;
    };

    let raw_windows = [
        pick_object(limit, &["primary_window", "primaryWindow"]),
        pick_object(limit, &["secondary_window", "secondaryWindow"]),
    ];

    for window in raw_windows.into_iter().flatten() {
        match window_seconds(window) {
            Some(s) if s == FIVE_HOUR_SECONDS && classified.five_hour.is_none() => {
                classified.five_hour = Some(window);
            }
            Some(s) if s == WEEK_SECONDS && classified.weekly.is_none() => {
                classified.weekly = Some(window);
            }
            _ => {}
        }
    }
    classified
}

/// Resolves a window's reset time: absolute `reset_at` first, then `reset_after_seconds`.
pub fn resolve_window_reset(window: &RawWindow, now: DateTime<Utc>) -> Option<ResetTimestamp> {
    if let Some(reset_at) = normalize_number_value(pick(window, &["reset_at", "resetAt"])) {
        if reset_at > 0.0 {
            return Some(ResetTimestamp::from_epoch_seconds(reset_at.round() as i64));
        }
    }
    normalize_number_value(pick(window, &["reset_after_seconds", "resetAfterSeconds"]))
        .filter(|seconds| *seconds >= 0.0)
        .and_then(|seconds| ResetTimestamp::from_seconds_after(now, seconds))
}

pub fn format_codex_reset_label<Tz>(window: &RawWindow, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    resolve_window_reset(window, now)
        .map(|ts| ts.format_in(tz))
        .unwrap_or_else(|| NO_RESET_LABEL.to_string())
}

/// Limit state flags of one rate-limit object.
fn is_limit_reached(limit: Option<&Map<String, Value>>) -> bool {
    let Some(limit) = limit else {
        return false;
    };
    let reached = pick(limit, &["limit_reached", "limitReached"])
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let allowed = limit.get("allowed").and_then(Value::as_bool);
    reached || allowed == Some(false)
}

fn build_window<Tz>(
    slot: &WindowSlot,
    window: &RawWindow,
    limit_reached: bool,
    now: DateTime<Utc>,
    tz: &Tz,
) -> UsageWindow
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let reset_label = format_codex_reset_label(window, now, tz);
    let reported = normalize_number_value(pick(window, &["used_percent", "usedPercent"]));
    // Exhaustion is only claimed when we can say when it ends.
    let used_percent = reported
        .or_else(|| (limit_reached && reset_label != NO_RESET_LABEL).then_some(100.0))
        .map(clamp_percent);

    UsageWindow {
        id: slot.id.to_string(),
        label_key: slot.label_key.to_string(),
        used_percent,
        reset_label,
    }
}

/// Builds up to four windows: 5-hour and weekly for the main and code-review limits.
pub fn build_codex_quota_windows_in<Tz>(
    payload: &Map<String, Value>,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Vec<UsageWindow>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let rate_limit = pick_object(payload, &["rate_limit", "rateLimit"]);
    let code_review_limit = pick_object(payload, &["code_review_rate_limit", "codeReviewRateLimit"]);

    let mut windows = Vec::new();
    for (limit, five_hour_slot, weekly_slot) in [
        (rate_limit, &CODE_FIVE_HOUR, &CODE_WEEKLY),
        (code_review_limit, &CODE_REVIEW_FIVE_HOUR, &CODE_REVIEW_WEEKLY),
    ] {
        let classified = classify_windows(limit);
        let reached = is_limit_reached(limit);
        if let Some(window) = classified.five_hour {
            windows.push(build_window(five_hour_slot, window, reached, now, tz));
        }
        if let Some(window) = classified.weekly {
            windows.push(build_window(weekly_slot, window, reached, now, tz));
        }
    }
    windows
}

pub fn build_codex_quota_windows(payload: &Map<String, Value>) -> Vec<UsageWindow> {
    build_codex_quota_windows_in(payload, Utc::now(), &chrono::Local)
}

/// Plan type reported by the usage payload.
pub fn resolve_usage_plan_type(payload: &Map<String, Value>) -> Option<PlanType> {
    normalize_plan_type(pick(payload, &CODEX_PLAN_TYPE_KEYS))
}

/// Normalizes a usage payload; the payload's plan type wins over `fallback_plan`.
pub fn normalize_codex_usage_in<Tz>(
    payload: &Map<String, Value>,
    fallback_plan: Option<PlanType>,
    now: DateTime<Utc>,
    tz: &Tz,
) -> CodexQuota
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    CodexQuota {
        plan_type: resolve_usage_plan_type(payload).or(fallback_plan),
        windows: build_codex_quota_windows_in(payload, now, tz),
    }
}

pub fn normalize_codex_usage(
    payload: &Map<String, Value>,
    fallback_plan: Option<PlanType>,
) -> CodexQuota {
    normalize_codex_usage_in(payload, fallback_plan, Utc::now(), &chrono::Local)
}

#[cfg(test)]
#[path = "tests/codex_tests.rs"]
mod tests;
