//! Assistant usage API: account summary and OAuth rolling windows.

use super::types::{AssistantQuotaSummary, RollingWindow};
use super::values::{
    clamp_percent, normalize_number_value, normalize_string_value, parse_percent_string, pick,
    pick_object,
};
use serde_json::{Map, Value};

struct RollingSlot {
    id: &'static str,
    label_key: &'static str,
    utilization_keys: [&'static str; 2],
    reset_keys: [&'static str; 2],
}

const ROLLING_SLOTS: [RollingSlot; 3] = [
    RollingSlot {
        id: "five-hour",
        label_key: "claude_quota.five_hour_window",
        utilization_keys: ["five_hour_utilization", "fiveHourUtilization"],
        reset_keys: ["five_hour_resets_at", "fiveHourResetsAt"],
    },
    RollingSlot {
        id: "seven-day",
        label_key: "claude_quota.seven_day_window",
        utilization_keys: ["seven_day_utilization", "sevenDayUtilization"],
        reset_keys: ["seven_day_resets_at", "sevenDayResetsAt"],
    },
    RollingSlot {
        id: "seven-day-sonnet",
        label_key: "claude_quota.seven_day_sonnet_window",
        utilization_keys: ["seven_day_sonnet_util", "sevenDaySonnetUtil"],
        reset_keys: ["seven_day_sonnet_resets", "sevenDaySonnetResets"],
    },
];

fn parse_utilization(value: Option<&Value>) -> Option<f64> {
    parse_percent_string(normalize_string_value(value).as_deref())
}

/// Rolling windows of an OAuth usage object; unparseable ones are left out.
pub fn build_rolling_windows(oauth_usage: &Map<String, Value>) -> Vec<RollingWindow> {
    ROLLING_SLOTS
        .iter()
        .filter_map(|slot| {
            let used = parse_utilization(pick(oauth_usage, &slot.utilization_keys))?;
            Some(RollingWindow {
                id: slot.id.to_string(),
                label_key: slot.label_key.to_string(),
                used_percent: clamp_percent(used),
                resets_at: normalize_string_value(pick(oauth_usage, &slot.reset_keys)),
            })
        })
        .collect()
}

/// `"NN.N%"` strings, or a plain number.
fn percentage(value: Option<&Value>) -> Option<f64> {
    parse_utilization(value)
        .or_else(|| normalize_number_value(value))
        .map(clamp_percent)
}

fn number(obj: Option<&Map<String, Value>>, keys: &[&str]) -> Option<f64> {
    normalize_number_value(obj.and_then(|o| pick(o, keys)))
}

fn string(obj: Option<&Map<String, Value>>, keys: &[&str]) -> Option<String> {
    normalize_string_value(obj.and_then(|o| pick(o, keys)))
}

/// Extracts the summary from a quota payload.
///
/// With an OAuth usage object the summary carries rolling windows; without
/// one, callers fall back to the monthly quota fields.
pub fn parse_claude_quota_payload(payload: &Map<String, Value>) -> AssistantQuotaSummary {
    let root = Some(payload);
    let quota = pick_object(payload, &["quota"]);
    let rate_limit = pick_object(payload, &["rate_limit", "rateLimit"]);
    let oauth_usage = pick_object(payload, &["oauth_usage", "oauthUsage"]);

    let rolling_windows = oauth_usage
        .map(build_rolling_windows)
        .filter(|windows| !windows.is_empty());

    AssistantQuotaSummary {
        email: string(root, &["email"]),
        organization_name: string(root, &["organization_name", "organizationName"]),
        plan_type: string(root, &["plan_type", "planType"]),
        monthly_quota: number(quota, &["monthly_quota", "monthlyQuota"]),
        used_quota: number(quota, &["used_quota", "usedQuota"]),
        remaining_quota: number(quota, &["remaining_quota", "remainingQuota"]),
        quota_percentage: percentage(quota.and_then(|q| {
            pick(q, &["quota_percentage", "quotaPercentage"])
        })),
        reset_date: string(quota, &["reset_date", "resetDate"]),
        requests_limit: number(rate_limit, &["requests_limit", "requestsLimit"]),
        requests_remaining: number(rate_limit, &["requests_remaining", "requestsRemaining"]),
        rolling_windows,
    }
}

#[cfg(test)]
#[path = "tests/claude_tests.rs"]
mod tests;
