//! Render-agnostic display rows.
//!
//! Turns success payloads into rows of label, percent and reset text so any
//! front end can draw them. Labels stay message keys unless a [`Translate`]
//! implementation resolves them.

use super::types::{
    AnyQuotaState, AssistantQuotaSummary, CliQuotaBucket, CodexQuota, ProjectQuotaGroup,
    QuotaKind, QuotaState,
};
use super::values::{clamp_fraction, clamp_percent, PlanType};
use crate::usage_reset::format_quota_reset_time_in;
use chrono::TimeZone;
use serde::Serialize;
use std::collections::HashMap;

/// Message lookup supplied by the host.
pub trait Translate {
    fn lookup(&self, key: &str) -> Option<String>;

    /// Resolved text, or the key itself when unknown.
    fn text(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_else(|| key.to_string())
    }
}

/// Leaves every key untranslated.
pub struct KeysOnly;

impl Translate for KeysOnly {
    fn lookup(&self, _key: &str) -> Option<String> {
        None
    }
}

impl Translate for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarLevel {
    High,
    Medium,
    Low,
}

/// Colour thresholds of a progress bar, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub high: u8,
    pub medium: u8,
}

pub const REMAINING_THRESHOLDS: Thresholds = Thresholds {
    high: 60,
    medium: 20,
};
pub const CODEX_THRESHOLDS: Thresholds = Thresholds {
    high: 80,
    medium: 50,
};

impl Thresholds {
    /// Level of a remaining-percent bar; unknown counts as medium.
    pub fn level(&self, percent: Option<f64>) -> BarLevel {
        match percent.map(clamp_percent) {
            None => BarLevel::Medium,
            Some(p) if p >= f64::from(self.high) => BarLevel::High,
            Some(p) if p >= f64::from(self.medium) => BarLevel::Medium,
            Some(_) => BarLevel::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    /// Fill width in `[0, 100]`; unknown renders empty
    pub width: u8,
    pub level: BarLevel,
}

impl Bar {
    pub fn new(percent: Option<f64>, thresholds: Thresholds) -> Self {
        Self {
            width: percent.map(clamp_percent).unwrap_or(0.0).round() as u8,
            level: thresholds.level(percent),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaRow {
    pub id: String,
    pub label: String,
    pub percent_label: String,
    pub reset_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar: Option<Bar>,
}

impl QuotaRow {
    fn message(id: &str, label: String) -> Self {
        Self {
            id: id.to_string(),
            label,
            percent_label: String::new(),
            reset_label: String::new(),
            title: None,
            details: Vec::new(),
            bar: None,
        }
    }
}

fn percent_label(percent: Option<f64>) -> String {
    match percent {
        Some(p) => format!("{}%", p.round()),
        None => "--".to_string(),
    }
}

fn empty_row<T: Translate + ?Sized>(kind: QuotaKind, t: &T) -> QuotaRow {
    QuotaRow::message("empty", t.text(kind.empty_payload_key()))
}

/// Compact token count: `1.2M`, `3.4K` or the plain number.
pub fn format_tokens(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{}", value)
    }
}

pub fn antigravity_rows<T, Tz>(groups: &[ProjectQuotaGroup], t: &T, tz: &Tz) -> Vec<QuotaRow>
where
    T: Translate + ?Sized,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if groups.is_empty() {
        return vec![empty_row(QuotaKind::Antigravity, t)];
    }
    groups
        .iter()
        .map(|group| {
            let percent = (clamp_fraction(group.remaining_fraction) * 100.0).round();
            let members: Vec<&str> = group.member_identifiers.iter().map(String::as_str).collect();
            QuotaRow {
                id: group.id.clone(),
                label: group.label.clone(),
                percent_label: percent_label(Some(percent)),
                reset_label: format_quota_reset_time_in(group.reset_time.as_deref(), tz),
                title: Some(members.join(", ")),
                details: Vec::new(),
                bar: Some(Bar::new(Some(percent), REMAINING_THRESHOLDS)),
            }
        })
        .collect()
}

fn plan_label<T: Translate + ?Sized>(plan: &PlanType, t: &T) -> String {
    match plan.label_key() {
        Some(key) => t.text(key),
        None => plan.as_str().to_string(),
    }
}

/// Codex rows show the remaining share, inverted from the used percent.
pub fn codex_rows<T: Translate + ?Sized>(quota: &CodexQuota, t: &T) -> Vec<QuotaRow> {
    let mut rows = Vec::new();
    if let Some(plan) = &quota.plan_type {
        let mut row = QuotaRow::message("plan", t.text("codex_quota.plan_label"));
        row.details.push(plan_label(plan, t));
        rows.push(row);
    }

    if quota.windows.is_empty() {
        rows.push(empty_row(QuotaKind::Codex, t));
        return rows;
    }

    rows.extend(quota.windows.iter().map(|window| {
        let remaining = window.used_percent.map(|used| 100.0 - clamp_percent(used));
        QuotaRow {
            id: window.id.clone(),
            label: t.text(&window.label_key),
            percent_label: percent_label(remaining),
            reset_label: window.reset_label.clone(),
            title: None,
            details: Vec::new(),
            bar: Some(Bar::new(remaining, CODEX_THRESHOLDS)),
        }
    }));
    rows
}

pub fn gemini_cli_rows<T, Tz>(buckets: &[CliQuotaBucket], t: &T, tz: &Tz) -> Vec<QuotaRow>
where
    T: Translate + ?Sized,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if buckets.is_empty() {
        return vec![empty_row(QuotaKind::GeminiCli, t)];
    }
    buckets
        .iter()
        .map(|bucket| {
            let percent = bucket
                .remaining_fraction
                .map(|f| (clamp_fraction(f) * 100.0).round());
            let base = if bucket.member_model_ids.is_empty() {
                bucket.label.clone()
            } else {
                bucket.member_model_ids.join(", ")
            };
            let title = match &bucket.token_type {
                Some(token_type) => format!("{} ({})", base, token_type),
                None => base,
            };
            let details = bucket
                .remaining_amount
                .map(|amount| {
                    vec![format!(
                        "{}: {}",
                        t.text("gemini_cli_quota.remaining_amount"),
                        amount
                    )]
                })
                .unwrap_or_default();
            QuotaRow {
                id: bucket.id.clone(),
                label: bucket.label.clone(),
                percent_label: percent_label(percent),
                reset_label: format_quota_reset_time_in(bucket.reset_time.as_deref(), tz),
                title: Some(title),
                details,
                bar: Some(Bar::new(percent, REMAINING_THRESHOLDS)),
            }
        })
        .collect()
}

/// How an assistant summary is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMode {
    RollingWindows,
    MonthlyQuota,
    None,
}

pub fn summary_mode(summary: &AssistantQuotaSummary) -> SummaryMode {
    if summary
        .rolling_windows
        .as_ref()
        .is_some_and(|windows| !windows.is_empty())
    {
        SummaryMode::RollingWindows
    } else if summary.monthly_quota.is_some() && summary.remaining_quota.is_some() {
        SummaryMode::MonthlyQuota
    } else {
        SummaryMode::None
    }
}

/// Rolling windows label the used share while the bar shows what remains.
pub fn claude_rows<T, Tz>(summary: &AssistantQuotaSummary, t: &T, tz: &Tz) -> Vec<QuotaRow>
where
    T: Translate + ?Sized,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut rows = Vec::new();

    if summary.email.is_some() || summary.plan_type.is_some() {
        let mut row = QuotaRow::message("info", String::new());
        if let Some(email) = &summary.email {
            row.details
                .push(format!("{}: {}", t.text("claude_quota.email_label"), email));
        }
        if let Some(plan) = &summary.plan_type {
            row.details
                .push(format!("{}: {}", t.text("claude_quota.plan_label"), plan));
        }
        rows.push(row);
    }

    match summary_mode(summary) {
        SummaryMode::RollingWindows => {
            for window in summary.rolling_windows.iter().flatten() {
                let used = clamp_percent(window.used_percent);
                rows.push(QuotaRow {
                    id: window.id.clone(),
                    label: t.text(&window.label_key),
                    percent_label: percent_label(Some(used)),
                    reset_label: format_quota_reset_time_in(window.resets_at.as_deref(), tz),
                    title: None,
                    details: Vec::new(),
                    bar: Some(Bar::new(Some(100.0 - used), REMAINING_THRESHOLDS)),
                });
            }
        }
        SummaryMode::MonthlyQuota => {
            let remaining = summary.remaining_quota.unwrap_or(0.0).max(0.0);
            let total = summary.monthly_quota.unwrap_or(1.0).max(1.0);
            let percent = (remaining / total * 100.0).round();
            rows.push(QuotaRow {
                id: "quota".to_string(),
                label: t.text("claude_quota.monthly_quota"),
                percent_label: percent_label(Some(percent)),
                reset_label: format_quota_reset_time_in(summary.reset_date.as_deref(), tz),
                title: None,
                details: vec![
                    format!(
                        "{}: {}",
                        t.text("claude_quota.used_label"),
                        format_tokens(summary.used_quota.unwrap_or(0.0))
                    ),
                    format!(
                        "{}: {}",
                        t.text("claude_quota.remaining_label"),
                        format_tokens(remaining)
                    ),
                ],
                bar: Some(Bar::new(Some(percent), REMAINING_THRESHOLDS)),
            });
        }
        SummaryMode::None => {}
    }

    if summary.requests_limit.is_some() || summary.requests_remaining.is_some() {
        let mut row = QuotaRow::message("rate-limit", t.text("claude_quota.rate_limit_label"));
        row.details.push(format!(
            "{} / {} {}",
            summary.requests_remaining.unwrap_or(0.0),
            summary.requests_limit.unwrap_or(0.0),
            t.text("claude_quota.requests_per_minute")
        ));
        rows.push(row);
    }

    if rows.is_empty() {
        rows.push(empty_row(QuotaKind::Claude, t));
    }
    rows
}

/// Single message row for the non-success states.
pub fn status_row<D, T: Translate + ?Sized>(
    kind: QuotaKind,
    state: &QuotaState<D>,
    t: &T,
) -> Option<QuotaRow> {
    let prefix = kind.i18n_prefix();
    match state {
        QuotaState::Idle => Some(QuotaRow::message("idle", t.text(&format!("{}.idle", prefix)))),
        QuotaState::Loading => Some(QuotaRow::message(
            "loading",
            t.text(&format!("{}.loading", prefix)),
        )),
        QuotaState::Error {
            message,
            http_status_code,
        } => {
            let resolved = super::error::resolve_error_message(*http_status_code, message);
            let mut row = QuotaRow::message("error", t.text(&format!("{}.load_failed", prefix)));
            row.details.push(t.text(&resolved));
            Some(row)
        }
        QuotaState::Success { .. } => None,
    }
}

/// Rows for a state of any kind: one status row, or the success rows.
pub fn state_rows<T, Tz>(state: &AnyQuotaState, t: &T, tz: &Tz) -> Vec<QuotaRow>
where
    T: Translate + ?Sized,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let kind = state.kind();
    let status = match state {
        AnyQuotaState::Antigravity { state } => status_row(kind, state, t),
        AnyQuotaState::Codex { state } => status_row(kind, state, t),
        AnyQuotaState::GeminiCli { state } => status_row(kind, state, t),
        AnyQuotaState::Claude { state } => status_row(kind, state, t),
    };
    if let Some(row) = status {
        return vec![row];
    }

    match state {
        AnyQuotaState::Antigravity { state } => {
            antigravity_rows(state.data().map(Vec::as_slice).unwrap_or_default(), t, tz)
        }
        AnyQuotaState::Codex { state } => {
            codex_rows(&state.data().cloned().unwrap_or_default(), t)
        }
        AnyQuotaState::GeminiCli { state } => {
            gemini_cli_rows(state.data().map(Vec::as_slice).unwrap_or_default(), t, tz)
        }
        AnyQuotaState::Claude { state } => {
            claude_rows(&state.data().cloned().unwrap_or_default(), t, tz)
        }
    }
}

#[cfg(test)]
#[path = "tests/display_tests.rs"]
mod tests;
