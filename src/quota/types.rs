//! Canonical quota state and the per-provider success payloads.

use super::values::PlanType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which quota service a subject is polled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuotaKind {
    Antigravity,
    Codex,
    GeminiCli,
    Claude,
}

impl QuotaKind {
    pub const ALL: [QuotaKind; 4] = [
        QuotaKind::Antigravity,
        QuotaKind::Codex,
        QuotaKind::GeminiCli,
        QuotaKind::Claude,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaKind::Antigravity => "antigravity",
            QuotaKind::Codex => "codex",
            QuotaKind::GeminiCli => "gemini-cli",
            QuotaKind::Claude => "claude",
        }
    }

    /// Prefix of every message key owned by this kind.
    pub fn i18n_prefix(&self) -> &'static str {
        match self {
            QuotaKind::Antigravity => "antigravity_quota",
            QuotaKind::Codex => "codex_quota",
            QuotaKind::GeminiCli => "gemini_cli_quota",
            QuotaKind::Claude => "claude_quota",
        }
    }

    /// Message key shown when a successful response carried no quota data.
    pub fn empty_payload_key(&self) -> &'static str {
        match self {
            QuotaKind::Antigravity => "antigravity_quota.empty_models",
            QuotaKind::Codex => "codex_quota.empty_windows",
            QuotaKind::GeminiCli => "gemini_cli_quota.empty_buckets",
            QuotaKind::Claude => "claude_quota.no_data",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered || kind.as_str().replace('-', "_") == lowered)
    }
}

impl std::fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one quota subject for one fetch cycle.
///
/// Each cycle moves `Idle -> Loading -> Success | Error` and the whole value is
/// replaced on every transition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QuotaState<T> {
    #[default]
    Idle,
    Loading,
    Success {
        data: T,
    },
    Error {
        message: String,
        #[serde(rename = "httpStatusCode", skip_serializing_if = "Option::is_none")]
        http_status_code: Option<u16>,
    },
}

impl<T> QuotaState<T> {
    pub fn success(data: T) -> Self {
        QuotaState::Success { data }
    }

    pub fn error(message: impl Into<String>, http_status_code: Option<u16>) -> Self {
        QuotaState::Error {
            message: message.into(),
            http_status_code,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            QuotaState::Idle => "idle",
            QuotaState::Loading => "loading",
            QuotaState::Success { .. } => "success",
            QuotaState::Error { .. } => "error",
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QuotaState::Success { data } => Some(data),
            _ => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, QuotaState::Success { .. } | QuotaState::Error { .. })
    }
}

/// One display line of the project-quota service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuotaGroup {
    pub id: String,
    pub label: String,
    pub member_identifiers: BTreeSet<String>,
    /// Worst remaining fraction among members, in `[0, 1]`
    pub remaining_fraction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<String>,
}

/// A classified rate-limit window of the coding-assistant usage API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageWindow {
    pub id: String,
    pub label_key: String,
    /// Percent used in `[0, 100]`, `None` when unknown
    pub used_percent: Option<f64>,
    /// Pre-formatted reset time, or `"-"`
    pub reset_label: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodexQuota {
    pub plan_type: Option<PlanType>,
    pub windows: Vec<UsageWindow>,
}

/// A CLI quota bucket after per-model normalization, before grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCliBucket {
    pub model_id: String,
    pub token_type: Option<String>,
    pub remaining_fraction: Option<f64>,
    pub remaining_amount: Option<f64>,
    pub reset_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliQuotaBucket {
    pub id: String,
    pub label: String,
    pub remaining_fraction: Option<f64>,
    pub remaining_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<String>,
    pub token_type: Option<String>,
    pub member_model_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingWindow {
    pub id: String,
    pub label_key: String,
    pub used_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<String>,
}

/// Account summary of the assistant usage API.
///
/// Either `rolling_windows` or the monthly fields drive the display; which one
/// is decided purely by what the payload carried.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantQuotaSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_quota: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_quota: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_quota: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_limit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_remaining: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolling_windows: Option<Vec<RollingWindow>>,
}

pub type AntigravityQuotaState = QuotaState<Vec<ProjectQuotaGroup>>;
pub type CodexQuotaState = QuotaState<CodexQuota>;
pub type GeminiCliQuotaState = QuotaState<Vec<CliQuotaBucket>>;
pub type ClaudeQuotaState = QuotaState<AssistantQuotaSummary>;

/// A normalized state of any kind, for callers that handle kinds uniformly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnyQuotaState {
    Antigravity { state: AntigravityQuotaState },
    Codex { state: CodexQuotaState },
    GeminiCli { state: GeminiCliQuotaState },
    Claude { state: ClaudeQuotaState },
}

impl AnyQuotaState {
    pub fn kind(&self) -> QuotaKind {
        match self {
            AnyQuotaState::Antigravity { .. } => QuotaKind::Antigravity,
            AnyQuotaState::Codex { .. } => QuotaKind::Codex,
            AnyQuotaState::GeminiCli { .. } => QuotaKind::GeminiCli,
            AnyQuotaState::Claude { .. } => QuotaKind::Claude,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            AnyQuotaState::Antigravity { state } => state.status(),
            AnyQuotaState::Codex { state } => state.status(),
            AnyQuotaState::GeminiCli { state } => state.status(),
            AnyQuotaState::Claude { state } => state.status(),
        }
    }

    /// An error state of `kind`.
    pub fn error(kind: QuotaKind, message: impl Into<String>, status: Option<u16>) -> Self {
        let message = message.into();
        match kind {
            QuotaKind::Antigravity => AnyQuotaState::Antigravity {
                state: QuotaState::error(message, status),
            },
            QuotaKind::Codex => AnyQuotaState::Codex {
                state: QuotaState::error(message, status),
            },
            QuotaKind::GeminiCli => AnyQuotaState::GeminiCli {
                state: QuotaState::error(message, status),
            },
            QuotaKind::Claude => AnyQuotaState::Claude {
                state: QuotaState::error(message, status),
            },
        }
    }
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
