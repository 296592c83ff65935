//! Single-response entry points: raw provider response in, quota state out.

use super::antigravity::{build_antigravity_quota_groups, extract_models};
use super::claude::parse_claude_quota_payload;
use super::codex::normalize_codex_usage;
use super::error::{transport_error_message, QuotaError};
use super::gemini_cli::normalize_gemini_cli_quota;
use super::types::{
    AnyQuotaState, AssistantQuotaSummary, CliQuotaBucket, CodexQuota, ProjectQuotaGroup,
    QuotaKind, QuotaState,
};
use super::values::{parse_payload, PlanType};
use serde_json::Value;

/// A provider response as handed over by the transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawResponse<'a> {
    /// `None` when the body was captured without its status
    pub status_code: Option<u16>,
    pub body: Option<&'a Value>,
    pub body_text: Option<&'a str>,
}

impl<'a> RawResponse<'a> {
    pub fn ok(body: &'a Value) -> Self {
        Self {
            status_code: Some(200),
            body: Some(body),
            body_text: None,
        }
    }

    fn is_success(&self) -> bool {
        self.status_code.is_none_or(|status| (200..300).contains(&status))
    }
}

pub fn normalize_antigravity(
    body: Option<&Value>,
    body_text: Option<&str>,
) -> Result<Vec<ProjectQuotaGroup>, QuotaError> {
    let models = extract_models(body, body_text).ok_or(QuotaError::EmptyPayload {
        kind: QuotaKind::Antigravity,
    })?;
    Ok(build_antigravity_quota_groups(&models))
}

pub fn normalize_codex(
    body: Option<&Value>,
    body_text: Option<&str>,
    fallback_plan: Option<PlanType>,
) -> Result<CodexQuota, QuotaError> {
    let payload = parse_payload(body, body_text).ok_or(QuotaError::EmptyPayload {
        kind: QuotaKind::Codex,
    })?;
    Ok(normalize_codex_usage(&payload, fallback_plan))
}

/// Missing or bucket-less payloads are a valid empty answer.
pub fn normalize_gemini_cli(
    body: Option<&Value>,
    body_text: Option<&str>,
) -> Result<Vec<CliQuotaBucket>, QuotaError> {
    Ok(normalize_gemini_cli_quota(body, body_text))
}

pub fn normalize_claude(
    body: Option<&Value>,
    body_text: Option<&str>,
) -> Result<AssistantQuotaSummary, QuotaError> {
    let payload = parse_payload(body, body_text).ok_or(QuotaError::EmptyPayload {
        kind: QuotaKind::Claude,
    })?;
    Ok(parse_claude_quota_payload(&payload))
}

/// Folds a normalization result into a settled state.
pub fn settle<T>(result: Result<T, QuotaError>) -> QuotaState<T> {
    match result {
        Ok(data) => QuotaState::success(data),
        Err(err) => err.into_state(),
    }
}

/// Normalizes one response of `kind` into a settled state.
///
/// A non-2xx status yields an error state carrying the status and the best
/// message the body offers.
pub fn normalize_response(
    kind: QuotaKind,
    response: RawResponse<'_>,
    fallback_plan: Option<PlanType>,
) -> AnyQuotaState {
    if !response.is_success() {
        let message =
            transport_error_message(response.status_code, response.body, response.body_text);
        return AnyQuotaState::error(kind, message, response.status_code);
    }

    let (body, text) = (response.body, response.body_text);
    match kind {
        QuotaKind::Antigravity => AnyQuotaState::Antigravity {
            state: settle(normalize_antigravity(body, text)),
        },
        QuotaKind::Codex => AnyQuotaState::Codex {
            state: settle(normalize_codex(body, text, fallback_plan)),
        },
        QuotaKind::GeminiCli => AnyQuotaState::GeminiCli {
            state: settle(normalize_gemini_cli(body, text)),
        },
        QuotaKind::Claude => AnyQuotaState::Claude {
            state: settle(normalize_claude(body, text)),
        },
    }
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
