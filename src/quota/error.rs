//! Failure taxonomy of a quota fetch and the status-code message contract.

use super::types::{QuotaKind, QuotaState};
use super::values::{normalize_string_value, pick};
use serde_json::Value;
use thiserror::Error;

pub const UPDATE_REQUIRED_KEY: &str = "common.quota_update_required";
pub const CHECK_CREDENTIAL_KEY: &str = "common.quota_check_credential";
pub const UNKNOWN_ERROR_KEY: &str = "common.unknown_error";

/// Which credential detail was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    AuthIndex,
    AccountId,
    ProjectId,
}

impl MissingField {
    fn key_suffix(&self) -> &'static str {
        match self {
            MissingField::AuthIndex => "missing_auth_index",
            MissingField::AccountId => "missing_account_id",
            MissingField::ProjectId => "missing_project_id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuotaError {
    /// No usable auth index or account id; raised before any request.
    #[error("{}.{}", .kind.i18n_prefix(), .field.key_suffix())]
    MissingCredential { kind: QuotaKind, field: MissingField },

    /// Non-2xx response or network failure.
    #[error("{message}")]
    Transport { message: String, status: Option<u16> },

    /// 2xx response without parseable quota data.
    #[error("{}", .kind.empty_payload_key())]
    EmptyPayload { kind: QuotaKind },
}

impl QuotaError {
    pub fn transport(message: impl Into<String>, status: Option<u16>) -> Self {
        QuotaError::Transport {
            message: message.into(),
            status,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            QuotaError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Converts the failure into the error state stored for the subject.
    pub fn into_state<T>(self) -> QuotaState<T> {
        let status = self.status();
        QuotaState::error(self.to_string(), status)
    }
}

/// Error text of a failed response.
///
/// Prefers `error.message`, then a string `error`, then `message` from the
/// body, then the raw body text, then `HTTP <status>`.
pub fn transport_error_message(
    status: Option<u16>,
    body: Option<&Value>,
    body_text: Option<&str>,
) -> String {
    let from_body = body.and_then(Value::as_object).and_then(|body| {
        body.get("error")
            .and_then(Value::as_object)
            .and_then(|error| normalize_string_value(error.get("message")))
            .or_else(|| normalize_string_value(body.get("error")))
            .or_else(|| normalize_string_value(pick(body, &["message"])))
    });

    from_body
        .or_else(|| normalize_string_value(body))
        .or_else(|| {
            let text = body_text?.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .unwrap_or_else(|| match status {
            Some(status) => format!("HTTP {}", status),
            None => UNKNOWN_ERROR_KEY.to_string(),
        })
}

/// Statuses that get their own message instead of the raw transport text.
pub fn is_priority_status(status: u16) -> bool {
    status == 403 || status == 404
}

/// Message to show for an error state.
///
/// 404 means the upstream integration changed, 403 means the credential lacks
/// permission; any other status surfaces the raw message unchanged.
pub fn resolve_error_message(status: Option<u16>, raw: &str) -> String {
    match status {
        Some(404) => UPDATE_REQUIRED_KEY.to_string(),
        Some(403) => CHECK_CREDENTIAL_KEY.to_string(),
        _ if raw.trim().is_empty() => UNKNOWN_ERROR_KEY.to_string(),
        _ => raw.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
