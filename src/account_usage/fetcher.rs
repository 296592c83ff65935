//! Per-provider quota fetches and the concurrent refresh pass.

use super::api_client::{
    antigravity_headers, codex_headers, gemini_cli_headers, status_from_error, ApiCallRequest,
    HttpMethod, ManagementApi, QuotaEndpoints,
};
use super::credentials::{
    eligible_quota_kind, resolve_codex_chatgpt_account_id, resolve_codex_plan_type,
    resolve_gemini_cli_project_id, AuthFile,
};
use super::store::QuotaStore;
use super::types::RefreshSummary;
use crate::quota::antigravity::resolve_project_id;
use crate::quota::error::{is_priority_status, MissingField, UNKNOWN_ERROR_KEY};
use crate::quota::normalize::{
    normalize_antigravity, normalize_claude, normalize_codex, normalize_gemini_cli, settle,
};
use crate::quota::types::{AssistantQuotaSummary, CliQuotaBucket, CodexQuota, ProjectQuotaGroup};
use crate::quota::{AnyQuotaState, QuotaError, QuotaKind};
use futures::future::join_all;
use serde_json::json;

fn require_auth_index(file: &AuthFile, kind: QuotaKind) -> Result<String, QuotaError> {
    file.auth_index().ok_or(QuotaError::MissingCredential {
        kind,
        field: MissingField::AuthIndex,
    })
}

fn transport_failure(err: anyhow::Error) -> QuotaError {
    QuotaError::transport(err.to_string(), status_from_error(&err))
}

/// Project id named by the stored credential, or the configured default.
async fn antigravity_project_id(
    api: &dyn ManagementApi,
    file: &AuthFile,
    default_project: &str,
) -> String {
    match api.download_auth_file(&file.name).await {
        Ok(text) => resolve_project_id(&text, default_project),
        Err(err) => {
            tracing::debug!(file = %file.name, error = %err, "auth file download failed, using default project");
            default_project.to_string()
        }
    }
}

/// Tracks the most informative failure across candidate endpoints.
#[derive(Debug, Default)]
struct AttemptLog {
    last_error: Option<String>,
    last_status: Option<u16>,
    priority_status: Option<u16>,
    had_success: bool,
}

impl AttemptLog {
    fn record_failure(&mut self, message: String, status: Option<u16>) {
        self.last_error = Some(message);
        if let Some(status) = status {
            self.last_status = Some(status);
            if is_priority_status(status) && self.priority_status.is_none() {
                self.priority_status = Some(status);
            }
        }
    }

    fn into_error(self) -> QuotaError {
        QuotaError::transport(
            self.last_error
                .unwrap_or_else(|| UNKNOWN_ERROR_KEY.to_string()),
            self.priority_status.or(self.last_status),
        )
    }
}

/// Tries each endpoint in order and returns the first non-empty group list.
///
/// If any endpoint answered 2xx without usable groups the result is an empty
/// success; only when every endpoint failed does an error come back, carrying
/// the first 403/404 seen or else the last status.
pub async fn fetch_antigravity_quota(
    api: &dyn ManagementApi,
    endpoints: &QuotaEndpoints,
    file: &AuthFile,
) -> Result<Vec<ProjectQuotaGroup>, QuotaError> {
    let auth_index = require_auth_index(file, QuotaKind::Antigravity)?;
    let project_id = antigravity_project_id(api, file, &endpoints.antigravity_project_id).await;
    let data = json!({ "project": project_id }).to_string();

    let mut attempts = AttemptLog::default();
    for url in &endpoints.antigravity_urls {
        let request = ApiCallRequest {
            auth_index: auth_index.clone(),
            method: HttpMethod::Post,
            url: url.clone(),
            header: antigravity_headers(),
            data: Some(data.clone()),
        };

        let result = match api.api_call(request).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(file = %file.name, url = %url, error = %err, "quota endpoint unreachable");
                let status = status_from_error(&err);
                attempts.record_failure(err.to_string(), status);
                continue;
            }
        };

        if !result.is_success() {
            tracing::warn!(file = %file.name, url = %url, status = result.status_code, "quota endpoint failed");
            let status = result.status_code;
            attempts.record_failure(result.error_message(), Some(status));
            continue;
        }

        attempts.had_success = true;
        let groups = normalize_antigravity(result.body.as_ref(), result.body_text.as_deref())
            .unwrap_or_default();
        if groups.is_empty() {
            attempts.record_failure(QuotaKind::Antigravity.empty_payload_key().to_string(), None);
            continue;
        }
        return Ok(groups);
    }

    if attempts.had_success {
        return Ok(Vec::new());
    }
    Err(attempts.into_error())
}

pub async fn fetch_codex_quota(
    api: &dyn ManagementApi,
    endpoints: &QuotaEndpoints,
    file: &AuthFile,
) -> Result<CodexQuota, QuotaError> {
    let auth_index = require_auth_index(file, QuotaKind::Codex)?;
    let plan_from_file = resolve_codex_plan_type(file);
    let account_id = resolve_codex_chatgpt_account_id(file).ok_or(QuotaError::MissingCredential {
        kind: QuotaKind::Codex,
        field: MissingField::AccountId,
    })?;

    let request = ApiCallRequest {
        auth_index,
        method: HttpMethod::Get,
        url: endpoints.codex_usage_url.clone(),
        header: codex_headers(&account_id),
        data: None,
    };
    let result = api.api_call(request).await.map_err(transport_failure)?;
    if !result.is_success() {
        return Err(result.into_transport_error());
    }

    normalize_codex(
        result.body.as_ref(),
        result.body_text.as_deref(),
        plan_from_file,
    )
}

pub async fn fetch_gemini_cli_quota(
    api: &dyn ManagementApi,
    endpoints: &QuotaEndpoints,
    file: &AuthFile,
) -> Result<Vec<CliQuotaBucket>, QuotaError> {
    let auth_index = require_auth_index(file, QuotaKind::GeminiCli)?;
    let project_id = resolve_gemini_cli_project_id(file).ok_or(QuotaError::MissingCredential {
        kind: QuotaKind::GeminiCli,
        field: MissingField::ProjectId,
    })?;

    let request = ApiCallRequest {
        auth_index,
        method: HttpMethod::Post,
        url: endpoints.gemini_cli_quota_url.clone(),
        header: gemini_cli_headers(),
        data: Some(json!({ "project": project_id }).to_string()),
    };
    let result = api.api_call(request).await.map_err(transport_failure)?;
    if !result.is_success() {
        return Err(result.into_transport_error());
    }

    normalize_gemini_cli(result.body.as_ref(), result.body_text.as_deref())
}

pub async fn fetch_claude_quota(
    api: &dyn ManagementApi,
    file: &AuthFile,
) -> Result<AssistantQuotaSummary, QuotaError> {
    let response = api
        .get_claude_quota(&file.name)
        .await
        .map_err(transport_failure)?;
    normalize_claude(Some(&response), None)
}

/// Fetches one file and returns its settled state.
pub async fn fetch_quota_state(
    api: &dyn ManagementApi,
    endpoints: &QuotaEndpoints,
    kind: QuotaKind,
    file: &AuthFile,
) -> AnyQuotaState {
    match kind {
        QuotaKind::Antigravity => AnyQuotaState::Antigravity {
            state: settle(fetch_antigravity_quota(api, endpoints, file).await),
        },
        QuotaKind::Codex => AnyQuotaState::Codex {
            state: settle(fetch_codex_quota(api, endpoints, file).await),
        },
        QuotaKind::GeminiCli => AnyQuotaState::GeminiCli {
            state: settle(fetch_gemini_cli_quota(api, endpoints, file).await),
        },
        QuotaKind::Claude => AnyQuotaState::Claude {
            state: settle(fetch_claude_quota(api, file).await),
        },
    }
}

enum Outcome {
    Succeeded,
    Failed,
    Superseded,
}

async fn refresh_one(
    api: &dyn ManagementApi,
    endpoints: &QuotaEndpoints,
    store: &QuotaStore,
    kind: QuotaKind,
    file: &AuthFile,
) -> Outcome {
    let ticket = store.begin_fetch(kind, &file.name);
    tracing::debug!(file = %file.name, kind = %kind, generation = ticket.generation, "fetching quota");

    let state = fetch_quota_state(api, endpoints, kind, file).await;
    let failed = state.status() == "error";
    if failed {
        tracing::warn!(file = %file.name, kind = %kind, "quota fetch failed");
    }

    if !store.commit(&ticket, state) {
        Outcome::Superseded
    } else if failed {
        Outcome::Failed
    } else {
        Outcome::Succeeded
    }
}

/// Refreshes every eligible file concurrently and commits each result.
///
/// Files that are disabled, of an unknown provider, or runtime-only CLI
/// credentials are skipped without touching the store.
pub async fn refresh_all(
    api: &dyn ManagementApi,
    endpoints: &QuotaEndpoints,
    files: &[AuthFile],
    store: &QuotaStore,
) -> RefreshSummary {
    let pending = files.iter().filter_map(|file| {
        let kind = eligible_quota_kind(file)?;
        Some(refresh_one(api, endpoints, store, kind, file))
    });

    let mut summary = RefreshSummary::default();
    for outcome in join_all(pending).await {
        match outcome {
            Outcome::Succeeded => summary.succeeded += 1,
            Outcome::Failed => summary.failed += 1,
            Outcome::Superseded => summary.superseded += 1,
        }
    }
    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        superseded = summary.superseded,
        "quota refresh complete"
    );
    summary
}

#[cfg(test)]
#[path = "tests/fetcher_tests.rs"]
mod tests;
