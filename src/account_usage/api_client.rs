//! Request and response shapes of the management API-call proxy.
//!
//! Quota requests are never sent directly. The host's management API performs
//! them on behalf of a stored credential (selected by auth index) and
//! substitutes `$TOKEN$` in headers with that credential's access token.

use crate::quota::antigravity::{ANTIGRAVITY_QUOTA_URLS, DEFAULT_ANTIGRAVITY_PROJECT_ID};
use crate::quota::gemini_cli::GEMINI_CLI_QUOTA_URL;
use crate::quota::error::transport_error_message;
use crate::quota::QuotaError;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const CODEX_USAGE_URL: &str = "https://chatgpt.com/backend-api/wham/usage";

const BEARER_TOKEN_PLACEHOLDER: &str = "Bearer $TOKEN$";
const ANTIGRAVITY_USER_AGENT: &str = "antigravity/1.11.5 windows/amd64";
const CODEX_USER_AGENT: &str = "codex_cli_rs/0.76.0 (Debian 13.0.0; x86_64) WindowsTerminal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

/// One proxied request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallRequest {
    pub auth_index: String,
    pub method: HttpMethod,
    pub url: String,
    pub header: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Outcome of a proxied request that reached the upstream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallResult {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
}

impl ApiCallResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Best error text a failed response offers.
    pub fn error_message(&self) -> String {
        transport_error_message(
            Some(self.status_code),
            self.body.as_ref(),
            self.body_text.as_deref(),
        )
    }

    /// Converts a non-2xx result into a transport failure.
    pub fn into_transport_error(self) -> QuotaError {
        QuotaError::transport(self.error_message(), Some(self.status_code))
    }
}

/// Collaborator that performs network calls for the fetch cycle.
///
/// Failures that never produced a response come back as errors; attach a
/// [`QuotaError::Transport`] to carry a status code through.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    async fn api_call(&self, request: ApiCallRequest) -> Result<ApiCallResult>;

    /// Raw text of a stored auth file.
    async fn download_auth_file(&self, name: &str) -> Result<String>;

    /// Quota summary the host keeps for an assistant credential.
    async fn get_claude_quota(&self, name: &str) -> Result<Value>;
}

/// Status code carried by a collaborator error, if any.
pub fn status_from_error(err: &anyhow::Error) -> Option<u16> {
    err.downcast_ref::<QuotaError>().and_then(QuotaError::status)
}

/// Upstream locations, overridable through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaEndpoints {
    pub antigravity_project_id: String,
    pub antigravity_urls: Vec<String>,
    pub codex_usage_url: String,
    pub gemini_cli_quota_url: String,
}

impl Default for QuotaEndpoints {
    fn default() -> Self {
        Self {
            antigravity_project_id: DEFAULT_ANTIGRAVITY_PROJECT_ID.to_string(),
            antigravity_urls: ANTIGRAVITY_QUOTA_URLS.iter().map(|u| u.to_string()).collect(),
            codex_usage_url: CODEX_USAGE_URL.to_string(),
            gemini_cli_quota_url: GEMINI_CLI_QUOTA_URL.to_string(),
        }
    }
}

fn base_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Authorization".to_string(), BEARER_TOKEN_PLACEHOLDER.to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
    ])
}

pub fn antigravity_headers() -> BTreeMap<String, String> {
    let mut headers = base_headers();
    headers.insert("User-Agent".to_string(), ANTIGRAVITY_USER_AGENT.to_string());
    headers
}

pub fn codex_headers(account_id: &str) -> BTreeMap<String, String> {
    let mut headers = base_headers();
    headers.insert("User-Agent".to_string(), CODEX_USER_AGENT.to_string());
    headers.insert("Chatgpt-Account-Id".to_string(), account_id.to_string());
    headers
}

pub fn gemini_cli_headers() -> BTreeMap<String, String> {
    base_headers()
}

#[cfg(test)]
#[path = "tests/api_client_tests.rs"]
mod tests;
