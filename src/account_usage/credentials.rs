//! Auth-file records and the details quota requests need from them.

use crate::quota::values::{
    normalize_auth_index_value, normalize_plan_type, normalize_string_value, pick, pick_object,
    PlanType, CODEX_PLAN_TYPE_KEYS,
};
use crate::quota::QuotaKind;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const OPENAI_AUTH_CLAIM: &str = "https://api.openai.com/auth";

/// A stored credential as listed by the host.
///
/// Only `name` is fixed; every other field is read leniently since hosts spell
/// them in either case style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthFile {
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl AuthFile {
    pub fn new(name: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn auth_index(&self) -> Option<String> {
        normalize_auth_index_value(pick(&self.fields, &["auth_index", "authIndex"]))
    }

    /// Lower-cased provider, from `provider` or `type`.
    pub fn provider(&self) -> Option<String> {
        normalize_string_value(pick(&self.fields, &["provider", "type"])).map(|p| p.to_lowercase())
    }

    fn metadata(&self) -> Option<&Map<String, Value>> {
        pick_object(&self.fields, &["metadata"])
    }

    fn attributes(&self) -> Option<&Map<String, Value>> {
        pick_object(&self.fields, &["attributes"])
    }
}

fn is_kind(file: &AuthFile, kind: QuotaKind) -> bool {
    file.provider().and_then(|p| QuotaKind::parse(&p)) == Some(kind)
}

pub fn is_antigravity_file(file: &AuthFile) -> bool {
    is_kind(file, QuotaKind::Antigravity)
}

pub fn is_codex_file(file: &AuthFile) -> bool {
    is_kind(file, QuotaKind::Codex)
}

pub fn is_gemini_cli_file(file: &AuthFile) -> bool {
    is_kind(file, QuotaKind::GeminiCli)
}

pub fn is_claude_file(file: &AuthFile) -> bool {
    is_kind(file, QuotaKind::Claude)
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => text.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

pub fn is_disabled_auth_file(file: &AuthFile) -> bool {
    truthy(file.fields.get("disabled"))
        || normalize_string_value(file.fields.get("status"))
            .is_some_and(|status| status.eq_ignore_ascii_case("disabled"))
}

pub fn is_runtime_only_auth_file(file: &AuthFile) -> bool {
    truthy(pick(&file.fields, &["runtime_only", "runtimeOnly"]))
}

/// Quota service a file is polled against, or `None` when it is not eligible.
pub fn eligible_quota_kind(file: &AuthFile) -> Option<QuotaKind> {
    if is_disabled_auth_file(file) {
        return None;
    }
    let kind = QuotaKind::parse(&file.provider()?)?;
    if kind == QuotaKind::GeminiCli && is_runtime_only_auth_file(file) {
        return None;
    }
    Some(kind)
}

/// Decodes the claims segment of a JWT.
pub fn decode_jwt_claims(token: &str) -> Option<Map<String, Value>> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .ok()?;
    match serde_json::from_slice::<Value>(&payload).ok()? {
        Value::Object(claims) => Some(claims),
        _ => None,
    }
}

/// Claims of the file's id token, whether stored encoded or already decoded.
fn id_token_claims(file: &AuthFile) -> Option<Map<String, Value>> {
    let raw = pick(&file.fields, &["id_token"])
        .or_else(|| file.metadata().and_then(|m| pick(m, &["id_token"])))
        .or_else(|| file.attributes().and_then(|a| pick(a, &["id_token"])))?;
    match raw {
        Value::Object(claims) => Some(claims.clone()),
        Value::String(token) => decode_jwt_claims(token),
        _ => None,
    }
}

fn auth_claim(claims: &Map<String, Value>, key: &str) -> Option<String> {
    normalize_string_value(claims.get(key)).or_else(|| {
        claims
            .get(OPENAI_AUTH_CLAIM)
            .and_then(Value::as_object)
            .and_then(|auth| normalize_string_value(auth.get(key)))
    })
}

pub fn resolve_codex_chatgpt_account_id(file: &AuthFile) -> Option<String> {
    id_token_claims(file)
        .and_then(|claims| auth_claim(&claims, "chatgpt_account_id"))
        .or_else(|| {
            file.metadata()
                .and_then(|m| normalize_string_value(pick(m, &["account_id", "accountId"])))
        })
}

/// Plan type known from the auth file, used when the usage payload omits it.
pub fn resolve_codex_plan_type(file: &AuthFile) -> Option<PlanType> {
    let from_claims = id_token_claims(file)
        .and_then(|claims| auth_claim(&claims, "chatgpt_plan_type"))
        .map(Value::String);
    normalize_plan_type(from_claims.as_ref())
        .or_else(|| normalize_plan_type(pick(&file.fields, &CODEX_PLAN_TYPE_KEYS)))
        .or_else(|| {
            file.metadata()
                .and_then(|m| normalize_plan_type(pick(m, &CODEX_PLAN_TYPE_KEYS)))
        })
}

/// Project id from an account label of the form `email (project-id)`.
fn project_id_from_account(account: &str) -> Option<String> {
    let (_, tail) = account.trim().rsplit_once('(')?;
    let project = tail.strip_suffix(')')?.trim();
    (!project.is_empty()).then(|| project.to_string())
}

pub fn resolve_gemini_cli_project_id(file: &AuthFile) -> Option<String> {
    normalize_string_value(file.fields.get("account"))
        .and_then(|account| project_id_from_account(&account))
        .or_else(|| {
            file.metadata()
                .and_then(|m| normalize_string_value(pick(m, &["project_id", "projectId"])))
        })
}

#[cfg(test)]
#[path = "tests/credentials_tests.rs"]
mod tests;
