use super::*;
use serde_json::json;

#[test]
fn test_non_success_status_becomes_error_state() {
    let body = json!({ "error": { "message": "Requested entity was not found." } });
    let state = normalize_response(
        QuotaKind::GeminiCli,
        RawResponse {
            status_code: Some(404),
            body: Some(&body),
            body_text: None,
        },
        None,
    );

    assert_eq!(
        state,
        AnyQuotaState::GeminiCli {
            state: QuotaState::error("Requested entity was not found.", Some(404)),
        }
    );
}

#[test]
fn test_antigravity_without_models_is_empty_payload() {
    let body = json!({ "other": 1 });
    let state = normalize_response(QuotaKind::Antigravity, RawResponse::ok(&body), None);
    assert_eq!(
        state,
        AnyQuotaState::Antigravity {
            state: QuotaState::error("antigravity_quota.empty_models", None),
        }
    );
}

#[test]
fn test_codex_unparseable_text_is_empty_payload() {
    let state = normalize_response(
        QuotaKind::Codex,
        RawResponse {
            status_code: Some(200),
            body: None,
            body_text: Some("<html>"),
        },
        None,
    );
    assert_eq!(state.status(), "error");
    let AnyQuotaState::Codex { state } = state else {
        panic!("expected codex state");
    };
    assert_eq!(state, QuotaState::error("codex_quota.empty_windows", None));
}

#[test]
fn test_codex_fallback_plan_applies() {
    let body = json!({ "rate_limit": null });
    let state = normalize_response(QuotaKind::Codex, RawResponse::ok(&body), Some(PlanType::Plus));
    let AnyQuotaState::Codex { state } = state else {
        panic!("expected codex state");
    };
    let quota = state.data().unwrap();
    assert_eq!(quota.plan_type, Some(PlanType::Plus));
    assert!(quota.windows.is_empty());
}

#[test]
fn test_gemini_cli_empty_body_is_success() {
    let state = normalize_response(QuotaKind::GeminiCli, RawResponse::default(), None);
    assert_eq!(
        state,
        AnyQuotaState::GeminiCli {
            state: QuotaState::success(Vec::new()),
        }
    );
}

#[test]
fn test_claude_summary_from_text() {
    let state = normalize_response(
        QuotaKind::Claude,
        RawResponse {
            status_code: None,
            body: None,
            body_text: Some(r#"{"oauth_usage": {"seven_day_utilization": "55%"}}"#),
        },
        None,
    );
    let AnyQuotaState::Claude { state } = state else {
        panic!("expected claude state");
    };
    let windows = state.data().unwrap().rolling_windows.clone().unwrap();
    assert_eq!(windows[0].id, "seven-day");
    assert_eq!(windows[0].used_percent, 55.0);
}

#[test]
fn test_claude_non_object_is_empty_payload() {
    let body = json!([1, 2, 3]);
    let state = normalize_claude(Some(&body), None);
    assert_eq!(
        state,
        Err(QuotaError::EmptyPayload {
            kind: QuotaKind::Claude
        })
    );
}
