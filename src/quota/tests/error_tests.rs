use super::*;
use serde_json::json;

#[test]
fn test_status_mapping_contract() {
    assert_eq!(
        resolve_error_message(Some(404), "Not Found"),
        "common.quota_update_required"
    );
    assert_eq!(
        resolve_error_message(Some(403), "Forbidden"),
        "common.quota_check_credential"
    );
    assert_eq!(
        resolve_error_message(Some(500), "upstream exploded"),
        "upstream exploded"
    );
    assert_eq!(resolve_error_message(None, "offline"), "offline");
    assert_eq!(resolve_error_message(Some(500), "  "), "common.unknown_error");
}

#[test]
fn test_error_messages_are_message_keys() {
    let err = QuotaError::MissingCredential {
        kind: QuotaKind::Codex,
        field: MissingField::AccountId,
    };
    assert_eq!(err.to_string(), "codex_quota.missing_account_id");
    assert_eq!(err.status(), None);

    let err = QuotaError::EmptyPayload {
        kind: QuotaKind::Antigravity,
    };
    assert_eq!(err.to_string(), "antigravity_quota.empty_models");
}

#[test]
fn test_into_state_keeps_status() {
    let state: QuotaState<()> = QuotaError::transport("Forbidden", Some(403)).into_state();
    assert_eq!(state, QuotaState::error("Forbidden", Some(403)));
}

#[test]
fn test_priority_statuses() {
    assert!(is_priority_status(403));
    assert!(is_priority_status(404));
    assert!(!is_priority_status(401));
}

#[test]
fn test_transport_error_message_precedence() {
    let body = json!({ "error": { "message": "quota project missing" }, "message": "outer" });
    assert_eq!(
        transport_error_message(Some(400), Some(&body), Some("raw")),
        "quota project missing"
    );

    let body = json!({ "error": "invalid_grant" });
    assert_eq!(
        transport_error_message(Some(401), Some(&body), None),
        "invalid_grant"
    );

    let body = json!({ "message": "slow down" });
    assert_eq!(transport_error_message(Some(429), Some(&body), None), "slow down");

    assert_eq!(
        transport_error_message(Some(502), None, Some(" Bad Gateway ")),
        "Bad Gateway"
    );
    assert_eq!(transport_error_message(Some(503), None, None), "HTTP 503");
    assert_eq!(transport_error_message(None, None, None), "common.unknown_error");
}
