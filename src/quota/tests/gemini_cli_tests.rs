use super::*;
use serde_json::json;

fn tables() -> GroupTables {
    GroupTables::embedded()
}

fn parsed(model_id: &str, token_type: Option<&str>, fraction: Option<f64>) -> ParsedCliBucket {
    ParsedCliBucket {
        model_id: model_id.to_string(),
        token_type: token_type.map(str::to_string),
        remaining_fraction: fraction,
        remaining_amount: None,
        reset_time: None,
    }
}

#[test]
fn test_fallback_fraction_rules() {
    assert_eq!(fallback_fraction(Some(0.0), None), Some(0.0));
    assert_eq!(fallback_fraction(Some(-3.0), Some("2026-01-01T00:00:00Z")), Some(0.0));
    assert_eq!(fallback_fraction(None, Some("2026-01-01T00:00:00Z")), Some(0.0));
    assert_eq!(fallback_fraction(None, None), None);
    assert_eq!(fallback_fraction(Some(12.0), None), None);
    assert_eq!(fallback_fraction(Some(5.0), Some("2026-01-01T00:00:00Z")), None);
}

#[test]
fn test_parse_cli_bucket_applies_fallbacks() {
    let tables = tables();

    let bucket = parse_cli_bucket(
        &tables,
        &json!({ "modelId": "gemini-2.5-pro", "remainingAmount": 0 }),
    )
    .unwrap();
    assert_eq!(bucket.remaining_fraction, Some(0.0));

    let bucket = parse_cli_bucket(
        &tables,
        &json!({ "model_id": "gemini-2.5-pro", "reset_time": "2026-01-01T00:00:00Z" }),
    )
    .unwrap();
    assert_eq!(bucket.remaining_fraction, Some(0.0));

    let bucket = parse_cli_bucket(&tables, &json!({ "modelId": "gemini-2.5-pro" })).unwrap();
    assert_eq!(bucket.remaining_fraction, None);
}

#[test]
fn test_parse_cli_bucket_canonicalises_model() {
    let bucket = parse_cli_bucket(
        &tables(),
        &json!({ "modelId": "models/gemini-3-pro_vertex", "remainingFraction": 2.0 }),
    )
    .unwrap();
    assert_eq!(bucket.model_id, "gemini-3-pro-preview");
    assert_eq!(bucket.remaining_fraction, Some(1.0));
}

#[test]
fn test_unknown_models_are_dropped() {
    assert!(parse_cli_bucket(&tables(), &json!({ "modelId": "gemini-1.0-ultra" })).is_none());
    assert!(parse_cli_bucket(&tables(), &json!({ "tokenType": "REQUESTS" })).is_none());
    assert!(parse_cli_bucket(&tables(), &json!("gemini-2.5-pro")).is_none());
}

#[test]
fn test_grouping_takes_minimum_fraction() {
    let buckets = build_gemini_cli_quota_buckets_with(
        &tables(),
        vec![
            parsed("gemini-3-pro-preview", Some("REQUESTS"), Some(0.8)),
            parsed("gemini-2.5-pro", Some("REQUESTS"), Some(0.4)),
        ],
    );

    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].id, "gemini-pro-series-requests");
    assert_eq!(buckets[0].remaining_fraction, Some(0.4));
    assert_eq!(
        buckets[0].member_model_ids,
        vec!["gemini-3-pro-preview".to_string(), "gemini-2.5-pro".to_string()]
    );
}

#[test]
fn test_unknown_fraction_does_not_hide_known_one() {
    let buckets = build_gemini_cli_quota_buckets_with(
        &tables(),
        vec![
            parsed("gemini-2.5-flash", None, None),
            parsed("gemini-3-flash-preview", None, Some(0.6)),
        ],
    );
    assert_eq!(buckets[0].id, "gemini-flash-series");
    assert_eq!(buckets[0].remaining_fraction, Some(0.6));
}

#[test]
fn test_token_types_form_separate_buckets_in_table_order() {
    let buckets = build_gemini_cli_quota_buckets_with(
        &tables(),
        vec![
            parsed("gemini-2.5-pro", Some("TOKENS"), Some(0.5)),
            parsed("gemini-2.5-flash-lite", Some("REQUESTS"), Some(0.9)),
            parsed("gemini-2.5-pro", Some("REQUESTS"), Some(0.7)),
        ],
    );
    let ids: Vec<&str> = buckets.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "gemini-flash-lite-series-requests",
            "gemini-pro-series-tokens",
            "gemini-pro-series-requests"
        ]
    );
}

#[test]
fn test_preferred_model_amount_wins() {
    let mut preferred = parsed("gemini-3-pro-preview", None, Some(0.5));
    preferred.remaining_amount = Some(80.0);
    let mut other = parsed("gemini-2.5-pro", None, Some(0.2));
    other.remaining_amount = Some(10.0);
    other.reset_time = Some("2026-01-02T00:00:00Z".to_string());

    let buckets = build_gemini_cli_quota_buckets_with(&tables(), vec![other, preferred]);
    assert_eq!(buckets[0].remaining_amount, Some(80.0));
    assert_eq!(buckets[0].reset_time.as_deref(), Some("2026-01-02T00:00:00Z"));
}

#[test]
fn test_minimum_amount_without_preferred_model() {
    let mut a = parsed("gemini-2.5-pro", None, Some(0.5));
    a.remaining_amount = Some(30.0);
    let buckets = build_gemini_cli_quota_buckets_with(&tables(), vec![a]);
    assert_eq!(buckets[0].remaining_amount, Some(30.0));
}

#[test]
fn test_normalize_payload_from_text() {
    let text = r#"{"buckets": [
        {"modelId": "gemini-2.5-flash", "tokenType": "REQUESTS", "remainingFraction": 0.25}
    ]}"#;
    let buckets = normalize_gemini_cli_quota_with(&tables(), None, Some(text));
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].label, "Gemini Flash Series");
    assert_eq!(buckets[0].token_type.as_deref(), Some("REQUESTS"));
}

#[test]
fn test_empty_or_missing_buckets_yield_nothing() {
    assert!(normalize_gemini_cli_quota_with(&tables(), Some(&json!({})), None).is_empty());
    assert!(
        normalize_gemini_cli_quota_with(&tables(), Some(&json!({ "buckets": [] })), None)
            .is_empty()
    );
    assert!(normalize_gemini_cli_quota_with(&tables(), None, None).is_empty());
}
