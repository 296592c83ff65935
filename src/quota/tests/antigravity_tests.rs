use super::*;
use serde_json::json;

fn models(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn build(value: Value) -> Vec<ProjectQuotaGroup> {
    build_antigravity_quota_groups_with(&GroupTables::embedded(), &models(value))
}

#[test]
fn test_minimum_fraction_governs_group() {
    let groups = build(json!({
        "gemini-3-pro-high": { "quotaInfo": { "remainingFraction": 0.3 } },
        "gemini-3-pro-low": { "quota_info": { "remaining": 0.1 } }
    }));

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, "gemini-3-pro");
    assert_eq!(groups[0].remaining_fraction, 0.1);
    assert_eq!(
        groups[0].member_identifiers.iter().collect::<Vec<_>>(),
        vec!["gemini-3-pro-high", "gemini-3-pro-low"]
    );
}

#[test]
fn test_groups_follow_table_order_and_skip_unmapped_models() {
    let groups = build(json!({
        "gemini-3-flash": { "quotaInfo": { "remainingFraction": 0.9 } },
        "mystery-model": { "quotaInfo": { "remainingFraction": 0.5 } },
        "claude-sonnet-4-5": { "quotaInfo": { "remainingFraction": 0.4 } }
    }));

    let ids: Vec<&str> = groups.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(ids, vec!["claude-gpt", "gemini-3-flash"]);
}

#[test]
fn test_last_seen_reset_time_wins() {
    let groups = build(json!({
        "gemini-2.5-flash": {
            "quotaInfo": { "remainingFraction": 0.5, "resetTime": "2026-01-01T00:00:00Z" }
        },
        "gemini-2.5-flash-thinking": {
            "quotaInfo": { "remainingFraction": 0.6, "resetTime": "2026-01-02T00:00:00Z" }
        }
    }));
    assert_eq!(
        groups[0].reset_time.as_deref(),
        Some("2026-01-02T00:00:00Z")
    );
}

#[test]
fn test_missing_fraction_with_reset_counts_as_exhausted() {
    let entry = parse_model_entry(
        "gemini-3-flash",
        &json!({ "quotaInfo": { "resetTime": "2026-01-01T00:00:00Z" } }),
    )
    .unwrap();
    assert_eq!(entry.remaining_fraction, 0.0);

    assert!(parse_model_entry("gemini-3-flash", &json!({ "quotaInfo": {} })).is_none());
    assert!(parse_model_entry("gemini-3-flash", &json!({ "displayName": "x" })).is_none());
}

#[test]
fn test_fraction_is_clamped() {
    let groups = build(json!({
        "gemini-3-flash": { "quotaInfo": { "remainingFraction": 1.8 } }
    }));
    assert_eq!(groups[0].remaining_fraction, 1.0);
}

#[test]
fn test_display_name_matches_group_and_sets_label() {
    let groups = build(json!({
        "model-x": {
            "displayName": "Gemini-3-Pro-Image-Preview",
            "quotaInfo": { "remainingFraction": 0.7 }
        }
    }));

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, "gemini-image");
    assert_eq!(groups[0].label, "Gemini-3-Pro-Image-Preview");
}

#[test]
fn test_extract_models_requires_object() {
    let body = json!({ "models": { "a": {} } });
    assert!(extract_models(Some(&body), None).is_some());
    assert!(extract_models(Some(&json!({ "models": [] })), None).is_none());
    assert!(extract_models(None, Some(r#"{"models": {}}"#)).is_some());
    assert!(extract_models(None, Some("oops")).is_none());
}

#[test]
fn test_resolve_project_id_lookup_order() {
    let default = DEFAULT_ANTIGRAVITY_PROJECT_ID;
    assert_eq!(resolve_project_id(r#"{"project_id": "top"}"#, default), "top");
    assert_eq!(resolve_project_id(r#"{"projectId": "camel"}"#, default), "camel");
    assert_eq!(
        resolve_project_id(r#"{"installed": {"project_id": "inst"}, "web": {"projectId": "web"}}"#, default),
        "inst"
    );
    assert_eq!(
        resolve_project_id(r#"{"web": {"projectId": "web"}}"#, default),
        "web"
    );
}

#[test]
fn test_resolve_project_id_falls_back_to_default() {
    let default = DEFAULT_ANTIGRAVITY_PROJECT_ID;
    assert_eq!(resolve_project_id("", default), default);
    assert_eq!(resolve_project_id("not json", default), default);
    assert_eq!(resolve_project_id(r#"{"project_id": "  "}"#, default), default);
    assert_eq!(resolve_project_id("[]", "custom-project"), "custom-project");
}
