use super::*;
use proptest::prelude::*;
use serde_json::json;

fn obj(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

#[test]
fn test_normalize_string_value_trims_and_rejects_blank() {
    assert_eq!(
        normalize_string_value(Some(&json!("  plus "))),
        Some("plus".to_string())
    );
    assert_eq!(normalize_string_value(Some(&json!("   "))), None);
    assert_eq!(normalize_string_value(Some(&json!(42))), None);
    assert_eq!(normalize_string_value(Some(&Value::Null)), None);
    assert_eq!(normalize_string_value(None), None);
}

#[test]
fn test_normalize_number_value_accepts_numeric_strings() {
    assert_eq!(normalize_number_value(Some(&json!(45.5))), Some(45.5));
    assert_eq!(normalize_number_value(Some(&json!(" 45.5 "))), Some(45.5));
    assert_eq!(normalize_number_value(Some(&json!("abc"))), None);
    assert_eq!(normalize_number_value(Some(&json!(""))), None);
    assert_eq!(normalize_number_value(Some(&json!(true))), None);
}

#[test]
fn test_normalize_number_value_rejects_non_finite() {
    assert_eq!(normalize_number_value(Some(&json!("NaN"))), None);
    assert_eq!(normalize_number_value(Some(&json!("inf"))), None);
}

#[test]
fn test_normalize_quota_fraction_clamps() {
    assert_eq!(normalize_quota_fraction(Some(&json!(-0.5))), Some(0.0));
    assert_eq!(normalize_quota_fraction(Some(&json!(1.7))), Some(1.0));
    assert_eq!(normalize_quota_fraction(Some(&json!("0.25"))), Some(0.25));
    assert_eq!(normalize_quota_fraction(None), None);
}

#[test]
fn test_negative_zero_is_normalized() {
    let fraction = normalize_quota_fraction(Some(&json!("-0"))).unwrap();
    assert_eq!(fraction, 0.0);
    assert!(fraction.is_sign_positive());
    assert!(clamp_percent(-0.0).is_sign_positive());
}

proptest! {
    #[test]
    fn prop_quota_fraction_always_in_unit_range(f in -1.0e6f64..1.0e6) {
        let out = normalize_quota_fraction(Some(&json!(f))).unwrap();
        prop_assert!((0.0..=1.0).contains(&out));
        if f < 0.0 {
            prop_assert_eq!(out, 0.0);
        } else if f > 1.0 {
            prop_assert_eq!(out, 1.0);
        } else {
            prop_assert_eq!(out, f);
        }
    }
}

#[test]
fn test_pick_prefers_first_non_null_key() {
    let map = obj(json!({ "used_percent": null, "usedPercent": 12 }));
    assert_eq!(pick(&map, &["used_percent", "usedPercent"]), Some(&json!(12)));

    // A present but blank value still wins over later keys.
    let map = obj(json!({ "plan_type": "", "planType": "plus" }));
    assert_eq!(pick(&map, &["plan_type", "planType"]), Some(&json!("")));
}

#[test]
fn test_codex_plan_type_keys_prefer_camel_case() {
    let map = obj(json!({ "plan_type": "free", "planType": "team" }));
    assert_eq!(
        normalize_plan_type(pick(&map, &CODEX_PLAN_TYPE_KEYS)),
        Some(PlanType::Team)
    );
}

#[test]
fn test_normalize_plan_type_known_and_unknown() {
    assert_eq!(normalize_plan_type(Some(&json!(" PLUS "))), Some(PlanType::Plus));
    assert_eq!(normalize_plan_type(Some(&json!("Free"))), Some(PlanType::Free));
    assert_eq!(
        normalize_plan_type(Some(&json!(" Enterprise "))),
        Some(PlanType::Other("Enterprise".to_string()))
    );
    assert_eq!(normalize_plan_type(Some(&json!(""))), None);
}

#[test]
fn test_plan_type_label_keys() {
    assert_eq!(PlanType::Team.label_key(), Some("codex_quota.plan_team"));
    assert_eq!(PlanType::Other("pro".to_string()).label_key(), None);
    assert_eq!(PlanType::Other("pro".to_string()).to_string(), "pro");
}

#[test]
fn test_parse_percent_string() {
    assert_eq!(parse_percent_string(Some("12.3%")), Some(12.3));
    assert_eq!(parse_percent_string(Some(" 40 ")), Some(40.0));
    assert_eq!(parse_percent_string(Some("abc%")), None);
    assert_eq!(parse_percent_string(Some("")), None);
    assert_eq!(parse_percent_string(None), None);
}

#[test]
fn test_normalize_auth_index_value() {
    assert_eq!(normalize_auth_index_value(Some(&json!(3))), Some("3".to_string()));
    assert_eq!(
        normalize_auth_index_value(Some(&json!(" abc "))),
        Some("abc".to_string())
    );
    assert_eq!(normalize_auth_index_value(Some(&json!(""))), None);
    assert_eq!(normalize_auth_index_value(Some(&json!(false))), None);
}

#[test]
fn test_parse_payload_sources() {
    let body = json!({ "models": {} });
    assert!(parse_payload(Some(&body), None).is_some());

    let as_string = json!(r#"{"a": 1}"#);
    assert_eq!(
        parse_payload(Some(&as_string), None),
        Some(obj(json!({ "a": 1 })))
    );

    assert_eq!(
        parse_payload(None, Some(r#" {"b": 2} "#)),
        Some(obj(json!({ "b": 2 })))
    );
    assert_eq!(
        parse_payload(Some(&Value::Null), Some(r#"{"b": 2}"#)),
        Some(obj(json!({ "b": 2 })))
    );
}

#[test]
fn test_parse_payload_rejects_non_objects() {
    assert_eq!(parse_payload(Some(&json!([1, 2])), Some("{}")), None);
    assert_eq!(parse_payload(None, Some("[1, 2]")), None);
    assert_eq!(parse_payload(None, Some("not json")), None);
    assert_eq!(parse_payload(None, Some("   ")), None);
    assert_eq!(parse_payload(None, None), None);
}
