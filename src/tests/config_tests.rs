use super::*;
use serial_test::serial;
use tempfile::tempdir;

const CUSTOM_GROUPS: &str = r#"
antigravity:
  - id: everything-flash
    label: Flash
    members: ["gemini-3-flash*"]
gemini_cli:
  aliases:
    gemini-2.5-pro: [gemini-2.5-pro]
  groups:
    - id: pro
      label: Pro
      members: [gemini-2.5-pro]
"#;

fn write_config(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("config.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn test_empty_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let config = QuotaConfig::load(&write_config(dir.path(), "{}")).unwrap();

    assert_eq!(config.endpoints(), QuotaEndpoints::default());
    assert!(config.groups_file.is_none());
    assert!(config.group_tables().unwrap().is_none());
}

#[test]
fn test_overrides_are_applied() {
    let dir = tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
antigravity_project_id: my-project
antigravity_urls:
  - https://quota.internal/models
codex_usage_url: https://codex.internal/usage
"#,
    );
    let endpoints = QuotaConfig::load(&path).unwrap().endpoints();

    assert_eq!(endpoints.antigravity_project_id, "my-project");
    assert_eq!(endpoints.antigravity_urls, vec!["https://quota.internal/models"]);
    assert_eq!(endpoints.codex_usage_url, "https://codex.internal/usage");
    assert_eq!(
        endpoints.gemini_cli_quota_url,
        QuotaEndpoints::default().gemini_cli_quota_url
    );
}

#[test]
fn test_unknown_field_is_rejected() {
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "codex_url: https://typo.example\n");

    let err = QuotaConfig::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file as YAML"));
}

#[test]
fn test_empty_endpoint_list_is_rejected() {
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "antigravity_urls: []\n");

    let err = QuotaConfig::load(&path).unwrap_err();
    assert_eq!(err.to_string(), "antigravity_urls must list at least one endpoint");
}

#[test]
fn test_blank_values_are_rejected() {
    let dir = tempdir().unwrap();

    let path = write_config(dir.path(), "antigravity_urls: ['  ']\n");
    let err = QuotaConfig::load(&path).unwrap_err();
    assert_eq!(err.to_string(), "antigravity_urls contains an empty endpoint");

    let path = write_config(dir.path(), "antigravity_project_id: ''\n");
    let err = QuotaConfig::load(&path).unwrap_err();
    assert_eq!(err.to_string(), "antigravity_project_id must not be empty");

    let path = write_config(dir.path(), "gemini_cli_quota_url: ' '\n");
    let err = QuotaConfig::load(&path).unwrap_err();
    assert_eq!(err.to_string(), "gemini_cli_quota_url must not be empty");
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.yaml");

    let err = QuotaConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
    assert!(err.to_string().contains("absent.yaml"));
}

#[test]
fn test_groups_file_resolves_against_config_dir() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("tables")).unwrap();
    std::fs::write(dir.path().join("tables/groups.yaml"), CUSTOM_GROUPS).unwrap();
    let path = write_config(dir.path(), "groups_file: tables/groups.yaml\n");

    let tables = QuotaConfig::load(&path).unwrap().group_tables().unwrap().unwrap();
    assert_eq!(tables.antigravity.len(), 1);
    assert_eq!(tables.antigravity[0].id, "everything-flash");
    assert_eq!(tables.gemini_cli.groups[0].id, "pro");
}

#[test]
fn test_invalid_groups_file_is_an_error() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("groups.yaml"),
        "antigravity: []\ngemini_cli:\n  aliases: {}\n  groups:\n    - id: pro\n      label: Pro\n      members: []\n",
    )
    .unwrap();
    let path = write_config(dir.path(), "groups_file: groups.yaml\n");

    let err = QuotaConfig::load(&path).unwrap().group_tables().unwrap_err();
    assert!(format!("{:#}", err).contains("has no members"));
}

#[test]
#[serial]
fn test_default_path_honours_env_override() {
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "antigravity_project_id: from-env\n");

    std::env::set_var(CONFIG_PATH_ENV, &path);
    let resolved = QuotaConfig::default_path();
    let loaded = QuotaConfig::load_default();
    std::env::remove_var(CONFIG_PATH_ENV);

    assert_eq!(resolved.unwrap(), path);
    assert_eq!(loaded.unwrap().antigravity_project_id, "from-env");
}

#[test]
#[serial]
fn test_load_default_without_file_uses_defaults() {
    let dir = tempdir().unwrap();

    std::env::set_var(CONFIG_PATH_ENV, dir.path().join("missing.yaml"));
    let loaded = QuotaConfig::load_default();
    std::env::remove_var(CONFIG_PATH_ENV);

    assert_eq!(loaded.unwrap(), QuotaConfig::default());
}
