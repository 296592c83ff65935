use crate::account_usage::api_client::QuotaEndpoints;
use crate::quota::antigravity::{ANTIGRAVITY_QUOTA_URLS, DEFAULT_ANTIGRAVITY_PROJECT_ID};
use crate::quota::gemini_cli::GEMINI_CLI_QUOTA_URL;
use crate::quota::groups::GroupTables;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an alternate config file.
pub const CONFIG_PATH_ENV: &str = "QUOTA_NORMALIZER_CONFIG";

const CONFIG_DIR: &str = ".quota-normalizer";
const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaConfig {
    /// Replacement grouping tables; relative paths resolve against the config file
    #[serde(default)]
    pub groups_file: Option<PathBuf>,
    #[serde(default = "default_project_id")]
    pub antigravity_project_id: String,
    /// Tried in order until one answers with quota data
    #[serde(default = "default_antigravity_urls")]
    pub antigravity_urls: Vec<String>,
    #[serde(default = "default_codex_usage_url")]
    pub codex_usage_url: String,
    #[serde(default = "default_gemini_cli_quota_url")]
    pub gemini_cli_quota_url: String,

    #[serde(skip)]
    source_dir: Option<PathBuf>,
}

fn default_project_id() -> String {
    DEFAULT_ANTIGRAVITY_PROJECT_ID.to_string()
}

fn default_antigravity_urls() -> Vec<String> {
    ANTIGRAVITY_QUOTA_URLS.iter().map(|u| u.to_string()).collect()
}

fn default_codex_usage_url() -> String {
    crate::account_usage::api_client::CODEX_USAGE_URL.to_string()
}

fn default_gemini_cli_quota_url() -> String {
    GEMINI_CLI_QUOTA_URL.to_string()
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            groups_file: None,
            antigravity_project_id: default_project_id(),
            antigravity_urls: default_antigravity_urls(),
            codex_usage_url: default_codex_usage_url(),
            gemini_cli_quota_url: default_gemini_cli_quota_url(),
            source_dir: None,
        }
    }
}

impl QuotaConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file as YAML: {}", path.display()))?;
        config.source_dir = path.parent().map(Path::to_path_buf);
        config.validate()?;
        Ok(config)
    }

    /// Config path: `$QUOTA_NORMALIZER_CONFIG`, else `~/.quota-normalizer/config.yaml`.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().context("Could not determine home directory for config")?;
        Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Loads the default config file, or the defaults when it does not exist.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    fn validate(&self) -> Result<()> {
        if self.antigravity_urls.is_empty() {
            anyhow::bail!("antigravity_urls must list at least one endpoint");
        }
        for url in &self.antigravity_urls {
            if url.trim().is_empty() {
                anyhow::bail!("antigravity_urls contains an empty endpoint");
            }
        }
        if self.antigravity_project_id.trim().is_empty() {
            anyhow::bail!("antigravity_project_id must not be empty");
        }
        if self.codex_usage_url.trim().is_empty() {
            anyhow::bail!("codex_usage_url must not be empty");
        }
        if self.gemini_cli_quota_url.trim().is_empty() {
            anyhow::bail!("gemini_cli_quota_url must not be empty");
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.source_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Grouping tables named by `groups_file`, if any.
    pub fn group_tables(&self) -> Result<Option<GroupTables>> {
        let Some(groups_file) = &self.groups_file else {
            return Ok(None);
        };
        GroupTables::load(&self.resolve(groups_file)).map(Some)
    }

    pub fn endpoints(&self) -> QuotaEndpoints {
        QuotaEndpoints {
            antigravity_project_id: self.antigravity_project_id.clone(),
            antigravity_urls: self.antigravity_urls.clone(),
            codex_usage_url: self.codex_usage_url.clone(),
            gemini_cli_quota_url: self.gemini_cli_quota_url.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
