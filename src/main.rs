use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quota_normalizer::account_usage::api_client::ApiCallResult;
use quota_normalizer::config::QuotaConfig;
use quota_normalizer::quota::display::{self, KeysOnly, Translate};
use quota_normalizer::quota::groups;
use quota_normalizer::quota::values::{normalize_plan_type, PlanType};
use quota_normalizer::quota::{normalize_response, QuotaKind, RawResponse};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "quota")]
#[command(about = "Normalize AI-service quota responses into canonical quota states")]
#[command(version)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Config file (defaults to $QUOTA_NORMALIZER_CONFIG or ~/.quota-normalizer/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize a captured provider response and print it as JSON
    Normalize {
        /// antigravity, codex, gemini-cli or claude
        provider: String,

        /// Response body, or a `{statusCode, body, bodyText}` capture
        file: PathBuf,

        /// Print display rows instead of the quota state
        #[arg(long)]
        rows: bool,

        /// Plan type to assume when a codex payload omits it
        #[arg(long)]
        plan: Option<String>,

        /// JSON object of message key -> text used for row labels
        #[arg(long)]
        messages: Option<PathBuf>,
    },

    /// Print the active grouping tables as YAML
    Groups,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quota_normalizer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<QuotaConfig> {
    match path {
        Some(path) => QuotaConfig::load(path),
        None => QuotaConfig::load_default(),
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} as JSON", path.display()))
}

/// Accepts either a bare body or a full API-call capture.
fn into_capture(value: Value) -> Result<ApiCallResult> {
    let is_capture = value
        .as_object()
        .is_some_and(|obj| obj.contains_key("statusCode"));
    if is_capture {
        return serde_json::from_value(value).context("Invalid API-call capture");
    }
    Ok(ApiCallResult {
        status_code: 200,
        body: Some(value),
        body_text: None,
    })
}

fn run_normalize(
    provider: &str,
    file: &Path,
    rows: bool,
    plan: Option<&str>,
    messages: Option<&Path>,
) -> Result<()> {
    let kind = QuotaKind::parse(provider)
        .with_context(|| format!("Unknown provider '{}'", provider))?;
    let capture = into_capture(read_json(file)?)?;
    let fallback_plan: Option<PlanType> =
        plan.and_then(|p| normalize_plan_type(Some(&Value::String(p.to_string()))));

    let state = normalize_response(
        kind,
        RawResponse {
            status_code: Some(capture.status_code),
            body: capture.body.as_ref(),
            body_text: capture.body_text.as_deref(),
        },
        fallback_plan,
    );
    tracing::info!(provider = %kind, status = state.status(), "normalized response");

    let output = if rows {
        let table: Option<HashMap<String, String>> = match messages {
            Some(path) => Some(
                serde_json::from_value(read_json(path)?)
                    .with_context(|| format!("{} is not a key -> text object", path.display()))?,
            ),
            None => None,
        };
        let translate: &dyn Translate = match &table {
            Some(table) => table,
            None => &KeysOnly,
        };
        serde_json::to_string_pretty(&display::state_rows(&state, translate, &chrono::Local))?
    } else {
        serde_json::to_string_pretty(&state)?
    };
    println!("{}", output);
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    if let Some(tables) = config.group_tables()? {
        groups::install(tables)?;
    }

    match cli.command {
        Command::Normalize {
            provider,
            file,
            rows,
            plan,
            messages,
        } => run_normalize(
            &provider,
            &file,
            rows,
            plan.as_deref(),
            messages.as_deref(),
        ),
        Command::Groups => {
            let yaml = serde_yaml::to_string(groups::active())
                .context("Failed to serialize grouping tables")?;
            print!("{}", yaml);
            Ok(())
        }
    }
}
