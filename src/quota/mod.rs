//! Quota normalization.
//!
//! Each provider module turns one raw upstream response into the canonical
//! payload of [`types::QuotaState`]. Everything here is synchronous and free of
//! I/O; fetching and storing live in [`crate::account_usage`].

pub mod antigravity;
pub mod claude;
pub mod codex;
pub mod display;
pub mod error;
pub mod gemini_cli;
pub mod groups;
pub mod normalize;
pub mod types;
pub mod values;

pub use error::{resolve_error_message, QuotaError};
pub use normalize::{normalize_response, RawResponse};
pub use types::{
    AnyQuotaState, AssistantQuotaSummary, CliQuotaBucket, CodexQuota, ProjectQuotaGroup,
    QuotaKind, QuotaState, RollingWindow, UsageWindow,
};
