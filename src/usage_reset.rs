//! Reset timestamps and the labels rendered next to quota rows.
//!
//! Providers report resets either as absolute epoch seconds, as seconds from
//! the time of the request, or as an RFC 3339 string. All of them end up as a
//! short `MM/DD HH:MM` label, or `"-"` when nothing usable was reported.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Label shown when no reset time is known.
pub const NO_RESET_LABEL: &str = "-";

const RESET_LABEL_FORMAT: &str = "%m/%d %H:%M";

/// An absolute reset timestamp stored as Unix epoch seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResetTimestamp {
    /// Unix timestamp in seconds
    pub epoch_seconds: i64,
}

impl ResetTimestamp {
    pub fn from_epoch_seconds(seconds: i64) -> Self {
        Self {
            epoch_seconds: seconds,
        }
    }

    /// Reset `seconds` after `now`, or `None` when the sum overflows.
    pub fn from_seconds_after(now: DateTime<Utc>, seconds: f64) -> Option<Self> {
        now.timestamp()
            .checked_add(seconds.round() as i64)
            .map(Self::from_epoch_seconds)
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.epoch_seconds, 0)
    }

    /// Formats the timestamp in `tz`.
    pub fn format_in<Tz>(self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        match self.to_datetime() {
            Some(dt) => dt.with_timezone(tz).format(RESET_LABEL_FORMAT).to_string(),
            None => NO_RESET_LABEL.to_string(),
        }
    }
}

/// Parses an RFC 3339 reset string.
pub fn parse_reset_time(raw: &str) -> Option<ResetTimestamp> {
    let parsed = DateTime::parse_from_rfc3339(raw.trim()).ok()?;
    Some(ResetTimestamp::from_epoch_seconds(parsed.timestamp()))
}

/// Label for an RFC 3339 reset string, `"-"` when missing or unparseable.
pub fn format_quota_reset_time_in<Tz>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    raw.and_then(parse_reset_time)
        .map(|ts| ts.format_in(tz))
        .unwrap_or_else(|| NO_RESET_LABEL.to_string())
}

#[cfg(test)]
#[path = "tests/usage_reset_tests.rs"]
mod tests;
