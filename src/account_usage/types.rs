//! Bookkeeping types of the fetch-and-store cycle.

use crate::quota::QuotaKind;
use serde::Serialize;

/// Identifies one in-flight fetch.
///
/// Generations increase across the whole store, so a later ticket for the same
/// key always supersedes an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub kind: QuotaKind,
    pub file_name: String,
    pub generation: u64,
}

/// Outcome counts of one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Results dropped because a newer fetch for the same key had started
    pub superseded: usize,
}

impl RefreshSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.superseded
    }
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
