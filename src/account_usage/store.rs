//! Keyed store of the latest quota state per auth file.

use super::types::FetchTicket;
use crate::quota::types::{
    AntigravityQuotaState, AnyQuotaState, ClaudeQuotaState, CodexQuotaState, GeminiCliQuotaState,
};
use crate::quota::{QuotaKind, QuotaState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Slots {
    antigravity: HashMap<String, AntigravityQuotaState>,
    codex: HashMap<String, CodexQuotaState>,
    gemini_cli: HashMap<String, GeminiCliQuotaState>,
    claude: HashMap<String, ClaudeQuotaState>,
    generations: HashMap<(QuotaKind, String), u64>,
}

impl Slots {
    fn mark_loading(&mut self, kind: QuotaKind, file_name: &str) {
        let key = file_name.to_string();
        match kind {
            QuotaKind::Antigravity => {
                self.antigravity.insert(key, QuotaState::Loading);
            }
            QuotaKind::Codex => {
                self.codex.insert(key, QuotaState::Loading);
            }
            QuotaKind::GeminiCli => {
                self.gemini_cli.insert(key, QuotaState::Loading);
            }
            QuotaKind::Claude => {
                self.claude.insert(key, QuotaState::Loading);
            }
        }
    }

    fn replace(&mut self, file_name: &str, state: AnyQuotaState) {
        let key = file_name.to_string();
        match state {
            AnyQuotaState::Antigravity { state } => {
                self.antigravity.insert(key, state);
            }
            AnyQuotaState::Codex { state } => {
                self.codex.insert(key, state);
            }
            AnyQuotaState::GeminiCli { state } => {
                self.gemini_cli.insert(key, state);
            }
            AnyQuotaState::Claude { state } => {
                self.claude.insert(key, state);
            }
        }
    }
}

/// Latest state per `(kind, file name)`.
///
/// Every write replaces the whole state of a key. A fetch result is committed
/// only while its ticket is the newest one issued for that key.
#[derive(Debug, Default)]
pub struct QuotaStore {
    slots: RwLock<Slots>,
    next_generation: AtomicU64,
}

impl QuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Slots> {
        self.slots.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Slots> {
        self.slots.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Marks the key as loading and returns the ticket its result must present.
    pub fn begin_fetch(&self, kind: QuotaKind, file_name: &str) -> FetchTicket {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let mut slots = self.write();
        slots
            .generations
            .insert((kind, file_name.to_string()), generation);
        slots.mark_loading(kind, file_name);
        FetchTicket {
            kind,
            file_name: file_name.to_string(),
            generation,
        }
    }

    /// Replaces the key's state with `state`.
    ///
    /// Returns `false` and drops the result when a newer fetch has begun, the
    /// store was cleared, or the state belongs to another kind.
    pub fn commit(&self, ticket: &FetchTicket, state: AnyQuotaState) -> bool {
        if state.kind() != ticket.kind {
            tracing::warn!(
                file = %ticket.file_name,
                expected = %ticket.kind,
                actual = %state.kind(),
                "refusing to commit quota state of another kind"
            );
            return false;
        }

        let mut slots = self.write();
        let key = (ticket.kind, ticket.file_name.clone());
        if slots.generations.get(&key) != Some(&ticket.generation) {
            tracing::debug!(
                file = %ticket.file_name,
                kind = %ticket.kind,
                generation = ticket.generation,
                "discarding superseded quota result"
            );
            return false;
        }
        slots.replace(&ticket.file_name, state);
        true
    }

    pub fn antigravity(&self, file_name: &str) -> Option<AntigravityQuotaState> {
        self.read().antigravity.get(file_name).cloned()
    }

    pub fn codex(&self, file_name: &str) -> Option<CodexQuotaState> {
        self.read().codex.get(file_name).cloned()
    }

    pub fn gemini_cli(&self, file_name: &str) -> Option<GeminiCliQuotaState> {
        self.read().gemini_cli.get(file_name).cloned()
    }

    pub fn claude(&self, file_name: &str) -> Option<ClaudeQuotaState> {
        self.read().claude.get(file_name).cloned()
    }

    /// State of any kind, wrapped for uniform handling.
    pub fn get(&self, kind: QuotaKind, file_name: &str) -> Option<AnyQuotaState> {
        match kind {
            QuotaKind::Antigravity => self
                .antigravity(file_name)
                .map(|state| AnyQuotaState::Antigravity { state }),
            QuotaKind::Codex => self.codex(file_name).map(|state| AnyQuotaState::Codex { state }),
            QuotaKind::GeminiCli => self
                .gemini_cli(file_name)
                .map(|state| AnyQuotaState::GeminiCli { state }),
            QuotaKind::Claude => self.claude(file_name).map(|state| AnyQuotaState::Claude { state }),
        }
    }

    /// File names with a state of `kind`, sorted.
    pub fn file_names(&self, kind: QuotaKind) -> Vec<String> {
        let slots = self.read();
        let mut names: Vec<String> = match kind {
            QuotaKind::Antigravity => slots.antigravity.keys().cloned().collect(),
            QuotaKind::Codex => slots.codex.keys().cloned().collect(),
            QuotaKind::GeminiCli => slots.gemini_cli.keys().cloned().collect(),
            QuotaKind::Claude => slots.claude.keys().cloned().collect(),
        };
        names.sort();
        names
    }

    /// Drops every state. Fetches still in flight will not be committed.
    pub fn clear(&self) {
        *self.write() = Slots::default();
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
