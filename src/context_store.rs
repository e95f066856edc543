//! Process-lifetime log of free-text annotations.
//!
//! Entries from earlier commands stay visible to every later command until
//! the log is cleared.
use crate::error::DispatchError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Longest annotation accepted, in characters.
pub const MAX_CONTEXT_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalContextEntry {
    pub command: String,
    pub content: String,
    pub added_at_epoch_ms: u64,
}

#[derive(Debug, Default)]
pub struct GlobalContextStore {
    entries: Vec<GlobalContextEntry>,
}

impl GlobalContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; content over [`MAX_CONTEXT_CHARS`] is refused.
    pub fn add(&mut self, command: &str, content: &str) -> Result<&GlobalContextEntry, DispatchError> {
        if exceeds_context_limit(content) {
            return Err(context_too_long(content));
        }
        self.entries.push(GlobalContextEntry {
            command: command.to_string(),
            content: content.to_string(),
            added_at_epoch_ms: now_epoch_ms(),
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Entries in insertion order.
    pub fn list(&self) -> &[GlobalContextEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let cleared = self.entries.len();
        self.entries.clear();
        cleared
    }
}

pub(crate) fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Character count, not byte length.
pub(crate) fn exceeds_context_limit(content: &str) -> bool {
    content.chars().count() > MAX_CONTEXT_CHARS
}

pub(crate) fn context_too_long(content: &str) -> DispatchError {
    DispatchError::invalid_with(
        "context",
        &format!("<{} characters>", content.chars().count()),
        format!("at most {MAX_CONTEXT_CHARS} characters"),
    )
}
