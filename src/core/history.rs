//! Command history, persisted per OS profile.
//!
//! Entries are unique: submitting a command again moves it to the newest
//! position. Each profile has its own list under
//! `terminal-history-<profile>` in the key-value store.

use std::collections::HashSet;
use std::rc::Rc;

use crate::config::{HISTORY_NAMESPACE, MAX_COMMAND_HISTORY};
use crate::models::OsProfile;
use crate::utils::console;
use crate::utils::storage::{KeyValueStore, get_json, set_json};

/// Storage key for a profile's history.
pub fn history_key(os: OsProfile) -> String {
    format!("{}-{}", HISTORY_NAMESPACE, os)
}

/// Drop blanks and repeats (keeping the newest occurrence), then cap at `limit`.
///
/// Lists written by other builds may not respect the MRU rules `add` keeps.
fn clean_entries(entries: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut cleaned: Vec<String> = entries
        .into_iter()
        .rev()
        .filter(|entry| !entry.trim().is_empty())
        .filter(|entry| seen.insert(entry.clone()))
        .take(limit)
        .collect();
    cleaned.reverse();
    cleaned
}

pub struct HistoryManager {
    storage: Rc<dyn KeyValueStore>,
    os: OsProfile,
    entries: Vec<String>,
    /// Index into `entries` while browsing with the arrow keys.
    cursor: Option<usize>,
    limit: usize,
}

impl std::fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryManager")
            .field("os", &self.os)
            .field("entries", &self.entries.len())
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl HistoryManager {
    pub fn new(storage: Rc<dyn KeyValueStore>, os: OsProfile) -> Self {
        Self::with_limit(storage, os, MAX_COMMAND_HISTORY)
    }

    pub fn with_limit(storage: Rc<dyn KeyValueStore>, os: OsProfile, limit: usize) -> Self {
        let mut manager = Self {
            storage,
            os,
            entries: Vec::new(),
            cursor: None,
            limit: limit.max(1),
        };
        manager.entries = manager.load();
        manager
    }

    /// Oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn os(&self) -> OsProfile {
        self.os
    }

    pub fn is_browsing(&self) -> bool {
        self.cursor.is_some()
    }

    /// Record a submitted command. Blank input is ignored.
    pub fn add(&mut self, command: &str) {
        self.cursor = None;
        if command.trim().is_empty() {
            return;
        }

        self.entries.retain(|entry| entry != command);
        self.entries.push(command.to_string());
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.persist();
    }

    /// Step towards older entries, stopping at the oldest.
    pub fn up(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let index = match self.cursor {
            None => self.entries.len() - 1,
            Some(i) => i.saturating_sub(1),
        };
        self.cursor = Some(index);
        self.entries.get(index).map(String::as_str)
    }

    /// Step towards newer entries; past the newest, browsing ends and `None`
    /// is returned.
    pub fn down(&mut self) -> Option<&str> {
        let next = match self.cursor {
            Some(i) if i + 1 < self.entries.len() => Some(i + 1),
            _ => None,
        };
        self.cursor = next;
        next.and_then(|i| self.entries.get(i)).map(String::as_str)
    }

    pub fn reset_navigation(&mut self) {
        self.cursor = None;
    }

    /// Load the other profile's list.
    pub fn switch_os(&mut self, os: OsProfile) {
        self.os = os;
        self.cursor = None;
        self.entries = self.load();
    }

    fn load(&self) -> Vec<String> {
        let key = history_key(self.os);
        match get_json::<Vec<String>>(self.storage.as_ref(), &key) {
            Ok(Some(entries)) => clean_entries(entries, self.limit),
            Ok(None) => Vec::new(),
            Err(err) => {
                console::warn(&format!("ignoring corrupt history under '{}': {}", key, err));
                Vec::new()
            }
        }
    }

    fn persist(&self) {
        let key = history_key(self.os);
        if let Err(err) = set_json(self.storage.as_ref(), &key, &self.entries) {
            console::warn(&format!("failed to save history: {}", err));
        }
    }
}
