use std::collections::VecDeque;
use std::sync::Arc;

use crate::gateway::{load_json, save_json, KeyValueStore};
use crate::schema::{fresh_id, now_millis, HistoryEntry, HistoryKind};
use crate::text::truncate_chars;

pub const HISTORY_KEY: &str = "history";
pub const MAX_HISTORY_ENTRIES: usize = 50;
pub const MAX_HISTORY_CONTENT_CHARS: usize = 200;

/// Bounded, newest-first record of submissions and replies.
///
/// Order is insertion order only; timestamps are informational.
pub struct HistoryLog {
    store: Arc<dyn KeyValueStore>,
    entries: VecDeque<HistoryEntry>,
}

impl HistoryLog {
    /// Loads the persisted log, starting empty when absent or unparseable.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let mut entries: VecDeque<HistoryEntry> =
            load_json::<Vec<HistoryEntry>>(store.as_ref(), HISTORY_KEY)
                .unwrap_or_default()
                .into();
        if entries.len() > MAX_HISTORY_ENTRIES {
            tracing::warn!(
                loaded = entries.len(),
                kept = MAX_HISTORY_ENTRIES,
                "clamping oversized persisted history"
            );
            entries.truncate(MAX_HISTORY_ENTRIES);
        }

        Self { store, entries }
    }

    /// Records a new entry at the head, evicting the oldest beyond capacity.
    pub fn append(&mut self, kind: HistoryKind, content: &str) -> &HistoryEntry {
        let entry = HistoryEntry {
            id: fresh_id(),
            kind,
            content: truncate_chars(content, MAX_HISTORY_CONTENT_CHARS),
            timestamp: now_millis(),
        };

        self.entries.push_front(entry);
        while self.entries.len() > MAX_HISTORY_ENTRIES {
            self.entries.pop_back();
        }
        self.persist();

        &self.entries[0]
    }

    /// Empties the log and removes its persisted copy.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.store.remove(HISTORY_KEY);
    }

    /// Entries newest first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &HistoryEntry> + '_ {
        self.entries.iter()
    }

    pub fn head(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) {
        let snapshot: Vec<&HistoryEntry> = self.entries.iter().collect();
        save_json(self.store.as_ref(), HISTORY_KEY, &snapshot);
    }
}
