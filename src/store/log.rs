//! Append-only call history storage.

use crate::order::CallLogEntry;
use chrono::Duration;
use dashmap::DashMap;

/// Per-order append-only list of call log entries.
#[derive(Debug, Default)]
pub struct CallLog {
    entries: DashMap<String, Vec<CallLogEntry>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return it as stored.
    ///
    /// The stored entry gets the next sequence number for its order, and a
    /// timestamp strictly after the previous entry's (bumped by one
    /// microsecond on a collision or a clock step backwards).
    pub fn append(&self, mut entry: CallLogEntry) -> CallLogEntry {
        let mut history = self.entries.entry(entry.order_id.clone()).or_default();

        if let Some(last) = history.last() {
            if entry.recorded_at <= last.recorded_at {
                entry.recorded_at = last.recorded_at + Duration::microseconds(1);
            }
        }
        entry.sequence = history.len() as u64 + 1;

        history.push(entry.clone());
        entry
    }

    /// History of one order, oldest first.
    pub fn history(&self, order_id: &str) -> Vec<CallLogEntry> {
        self.entries
            .get(order_id)
            .map(|history| history.value().clone())
            .unwrap_or_default()
    }
}
