//! Frame and lifecycle history for debugging and diagnostics.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::command::hex_bytes;

/// Type of entry in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// A frame flushed to the socket.
    Sent,
    /// A lifecycle notification.
    Event,
}

/// A recorded entry in the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: EntryKind,
    /// Frame bytes as `0x71 0x23 ...`, or the event name.
    pub detail: String,
    /// Seconds since history creation
    pub timestamp: f64,
}

/// Bounded log of what a controller wrote and went through.
#[derive(Debug, Clone)]
pub struct FrameHistory {
    start_time: Instant,
    entries: Vec<HistoryEntry>,
    frames_sent: usize,
    events_seen: usize,
    last_error: Option<String>,
    max_entries: usize,
}

impl Default for FrameHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameHistory {
    pub const DEFAULT_MAX_ENTRIES: usize = 100;

    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            entries: Vec::new(),
            frames_sent: 0,
            events_seen: 0,
            last_error: None,
            max_entries: Self::DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Self::new()
        }
    }

    pub fn record_frame(&mut self, frame: &[u8]) {
        self.frames_sent += 1;
        self.push(EntryKind::Sent, hex_bytes(frame));
    }

    pub fn record_event(&mut self, name: &str) {
        self.events_seen += 1;
        self.push(EntryKind::Event, name.to_string());
    }

    pub fn record_error(&mut self, error: &str) {
        self.last_error = Some(error.to_string());
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.frames_sent = 0;
        self.events_seen = 0;
        self.last_error = None;
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            frames_sent: self.frames_sent,
            events_seen: self.events_seen,
            total_entries: self.entries.len(),
            last_error: self.last_error.clone(),
        }
    }

    fn push(&mut self, kind: EntryKind, detail: String) {
        self.entries.push(HistoryEntry {
            kind,
            detail,
            timestamp: self.start_time.elapsed().as_secs_f64(),
        });

        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
    }
}

/// Summary of the history for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySummary {
    pub frames_sent: usize,
    pub events_seen: usize,
    pub total_entries: usize,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_frame() {
        let mut history = FrameHistory::new();
        history.record_frame(&[0x71, 0x23, 0x0f, 0xa3]);

        assert_eq!(history.len(), 1);
        assert_eq!(history.entries()[0].kind, EntryKind::Sent);
        assert_eq!(history.entries()[0].detail, "0x71 0x23 0x0f 0xa3");
    }

    #[test]
    fn test_record_error() {
        let mut history = FrameHistory::new();
        history.record_error("connection refused");
        assert_eq!(history.last_error(), Some("connection refused"));
        history.clear();
        assert_eq!(history.last_error(), None);
    }

    #[test]
    fn test_max_entries_keeps_counts() {
        let mut history = FrameHistory::with_max_entries(2);
        for i in 0..5 {
            history.record_frame(&[i]);
        }
        history.record_event("connected");

        assert_eq!(history.len(), 2);
        let summary = history.summary();
        assert_eq!(summary.frames_sent, 5);
        assert_eq!(summary.events_seen, 1);
        assert_eq!(history.entries()[1].detail, "connected");
    }
}
