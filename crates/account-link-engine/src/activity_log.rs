//! Append-only activity log shown next to the account status.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Header line of a rendered log.
pub const LOG_HEADER: &str = "Log:";

/// One log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Ordered log of controller activity. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: Vec<LogEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line.
    pub fn push(&mut self, message: impl Into<String>) {
        self.entries.push(LogEntry {
            at: Utc::now(),
            message: message.into(),
        });
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Messages in order, without timestamps.
    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }

    /// Header followed by one message per line.
    pub fn render(&self) -> String {
        let mut out = String::from(LOG_HEADER);
        for entry in &self.entries {
            out.push('\n');
            out.push_str(&entry.message);
        }
        out
    }
}
