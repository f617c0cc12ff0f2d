use std::sync::Mutex;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::LogLevel;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn now(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            level,
            message: message.into(),
        }
    }

    pub fn to_line(&self) -> String {
        format!("[{}] [{}] {}", self.timestamp, self.level.as_str(), self.message)
    }
}

/// Operator-facing log of a pipeline run.
///
/// Implementations must also forward every line to `tracing` (see [`trace_entry`]).
pub trait Journal {
    fn log(&self, level: LogLevel, message: &str);

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message)
    }
    fn success(&self, message: &str) {
        self.log(LogLevel::Success, message)
    }
    fn warn(&self, message: &str) {
        self.log(LogLevel::Warning, message)
    }
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message)
    }
    fn phase(&self, message: &str) {
        self.log(LogLevel::Phase, message)
    }
}

pub fn trace_entry(level: LogLevel, message: &str) {
    match level {
        LogLevel::Warning => tracing::warn!("{}", message),
        LogLevel::Error => tracing::error!("{}", message),
        LogLevel::Info | LogLevel::Success | LogLevel::Phase => tracing::info!(level = level.as_str(), "{}", message),
    }
}

/// Journal that only emits tracing events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingJournal;

impl Journal for TracingJournal {
    fn log(&self, level: LogLevel, message: &str) {
        trace_entry(level, message);
    }
}

/// Journal that keeps entries in memory (also traced). Used for tests and the persisted event log.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries().iter().any(|e| e.level == level && e.message.contains(needle))
    }
}

impl Journal for MemoryJournal {
    fn log(&self, level: LogLevel, message: &str) {
        trace_entry(level, message);
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry::now(level, message));
        }
    }
}
