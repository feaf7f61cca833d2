//! Transfer log.
//!
//! Every decision of a transfer is reported as a [`LogEntry`] through a
//! [`LogSink`]. The CLI and the HTTP server use the global [`LOG_BROADCASTER`],
//! which prints to stdout and fans entries out to SSE subscribers. Tests and
//! HTTP responses collect entries with a [`MemoryLog`].
//!
//! The log is advisory: nothing reads it back to make decisions.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Log level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting level for display.
    #[serde(default)]
    pub indent: u8,
    /// Local time the entry was emitted, RFC 3339.
    pub timestamp: String,
}

impl LogEntry {
    fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
            timestamp: chrono::Local::now().to_rfc3339(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Destination for log entries.
pub trait LogSink: Send + Sync {
    fn log(&self, entry: LogEntry);

    fn info(&self, msg: &str) {
        self.log(LogEntry::info(msg));
    }

    fn success(&self, msg: &str) {
        self.log(LogEntry::success(msg));
    }

    fn warning(&self, msg: &str) {
        self.log(LogEntry::warning(msg));
    }

    fn error(&self, msg: &str) {
        self.log(LogEntry::error(msg));
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<Arc<LogBroadcaster>> = Lazy::new(|| Arc::new(LogBroadcaster::new()));

/// Prints entries and broadcasts them to all SSE subscribers
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    echo: bool,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender, echo: true }
    }

    /// A broadcaster that does not print to stdout.
    pub fn silent() -> Self {
        Self {
            echo: false,
            ..Self::new()
        }
    }

    /// Get a receiver for SSE streaming
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl LogSink for LogBroadcaster {
    fn log(&self, entry: LogEntry) {
        if self.echo {
            let prefix = match entry.level {
                LogLevel::Info => "   ",
                LogLevel::Success => "   ✓",
                LogLevel::Warning => "   ⚠️",
                LogLevel::Error => "   ❌",
            };
            let indent = "   ".repeat(entry.indent as usize);
            println!("{}{} {}", indent, prefix, entry.message);
        }

        // No receivers is fine
        let _ = self.sender.send(entry);
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects entries in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the entries logged so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Messages only, in order.
    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.message).collect()
    }
}

impl LogSink for MemoryLog {
    fn log(&self, entry: LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}

/// Sends every entry to two sinks.
pub struct Tee<A, B>(pub A, pub B);

impl<A: LogSink, B: LogSink> LogSink for Tee<A, B> {
    fn log(&self, entry: LogEntry) {
        self.0.log(entry.clone());
        self.1.log(entry);
    }
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn log(&self, entry: LogEntry) {
        (**self).log(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_log_keeps_order() {
        let log = MemoryLog::new();
        log.info("first");
        log.warning("second");
        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[1].message, "second");
    }

    #[test]
    fn test_broadcast_reaches_subscriber() {
        let broadcaster = LogBroadcaster::silent();
        let mut rx = broadcaster.subscribe();
        broadcaster.success("copied");
        let entry = rx.try_recv().unwrap();
        assert_eq!(entry.level, LogLevel::Success);
        assert_eq!(entry.message, "copied");
    }

    #[test]
    fn test_tee_duplicates() {
        let a = Arc::new(MemoryLog::new());
        let b = Arc::new(MemoryLog::new());
        let tee = Tee(a.clone(), b.clone());
        tee.error("boom");
        assert_eq!(a.messages(), vec!["boom"]);
        assert_eq!(b.messages(), vec!["boom"]);
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let json = serde_json::to_value(LogEntry::warning("x").with_indent(1)).unwrap();
        assert_eq!(json["level"], "warning");
        assert_eq!(json["indent"], 1);
        assert!(json["timestamp"].is_string());
    }
}
