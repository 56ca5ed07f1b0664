//! Pipeline log broadcasting.
//!
//! Log entries are echoed to stderr (stdout may be carrying NDJSON) and
//! broadcast to any subscriber, e.g. a progress display or a test.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth for sub-steps
    #[serde(default)]
    pub indent: u8,
    /// RFC 3339 UTC time of creation
    pub timestamp: String,
}

impl LogEntry {
    fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
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

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Broadcasts log entries to all subscribers
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    echo: AtomicBool,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self {
            sender,
            echo: AtomicBool::new(true),
        }
    }

    /// Turn stderr echo on or off. Subscribers still receive every entry.
    pub fn set_echo(&self, echo: bool) {
        self.echo.store(echo, Ordering::Relaxed);
    }

    pub fn is_echoing(&self) -> bool {
        self.echo.load(Ordering::Relaxed)
    }

    pub fn log(&self, entry: LogEntry) {
        self.publish(entry, true);
    }

    /// Broadcast `entry`, echoing it only if both `echo` and the global
    /// switch allow it.
    pub fn publish(&self, entry: LogEntry, echo: bool) {
        if echo && self.is_echoing() {
            let prefix = match entry.level {
                LogLevel::Info => "   ",
                LogLevel::Success => "   ✓",
                LogLevel::Warning => "   ⚠️",
                LogLevel::Error => "   ❌",
            };
            let indent = "   ".repeat(entry.indent as usize);
            eprintln!("{}{} {}", indent, prefix, entry.message);
        }

        // No subscribers is fine.
        let _ = self.sender.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }

    /// Subscribe as a `Stream`. Lagging subscribers see a `Lagged` error item.
    pub fn subscribe_stream(&self) -> BroadcastStream<LogEntry> {
        BroadcastStream::new(self.subscribe())
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::warning(msg));
}

/// Logger for one pipeline run.
///
/// A quiet run keeps its entries off stderr without touching the global
/// echo switch, so concurrent runs don't affect each other.
#[derive(Debug, Clone, Copy)]
pub struct RunLog {
    echo: bool,
}

impl RunLog {
    pub fn new(quiet: bool) -> Self {
        Self { echo: !quiet }
    }

    pub fn info(&self, msg: impl Into<String>) {
        LOG_BROADCASTER.publish(LogEntry::info(msg), self.echo);
    }

    pub fn info_indent(&self, msg: impl Into<String>, indent: u8) {
        LOG_BROADCASTER.publish(LogEntry::info(msg).with_indent(indent), self.echo);
    }

    pub fn success(&self, msg: impl Into<String>) {
        LOG_BROADCASTER.publish(LogEntry::success(msg), self.echo);
    }

    pub fn error(&self, msg: impl Into<String>) {
        LOG_BROADCASTER.publish(LogEntry::error(msg), self.echo);
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new(false)
    }
}
