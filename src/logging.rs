//! Diagnostics Channels
//!
//! Per-component loggers that feed one injectable sink. The core reports
//! every recoverable oddity (missing property groups, unresolved configs,
//! stale object ids) through here and keeps going; the host decides whether
//! entries end up on stderr, in a status panel, or in the `log` facade.
//! Passing the sink in explicitly keeps the core testable in isolation.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "I"),
            LogLevel::Warn => write!(f, "W"),
            LogLevel::Error => write!(f, "E"),
        }
    }
}

/// Destination for diagnostic entries.
///
/// Implementations must not block; the core logs from parse loops.
pub trait LogSink: Send + Sync {
    fn entry(&self, level: LogLevel, channel: &str, message: &str);
}

/// A named diagnostics channel (e.g. `"SandboxObject"`).
///
/// Cheap to clone; clones share the sink.
#[derive(Clone)]
pub struct Logger {
    channel: &'static str,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub fn new(channel: &'static str, sink: Arc<dyn LogSink>) -> Self {
        Self { channel, sink }
    }

    /// Another channel on the same sink.
    pub fn with_channel(&self, channel: &'static str) -> Self {
        Self {
            channel,
            sink: Arc::clone(&self.sink),
        }
    }

    pub fn channel(&self) -> &'static str {
        self.channel
    }

    pub fn info(&self, message: &str) {
        self.sink.entry(LogLevel::Info, self.channel, message);
    }

    pub fn warn(&self, message: &str) {
        self.sink.entry(LogLevel::Warn, self.channel, message);
    }

    pub fn error(&self, message: &str) {
        self.sink.entry(LogLevel::Error, self.channel, message);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("channel", &self.channel).finish()
    }
}

/// Default sink: forwards to the `log` facade with the channel as target.
#[derive(Debug, Default)]
pub struct FacadeSink;

impl LogSink for FacadeSink {
    fn entry(&self, level: LogLevel, channel: &str, message: &str) {
        match level {
            LogLevel::Info => log::info!(target: channel, "{}", message),
            LogLevel::Warn => log::warn!(target: channel, "{}", message),
            LogLevel::Error => log::error!(target: channel, "{}", message),
        }
    }
}

/// One recorded entry from a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub channel: String,
    pub message: String,
}

/// Recording sink with warning/error totals.
///
/// Used by tests, and by hosts that render a log panel with a badge count
/// instead of (or alongside) a terminal logger.
#[derive(Debug, Default)]
pub struct MemorySink {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: Vec<LogEntry>,
    warnings: usize,
    errors: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warning_count(&self) -> usize {
        self.inner.lock().unwrap().warnings
    }

    pub fn error_count(&self) -> usize {
        self.inner.lock().unwrap().errors
    }

    /// Snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.inner.lock().unwrap().entries.clone()
    }

    /// True if any entry's message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .entries
            .iter()
            .any(|entry| entry.message.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn entry(&self, level: LogLevel, channel: &str, message: &str) {
        let mut inner = self.inner.lock().unwrap();
        match level {
            LogLevel::Warn => inner.warnings += 1,
            LogLevel::Error => inner.errors += 1,
            LogLevel::Info => {}
        }
        inner.entries.push(LogEntry {
            level,
            channel: channel.to_string(),
            message: message.to_string(),
        });
    }
}
