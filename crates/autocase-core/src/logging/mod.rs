//! # Autocase Core Logging Sinks
//!
//! Components never reach for a process-wide logger directly. Each one is
//! handed an [`Arc<dyn LogSink>`](LogSink) at construction and emits leveled
//! records through it.
//!
//! - [`FacadeSink`] forwards to the `log` facade, so whatever backend the
//!   host installed (the `autocase` binary uses `tracing-subscriber`) sees
//!   the records.
//! - [`MemorySink`] keeps formatted records in memory and backs the
//!   execution log exposed by [`Application`](crate::kernel::Application).
//! - [`TeeSink`] fans a record out to several sinks.
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
pub use log::Level;

/// Receiver for leveled log records.
pub trait LogSink: Send + Sync {
    /// Record a message. `target` is usually the emitting module path.
    fn log(&self, level: Level, target: &str, message: &str);

    /// Whether records at `level` would be kept. Callers may skip formatting
    /// expensive messages when this returns false.
    fn enabled(&self, _level: Level) -> bool {
        true
    }
}

/// Emit a formatted record through a [`LogSink`].
///
/// ```ignore
/// emit!(self.sink, Info, "Loaded {} plugins", count);
/// ```
macro_rules! emit {
    ($sink:expr, $level:ident, $($arg:tt)+) => {{
        let sink: &dyn $crate::logging::LogSink = &*$sink;
        if sink.enabled($crate::logging::Level::$level) {
            sink.log($crate::logging::Level::$level, module_path!(), &format!($($arg)+));
        }
    }};
}
pub(crate) use emit;

/// Forwards every record to the `log` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeSink;

impl LogSink for FacadeSink {
    fn log(&self, level: Level, target: &str, message: &str) {
        log::log!(target: target, level, "{}", message);
    }

    fn enabled(&self, level: Level) -> bool {
        level <= log::max_level()
    }
}

/// A single captured record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// Keeps records at or above a minimum level in memory.
#[derive(Debug)]
pub struct MemorySink {
    min_level: Mutex<Level>,
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new(min_level: Level) -> Self {
        Self {
            min_level: Mutex::new(min_level),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Change the capture threshold. Already captured records are kept.
    pub fn set_level(&self, level: Level) {
        if let Ok(mut guard) = self.min_level.lock() {
            *guard = level;
        }
    }

    pub fn level(&self) -> Level {
        self.min_level.lock().map(|l| *l).unwrap_or(Level::Info)
    }

    /// Snapshot of captured records in emission order
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// All captured records rendered one per line
    pub fn contents(&self) -> String {
        let mut out = String::new();
        for record in self.records() {
            out.push_str(&record.to_string());
            out.push('\n');
        }
        out
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: Level, target: &str, message: &str) {
        if !self.enabled(level) {
            return;
        }
        if let Ok(mut records) = self.records.lock() {
            records.push(LogRecord {
                timestamp: Local::now(),
                level,
                target: target.to_string(),
                message: message.to_string(),
            });
        }
    }

    fn enabled(&self, level: Level) -> bool {
        level <= self.level()
    }
}

/// Fans records out to every contained sink.
#[derive(Default, Clone)]
pub struct TeeSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl TeeSink {
    pub fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Self { sinks }
    }
}

impl LogSink for TeeSink {
    fn log(&self, level: Level, target: &str, message: &str) {
        for sink in &self.sinks {
            if sink.enabled(level) {
                sink.log(level, target, message);
            }
        }
    }

    fn enabled(&self, level: Level) -> bool {
        self.sinks.iter().any(|s| s.enabled(level))
    }
}

/// The sink used when a component is built without an explicit one.
pub fn default_sink() -> Arc<dyn LogSink> {
    Arc::new(FacadeSink)
}

#[cfg(test)]
mod tests;
