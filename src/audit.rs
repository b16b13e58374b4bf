//! WAYBILL - Audit Logging
//! An explicit logger handle given to each record component when it is built.
//!
//! Components never call the global `log` macros. They log through the
//! `AuditLog` they were constructed with, so a test can hand in its own sink
//! and inspect what was written.

use std::fmt;
use std::sync::Arc;

use log::{Level, Log, Metadata, Record};

/// Forwards to whatever logger is installed process-wide (e.g. `env_logger`).
struct GlobalLogger;

impl Log for GlobalLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        log::logger().log(record)
    }

    fn flush(&self) {
        log::logger().flush()
    }
}

/// A cloneable logger handle with a fixed target.
#[derive(Clone)]
pub struct AuditLog {
    sink: Arc<dyn Log>,
    target: String,
}

impl AuditLog {
    /// Log to `sink` under `target`.
    pub fn new(sink: Arc<dyn Log>, target: impl Into<String>) -> Self {
        Self {
            sink,
            target: target.into(),
        }
    }

    /// Log to the process-wide logger under `target`.
    pub fn global(target: impl Into<String>) -> Self {
        Self::new(Arc::new(GlobalLogger), target)
    }

    /// The same sink under a different target.
    pub fn scoped(&self, target: impl Into<String>) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            target: target.into(),
        }
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder()
            .level(level)
            .target(&self.target)
            .build();
        if !self.sink.enabled(&metadata) {
            return;
        }
        self.sink.log(
            &Record::builder()
                .metadata(metadata)
                .args(args)
                .module_path(Some(module_path!()))
                .build(),
        );
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args)
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args)
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args)
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::global("waybill")
    }
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditLog")
            .field("target", &self.target)
            .finish()
    }
}

/// In-memory sink that keeps every line, for tests.
#[derive(Default)]
pub struct MemorySink {
    lines: std::sync::Mutex<Vec<(Level, String, String)>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Captured `(level, target, message)` triples, oldest first.
    pub fn lines(&self) -> Vec<(Level, String, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Captured messages only.
    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, _, msg)| msg).collect()
    }
}

impl Log for MemorySink {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((
                record.level(),
                record.target().to_string(),
                record.args().to_string(),
            ));
        }
    }

    fn flush(&self) {}
}
