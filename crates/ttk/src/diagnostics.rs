//! Diagnostics sink passed through parsing and rendering.
//!
//! Nothing in the engine logs through global state: every render receives a
//! [`Diagnostics`] implementation. [`TracingDiagnostics`] forwards to the
//! `tracing` ecosystem and is what [`Template::process`](crate::Template::process)
//! uses; [`RecordingDiagnostics`] keeps messages in memory.

use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
}

/// Receiver for engine diagnostics.
pub trait Diagnostics {
    fn record(&self, level: Level, message: &str);
}

/// Forwards diagnostics as `tracing` events with target `ttk`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, level: Level, message: &str) {
        match level {
            Level::Trace => tracing::trace!(target: "ttk", "{message}"),
            Level::Debug => tracing::debug!(target: "ttk", "{message}"),
            Level::Info => tracing::info!(target: "ttk", "{message}"),
            Level::Warn => tracing::warn!(target: "ttk", "{message}"),
        }
    }
}

/// Collects diagnostics in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    entries: RefCell<Vec<(Level, String)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries, oldest first.
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    /// Messages recorded at exactly `level`.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn record(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}
