//! ui::logger
//!
//! The log sink lifecycle hooks report progress to.
//!
//! Hooks write human-readable lines ("Published Gitea release: ...") that
//! end up in CI logs. [`TracingLogger`] forwards them to `tracing`;
//! [`MemoryLogger`] keeps them for assertions.

use std::sync::{Arc, Mutex};

/// Destination for progress and warning lines.
pub trait Logger: Send + Sync {
    /// A progress line.
    fn log(&self, message: &str);

    /// A non-fatal problem, e.g. a skipped asset.
    fn warn(&self, message: &str);
}

/// Logger backed by `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// Severity of a captured line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
}

/// Logger that records every line in memory.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    lines: Arc<Mutex<Vec<(Level, String)>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every captured line, in order.
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Captured progress lines.
    pub fn infos(&self) -> Vec<String> {
        self.at(Level::Info)
    }

    /// Captured warnings.
    pub fn warnings(&self) -> Vec<String> {
        self.at(Level::Warn)
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, line)| line.contains(needle))
    }

    fn at(&self, level: Level) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line)
            .collect()
    }

    fn push(&self, level: Level, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, message.to_string()));
        }
    }
}

impl Logger for MemoryLogger {
    fn log(&self, message: &str) {
        tracing::info!("{}", message);
        self.push(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
        self.push(Level::Warn, message);
    }
}
