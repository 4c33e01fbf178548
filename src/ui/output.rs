//! ui::output
//!
//! Output formatting and logging setup.
//!
//! # Design
//!
//! Progress goes through `tracing` to stderr so stdout stays free for the
//! JSON result of a hook. `RUST_LOG` overrides the level picked from the
//! `--quiet` / `--debug` flags.

use std::fmt::Display;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::errors::{AggregateError, PluginError};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - warnings and errors only
    Quiet,
    /// Normal mode - progress lines
    Normal,
    /// Debug mode - request and descriptor dumps
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Default filter directive for this verbosity.
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Debug => "debug",
        }
    }
}

/// Install the global `tracing` subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity == Verbosity::Debug)
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Format a plugin error for the terminal: `code: message` then details.
pub fn format_plugin_error(err: &PluginError) -> String {
    format!("{}: {}\n\n{}", err.code, err.message, err.details)
}

/// Format every error of an aggregate, separated by blank lines.
pub fn format_aggregate(err: &AggregateError) -> String {
    err.errors()
        .iter()
        .map(format_plugin_error)
        .collect::<Vec<_>>()
        .join("\n\n")
}
