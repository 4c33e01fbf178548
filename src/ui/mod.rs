//! ui
//!
//! Terminal output and logging.
//!
//! # Modules
//!
//! - [`output`] - Verbosity, subscriber setup, and error formatting
//! - [`logger`] - The `Logger` sink lifecycle hooks write progress to
//!
//! # Design
//!
//! Hooks never print directly. They write through a [`logger::Logger`], and
//! only the CLI decides where that ends up.

pub mod logger;
pub mod output;
