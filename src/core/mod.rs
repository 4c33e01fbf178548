//! core
//!
//! Domain types, option handling, and pure helpers.
//!
//! # Modules
//!
//! - [`types`] - Release, branch, asset, and pipeline context types
//! - [`config`] - Plugin options, environment resolution, and validation
//! - [`errors`] - User-facing error codes and the aggregate error
//! - [`repo_url`] - Repository URL parsing
//! - [`template`] - `${...}` interpolation for asset names and labels
//!
//! Nothing in here performs network I/O.

pub mod config;
pub mod errors;
pub mod repo_url;
pub mod template;
pub mod types;
