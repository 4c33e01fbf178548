//! gitea-release - publish Gitea releases from an automated versioning pipeline
//!
//! Given the next release computed by a versioning pipeline (tag, name,
//! notes, branch), this crate makes sure exactly one matching release exists
//! on a Gitea instance, uploads the configured assets to it, and can later
//! promote the release to another distribution channel.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Lifecycle hooks: verify -> publish / add-channel
//! - [`core`] - Domain types, option resolution, errors, pure helpers
//! - [`forge`] - Abstraction over the forge's release API (Gitea v1)
//! - [`ui`] - Logging and terminal output
//!
//! # Correctness Invariants
//!
//! 1. At most one release exists per tag; the tag is looked up first
//! 2. A release with assets stays a draft until every upload settled
//! 3. The token never appears in logs, errors, or `Debug` output

pub mod cli;
pub mod core;
pub mod engine;
pub mod forge;
pub mod ui;
