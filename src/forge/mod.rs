//! forge
//!
//! Abstraction over the release-management API of the remote forge.
//!
//! # Architecture
//!
//! The `Forge` trait defines the five release operations the lifecycle
//! hooks need. The engine never names a concrete implementation; it gets
//! clients from a [`ForgeConnector`].
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and request/response types
//! - [`gitea`]: Gitea implementation over the REST API
//! - [`mock`]: Mock implementation for deterministic testing
//! - `factory`: Forge creation and connectors
//!
//! # Example
//!
//! ```ignore
//! use gitea_release::forge::{gitea_connector, Forge};
//!
//! let forge = gitea_connector()(&token, "https://gitea.example.com/api/v1");
//! let release = forge.get_release_by_tag(&repo, "v1.0.0").await?;
//! ```

mod factory;
pub mod gitea;
pub mod mock;
mod traits;

pub use factory::{fixed_connector, gitea_connector, ForgeConnector};
pub use traits::*;
