//! forge::factory
//!
//! Forge creation.
//!
//! # Design
//!
//! The lifecycle hooks only learn the token and API base after resolving
//! configuration, so they do not hold a forge up front. Instead they hold a
//! [`ForgeConnector`] and ask it for a client once those values are known.
//! Production code uses [`gitea_connector`]; tests hand in a connector that
//! always returns the same mock.
//!
//! # Example
//!
//! ```
//! use gitea_release::forge::gitea_connector;
//!
//! let connect = gitea_connector();
//! assert_eq!(connect("token", "https://gitea.example.com/api/v1").name(), "gitea");
//! ```

use std::sync::Arc;

use super::gitea::GiteaForge;
use super::traits::Forge;

/// Builds a forge client from `(token, api_base)`.
pub type ForgeConnector = Arc<dyn Fn(&str, &str) -> Arc<dyn Forge> + Send + Sync>;

/// Connector producing [`GiteaForge`] clients.
///
/// Clients share one connection pool.
pub fn gitea_connector() -> ForgeConnector {
    let client = reqwest::Client::new();
    Arc::new(move |token: &str, api_base: &str| -> Arc<dyn Forge> {
        Arc::new(GiteaForge::with_client(client.clone(), token, api_base))
    })
}

/// Connector that ignores its arguments and always returns `forge`.
pub fn fixed_connector(forge: Arc<dyn Forge>) -> ForgeConnector {
    Arc::new(move |_token: &str, _api_base: &str| forge.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::MockForge;

    #[test]
    fn gitea_connector_builds_gitea_clients() {
        let connect = gitea_connector();
        assert_eq!(connect("token", "https://gitea.io/api/v1").name(), "gitea");
    }

    #[test]
    fn fixed_connector_returns_same_forge() {
        let connect = fixed_connector(Arc::new(MockForge::new()));
        assert_eq!(connect("a", "b").name(), "mock");
        assert_eq!(connect("c", "d").name(), "mock");
    }
}
