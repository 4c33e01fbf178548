//! engine::verify
//!
//! Pre-flight checks run before anything is published.
//!
//! # Checks
//!
//! In reporting order:
//! 1. every configured option has its expected shape
//! 2. a Gitea URL is configured (`ENOGITEAURL`)
//! 3. a token is configured (`ENOGITEATOKEN`)
//! 4. the repository URL yields an owner and a repo (`EINVALIDGITEAURL`)
//! 5. only when 2-4 hold: the repository is reachable with the token and
//!    the token may push (`EINVALIDGITEATOKEN`, `EMISSINGREPO`,
//!    `EGITEANOPERMISSION`)
//!
//! # Invariants
//!
//! - No check short-circuits another; all failures are reported together.
//! - A remote failure other than 401/404 is not a verification failure and
//!   propagates as-is.

use tracing::debug;

use super::ReleaseError;
use crate::core::config::ResolvedConfig;
use crate::core::errors::{AggregateError, PluginError};
use crate::core::repo_url::parse_repository_url;
use crate::forge::{ForgeConnector, ForgeError};
use crate::ui::logger::Logger;

/// Run every check against `config` and the pipeline's repository URL.
///
/// # Errors
///
/// - `ReleaseError::Verification` with every failed check, in order
/// - `ReleaseError::Forge` for an unexpected remote failure
pub async fn verify(
    config: &ResolvedConfig,
    repository_url: &str,
    connector: &ForgeConnector,
    logger: &dyn Logger,
) -> Result<(), ReleaseError> {
    let mut errors = config.validate();

    let identity = parse_repository_url(repository_url);

    if config.gitea_url.is_none() {
        errors.push(PluginError::no_gitea_url());
    }

    if config.gitea_token.is_none() {
        errors.push(PluginError::no_gitea_token(identity.as_ref()));
    }

    match (&identity, &config.gitea_token, config.api_base()) {
        (None, _, _) => errors.push(PluginError::invalid_gitea_url()),
        (Some(repo), Some(token), Some(api_base)) => {
            logger.log(&format!("Verify Gitea authentication ({})", api_base));

            let forge = connector(token.as_str(), &api_base);
            match forge.get_repo(repo).await {
                Ok(repository) => {
                    debug!(repo = %repository.full_name, push = repository.permissions.push, "repository permissions");
                    if !repository.permissions.push {
                        errors.push(PluginError::no_permission(repo));
                    }
                }
                Err(ForgeError::AuthFailed(_)) => {
                    errors.push(PluginError::invalid_gitea_token(repo))
                }
                Err(ForgeError::NotFound(_)) => errors.push(PluginError::missing_repo(repo)),
                Err(e) => return Err(ReleaseError::Forge(e)),
            }
        }
        _ => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ReleaseError::Verification(AggregateError::new(errors)))
    }
}
