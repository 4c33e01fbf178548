//! engine
//!
//! Orchestrates the release lifecycle: verify -> publish / add-channel.
//!
//! # Architecture
//!
//! The engine coordinates the three lifecycle hooks a versioning pipeline
//! calls on this plugin:
//!
//! 1. **verify_conditions**: validate options and credentials
//! 2. **publish**: create or update the release, attach assets
//! 3. **add_channel**: promote an existing release to another channel
//!
//! Hooks 2 and 3 verify first unless the [`Session`] already holds a
//! verification result.
//!
//! # Session states
//!
//! ```text
//! Unverified --ok--> Verified
//!     |
//!     +--fail--> Failed(errors)
//! ```
//!
//! `Verified` is never re-checked by publish or add-channel. `Failed`
//! returns the stored errors again without touching the network.
//!
//! # Example
//!
//! ```ignore
//! use gitea_release::core::config::PluginConfig;
//! use gitea_release::engine::Session;
//!
//! let mut session = Session::gitea();
//! session.verify_conditions(&config, &ctx).await?;
//! let result = session.publish(&config, &ctx).await?;
//! println!("{}: {}", result.name, result.url);
//! ```

pub mod assets;
pub mod channel;
pub mod publish;
pub mod reconcile;
pub mod verify;

pub use reconcile::{reconcile_release, ReconcileMode, ReconcileOutcome};

use std::sync::Arc;

use thiserror::Error;

use crate::core::config::{PluginConfig, ResolvedConfig};
use crate::core::errors::{AggregateError, ErrorCode, PluginError};
use crate::core::repo_url::parse_repository_url;
use crate::core::types::{PipelineContext, PublishResult, RepositoryIdentity};
use crate::forge::{gitea_connector, Forge, ForgeConnector, ForgeError};
use crate::ui::logger::{Logger, TracingLogger};

/// Errors from lifecycle hooks.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// Verification found one or more problems.
    #[error("{0}")]
    Verification(AggregateError),

    /// A user-facing plugin error.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// The forge failed in a way not mapped to a plugin error.
    #[error("forge error: {0}")]
    Forge(#[from] ForgeError),
}

impl From<AggregateError> for ReleaseError {
    fn from(err: AggregateError) -> Self {
        ReleaseError::Verification(err)
    }
}

impl ReleaseError {
    /// The plugin errors carried by this error, if any.
    pub fn plugin_errors(&self) -> Vec<PluginError> {
        match self {
            ReleaseError::Verification(agg) => agg.errors().to_vec(),
            ReleaseError::Plugin(e) => vec![e.clone()],
            ReleaseError::Forge(_) => Vec::new(),
        }
    }

    /// Codes of the carried plugin errors, in order.
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.plugin_errors().iter().map(|e| e.code).collect()
    }
}

/// Verification state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unverified,
    Verified,
    Failed(AggregateError),
}

/// One pipeline run's worth of lifecycle hooks.
///
/// Owns the verification state shared by the hooks, the way forge clients
/// are created, and where progress is logged.
pub struct Session {
    connector: ForgeConnector,
    logger: Arc<dyn Logger>,
    state: SessionState,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session using `connector` for forge clients.
    pub fn new(connector: ForgeConnector, logger: Arc<dyn Logger>) -> Self {
        Self {
            connector,
            logger,
            state: SessionState::Unverified,
        }
    }

    /// Session talking to Gitea over HTTP and logging through `tracing`.
    pub fn gitea() -> Self {
        Self::new(gitea_connector(), Arc::new(TracingLogger))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Verify options and credentials, recording the outcome.
    ///
    /// `assets`, `labels` and `assignees` missing from `config` are taken
    /// from this plugin's entry in the pipeline's `publish` list.
    pub async fn verify_conditions(
        &mut self,
        config: &PluginConfig,
        ctx: &PipelineContext,
    ) -> Result<(), ReleaseError> {
        let mut config = config.clone();
        config.inherit_from_publish(&ctx.options.publish);
        self.run_verification(&config, ctx).await
    }

    /// Publish the next release.
    pub async fn publish(
        &mut self,
        config: &PluginConfig,
        ctx: &PipelineContext,
    ) -> Result<PublishResult, ReleaseError> {
        self.ensure_verified(config, ctx).await?;
        let resolved = config.resolve(&ctx.env);
        let (forge, repo) = self.connect(&resolved, ctx)?;
        publish::publish(
            forge.as_ref(),
            &repo,
            &resolved,
            ctx,
            self.logger.as_ref(),
        )
        .await
    }

    /// Add the next release to the branch's channel.
    pub async fn add_channel(
        &mut self,
        config: &PluginConfig,
        ctx: &PipelineContext,
    ) -> Result<PublishResult, ReleaseError> {
        self.ensure_verified(config, ctx).await?;
        let resolved = config.resolve(&ctx.env);
        let (forge, repo) = self.connect(&resolved, ctx)?;
        channel::add_channel(forge.as_ref(), &repo, ctx, self.logger.as_ref()).await
    }

    async fn ensure_verified(
        &mut self,
        config: &PluginConfig,
        ctx: &PipelineContext,
    ) -> Result<(), ReleaseError> {
        match &self.state {
            SessionState::Verified => return Ok(()),
            SessionState::Failed(errors) => {
                return Err(ReleaseError::Verification(errors.clone()))
            }
            SessionState::Unverified => {}
        }
        self.run_verification(config, ctx).await
    }

    async fn run_verification(
        &mut self,
        config: &PluginConfig,
        ctx: &PipelineContext,
    ) -> Result<(), ReleaseError> {
        let resolved = config.resolve(&ctx.env);
        let result = verify::verify(
            &resolved,
            &ctx.options.repository_url,
            &self.connector,
            self.logger.as_ref(),
        )
        .await;

        match &result {
            Ok(()) => self.state = SessionState::Verified,
            Err(ReleaseError::Verification(errors)) => {
                self.state = SessionState::Failed(errors.clone())
            }
            // Transport failures leave the session unverified so a later
            // hook retries.
            Err(_) => {}
        }
        result
    }

    /// Client and repository for a verified configuration.
    fn connect(
        &self,
        config: &ResolvedConfig,
        ctx: &PipelineContext,
    ) -> Result<(Arc<dyn Forge>, RepositoryIdentity), PluginError> {
        let repo = parse_repository_url(&ctx.options.repository_url)
            .ok_or_else(PluginError::invalid_gitea_url)?;
        let api_base = config.api_base().ok_or_else(PluginError::no_gitea_url)?;
        let token = config
            .gitea_token
            .as_deref()
            .ok_or_else(|| PluginError::no_gitea_token(Some(&repo)))?;

        Ok(((self.connector)(token, &api_base), repo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{NextRelease, PipelineOptions};
    use crate::forge::fixed_connector;
    use crate::forge::mock::{MockForge, MockOperation};
    use crate::ui::logger::MemoryLogger;
    use serde_json::json;

    fn context(env: &[(&str, &str)]) -> PipelineContext {
        PipelineContext {
            env: env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            options: PipelineOptions {
                repository_url: "https://gitea.io/test_user/test_repo.git".into(),
                publish: Vec::new(),
            },
            next_release: NextRelease {
                name: "v1.0.0".into(),
                git_tag: "v1.0.0".into(),
                notes: "notes".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn valid_env() -> Vec<(&'static str, &'static str)> {
        vec![("GITEA_URL", "https://gitea.io"), ("GITEA_TOKEN", "gitea_token")]
    }

    fn session(forge: &MockForge) -> Session {
        Session::new(
            fixed_connector(Arc::new(forge.clone())),
            Arc::new(MemoryLogger::new()),
        )
    }

    fn get_repo_calls(forge: &MockForge) -> usize {
        forge
            .operations()
            .iter()
            .filter(|op| matches!(op, MockOperation::GetRepo { .. }))
            .count()
    }

    #[tokio::test]
    async fn verified_session_is_not_rechecked() {
        let forge = MockForge::new();
        let mut session = session(&forge);
        let config = PluginConfig::default();
        let ctx = context(&valid_env());

        session.verify_conditions(&config, &ctx).await.unwrap();
        assert_eq!(session.state(), &SessionState::Verified);

        session.publish(&config, &ctx).await.unwrap();
        session.add_channel(&config, &ctx).await.unwrap();
        assert_eq!(get_repo_calls(&forge), 1);
    }

    #[tokio::test]
    async fn publish_verifies_when_unverified() {
        let forge = MockForge::new();
        let mut session = session(&forge);

        session
            .publish(&PluginConfig::default(), &context(&valid_env()))
            .await
            .unwrap();

        assert_eq!(get_repo_calls(&forge), 1);
        assert_eq!(forge.release_count(), 1);
    }

    #[tokio::test]
    async fn failed_session_replays_without_network() {
        let forge = MockForge::new();
        let mut session = session(&forge);
        let config = PluginConfig::default();
        let ctx = context(&[]);

        let first = session.verify_conditions(&config, &ctx).await.unwrap_err();
        assert_eq!(first.codes(), vec![ErrorCode::NoGiteaUrl, ErrorCode::NoGiteaToken]);

        forge.clear_operations();
        let second = session
            .publish(&config, &context(&valid_env()))
            .await
            .unwrap_err();
        assert_eq!(second.codes(), first.codes());
        assert!(forge.operations().is_empty());
    }

    #[tokio::test]
    async fn verify_inherits_assets_from_publish_entry() {
        let forge = MockForge::new();
        let mut session = session(&forge);
        let mut ctx = context(&valid_env());
        ctx.options.publish = vec![json!({"path": "gitea-release", "assets": 42})];

        let err = session
            .verify_conditions(&PluginConfig::default(), &ctx)
            .await
            .unwrap_err();

        assert_eq!(err.codes(), vec![ErrorCode::InvalidAssets]);
    }

    #[test]
    fn plugin_errors_of_forge_error_are_empty() {
        let err = ReleaseError::Forge(ForgeError::RateLimited);
        assert!(err.plugin_errors().is_empty());
        assert_eq!(err.to_string(), "forge error: rate limited");
    }
}
