//! engine::publish
//!
//! The publish hook: make the release exist for the next tag and attach
//! the configured assets.
//!
//! # Flow
//!
//! ```text
//! no assets:  reconcile (non-draft) ----------------------------> done
//! assets:     reconcile (draft) -> glob -> upload all -> finalize -> done
//! ```
//!
//! Finalizing sets `draft: false`, so the release only becomes public once
//! every asset is attached. A forge error on any upload aborts before the
//! finalize step.

use tracing::debug;

use super::assets::{glob_assets, upload_assets, UploadBatch};
use super::reconcile::{reconcile_release, ReconcileMode};
use super::ReleaseError;
use crate::core::config::ResolvedConfig;
use crate::core::errors::PluginError;
use crate::core::types::{PipelineContext, PublishResult, ReleaseDescriptor, RepositoryIdentity};
use crate::forge::{Forge, UpdateReleaseRequest};
use crate::ui::logger::Logger;

/// Publish the next release of `repo`.
///
/// # Errors
///
/// - `ReleaseError::Plugin` (`EGITEAAPIERROR`) if an asset upload is
///   rejected, or (`EINVALIDASSETS`) if the assets option is malformed
/// - `ReleaseError::Forge` for lookup, create, update, or finalize failures
pub async fn publish(
    forge: &dyn Forge,
    repo: &RepositoryIdentity,
    config: &ResolvedConfig,
    ctx: &PipelineContext,
    logger: &dyn Logger,
) -> Result<PublishResult, ReleaseError> {
    let descriptor = ReleaseDescriptor::new(&ctx.next_release, &ctx.branch);
    let assets = config.assets()?;

    if assets.is_empty() {
        let outcome = reconcile_release(
            forge,
            repo,
            &descriptor,
            ReconcileMode::Publish { draft: false },
            logger,
        )
        .await?;

        logger.log(&format!("Published Gitea release: {}", outcome.url));
        return Ok(PublishResult::new(outcome.url));
    }

    let outcome = reconcile_release(
        forge,
        repo,
        &descriptor,
        ReconcileMode::Publish { draft: true },
        logger,
    )
    .await?;
    debug!(release_id = outcome.release_id, created = outcome.created, "draft release");

    let files = glob_assets(&ctx.cwd, &assets);
    let template_context = ctx.template_context();
    let batch = UploadBatch {
        forge,
        repo,
        release_id: outcome.release_id,
        cwd: &ctx.cwd,
        template_context: &template_context,
        skip_unsupported: config.skip_unsupported_assets,
        logger,
    };

    upload_assets(&batch, &files)
        .await
        .map_err(|e| PluginError::api_error(&e.forge_message()))?;

    let finalized = forge
        .update_release(
            repo,
            UpdateReleaseRequest {
                id: outcome.release_id,
                draft: Some(false),
                ..Default::default()
            },
        )
        .await?;

    let url = finalized.public_url();
    logger.log(&format!("Published Gitea release: {}", url));
    Ok(PublishResult::new(url))
}
