//! engine::reconcile
//!
//! Create-or-update of the release for a tag.
//!
//! # Invariants
//!
//! - At most one release exists per `(repository, tag_name)`: the tag is
//!   always looked up before anything is created.
//! - The lookup fully resolves before any mutation is sent.
//! - A lookup 404 means "not found"; any other lookup error aborts before
//!   a mutation.
//!
//! # Modes
//!
//! | mode | found | not found |
//! |---|---|---|
//! | `Publish { draft }` | update `{tag_name, name, body, prerelease}`, plus `draft: true` when drafting | create, `draft` as given |
//! | `Channel` | update `{tag_name, name, prerelease}` | create, never draft |
//!
//! Creates always carry the notes as `body`.

use tracing::debug;

use crate::core::types::{ReleaseDescriptor, RepositoryIdentity};
use crate::forge::{CreateReleaseRequest, Forge, ForgeError, UpdateReleaseRequest};
use crate::ui::logger::Logger;

/// Which hook is reconciling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Full publish. With `draft` set, the release is a draft afterwards,
    /// whether it was created or found.
    Publish { draft: bool },
    /// Channel promotion: notes are left untouched on an existing release.
    Channel,
}

/// What reconciliation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub release_id: u64,
    /// Public URL of the release as returned by the forge
    pub url: String,
    /// `true` if a new release was created, `false` if one was updated
    pub created: bool,
}

/// Make the forge hold `descriptor` for its tag.
pub async fn reconcile_release(
    forge: &dyn Forge,
    repo: &RepositoryIdentity,
    descriptor: &ReleaseDescriptor,
    mode: ReconcileMode,
    logger: &dyn Logger,
) -> Result<ReconcileOutcome, ForgeError> {
    debug!(?descriptor, ?mode, "release object");

    let existing = forge.get_release_by_tag(repo, &descriptor.tag_name).await?;

    let (release, created) = match existing {
        Some(found) => {
            debug!(release_id = found.id, "release exists for tag");
            let (body, draft) = match mode {
                ReconcileMode::Publish { draft } => {
                    (Some(descriptor.body.clone()), draft.then_some(true))
                }
                ReconcileMode::Channel => (None, None),
            };
            let request = UpdateReleaseRequest {
                id: found.id,
                tag_name: Some(descriptor.tag_name.clone()),
                name: Some(descriptor.name.clone()),
                body,
                draft,
                prerelease: Some(descriptor.prerelease),
            };
            (forge.update_release(repo, request).await?, false)
        }
        None => {
            logger.log(&format!(
                "There is no release for tag {}, creating a new one",
                descriptor.tag_name
            ));
            let draft = match mode {
                ReconcileMode::Publish { draft } => draft,
                ReconcileMode::Channel => false,
            };
            let request = CreateReleaseRequest {
                tag_name: descriptor.tag_name.clone(),
                name: descriptor.name.clone(),
                body: Some(descriptor.body.clone()),
                draft,
                prerelease: descriptor.prerelease,
            };
            (forge.create_release(repo, request).await?, true)
        }
    };

    Ok(ReconcileOutcome {
        release_id: release.id,
        url: release.public_url(),
        created,
    })
}
