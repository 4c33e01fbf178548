//! engine::channel
//!
//! The add-channel hook: promote an existing release to a new channel.
//!
//! The release found for the tag gets its name and prerelease flag
//! refreshed; its notes are left alone. If no release exists yet, one is
//! created with the full notes.

use super::reconcile::{reconcile_release, ReconcileMode};
use super::ReleaseError;
use crate::core::types::{PipelineContext, PublishResult, ReleaseDescriptor, RepositoryIdentity};
use crate::forge::Forge;
use crate::ui::logger::Logger;

/// Add the next release of `repo` to the branch's channel.
pub async fn add_channel(
    forge: &dyn Forge,
    repo: &RepositoryIdentity,
    ctx: &PipelineContext,
    logger: &dyn Logger,
) -> Result<PublishResult, ReleaseError> {
    let descriptor = ReleaseDescriptor::new(&ctx.next_release, &ctx.branch);

    let outcome =
        reconcile_release(forge, repo, &descriptor, ReconcileMode::Channel, logger).await?;

    if outcome.created {
        logger.log(&format!("Published Gitea release: {}", outcome.url));
    } else {
        logger.log(&format!("Updated Gitea release: {}", outcome.url));
    }

    Ok(PublishResult::new(outcome.url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BranchInfo, BranchType, NextRelease};
    use crate::forge::mock::{MockForge, MockOperation};
    use crate::forge::Release;
    use crate::ui::logger::MemoryLogger;

    fn repo() -> RepositoryIdentity {
        RepositoryIdentity::new("test_user", "test_repo").unwrap()
    }

    fn context() -> PipelineContext {
        PipelineContext {
            branch: BranchInfo {
                branch_type: BranchType::Prerelease,
                channel: Some("beta".into()),
                ..Default::default()
            },
            next_release: NextRelease {
                name: "v1.0.0".into(),
                git_tag: "v1.0.0".into(),
                notes: "Test release note body".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn updates_existing_release() {
        let forge = MockForge::with_releases(vec![Release {
            id: 1,
            tag_name: "v1.0.0".into(),
            ..Default::default()
        }]);
        let logger = MemoryLogger::new();

        let result = add_channel(&forge, &repo(), &context(), &logger)
            .await
            .unwrap();

        assert_eq!(
            forge.mutations(),
            vec![MockOperation::UpdateRelease {
                id: 1,
                tag_name: Some("v1.0.0".into()),
                name: Some("v1.0.0".into()),
                body: None,
                draft: None,
                prerelease: Some(true),
            }]
        );
        assert_eq!(
            logger.infos(),
            vec![format!("Updated Gitea release: {}", result.url)]
        );
    }

    #[tokio::test]
    async fn creates_missing_release_with_notes() {
        let forge = MockForge::new();
        let logger = MemoryLogger::new();

        let result = add_channel(&forge, &repo(), &context(), &logger)
            .await
            .unwrap();

        assert_eq!(
            forge.mutations(),
            vec![MockOperation::CreateRelease {
                tag_name: "v1.0.0".into(),
                name: "v1.0.0".into(),
                body: Some("Test release note body".into()),
                draft: false,
                prerelease: true,
            }]
        );
        assert_eq!(
            logger.infos(),
            vec![
                "There is no release for tag v1.0.0, creating a new one".to_string(),
                format!("Published Gitea release: {}", result.url),
            ]
        );
    }
}
