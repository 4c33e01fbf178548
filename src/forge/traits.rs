//! forge::traits
//!
//! Forge trait definition for the release-management API.
//!
//! # Design
//!
//! The `Forge` trait is async because forge operations involve network I/O.
//! All methods return `Result` so callers can tell an expected "not found"
//! apart from a fatal transport failure.
//!
//! Every operation takes the [`RepositoryIdentity`] it acts on, so one
//! client instance can serve several repositories.
//!
//! # Example
//!
//! ```ignore
//! use gitea_release::forge::{CreateReleaseRequest, Forge};
//!
//! async fn ship(forge: &dyn Forge, repo: &RepositoryIdentity) -> Result<(), ForgeError> {
//!     let release = forge
//!         .create_release(repo, CreateReleaseRequest {
//!             tag_name: "v1.0.0".to_string(),
//!             name: "v1.0.0".to_string(),
//!             body: Some("Notes".to_string()),
//!             prerelease: false,
//!             draft: false,
//!         })
//!         .await?;
//!     println!("Created release {}: {}", release.id, release.public_url());
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::RepositoryIdentity;

/// Most release pages scanned when looking up a tag.
pub const MAX_RELEASE_PAGES: u32 = 1000;

/// Errors from forge operations.
///
/// These map the HTTP failure modes of the release API. Status-specific
/// variants exist for the codes callers branch on (401, 403, 404, 429).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForgeError {
    /// Authentication is required but no token is configured.
    #[error("authentication required")]
    AuthRequired,

    /// The token was rejected (HTTP 401).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The token is valid but lacks permission (HTTP 403).
    #[error("permission denied: {0}")]
    Forbidden(String),

    /// The requested resource was not found (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (HTTP 429).
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The release listing did not end within the page limit.
    #[error("release listing exceeded {0} pages")]
    TooManyPages(u32),
}

impl ForgeError {
    /// HTTP status code behind this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ForgeError::AuthFailed(_) => Some(401),
            ForgeError::Forbidden(_) => Some(403),
            ForgeError::NotFound(_) => Some(404),
            ForgeError::RateLimited => Some(429),
            ForgeError::ApiError { status, .. } => Some(*status),
            ForgeError::AuthRequired
            | ForgeError::NetworkError(_)
            | ForgeError::TooManyPages(_) => None,
        }
    }

    /// The message reported by the forge, without the variant prefix.
    pub fn forge_message(&self) -> String {
        match self {
            ForgeError::AuthFailed(m)
            | ForgeError::Forbidden(m)
            | ForgeError::NotFound(m)
            | ForgeError::NetworkError(m)
            | ForgeError::ApiError { message: m, .. } => m.clone(),
            other => other.to_string(),
        }
    }
}

/// Repository metadata returned by `get_repo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// `owner/repo`
    #[serde(default)]
    pub full_name: String,
    /// Permissions the authenticated user holds on the repository.
    #[serde(default)]
    pub permissions: RepositoryPermissions,
}

/// Permission flags on a repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryPermissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub pull: bool,
}

/// A release as the forge represents it.
///
/// Only `id` and the public URL are relied upon after a call returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    /// API URL of the release.
    #[serde(default)]
    pub url: Option<String>,
    /// Web URL of the release page.
    #[serde(default)]
    pub html_url: Option<String>,
}

impl Release {
    /// The URL to hand back to the pipeline: the web page when known,
    /// otherwise the API URL.
    pub fn public_url(&self) -> String {
        self.html_url
            .clone()
            .or_else(|| self.url.clone())
            .unwrap_or_default()
    }
}

/// An uploaded release asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub browser_download_url: String,
}

/// Request to create a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateReleaseRequest {
    pub tag_name: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Only sent when set; a direct create omits the field entirely.
    #[serde(skip_serializing_if = "is_false")]
    pub draft: bool,
    pub prerelease: bool,
}

/// Request to update a release. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReleaseRequest {
    #[serde(skip)]
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerelease: Option<bool>,
}

/// Request to attach a file to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAssetRequest {
    /// Release the asset belongs to
    pub release_id: u64,
    /// Display name on the release page
    pub name: String,
    /// MIME type of the content
    pub content_type: String,
    /// File content
    pub content: Vec<u8>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// The Forge trait for interacting with a release-management API.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so they can be shared by the
/// concurrent upload futures of a publish.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. Callers should handle:
/// - `AuthFailed` / `Forbidden`: the token is wrong or underprivileged
/// - `NotFound`: resource doesn't exist
/// - `ApiError`: report the forge's message to the user
/// - `NetworkError`: transport failed
/// - `TooManyPages`: the release listing never ended
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "gitea").
    fn name(&self) -> &'static str;

    /// Fetch repository metadata, including the caller's permissions.
    async fn get_repo(&self, repo: &RepositoryIdentity) -> Result<Repository, ForgeError>;

    /// List one page of releases (1-based). An empty page means the
    /// listing is exhausted.
    async fn list_releases(
        &self,
        repo: &RepositoryIdentity,
        page: u32,
    ) -> Result<Vec<Release>, ForgeError>;

    /// Find the release for `tag` by scanning release pages in order.
    ///
    /// Pages are requested strictly one after another. The scan stops at
    /// the first match, the first empty page, or a page repeating the
    /// previous one (a server ignoring `page`). A 404 on a page means the
    /// release does not exist; any other error propagates.
    ///
    /// # Errors
    ///
    /// `ForgeError::TooManyPages` if no page ends the scan within
    /// [`MAX_RELEASE_PAGES`].
    async fn get_release_by_tag(
        &self,
        repo: &RepositoryIdentity,
        tag: &str,
    ) -> Result<Option<Release>, ForgeError> {
        let mut previous: Vec<u64> = Vec::new();
        for page in 1..=MAX_RELEASE_PAGES {
            let releases = match self.list_releases(repo, page).await {
                Ok(releases) => releases,
                Err(ForgeError::NotFound(_)) => return Ok(None),
                Err(e) => return Err(e),
            };

            if releases.is_empty() {
                return Ok(None);
            }

            let ids: Vec<u64> = releases.iter().map(|r| r.id).collect();
            if ids == previous {
                return Ok(None);
            }

            if let Some(found) = releases.into_iter().find(|r| r.tag_name == tag) {
                return Ok(Some(found));
            }

            previous = ids;
        }
        Err(ForgeError::TooManyPages(MAX_RELEASE_PAGES))
    }

    /// Create a new release.
    async fn create_release(
        &self,
        repo: &RepositoryIdentity,
        request: CreateReleaseRequest,
    ) -> Result<Release, ForgeError>;

    /// Update an existing release.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the release doesn't exist
    async fn update_release(
        &self,
        repo: &RepositoryIdentity,
        request: UpdateReleaseRequest,
    ) -> Result<Release, ForgeError>;

    /// Upload a file to a release.
    async fn create_release_asset(
        &self,
        repo: &RepositoryIdentity,
        request: UploadAssetRequest,
    ) -> Result<ReleaseAsset, ForgeError>;
}
