//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge provides a deterministic implementation of the `Forge` trait
//! for use in tests. It stores releases and uploaded assets in memory, pages
//! release listings like the real API, and allows configuring failure
//! scenarios. Every call is recorded so tests can assert on exact request
//! sequences.
//!
//! # Example
//!
//! ```
//! use gitea_release::core::types::RepositoryIdentity;
//! use gitea_release::forge::mock::MockForge;
//! use gitea_release::forge::{CreateReleaseRequest, Forge};
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::new();
//! let repo = RepositoryIdentity::new("owner", "repo").unwrap();
//!
//! let release = forge.create_release(&repo, CreateReleaseRequest {
//!     tag_name: "v1.0.0".to_string(),
//!     name: "v1.0.0".to_string(),
//!     body: Some("Notes".to_string()),
//!     draft: false,
//!     prerelease: false,
//! }).await.unwrap();
//!
//! assert_eq!(release.id, 1);
//!
//! let found = forge.get_release_by_tag(&repo, "v1.0.0").await.unwrap();
//! assert_eq!(found.unwrap().id, 1);
//! # });
//! ```

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::traits::{
    CreateReleaseRequest, Forge, ForgeError, Release, ReleaseAsset, Repository,
    RepositoryPermissions, UpdateReleaseRequest, UploadAssetRequest,
};
use crate::core::types::RepositoryIdentity;

/// Releases per listing page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 30;

/// Base URL used for the URLs the mock hands out.
const MOCK_BASE_URL: &str = "https://gitea.mock";

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockForge {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockForgeInner {
    /// Stored releases, in listing order.
    releases: Vec<Release>,
    /// Uploaded assets with the release they belong to.
    assets: Vec<(u64, ReleaseAsset)>,
    /// Next release id to assign.
    next_release_id: u64,
    /// Next asset id to assign.
    next_asset_id: u64,
    /// Releases per listing page.
    page_size: usize,
    /// Repository metadata; `None` makes `get_repo` return 404.
    repository: Option<Repository>,
    /// Method to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Per-asset upload failures, by asset name.
    upload_failures: Vec<(String, ForgeError)>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail get_repo with the given error.
    GetRepo(ForgeError),
    /// Fail list_releases with the given error.
    ListReleases(ForgeError),
    /// Fail create_release with the given error.
    CreateRelease(ForgeError),
    /// Fail update_release with the given error.
    UpdateRelease(ForgeError),
    /// Fail create_release_asset with the given error, for every asset or
    /// only the one with the given name.
    UploadAsset {
        name: Option<String>,
        error: ForgeError,
    },
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    GetRepo {
        repo: String,
    },
    ListReleases {
        page: u32,
    },
    CreateRelease {
        tag_name: String,
        name: String,
        body: Option<String>,
        draft: bool,
        prerelease: bool,
    },
    UpdateRelease {
        id: u64,
        tag_name: Option<String>,
        name: Option<String>,
        body: Option<String>,
        draft: Option<bool>,
        prerelease: Option<bool>,
    },
    UploadAsset {
        release_id: u64,
        name: String,
        content_type: String,
        size: usize,
    },
}

impl MockForge {
    /// Create a new empty mock forge.
    ///
    /// The repository exists and the token may push to it.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockForgeInner {
                releases: Vec::new(),
                assets: Vec::new(),
                next_release_id: 1,
                next_asset_id: 1,
                page_size: DEFAULT_PAGE_SIZE,
                repository: Some(Repository {
                    full_name: String::new(),
                    permissions: RepositoryPermissions {
                        admin: false,
                        push: true,
                        pull: true,
                    },
                }),
                fail_on: None,
                upload_failures: Vec::new(),
                operations: Vec::new(),
            })),
        }
    }

    /// Create a mock forge with pre-existing releases.
    ///
    /// # Example
    ///
    /// ```
    /// use gitea_release::forge::mock::MockForge;
    /// use gitea_release::forge::Release;
    ///
    /// let release = Release {
    ///     id: 42,
    ///     tag_name: "v1.0.0".to_string(),
    ///     name: "v1.0.0".to_string(),
    ///     ..Default::default()
    /// };
    ///
    /// let forge = MockForge::with_releases(vec![release]);
    /// assert_eq!(forge.release_count(), 1);
    /// ```
    pub fn with_releases(releases: Vec<Release>) -> Self {
        let forge = Self::new();
        {
            let mut inner = forge.inner.lock().unwrap();
            inner.next_release_id = releases.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            inner.releases = releases;
        }
        forge
    }

    /// Set how many releases each listing page holds.
    pub fn page_size(self, page_size: usize) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.page_size = page_size.max(1);
        }
        self
    }

    /// Set the permissions the token holds on the repository.
    pub fn permissions(self, permissions: RepositoryPermissions) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            if let Some(repository) = inner.repository.as_mut() {
                repository.permissions = permissions;
            }
        }
        self
    }

    /// Make the repository unknown: `get_repo` answers 404.
    pub fn without_repository(self) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.repository = None;
        }
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use gitea_release::forge::mock::{MockForge, FailOn};
    /// use gitea_release::forge::ForgeError;
    ///
    /// let forge = MockForge::new()
    ///     .fail_on(FailOn::CreateRelease(ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Make uploads of the asset called `name` fail with `error`.
    ///
    /// Can be called repeatedly to fail several assets with different
    /// errors.
    pub fn fail_upload(self, name: impl Into<String>, error: ForgeError) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.upload_failures.push((name.into(), error));
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
        inner.upload_failures.clear();
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Recorded operations other than reads (create, update, upload).
    pub fn mutations(&self) -> Vec<MockOperation> {
        self.operations()
            .into_iter()
            .filter(|op| {
                !matches!(
                    op,
                    MockOperation::GetRepo { .. } | MockOperation::ListReleases { .. }
                )
            })
            .collect()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }

    /// Get a release by id (for test verification).
    pub fn release(&self, id: u64) -> Option<Release> {
        let inner = self.inner.lock().unwrap();
        inner.releases.iter().find(|r| r.id == id).cloned()
    }

    /// All releases for `tag` (for test verification).
    pub fn releases_for_tag(&self, tag: &str) -> Vec<Release> {
        let inner = self.inner.lock().unwrap();
        inner
            .releases
            .iter()
            .filter(|r| r.tag_name == tag)
            .cloned()
            .collect()
    }

    /// Get the count of releases.
    pub fn release_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.releases.len()
    }

    /// Names of the assets attached to a release, in upload order.
    pub fn asset_names(&self, release_id: u64) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .assets
            .iter()
            .filter(|(id, _)| *id == release_id)
            .map(|(_, asset)| asset.name.clone())
            .collect()
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    /// Check if we should fail and return the error if so.
    fn check_fail<T>(&self, expected: &str, asset: Option<&str>) -> Option<Result<T, ForgeError>> {
        let inner = self.inner.lock().unwrap();
        match &inner.fail_on {
            Some(FailOn::GetRepo(e)) if expected == "get_repo" => Some(Err(e.clone())),
            Some(FailOn::ListReleases(e)) if expected == "list_releases" => Some(Err(e.clone())),
            Some(FailOn::CreateRelease(e)) if expected == "create_release" => {
                Some(Err(e.clone()))
            }
            Some(FailOn::UpdateRelease(e)) if expected == "update_release" => {
                Some(Err(e.clone()))
            }
            Some(FailOn::UploadAsset { name, error }) if expected == "upload_asset" => {
                match (name, asset) {
                    (Some(wanted), Some(actual)) if wanted != actual => None,
                    _ => Some(Err(error.clone())),
                }
            }
            _ => None,
        }
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

fn release_urls(repo: &RepositoryIdentity, id: u64, tag: &str) -> (String, String) {
    (
        format!("{}/api/v1/repos/{}/releases/{}", MOCK_BASE_URL, repo, id),
        format!("{}/{}/releases/tag/{}", MOCK_BASE_URL, repo, tag),
    )
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_repo(&self, repo: &RepositoryIdentity) -> Result<Repository, ForgeError> {
        self.record(MockOperation::GetRepo {
            repo: repo.to_string(),
        });

        if let Some(result) = self.check_fail("get_repo", None) {
            return result;
        }

        let inner = self.inner.lock().unwrap();
        inner
            .repository
            .clone()
            .map(|r| Repository {
                full_name: repo.to_string(),
                ..r
            })
            .ok_or_else(|| ForgeError::NotFound(format!("repository {}", repo)))
    }

    async fn list_releases(
        &self,
        _repo: &RepositoryIdentity,
        page: u32,
    ) -> Result<Vec<Release>, ForgeError> {
        self.record(MockOperation::ListReleases { page });

        if let Some(result) = self.check_fail("list_releases", None) {
            return result;
        }

        let inner = self.inner.lock().unwrap();
        let start = (page.max(1) as usize - 1) * inner.page_size;
        Ok(inner
            .releases
            .iter()
            .skip(start)
            .take(inner.page_size)
            .cloned()
            .collect())
    }

    async fn create_release(
        &self,
        repo: &RepositoryIdentity,
        request: CreateReleaseRequest,
    ) -> Result<Release, ForgeError> {
        self.record(MockOperation::CreateRelease {
            tag_name: request.tag_name.clone(),
            name: request.name.clone(),
            body: request.body.clone(),
            draft: request.draft,
            prerelease: request.prerelease,
        });

        if let Some(result) = self.check_fail("create_release", None) {
            return result;
        }

        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_release_id;
        inner.next_release_id += 1;

        let (url, html_url) = release_urls(repo, id, &request.tag_name);
        let release = Release {
            id,
            tag_name: request.tag_name,
            name: request.name,
            body: request.body,
            draft: request.draft,
            prerelease: request.prerelease,
            url: Some(url),
            html_url: Some(html_url),
        };

        inner.releases.push(release.clone());
        Ok(release)
    }

    async fn update_release(
        &self,
        repo: &RepositoryIdentity,
        request: UpdateReleaseRequest,
    ) -> Result<Release, ForgeError> {
        self.record(MockOperation::UpdateRelease {
            id: request.id,
            tag_name: request.tag_name.clone(),
            name: request.name.clone(),
            body: request.body.clone(),
            draft: request.draft,
            prerelease: request.prerelease,
        });

        if let Some(result) = self.check_fail("update_release", None) {
            return result;
        }

        let mut inner = self.inner.lock().unwrap();
        let release = inner
            .releases
            .iter_mut()
            .find(|r| r.id == request.id)
            .ok_or_else(|| ForgeError::NotFound(format!("release {}", request.id)))?;

        if let Some(tag_name) = request.tag_name {
            release.tag_name = tag_name;
        }
        if let Some(name) = request.name {
            release.name = name;
        }
        if let Some(body) = request.body {
            release.body = Some(body);
        }
        if let Some(draft) = request.draft {
            release.draft = draft;
        }
        if let Some(prerelease) = request.prerelease {
            release.prerelease = prerelease;
        }

        if release.html_url.is_none() {
            let (url, html_url) = release_urls(repo, release.id, &release.tag_name);
            release.url = Some(url);
            release.html_url = Some(html_url);
        }

        Ok(release.clone())
    }

    async fn create_release_asset(
        &self,
        repo: &RepositoryIdentity,
        request: UploadAssetRequest,
    ) -> Result<ReleaseAsset, ForgeError> {
        self.record(MockOperation::UploadAsset {
            release_id: request.release_id,
            name: request.name.clone(),
            content_type: request.content_type.clone(),
            size: request.content.len(),
        });

        if let Some(result) = self.check_fail("upload_asset", Some(&request.name)) {
            return result;
        }

        let mut inner = self.inner.lock().unwrap();
        if let Some((_, error)) = inner
            .upload_failures
            .iter()
            .find(|(name, _)| *name == request.name)
        {
            return Err(error.clone());
        }
        if !inner.releases.iter().any(|r| r.id == request.release_id) {
            return Err(ForgeError::NotFound(format!(
                "release {}",
                request.release_id
            )));
        }

        let id = inner.next_asset_id;
        inner.next_asset_id += 1;

        let asset = ReleaseAsset {
            id,
            name: request.name.clone(),
            size: request.content.len() as u64,
            browser_download_url: format!(
                "{}/{}/releases/download/{}/{}",
                MOCK_BASE_URL, repo, request.release_id, request.name
            ),
        };

        inner.assets.push((request.release_id, asset.clone()));
        Ok(asset)
    }
}
