//! forge::gitea
//!
//! Gitea forge implementation over the REST API.
//!
//! # Design
//!
//! This module implements the `Forge` trait for Gitea (and API-compatible
//! forks). Every request carries `Authorization: token <TOKEN>`; the token
//! is never logged and never appears in `Debug` output.
//!
//! Endpoints, relative to the API base (`<giteaUrl><prefix>`):
//!
//! | operation | request |
//! |---|---|
//! | repository | `GET /repos/{owner}/{repo}` |
//! | list releases | `GET /repos/{owner}/{repo}/releases?page=N` |
//! | create release | `POST /repos/{owner}/{repo}/releases` |
//! | update release | `PATCH /repos/{owner}/{repo}/releases/{id}` |
//! | upload asset | `POST /repos/{owner}/{repo}/releases/{id}/assets?name=X` (multipart `attachment`) |
//!
//! # Rate Limiting
//!
//! A 429 maps to `ForgeError::RateLimited`. No retry is attempted.
//!
//! # Example
//!
//! ```ignore
//! use gitea_release::forge::gitea::GiteaForge;
//! use gitea_release::forge::Forge;
//!
//! let forge = GiteaForge::new("token", "https://gitea.example.com/api/v1");
//! let repo = forge.get_repo(&identity).await?;
//! assert!(repo.permissions.push);
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use super::traits::{
    CreateReleaseRequest, Forge, ForgeError, Release, ReleaseAsset, Repository,
    UpdateReleaseRequest, UploadAssetRequest,
};
use crate::core::types::RepositoryIdentity;

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "gitea-release";

/// Multipart field Gitea reads the uploaded file from.
const ATTACHMENT_FIELD: &str = "attachment";

/// Gitea forge implementation.
pub struct GiteaForge {
    /// HTTP client for making requests
    client: Client,
    /// Personal access token
    token: String,
    /// API base URL, e.g. `https://gitea.example.com/api/v1`
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GiteaForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GiteaForge")
            .field("has_token", &!self.token.is_empty())
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GiteaForge {
    /// Create a client for the API at `api_base`.
    ///
    /// A trailing `/` on `api_base` is ignored.
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self::with_client(Client::new(), token, api_base)
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_client(
        client: Client,
        token: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            client,
            token: token.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// The API base URL requests are sent to.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        if self.token.is_empty() {
            return Err(ForgeError::AuthRequired);
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("token {}", self.token))
            .map_err(|_| ForgeError::AuthFailed("Token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
    }

    /// Build URL for a repository endpoint. An empty `path` addresses the
    /// repository itself.
    fn repo_url(&self, repo: &RepositoryIdentity, path: &str) -> String {
        let base = format!("{}/repos/{}/{}", self.api_base, repo.owner(), repo.repo());
        if path.is_empty() {
            base
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        &self,
        response: Response,
        status: StatusCode,
    ) -> Result<T, ForgeError> {
        // Gitea answers errors with `{"message": ..., "url": ...}`; plain-text
        // bodies come from proxies in front of it.
        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<GiteaErrorResponse>(&text) {
            Ok(err) if !err.message.is_empty() => err.message,
            _ if !text.trim().is_empty() => text.trim().to_string(),
            _ => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed(message),
            StatusCode::FORBIDDEN => ForgeError::Forbidden(message),
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("Gitea server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl Forge for GiteaForge {
    fn name(&self) -> &'static str {
        "gitea"
    }

    async fn get_repo(&self, repo: &RepositoryIdentity) -> Result<Repository, ForgeError> {
        let response = self
            .client
            .get(self.repo_url(repo, ""))
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn list_releases(
        &self,
        repo: &RepositoryIdentity,
        page: u32,
    ) -> Result<Vec<Release>, ForgeError> {
        let response = self
            .client
            .get(self.repo_url(repo, "releases"))
            .headers(self.headers()?)
            .query(&[("page", page)])
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn create_release(
        &self,
        repo: &RepositoryIdentity,
        request: CreateReleaseRequest,
    ) -> Result<Release, ForgeError> {
        let response = self
            .client
            .post(self.repo_url(repo, "releases"))
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn update_release(
        &self,
        repo: &RepositoryIdentity,
        request: UpdateReleaseRequest,
    ) -> Result<Release, ForgeError> {
        let url = self.repo_url(repo, &format!("releases/{}", request.id));

        let response = self
            .client
            .patch(url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn create_release_asset(
        &self,
        repo: &RepositoryIdentity,
        request: UploadAssetRequest,
    ) -> Result<ReleaseAsset, ForgeError> {
        let url = self.repo_url(repo, &format!("releases/{}/assets", request.release_id));

        let part = Part::bytes(request.content)
            .file_name(request.name.clone())
            .mime_str(&request.content_type)
            .map_err(|e| ForgeError::ApiError {
                status: 0,
                message: format!("Invalid content type '{}': {}", request.content_type, e),
            })?;
        let form = Form::new().part(ATTACHMENT_FIELD, part);

        let response = self
            .client
            .post(url)
            .headers(self.headers()?)
            .query(&[("name", request.name.as_str())])
            .multipart(form)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        self.handle_response(response).await
    }
}

/// Gitea error response body.
#[derive(Deserialize)]
struct GiteaErrorResponse {
    #[serde(default)]
    message: String,
}
