//! core::errors
//!
//! User-facing plugin errors.
//!
//! # Design
//!
//! Every fatal condition the pipeline should show to a human carries a
//! stable machine-readable [`ErrorCode`], a one-line message and a longer
//! details paragraph suitable for CI logs. Verification collects several of
//! these into an [`AggregateError`].
//!
//! Messages never contain the token value.
//!
//! # Example
//!
//! ```
//! use gitea_release::core::errors::{ErrorCode, PluginError};
//!
//! let err = PluginError::no_gitea_url();
//! assert_eq!(err.code, ErrorCode::NoGiteaUrl);
//! assert_eq!(err.code.as_str(), "ENOGITEAURL");
//! ```

use std::fmt;

use thiserror::Error;

use super::types::RepositoryIdentity;

/// Stable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidAssets,
    InvalidLabels,
    InvalidAssignees,
    InvalidReleasedLabels,
    InvalidSuccessComment,
    InvalidFailComment,
    InvalidFailTitle,
    InvalidAdditionalNotes,
    InvalidGiteaUrlOption,
    InvalidApiPathPrefix,
    InvalidSkipUnsupportedAssets,
    NoGiteaUrl,
    InvalidGiteaUrl,
    NoGiteaToken,
    InvalidGiteaToken,
    NoPermission,
    MissingRepo,
    ApiError,
}

impl ErrorCode {
    /// The code as printed in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidAssets => "EINVALIDASSETS",
            ErrorCode::InvalidLabels => "EINVALIDLABELS",
            ErrorCode::InvalidAssignees => "EINVALIDASSIGNEES",
            ErrorCode::InvalidReleasedLabels => "EINVALIDRELEASEDLABELS",
            ErrorCode::InvalidSuccessComment => "EINVALIDSUCCESSCOMMENT",
            ErrorCode::InvalidFailComment => "EINVALIDFAILCOMMENT",
            ErrorCode::InvalidFailTitle => "EINVALIDFAILTITLE",
            ErrorCode::InvalidAdditionalNotes => "EINVALIDADDITIONALNOTES",
            ErrorCode::InvalidGiteaUrlOption => "EINVALIDGITEAURLOPTION",
            ErrorCode::InvalidApiPathPrefix => "EINVALIDGITEAAPIPATHPREFIX",
            ErrorCode::InvalidSkipUnsupportedAssets => "EINVALIDSKIPUNSUPPORTEDASSETS",
            ErrorCode::NoGiteaUrl => "ENOGITEAURL",
            ErrorCode::InvalidGiteaUrl => "EINVALIDGITEAURL",
            ErrorCode::NoGiteaToken => "ENOGITEATOKEN",
            ErrorCode::InvalidGiteaToken => "EINVALIDGITEATOKEN",
            ErrorCode::NoPermission => "EGITEANOPERMISSION",
            ErrorCode::MissingRepo => "EMISSINGREPO",
            ErrorCode::ApiError => "EGITEAAPIERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fatal, user-facing plugin error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct PluginError {
    pub code: ErrorCode,
    pub message: String,
    pub details: String,
}

impl PluginError {
    fn new(code: ErrorCode, message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: details.into(),
        }
    }

    /// A configured option has the wrong shape.
    ///
    /// `option` is the user-facing option name; `value` is its rendering.
    pub fn invalid_option(code: ErrorCode, option: &str, expected: &str, value: &str) -> Self {
        Self::new(
            code,
            format!("Invalid `{}` option.", option),
            format!(
                "The `{}` option, if defined, must be {}.\n\nYour configuration for the `{}` option is `{}`.",
                option, expected, option, value
            ),
        )
    }

    pub fn no_gitea_url() -> Self {
        Self::new(
            ErrorCode::NoGiteaUrl,
            "No Gitea URL was provided.",
            "The Gitea URL must be set with the `giteaUrl` option or the `GITEA_URL` environment variable and must be a valid Gitea url.",
        )
    }

    pub fn invalid_gitea_url() -> Self {
        Self::new(
            ErrorCode::InvalidGiteaUrl,
            "The git repository URL is not a valid Gitea URL.",
            "The `repositoryUrl` option must be a valid Git URL with the format `<Gitea_URL>/<owner>/<repo>.git`.\n\nBy default the `repositoryUrl` option is retrieved from the `repository` property of your package manifest or the git origin url of the repository cloned by your CI environment.",
        )
    }

    pub fn no_gitea_token(repo: Option<&RepositoryIdentity>) -> Self {
        Self::new(
            ErrorCode::NoGiteaToken,
            "No Gitea token specified.",
            format!(
                "A Gitea personal token must be created and set in the `GITEA_TOKEN` environment variable on your CI environment.\n\nThe token must allow to push to {}.",
                describe(repo)
            ),
        )
    }

    pub fn invalid_gitea_token(repo: &RepositoryIdentity) -> Self {
        Self::new(
            ErrorCode::InvalidGiteaToken,
            "Invalid Gitea token.",
            format!(
                "The Gitea token configured in the `GITEA_TOKEN` environment variable must be a valid personal token allowing to push to the repository {}.\n\nPlease make sure to set the `GITEA_TOKEN` environment variable in your CI with the exact value of the Gitea personal token.",
                repo
            ),
        )
    }

    pub fn no_permission(repo: &RepositoryIdentity) -> Self {
        Self::new(
            ErrorCode::NoPermission,
            format!(
                "The Gitea token doesn't allow to push on the repository {}.",
                repo
            ),
            format!(
                "The user associated with the Gitea token configured in the `GITEA_TOKEN` environment variable must be allowed to push to the repository {}.\n\nPlease make sure the Gitea user associated with the token is an owner or a collaborator if the repository belongs to a user account or has write permissions if the repository belongs to an organization.",
                repo
            ),
        )
    }

    pub fn missing_repo(repo: &RepositoryIdentity) -> Self {
        Self::new(
            ErrorCode::MissingRepo,
            format!("The repository {} doesn't exist.", repo),
            "The `repositoryUrl` option must refer to your Gitea repository. The repository must be accessible with the Gitea API.\n\nPlease make sure to configure the `giteaUrl` and `giteaApiPathPrefix` options.",
        )
    }

    /// The forge rejected an operation; `message` is what it reported.
    pub fn api_error(message: &str) -> Self {
        Self::new(
            ErrorCode::ApiError,
            "Gitea API reported an error.",
            format!("Gitea API reported the following error: {}.", message),
        )
    }
}

fn describe(repo: Option<&RepositoryIdentity>) -> String {
    match repo {
        Some(r) => format!("the repository {}", r),
        None => "the repository".to_string(),
    }
}

/// Several plugin errors reported together, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateError {
    errors: Vec<PluginError>,
}

impl AggregateError {
    pub fn new(errors: Vec<PluginError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[PluginError] {
        &self.errors
    }

    /// Codes of the contained errors, in order.
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.errors.iter().map(|e| e.code).collect()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

impl std::error::Error for AggregateError {}
