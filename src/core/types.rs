//! core::types
//!
//! Domain types shared by the lifecycle hooks.
//!
//! # Types
//!
//! - [`RepositoryIdentity`] - `{owner, repo}` pair, never empty
//! - [`NextRelease`] / [`BranchInfo`] - what the pipeline hands us
//! - [`ReleaseDescriptor`] - the release we want the forge to hold
//! - [`AssetSpec`] - one configured asset entry
//! - [`PipelineContext`] - everything a hook receives besides plugin options
//! - [`PublishResult`] - what a hook hands back

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Fixed label reported next to the release URL.
pub const RELEASE_NAME: &str = "Gitea release";

/// A validated `{owner, repo}` pair.
///
/// Both fields are non-empty; the only way to build one is
/// [`RepositoryIdentity::new`], which refuses empty parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryIdentity {
    owner: String,
    repo: String,
}

impl RepositoryIdentity {
    /// Build an identity, or `None` if either part is blank.
    ///
    /// # Example
    ///
    /// ```
    /// use gitea_release::core::types::RepositoryIdentity;
    ///
    /// let id = RepositoryIdentity::new("octo", "widgets").unwrap();
    /// assert_eq!(id.to_string(), "octo/widgets");
    /// assert!(RepositoryIdentity::new("", "widgets").is_none());
    /// ```
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Option<Self> {
        let owner = owner.into();
        let repo = repo.into();
        if owner.trim().is_empty() || repo.trim().is_empty() {
            return None;
        }
        Some(Self { owner, repo })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// The release computed by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRelease {
    /// Human-readable release name
    #[serde(default)]
    pub name: String,
    /// Tag the release points at
    pub git_tag: String,
    /// Release notes (markdown)
    #[serde(default)]
    pub notes: String,
    /// Bare version, e.g. `1.0.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Distribution channel, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

/// Kind of branch the release is cut from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchType {
    #[default]
    Release,
    Prerelease,
    Maintenance,
}

/// Branch metadata from the pipeline.
///
/// A branch that does not say otherwise is the main release branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub branch_type: BranchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default = "default_main")]
    pub main: bool,
}

fn default_main() -> bool {
    true
}

impl Default for BranchInfo {
    fn default() -> Self {
        Self {
            name: None,
            branch_type: BranchType::default(),
            channel: None,
            main: default_main(),
        }
    }
}

impl BranchInfo {
    /// Whether releases from this branch are prereleases.
    ///
    /// Prerelease branches always are; release branches are unless they
    /// are the main release branch. Maintenance branches never are.
    pub fn is_prerelease(&self) -> bool {
        match self.branch_type {
            BranchType::Prerelease => true,
            BranchType::Release => !self.main,
            BranchType::Maintenance => false,
        }
    }
}

/// The release object this run wants to exist on the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub prerelease: bool,
}

impl ReleaseDescriptor {
    /// Build the descriptor for `next` cut from `branch`.
    pub fn new(next: &NextRelease, branch: &BranchInfo) -> Self {
        Self {
            tag_name: next.git_tag.clone(),
            name: next.name.clone(),
            body: next.notes.clone(),
            prerelease: branch.is_prerelease(),
        }
    }
}

/// Path part of an object-shaped asset: one glob or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetPath {
    One(String),
    Many(Vec<String>),
}

impl AssetPath {
    /// The glob patterns, in order.
    pub fn patterns(&self) -> Vec<String> {
        match self {
            AssetPath::One(p) => vec![p.clone()],
            AssetPath::Many(ps) => ps.clone(),
        }
    }
}

/// One configured asset.
///
/// # Example
///
/// ```toml
/// assets = [
///   "dist/*.tar.gz",
///   ["build/*.zip", "!build/debug.zip"],
///   { path = "target/app", name = "app-${nextRelease.version}", label = "App binary" },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetSpec {
    /// A single path or glob
    Path(String),
    /// Several globs expanded together
    Globs(Vec<String>),
    /// Path(s) with a templated display name and label
    Detailed {
        path: AssetPath,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl AssetSpec {
    /// The glob patterns this spec expands.
    pub fn patterns(&self) -> Vec<String> {
        match self {
            AssetSpec::Path(p) => vec![p.clone()],
            AssetSpec::Globs(ps) => ps.clone(),
            AssetSpec::Detailed { path, .. } => path.patterns(),
        }
    }
}

/// Options the pipeline was started with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOptions {
    /// URL of the repository being released
    #[serde(default)]
    pub repository_url: String,
    /// Publish-step plugin entries, as raw configuration
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub publish: Vec<serde_json::Value>,
}

/// Everything a lifecycle hook receives besides its own options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineContext {
    /// Directory relative asset paths resolve against
    #[serde(default)]
    pub cwd: PathBuf,
    /// Environment the pipeline runs in
    #[serde(default, skip_serializing)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub options: PipelineOptions,
    /// Branch being released; required so the prerelease flag is never
    /// guessed
    pub branch: BranchInfo,
    pub next_release: NextRelease,
}

impl PipelineContext {
    /// Template context for asset names and labels.
    ///
    /// Keys are camelCase (`nextRelease.version`, `branch.channel`). The
    /// environment is left out so tokens never end up in asset names.
    pub fn template_context(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Result of a publish or add-channel hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    /// Public URL of the release
    pub url: String,
    /// Always [`RELEASE_NAME`]
    pub name: String,
}

impl PublishResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: RELEASE_NAME.to_string(),
        }
    }
}
