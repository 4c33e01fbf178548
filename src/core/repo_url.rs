//! core::repo_url
//!
//! Extract `{owner, repo}` from a repository URL.
//!
//! Supported forms:
//! - `https://gitea.example.com/owner/repo.git` (any host, optional port and
//!   sub-path, `http`, `git+https` and `git+ssh` schemes too)
//! - `ssh://git@gitea.example.com:2222/owner/repo.git`
//! - `git@gitea.example.com:owner/repo.git` (scp-like)
//! - `owner/repo` shorthand
//!
//! The owner is the second-to-last path segment and the repo the last one,
//! with a trailing `.git` removed.

use url::Url;

use super::types::RepositoryIdentity;

/// Parse a repository URL into its identity.
///
/// Returns `None` when the URL has fewer than two path segments.
///
/// # Example
///
/// ```
/// use gitea_release::core::repo_url::parse_repository_url;
///
/// let id = parse_repository_url("git@gitea.io:octo/widgets.git").unwrap();
/// assert_eq!(id.owner(), "octo");
/// assert_eq!(id.repo(), "widgets");
/// ```
pub fn parse_repository_url(url: &str) -> Option<RepositoryIdentity> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    let path = if url.contains("://") {
        let parsed = Url::parse(url).ok()?;
        parsed.path().to_string()
    } else if let Some((host, path)) = split_scp_like(url) {
        if host.is_empty() {
            return None;
        }
        path.to_string()
    } else {
        // owner/repo shorthand: exactly two segments
        let segments: Vec<&str> = url.split('/').collect();
        if segments.len() != 2 {
            return None;
        }
        url.to_string()
    };

    owner_and_repo(&path)
}

/// Split `user@host:path` into host and path.
fn split_scp_like(url: &str) -> Option<(&str, &str)> {
    let (before, path) = url.split_once(':')?;
    let host = before.rsplit('@').next().unwrap_or(before);
    if host.contains('/') {
        return None;
    }
    Some((host, path))
}

fn owner_and_repo(path: &str) -> Option<RepositoryIdentity> {
    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    if segments.len() < 2 {
        return None;
    }

    let repo = segments[segments.len() - 1];
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    let owner = segments[segments.len() - 2];

    RepositoryIdentity::new(owner, repo)
}
