//! engine::assets
//!
//! Asset expansion and upload.
//!
//! # Expansion
//!
//! [`glob_assets`] turns configured [`AssetSpec`]s into concrete files
//! relative to the working directory:
//!
//! - every pattern is globbed; patterns prefixed with `!` exclude matches
//!   of the same spec
//! - a matched directory is replaced by the regular files beneath it
//! - a pattern with no match is kept as written, so the missing file is
//!   reported when uploading
//! - an object spec matching several files yields one entry per file, each
//!   keeping the `label` but with `name` reset to the file's base name
//! - results are de-duplicated by path, first occurrence wins
//!
//! # Upload
//!
//! [`upload_assets`] drives every upload concurrently in the calling task
//! and waits for all of them before inspecting results in configuration
//! order. Unreadable paths and non-files are skipped with a warning. The
//! first forge error in configuration order is returned.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use glob::{glob_with, MatchOptions, Pattern};
use serde_json::Value;
use tracing::debug;

use crate::core::template::render;
use crate::core::types::{AssetSpec, RepositoryIdentity};
use crate::forge::{Forge, ForgeError, ReleaseAsset, UploadAssetRequest};
use crate::ui::logger::Logger;

/// Fallback content type when the extension is unknown.
const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Statuses a forge uses to refuse an attachment it does not accept.
const UNSUPPORTED_ASSET_STATUSES: &[u16] = &[400, 415, 422];

/// One concrete file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Path relative to the working directory, as matched
    pub path: String,
    /// Name template
    pub name: Option<String>,
    /// Label template; wins over `name` as the uploaded display name
    pub label: Option<String>,
}

impl ResolvedAsset {
    fn plain(path: String) -> Self {
        Self {
            path,
            name: None,
            label: None,
        }
    }
}

/// Expand `specs` into concrete files under `cwd`.
pub fn glob_assets(cwd: &Path, specs: &[AssetSpec]) -> Vec<ResolvedAsset> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for spec in specs {
        let paths = expand_patterns(cwd, &spec.patterns());

        let resolved: Vec<ResolvedAsset> = match spec {
            AssetSpec::Detailed { name, label, .. } => {
                if paths.len() == 1 {
                    vec![ResolvedAsset {
                        path: paths[0].clone(),
                        name: name.clone(),
                        label: label.clone(),
                    }]
                } else {
                    paths
                        .into_iter()
                        .map(|path| ResolvedAsset {
                            name: Some(base_name(&path)),
                            label: label.clone(),
                            path,
                        })
                        .collect()
                }
            }
            _ => paths.into_iter().map(ResolvedAsset::plain).collect(),
        };

        for asset in resolved {
            if seen.insert(asset.path.clone()) {
                out.push(asset);
            }
        }
    }

    debug!(assets = ?out, "globbed assets");
    out
}

/// Expand the patterns of one spec.
fn expand_patterns(cwd: &Path, patterns: &[String]) -> Vec<String> {
    let excludes: Vec<Pattern> = patterns
        .iter()
        .filter_map(|p| p.strip_prefix('!'))
        .filter_map(|p| Pattern::new(p).ok())
        .collect();

    let mut out = Vec::new();
    for pattern in patterns.iter().filter(|p| !p.starts_with('!')) {
        let matches = expand_one(cwd, pattern);
        if matches.is_empty() {
            out.push(pattern.clone());
            continue;
        }
        out.extend(
            matches
                .into_iter()
                .filter(|m| !excludes.iter().any(|ex| ex.matches(m))),
        );
    }
    out
}

/// Glob a single pattern, replacing directories by the files beneath them.
fn expand_one(cwd: &Path, pattern: &str) -> Vec<String> {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let Ok(entries) = glob_with(&in_dir(cwd, pattern), options) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for entry in entries.flatten() {
        if entry.is_dir() {
            out.extend(files_under(&entry).into_iter().map(|f| relative(cwd, &f)));
        } else {
            out.push(relative(cwd, &entry));
        }
    }
    out
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    glob_with(&in_dir(dir, "**/*"), MatchOptions::new())
        .map(|paths| paths.flatten().filter(|p| p.is_file()).collect())
        .unwrap_or_default()
}

/// `pattern` anchored at `dir`, with glob metacharacters in `dir` escaped.
fn in_dir(dir: &Path, pattern: &str) -> String {
    if dir.as_os_str().is_empty() {
        return pattern.to_string();
    }
    let dir = Pattern::escape(&dir.to_string_lossy());
    format!("{}/{}", dir.trim_end_matches('/'), pattern)
}

fn relative(cwd: &Path, path: &Path) -> String {
    path.strip_prefix(cwd)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Upload destination and rendering inputs shared by one batch.
pub struct UploadBatch<'a> {
    pub forge: &'a dyn Forge,
    pub repo: &'a RepositoryIdentity,
    pub release_id: u64,
    /// Directory asset paths are relative to
    pub cwd: &'a Path,
    /// Context for `name` / `label` templates
    pub template_context: &'a Value,
    /// Treat 400/415/422 upload rejections as skips
    pub skip_unsupported: bool,
    pub logger: &'a dyn Logger,
}

/// Upload every asset of the batch.
///
/// Returns the uploaded assets in configuration order, skipped ones left
/// out.
///
/// # Errors
///
/// The first forge error in configuration order, after every upload has
/// settled.
pub async fn upload_assets(
    batch: &UploadBatch<'_>,
    assets: &[ResolvedAsset],
) -> Result<Vec<ReleaseAsset>, ForgeError> {
    let results = join_all(assets.iter().map(|asset| upload_one(batch, asset))).await;

    let mut uploaded = Vec::new();
    for result in results {
        if let Some(asset) = result? {
            uploaded.push(asset);
        }
    }
    Ok(uploaded)
}

async fn upload_one(
    batch: &UploadBatch<'_>,
    asset: &ResolvedAsset,
) -> Result<Option<ReleaseAsset>, ForgeError> {
    let full_path = batch.cwd.join(&asset.path);

    let Ok(metadata) = tokio::fs::metadata(&full_path).await else {
        batch.logger.warn(&format!(
            "The asset {} cannot be read, and will be ignored.",
            asset.path
        ));
        return Ok(None);
    };

    if !metadata.is_file() {
        batch.logger.warn(&format!(
            "The asset {} is not a file, and will be ignored.",
            asset.path
        ));
        return Ok(None);
    }

    let Ok(content) = tokio::fs::read(&full_path).await else {
        batch.logger.warn(&format!(
            "The asset {} cannot be read, and will be ignored.",
            asset.path
        ));
        return Ok(None);
    };

    let file_name = match &asset.name {
        Some(template) => render(template, batch.template_context),
        None => base_name(&asset.path),
    };
    let content_type = mime_guess::from_path(&file_name)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    let display_name = match &asset.label {
        Some(label) => render(label, batch.template_context),
        None => file_name,
    };

    debug!(path = %asset.path, name = %display_name, %content_type, "uploading asset");

    let request = UploadAssetRequest {
        release_id: batch.release_id,
        name: display_name.clone(),
        content_type,
        content,
    };

    match batch.forge.create_release_asset(batch.repo, request).await {
        Ok(uploaded) => {
            batch
                .logger
                .log(&format!("Published file {}", uploaded.browser_download_url));
            Ok(Some(uploaded))
        }
        Err(e)
            if batch.skip_unsupported
                && e.status()
                    .is_some_and(|s| UNSUPPORTED_ASSET_STATUSES.contains(&s)) =>
        {
            batch.logger.warn(&format!(
                "The asset {} was rejected by Gitea ({}), and will be ignored.",
                display_name,
                e.forge_message()
            ));
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::{FailOn, MockForge, MockOperation};
    use crate::forge::Release;
    use crate::ui::logger::MemoryLogger;
    use serde_json::json;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("dist/nested")).unwrap();
        fs::write(dir.path().join("dist/app.zip"), b"zip").unwrap();
        fs::write(dir.path().join("dist/app.tar.gz"), b"tgz").unwrap();
        fs::write(dir.path().join("dist/nested/deep.txt"), b"deep").unwrap();
        fs::write(dir.path().join("README.md"), b"# readme").unwrap();
        dir
    }

    fn paths(assets: &[ResolvedAsset]) -> Vec<String> {
        let mut out: Vec<String> = assets.iter().map(|a| a.path.clone()).collect();
        out.sort();
        out
    }

    #[test]
    fn plain_path_matches_itself() {
        let dir = fixture();
        let assets = glob_assets(dir.path(), &[AssetSpec::Path("README.md".into())]);
        assert_eq!(assets, vec![ResolvedAsset::plain("README.md".into())]);
    }

    #[test]
    fn glob_expands_and_excludes() {
        let dir = fixture();
        let assets = glob_assets(
            dir.path(),
            &[AssetSpec::Globs(vec![
                "dist/*.*".into(),
                "!dist/*.zip".into(),
            ])],
        );
        assert_eq!(paths(&assets), vec!["dist/app.tar.gz"]);
    }

    #[test]
    fn directories_expand_to_files() {
        let dir = fixture();
        let assets = glob_assets(dir.path(), &[AssetSpec::Path("dist/nested".into())]);
        assert_eq!(paths(&assets), vec!["dist/nested/deep.txt"]);
    }

    #[test]
    fn unmatched_pattern_is_kept() {
        let dir = fixture();
        let assets = glob_assets(dir.path(), &[AssetSpec::Path("missing.txt".into())]);
        assert_eq!(paths(&assets), vec!["missing.txt"]);
    }

    #[test]
    fn object_with_many_matches_resets_name() {
        let dir = fixture();
        let assets = glob_assets(
            dir.path(),
            &[AssetSpec::Detailed {
                path: crate::core::types::AssetPath::One("dist/app.*".into()),
                name: Some("custom".into()),
                label: Some("Bundle".into()),
            }],
        );
        assert_eq!(assets.len(), 2);
        for asset in &assets {
            assert_eq!(asset.label.as_deref(), Some("Bundle"));
            assert_eq!(asset.name.as_deref(), Some(base_name(&asset.path).as_str()));
        }
    }

    #[test]
    fn object_with_single_match_keeps_name() {
        let dir = fixture();
        let assets = glob_assets(
            dir.path(),
            &[AssetSpec::Detailed {
                path: crate::core::types::AssetPath::One("dist/app.zip".into()),
                name: Some("app-${nextRelease.version}.zip".into()),
                label: None,
            }],
        );
        assert_eq!(assets[0].name.as_deref(), Some("app-${nextRelease.version}.zip"));
    }

    #[test]
    fn duplicates_keep_first() {
        let dir = fixture();
        let assets = glob_assets(
            dir.path(),
            &[
                AssetSpec::Path("README.md".into()),
                AssetSpec::Detailed {
                    path: crate::core::types::AssetPath::One("README.md".into()),
                    name: None,
                    label: Some("Docs".into()),
                },
            ],
        );
        assert_eq!(assets, vec![ResolvedAsset::plain("README.md".into())]);
    }

    fn repo() -> RepositoryIdentity {
        RepositoryIdentity::new("owner", "repo").unwrap()
    }

    fn release() -> Release {
        Release {
            id: 1,
            tag_name: "v1.0.0".into(),
            draft: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn uploads_with_rendered_names_and_mime() {
        let dir = fixture();
        let forge = MockForge::with_releases(vec![release()]);
        let logger = MemoryLogger::new();
        let ctx = json!({"nextRelease": {"version": "1.0.0"}});
        let repo = repo();
        let batch = UploadBatch {
            forge: &forge,
            repo: &repo,
            release_id: 1,
            cwd: dir.path(),
            template_context: &ctx,
            skip_unsupported: false,
            logger: &logger,
        };

        let assets = vec![
            ResolvedAsset {
                path: "dist/app.zip".into(),
                name: Some("app-${nextRelease.version}.zip".into()),
                label: None,
            },
            ResolvedAsset {
                path: "README.md".into(),
                name: None,
                label: Some("Read me v${nextRelease.version}".into()),
            },
        ];

        let uploaded = upload_assets(&batch, &assets).await.unwrap();
        assert_eq!(uploaded.len(), 2);

        let ops = forge.mutations();
        assert!(ops.contains(&MockOperation::UploadAsset {
            release_id: 1,
            name: "app-1.0.0.zip".into(),
            content_type: "application/zip".into(),
            size: 3,
        }));
        assert!(ops.iter().any(|op| matches!(
            op,
            MockOperation::UploadAsset { name, size: 8, .. } if name == "Read me v1.0.0"
        )));
        assert_eq!(logger.infos().len(), 2);
    }

    #[tokio::test]
    async fn missing_and_directory_assets_are_skipped() {
        let dir = fixture();
        let forge = MockForge::with_releases(vec![release()]);
        let logger = MemoryLogger::new();
        let ctx = json!({});
        let repo = repo();
        let batch = UploadBatch {
            forge: &forge,
            repo: &repo,
            release_id: 1,
            cwd: dir.path(),
            template_context: &ctx,
            skip_unsupported: false,
            logger: &logger,
        };

        let assets = vec![
            ResolvedAsset::plain("missing.txt".into()),
            ResolvedAsset::plain("dist".into()),
            ResolvedAsset::plain("README.md".into()),
        ];

        let uploaded = upload_assets(&batch, &assets).await.unwrap();
        assert_eq!(uploaded.len(), 1);
        assert_eq!(
            logger.warnings(),
            vec![
                "The asset missing.txt cannot be read, and will be ignored.",
                "The asset dist is not a file, and will be ignored.",
            ]
        );
    }

    #[tokio::test]
    async fn unknown_extension_falls_back_to_text_plain() {
        let dir = fixture();
        fs::write(dir.path().join("CHANGES"), b"x").unwrap();
        let forge = MockForge::with_releases(vec![release()]);
        let ctx = json!({});
        let repo = repo();
        let batch = UploadBatch {
            forge: &forge,
            repo: &repo,
            release_id: 1,
            cwd: dir.path(),
            template_context: &ctx,
            skip_unsupported: false,
            logger: &MemoryLogger::new(),
        };

        upload_assets(&batch, &[ResolvedAsset::plain("CHANGES".into())])
            .await
            .unwrap();

        assert!(matches!(
            &forge.mutations()[..],
            [MockOperation::UploadAsset { content_type, .. }] if content_type == "text/plain"
        ));
    }

    #[tokio::test]
    async fn forge_error_fails_batch_after_all_attempts() {
        let dir = fixture();
        let forge = MockForge::with_releases(vec![release()]).fail_on(FailOn::UploadAsset {
            name: Some("app.zip".into()),
            error: ForgeError::ApiError {
                status: 500,
                message: "disk full".into(),
            },
        });
        let ctx = json!({});
        let repo = repo();
        let batch = UploadBatch {
            forge: &forge,
            repo: &repo,
            release_id: 1,
            cwd: dir.path(),
            template_context: &ctx,
            skip_unsupported: true,
            logger: &MemoryLogger::new(),
        };

        let assets = vec![
            ResolvedAsset::plain("dist/app.zip".into()),
            ResolvedAsset::plain("README.md".into()),
        ];
        let err = upload_assets(&batch, &assets).await.unwrap_err();

        assert_eq!(err.forge_message(), "disk full");
        assert_eq!(forge.mutations().len(), 2);
    }

    async fn first_failure_of(order: &[&str]) -> (String, usize) {
        let dir = fixture();
        let forge = MockForge::with_releases(vec![release()])
            .fail_upload("README.md", ForgeError::ApiError {
                status: 500,
                message: "readme rejected".into(),
            })
            .fail_upload("app.zip", ForgeError::ApiError {
                status: 500,
                message: "zip rejected".into(),
            });
        let ctx = json!({});
        let repo = repo();
        let batch = UploadBatch {
            forge: &forge,
            repo: &repo,
            release_id: 1,
            cwd: dir.path(),
            template_context: &ctx,
            skip_unsupported: false,
            logger: &MemoryLogger::new(),
        };

        let assets: Vec<ResolvedAsset> = order
            .iter()
            .map(|p| ResolvedAsset::plain(p.to_string()))
            .collect();
        let err = upload_assets(&batch, &assets).await.unwrap_err();
        (err.forge_message(), forge.mutations().len())
    }

    #[tokio::test]
    async fn first_failure_in_configuration_order_wins() {
        let (message, attempts) =
            first_failure_of(&["README.md", "dist/app.zip", "dist/app.tar.gz"]).await;
        assert_eq!(message, "readme rejected");
        assert_eq!(attempts, 3);

        let (message, attempts) =
            first_failure_of(&["dist/app.tar.gz", "dist/app.zip", "README.md"]).await;
        assert_eq!(message, "zip rejected");
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn skip_unsupported_turns_rejection_into_warning() {
        let dir = fixture();
        let forge = MockForge::with_releases(vec![release()]).fail_on(FailOn::UploadAsset {
            name: None,
            error: ForgeError::ApiError {
                status: 400,
                message: "unsupported file type".into(),
            },
        });
        let logger = MemoryLogger::new();
        let ctx = json!({});
        let repo = repo();
        let batch = UploadBatch {
            forge: &forge,
            repo: &repo,
            release_id: 1,
            cwd: dir.path(),
            template_context: &ctx,
            skip_unsupported: true,
            logger: &logger,
        };

        let uploaded = upload_assets(&batch, &[ResolvedAsset::plain("README.md".into())])
            .await
            .unwrap();

        assert!(uploaded.is_empty());
        assert_eq!(logger.warnings().len(), 1);
        assert!(logger.warnings()[0].contains("unsupported file type"));
    }
}
