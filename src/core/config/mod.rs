//! core::config
//!
//! Plugin options and their resolution against the environment.
//!
//! # Overview
//!
//! A [`PluginConfig`] holds the options the user wrote for this plugin, as
//! untyped values so that badly shaped options can be reported instead of
//! failing deserialization. [`PluginConfig::resolve`] merges them with
//! environment defaults into an immutable [`ResolvedConfig`].
//!
//! # Precedence
//!
//! | value | option | environment | default |
//! |---|---|---|---|
//! | base URL | `giteaUrl` | `GITEA_URL` | none |
//! | API prefix | `giteaApiPathPrefix` | `GITEA_PREFIX` | `/api/v1` |
//! | token | n/a | `GITEA_TOKEN` | none |
//! | skip unsupported assets | `skipUnsupportedAssets` | `GITEA_SKIP_UNSUPPORTED_ASSETS` | `false` |
//!
//! Option keys are accepted in camelCase or snake_case.
//!
//! # Example
//!
//! ```
//! use gitea_release::core::config::PluginConfig;
//! use std::collections::HashMap;
//!
//! let config = PluginConfig::from_value(serde_json::json!({
//!     "giteaUrl": "https://gitea.example.com",
//!     "assets": "dist/*.tar.gz"
//! }))
//! .unwrap();
//!
//! let env = HashMap::from([("GITEA_TOKEN".to_string(), "secret".to_string())]);
//! let resolved = config.resolve(&env);
//! assert_eq!(resolved.api_base().unwrap(), "https://gitea.example.com/api/v1");
//! assert_eq!(resolved.assets().unwrap().len(), 1);
//! ```

pub mod schema;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use super::errors::{ErrorCode, PluginError};
use super::types::AssetSpec;

/// Default API path prefix of a Gitea instance.
pub const DEFAULT_API_PATH_PREFIX: &str = "/api/v1";

/// Names this plugin may be registered under in a pipeline's `publish` list.
pub const PLUGIN_NAMES: &[&str] = &["gitea-release", "@saithodev/semantic-release-gitea"];

/// Options inherited from the plugin's own `publish` entry when unset.
const INHERITED_OPTIONS: &[&str] = &["assets", "labels", "assignees"];

/// Errors from loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Options as written by the user.
///
/// Keys are normalized to snake_case on construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginConfig {
    options: Map<String, Value>,
}

impl PluginConfig {
    /// Build from a JSON object.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` if `value` is neither an object nor null.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => Ok(Self {
                options: map
                    .into_iter()
                    .map(|(k, v)| (normalize_key(&k), v))
                    .collect(),
            }),
            other => Err(ConfigError::InvalidValue(format!(
                "plugin options must be an object, got {}",
                other
            ))),
        }
    }

    /// Load options from a `.json` or `.toml` file.
    ///
    /// The format is picked from the extension; anything but `.toml` is
    /// read as JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        let value: Value = if is_toml {
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        Self::from_value(value)
    }

    /// Raw value of an option (snake_case key).
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key).filter(|v| !v.is_null())
    }

    /// Set an option, normalizing the key.
    pub fn set(&mut self, key: &str, value: Value) {
        self.options.insert(normalize_key(key), value);
    }

    /// Fill `assets`, `labels` and `assignees` from this plugin's entry in
    /// the pipeline's `publish` list, where not already set.
    pub fn inherit_from_publish(&mut self, publish: &[Value]) {
        let entry = publish.iter().find_map(|p| {
            let map = p.as_object()?;
            let path = map.get("path")?.as_str()?;
            PLUGIN_NAMES.contains(&path).then_some(map)
        });

        let Some(entry) = entry else {
            return;
        };

        for key in INHERITED_OPTIONS {
            if self.get(key).is_some() {
                continue;
            }
            if let Some(value) = entry.get(*key).filter(|v| !v.is_null()) {
                self.options.insert((*key).to_string(), value.clone());
            }
        }
    }

    /// Merge with the environment into a [`ResolvedConfig`].
    pub fn resolve(&self, env: &HashMap<String, String>) -> ResolvedConfig {
        let env_var = |key: &str| env.get(key).filter(|v| !v.is_empty()).cloned();
        let option_str = |key: &str| {
            self.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let gitea_url = option_str("gitea_url").or_else(|| env_var("GITEA_URL"));
        let api_path_prefix = option_str("gitea_api_path_prefix")
            .or_else(|| env_var("GITEA_PREFIX"))
            .unwrap_or_else(|| DEFAULT_API_PATH_PREFIX.to_string());

        let skip_unsupported_assets = self
            .get("skip_unsupported_assets")
            .and_then(Value::as_bool)
            .unwrap_or(false)
            || env_var("GITEA_SKIP_UNSUPPORTED_ASSETS").is_some();

        let mut options = Map::new();
        for rule in schema::OPTION_RULES {
            if let Some(value) = self.get(rule.key) {
                let value = if rule.key == "assets" {
                    cast_array(value.clone())
                } else {
                    value.clone()
                };
                options.insert(rule.key.to_string(), value);
            }
        }

        ResolvedConfig {
            gitea_token: env_var("GITEA_TOKEN"),
            gitea_url,
            api_path_prefix,
            skip_unsupported_assets,
            options,
        }
    }
}

/// Configuration after merging options with the environment.
#[derive(Clone, PartialEq)]
pub struct ResolvedConfig {
    pub gitea_token: Option<String>,
    pub gitea_url: Option<String>,
    pub api_path_prefix: String,
    pub skip_unsupported_assets: bool,
    /// Validated options (assets, labels, ...) keyed by snake_case name
    options: Map<String, Value>,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("has_token", &self.gitea_token.is_some())
            .field("gitea_url", &self.gitea_url)
            .field("api_path_prefix", &self.api_path_prefix)
            .field("skip_unsupported_assets", &self.skip_unsupported_assets)
            .field("options", &self.options)
            .finish()
    }
}

impl ResolvedConfig {
    /// Check every option against its shape rule.
    pub fn validate(&self) -> Vec<PluginError> {
        schema::validate_options(|key| self.options.get(key))
    }

    /// Base URL of the API: the Gitea URL joined with the path prefix.
    pub fn api_base(&self) -> Option<String> {
        self.gitea_url
            .as_deref()
            .map(|url| join_url(url, &self.api_path_prefix))
    }

    /// Configured assets, typed.
    ///
    /// # Errors
    ///
    /// An `EINVALIDASSETS` error if the option has the wrong shape.
    pub fn assets(&self) -> Result<Vec<AssetSpec>, PluginError> {
        let Some(value) = self.options.get("assets") else {
            return Ok(Vec::new());
        };

        let invalid = || {
            PluginError::invalid_option(
                ErrorCode::InvalidAssets,
                "assets",
                "an `Array` of `Strings`, `Arrays of Strings` or `Objects` with a `path` property",
                &value.to_string(),
            )
        };

        if schema::validate_options(|key| (key == "assets").then_some(value))
            .iter()
            .any(|e| e.code == ErrorCode::InvalidAssets)
        {
            return Err(invalid());
        }

        serde_json::from_value(value.clone()).map_err(|_| invalid())
    }
}

/// Join a base URL and a path with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// Wrap a non-array value in a one-element array.
fn cast_array(value: Value) -> Value {
    match value {
        Value::Array(_) => value,
        other => Value::Array(vec![other]),
    }
}

/// `giteaApiPathPrefix` -> `gitea_api_path_prefix`; snake_case stays as is.
fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else if c == '-' {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn normalize_key_handles_both_cases() {
        assert_eq!(normalize_key("giteaApiPathPrefix"), "gitea_api_path_prefix");
        assert_eq!(normalize_key("gitea_url"), "gitea_url");
        assert_eq!(normalize_key("skip-unsupported-assets"), "skip_unsupported_assets");
    }

    #[test]
    fn resolves_from_environment() {
        let config = PluginConfig::default();
        let resolved = config.resolve(&env(&[
            ("GITEA_URL", "https://gitea.io"),
            ("GITEA_TOKEN", "gitea_token"),
            ("GITEA_PREFIX", "/prefix"),
        ]));

        assert_eq!(resolved.gitea_url.as_deref(), Some("https://gitea.io"));
        assert_eq!(resolved.gitea_token.as_deref(), Some("gitea_token"));
        assert_eq!(resolved.api_base().unwrap(), "https://gitea.io/prefix");
        assert!(!resolved.skip_unsupported_assets);
    }

    #[test]
    fn options_override_environment() {
        let config = PluginConfig::from_value(json!({
            "giteaUrl": "https://other.example.com/",
            "giteaApiPathPrefix": "api/v2"
        }))
        .unwrap();
        let resolved = config.resolve(&env(&[("GITEA_URL", "https://gitea.io")]));

        assert_eq!(
            resolved.api_base().unwrap(),
            "https://other.example.com/api/v2"
        );
    }

    #[test]
    fn default_prefix() {
        let resolved = PluginConfig::default().resolve(&env(&[("GITEA_URL", "https://gitea.io")]));
        assert_eq!(resolved.api_path_prefix, DEFAULT_API_PATH_PREFIX);
        assert_eq!(resolved.api_base().unwrap(), "https://gitea.io/api/v1");
    }

    #[test]
    fn token_never_comes_from_options() {
        let config = PluginConfig::from_value(json!({"giteaToken": "nope"})).unwrap();
        assert!(config.resolve(&HashMap::new()).gitea_token.is_none());
    }

    #[test]
    fn skip_unsupported_assets_from_option_or_env() {
        let config = PluginConfig::from_value(json!({"skipUnsupportedAssets": true})).unwrap();
        assert!(config.resolve(&HashMap::new()).skip_unsupported_assets);

        let resolved =
            PluginConfig::default().resolve(&env(&[("GITEA_SKIP_UNSUPPORTED_ASSETS", "1")]));
        assert!(resolved.skip_unsupported_assets);
    }

    #[test]
    fn single_asset_is_wrapped() {
        let config = PluginConfig::from_value(json!({"assets": {"path": "a.txt"}})).unwrap();
        let resolved = config.resolve(&HashMap::new());
        let assets = resolved.assets().unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].patterns(), vec!["a.txt"]);
    }

    #[test]
    fn invalid_assets_are_reported() {
        let config = PluginConfig::from_value(json!({"assets": 42})).unwrap();
        let resolved = config.resolve(&HashMap::new());
        let errors = resolved.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::InvalidAssets);
        assert!(resolved.assets().is_err());
    }

    #[test]
    fn inherits_from_publish_entry() {
        let mut config = PluginConfig::from_value(json!({"labels": ["mine"]})).unwrap();
        config.inherit_from_publish(&[
            json!("@semantic-release/npm"),
            json!({"path": "gitea-release", "assets": ["dist/*"], "labels": ["theirs"], "assignees": "bob"}),
        ]);

        assert_eq!(config.get("assets"), Some(&json!(["dist/*"])));
        assert_eq!(config.get("labels"), Some(&json!(["mine"])));
        assert_eq!(config.get("assignees"), Some(&json!("bob")));
    }

    #[test]
    fn ignores_other_publish_entries() {
        let mut config = PluginConfig::default();
        config.inherit_from_publish(&[json!({"path": "@semantic-release/github", "assets": ["x"]})]);
        assert!(config.get("assets").is_none());
    }

    #[test]
    fn rejects_non_object_options() {
        assert!(PluginConfig::from_value(json!([1, 2])).is_err());
        assert!(PluginConfig::from_value(Value::Null).is_ok());
    }

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("release.toml");
        fs::write(
            &path,
            "giteaUrl = \"https://gitea.io\"\nassets = [\"dist/*.zip\"]\n",
        )
        .unwrap();

        let config = PluginConfig::load(&path).unwrap();
        assert_eq!(config.get("gitea_url"), Some(&json!("https://gitea.io")));
        assert_eq!(config.get("assets"), Some(&json!(["dist/*.zip"])));
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("release.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            PluginConfig::load(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn debug_redacts_token() {
        let resolved = PluginConfig::default().resolve(&env(&[("GITEA_TOKEN", "secret_abc")]));
        let debug = format!("{:?}", resolved);
        assert!(!debug.contains("secret_abc"));
        assert!(debug.contains("has_token"));
    }

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("https://g.io/", "/api/v1/"), "https://g.io/api/v1");
        assert_eq!(join_url("https://g.io", ""), "https://g.io");
    }
}
