//! core::config::schema
//!
//! Shape rules for plugin options.
//!
//! # Validation
//!
//! Options arrive as untyped JSON/TOML values. Each recognized option has a
//! predicate over [`serde_json::Value`] and the error code reported when the
//! predicate fails. [`validate_options`] walks the table once, in table
//! order, and returns one error per violated option. Unset (`null`) options
//! are never checked.

use serde_json::Value;

use crate::core::errors::{ErrorCode, PluginError};

/// One row of the validation table.
pub struct OptionRule {
    /// snake_case key in the resolved option map
    pub key: &'static str,
    /// camelCase name shown to users
    pub display: &'static str,
    /// Human description of the accepted shape
    pub expected: &'static str,
    pub code: ErrorCode,
    pub check: fn(&Value) -> bool,
}

/// Rules for every validated option, in reporting order.
pub const OPTION_RULES: &[OptionRule] = &[
    OptionRule {
        key: "assets",
        display: "assets",
        expected: "an `Array` of `Strings`, `Arrays of Strings` or `Objects` with a `path` property",
        code: ErrorCode::InvalidAssets,
        check: is_asset_list,
    },
    OptionRule {
        key: "labels",
        display: "labels",
        expected: "a `String`, an `Array` of non-empty `Strings` or `false`",
        code: ErrorCode::InvalidLabels,
        check: is_string_list_or_false,
    },
    OptionRule {
        key: "assignees",
        display: "assignees",
        expected: "a `String` or an `Array` of non-empty `Strings`",
        code: ErrorCode::InvalidAssignees,
        check: is_string_or_string_list,
    },
    OptionRule {
        key: "released_labels",
        display: "releasedLabels",
        expected: "a `String`, an `Array` of non-empty `Strings` or `false`",
        code: ErrorCode::InvalidReleasedLabels,
        check: is_string_list_or_false,
    },
    OptionRule {
        key: "success_comment",
        display: "successComment",
        expected: "a `String` or `false`",
        code: ErrorCode::InvalidSuccessComment,
        check: is_string_or_false,
    },
    OptionRule {
        key: "fail_comment",
        display: "failComment",
        expected: "a `String` or `false`",
        code: ErrorCode::InvalidFailComment,
        check: is_string_or_false,
    },
    OptionRule {
        key: "fail_title",
        display: "failTitle",
        expected: "a non-empty `String`",
        code: ErrorCode::InvalidFailTitle,
        check: is_non_empty_string,
    },
    OptionRule {
        key: "additional_notes",
        display: "additionalNotes",
        expected: "a `String`",
        code: ErrorCode::InvalidAdditionalNotes,
        check: Value::is_string,
    },
    OptionRule {
        key: "gitea_url",
        display: "giteaUrl",
        expected: "a `String`",
        code: ErrorCode::InvalidGiteaUrlOption,
        check: Value::is_string,
    },
    OptionRule {
        key: "gitea_api_path_prefix",
        display: "giteaApiPathPrefix",
        expected: "a `String`",
        code: ErrorCode::InvalidApiPathPrefix,
        check: Value::is_string,
    },
    OptionRule {
        key: "skip_unsupported_assets",
        display: "skipUnsupportedAssets",
        expected: "a `Boolean`",
        code: ErrorCode::InvalidSkipUnsupportedAssets,
        check: Value::is_boolean,
    },
];

/// Check every configured option against [`OPTION_RULES`].
///
/// `lookup` returns the resolved value for a snake_case key, or `None` when
/// the option is unset.
pub fn validate_options<'a>(lookup: impl Fn(&str) -> Option<&'a Value>) -> Vec<PluginError> {
    OPTION_RULES
        .iter()
        .filter_map(|rule| {
            let value = lookup(rule.key).filter(|v| !v.is_null())?;
            if (rule.check)(value) {
                None
            } else {
                Some(PluginError::invalid_option(
                    rule.code,
                    rule.display,
                    rule.expected,
                    &value.to_string(),
                ))
            }
        })
        .collect()
}

fn is_non_empty_string(value: &Value) -> bool {
    value.as_str().is_some_and(|s| !s.trim().is_empty())
}

fn is_string_or_string_list(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty() && items.iter().all(is_non_empty_string),
        other => is_non_empty_string(other),
    }
}

fn is_string_list_or_false(value: &Value) -> bool {
    value == &Value::Bool(false) || is_string_or_string_list(value)
}

fn is_string_or_false(value: &Value) -> bool {
    value == &Value::Bool(false) || value.is_string()
}

fn is_asset(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.get("path").is_some_and(is_string_or_string_list),
        other => is_string_or_string_list(other),
    }
}

fn is_asset_list(value: &Value) -> bool {
    value.as_array().is_some_and(|items| items.iter().all(is_asset))
}
