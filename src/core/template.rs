//! core::template
//!
//! String interpolation for asset names and labels.
//!
//! # Syntax
//!
//! - `${path.to.value}` is replaced by the value at that dotted path in the
//!   context. Strings render as-is, numbers and booleans via `Display`,
//!   anything missing or `null` renders as the empty string, and arrays or
//!   objects render as compact JSON.
//! - `$${` renders a literal `${`.
//! - An unterminated `${` is copied through unchanged.
//!
//! Rendering is pure: no lookups beyond the supplied value, no side effects.

use serde_json::Value;

/// Render `template` against `context`.
///
/// # Example
///
/// ```
/// use gitea_release::core::template::render;
/// use serde_json::json;
///
/// let ctx = json!({"nextRelease": {"version": "1.0.0"}});
/// assert_eq!(
///     render("my-software-v${nextRelease.version}.tar.gz", &ctx),
///     "my-software-v1.0.0.tar.gz"
/// );
/// ```
pub fn render(template: &str, context: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("$${") {
            out.push_str("${");
            rest = after;
        } else if let Some(after) = tail.strip_prefix("${") {
            match after.find('}') {
                Some(end) => {
                    out.push_str(&lookup(context, after[..end].trim()));
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        } else {
            out.push('$');
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    out
}

fn lookup(context: &Value, path: &str) -> String {
    let mut current = context;
    for key in path.split('.') {
        let next = match current {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(v) => current = v,
            None => return String::new(),
        }
    }

    match current {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
