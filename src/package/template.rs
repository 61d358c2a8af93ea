//! `{{key}}` placeholder substitution for `--set key=value` parameters.
//!
//! Keys may be dot paths (`owner.name=John`), which nest into an object
//! tree. A placeholder with no matching parameter is left in the output
//! untouched.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// Build the parameter tree from `key=value` pairs.
///
/// The value is everything after the first `=`. A later pair with an empty
/// value does not clear an earlier one.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for a pair without `=` or with an empty key.
pub fn parse_params<S: AsRef<str>>(pairs: &[S]) -> Result<Value> {
    let mut root = Map::new();

    for pair in pairs {
        let pair = pair.as_ref();
        let Some((key, value)) = pair.split_once('=') else {
            return Err(Error::InvalidArgument(format!(
                "--set expects key=value, got '{pair}'"
            )));
        };
        let key = key.trim();
        if key.is_empty() || key.split('.').any(str::is_empty) {
            return Err(Error::InvalidArgument(format!("--set has an invalid key in '{pair}'")));
        }
        if value.is_empty() && lookup_in(&root, key).is_some() {
            continue;
        }
        insert_path(&mut root, key, Value::String(value.to_string()));
    }

    Ok(Value::Object(root))
}

fn insert_path(root: &mut Map<String, Value>, key: &str, value: Value) {
    let mut segments = key.split('.').peekable();
    let mut node = root;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            node.insert(segment.to_string(), value);
            return;
        }
        let child = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        let Value::Object(next) = child else { return };
        node = next;
    }
}

fn lookup_in<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let first = root.get(segments.next()?)?;
    segments.try_fold(first, |node, segment| node.get(segment))
}

fn lookup<'a>(params: &'a Value, key: &str) -> Option<&'a Value> {
    params.as_object().and_then(|root| lookup_in(root, key))
}

/// Substitute placeholders in a raw JSON template.
///
/// String values are inserted JSON-escaped (without quotes) so they stay
/// valid inside a string literal; other values are inserted as JSON.
#[must_use]
pub fn render_template(template: &str, params: &Value) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match lookup(params, &caps[1]) {
            Some(Value::String(s)) => {
                let quoted = Value::String(s.clone()).to_string();
                quoted[1..quoted.len() - 1].to_string()
            }
            Some(Value::Object(_)) | None => caps[0].to_string(),
            Some(other) => other.to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_params_nests_dot_paths() {
        let params = parse_params(&["owner.name=John", "owner.team=sre", "env=prod"]).unwrap();
        assert_eq!(params, json!({"owner": {"name": "John", "team": "sre"}, "env": "prod"}));
    }

    #[test]
    fn test_parse_params_splits_on_first_equals() {
        let params = parse_params(&["query=a=b"]).unwrap();
        assert_eq!(params["query"], "a=b");
    }

    #[test]
    fn test_parse_params_rejects_bad_pairs() {
        assert!(parse_params(&["novalue"]).is_err());
        assert!(parse_params(&["=x"]).is_err());
        assert!(parse_params(&["a..b=x"]).is_err());
    }

    #[test]
    fn test_empty_value_keeps_earlier() {
        let params = parse_params(&["env=prod", "env="]).unwrap();
        assert_eq!(params["env"], "prod");
    }

    #[test]
    fn test_render_keeps_unresolved_placeholders() {
        let params = parse_params(&["owner.name=John"]).unwrap();
        let out = render_template(
            r#"{"title": "{{ owner.name }}'s view", "zone": "{{zone}}", "owner": "{{owner}}"}"#,
            &params,
        );
        assert_eq!(
            out,
            r#"{"title": "John's view", "zone": "{{zone}}", "owner": "{{owner}}"}"#
        );
    }

    #[test]
    fn test_render_escapes_strings() {
        let params = parse_params(&[r#"label=say "hi""#]).unwrap();
        let out = render_template(r#"{"label": "{{label}}"}"#, &params);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["label"], r#"say "hi""#);
    }
}
