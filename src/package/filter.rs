//! Narrowing remote element lists by include conditions.

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use super::include::split_condition;
use super::sanitize::id_string;
use super::types::ElementKind;

/// Keep the items that satisfy every condition.
///
/// If the conditions contain any `id=` selection, those ids are looked up
/// by exact equality instead (one match per id, in condition order) and the
/// other conditions are ignored. Empty conditions keep everything.
#[must_use]
pub fn filter_elements_by(kind: ElementKind, items: &[Value], conditions: &[String]) -> Vec<Value> {
    let ids: Vec<&str> = conditions
        .iter()
        .filter_map(|c| split_condition(c))
        .filter(|(key, _)| key.eq_ignore_ascii_case("id"))
        .map(|(_, value)| value)
        .collect();

    if !ids.is_empty() {
        return ids
            .into_iter()
            .filter_map(|id| find_by_id(items, id).cloned())
            .collect();
    }

    let parsed: Vec<(String, &str)> = conditions
        .iter()
        .map(|c| match split_condition(c) {
            Some((key, value)) => (key.to_ascii_lowercase(), value),
            None => (c.trim().to_ascii_lowercase(), ""),
        })
        .collect();

    items
        .iter()
        .filter(|item| {
            parsed
                .iter()
                .all(|(key, value)| matches_condition(kind, item, key, value))
        })
        .cloned()
        .collect()
}

/// Find an element by exact id.
#[must_use]
pub fn find_by_id<'a>(items: &'a [Value], id: &str) -> Option<&'a Value> {
    items.iter().find(|item| id_string(item) == id)
}

/// Test one `key=value` condition against an element. Unknown keys never match.
#[must_use]
pub fn matches_condition(kind: ElementKind, item: &Value, key: &str, value: &str) -> bool {
    match (kind, key) {
        (ElementKind::Dashboard, "title") => regex_match(value, str_field(item, "title")),
        (ElementKind::Dashboard, "ownerid") => regex_match(value, str_field(item, "ownerId")),
        (ElementKind::Dashboard, "annotation") => item
            .get("annotations")
            .and_then(Value::as_array)
            .is_some_and(|a| a.iter().any(|v| v.as_str() == Some(value))),

        (ElementKind::Event | ElementKind::SmartAlert, "name" | "title") => {
            regex_match(value, str_field(item, "name"))
        }

        (ElementKind::Entity, "name" | "title") => {
            let field = item
                .get("name")
                .and_then(Value::as_str)
                .or_else(|| entity_label(item));
            regex_match(value, field)
        }
        (ElementKind::Entity, "label") => regex_match(value, entity_label(item)),

        _ => false,
    }
}

/// `data.label` of an entity.
#[must_use]
pub fn entity_label(item: &Value) -> Option<&str> {
    item.get("data")
        .and_then(|d| d.get("label"))
        .and_then(Value::as_str)
}

fn str_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str)
}

fn regex_match(pattern: &str, field: Option<&str>) -> bool {
    condition_regex(pattern).is_some_and(|re| re.is_match(field.unwrap_or_default()))
}

/// Case-insensitive regex for a condition value.
///
/// A value that is not a valid expression is matched literally.
fn condition_regex(pattern: &str) -> Option<Regex> {
    let build = |p: &str| RegexBuilder::new(p).case_insensitive(true).build();
    build(pattern).or_else(|_| build(&regex::escape(pattern))).ok()
}
