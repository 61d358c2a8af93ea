//! File-system-safe titles with deterministic de-duplication.

use std::collections::HashSet;

use serde_json::Value;

/// Lowercase `name` and replace anything outside `[a-z0-9-_]` with `_`.
///
/// Empty input becomes `untitled`. Idempotent.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    if name.is_empty() {
        return "untitled".to_string();
    }

    name.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Display string for an element: `title`, then `name`, then `<prefix>-<id>`.
#[must_use]
pub fn display_title(item: &Value, fallback_prefix: &str) -> String {
    ["title", "name"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .map_or_else(
            || format!("{fallback_prefix}-{}", id_string(item)),
            ToString::to_string,
        )
}

/// The element's `id` as a string, whatever its JSON type.
#[must_use]
pub fn id_string(item: &Value) -> String {
    match item.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Claim `base` in `taken`, or the first free `base_2`, `base_3`, ...
pub fn unique_name(base: &str, taken: &mut HashSet<String>) -> String {
    let mut name = base.to_string();
    let mut n = 2;
    while taken.contains(&name) {
        name = format!("{base}_{n}");
        n += 1;
    }
    taken.insert(name.clone());
    name
}

/// Assign every item a batch-unique sanitized `title`.
///
/// Repeated base titles get `_2`, `_3`, ... in input order, skipping any
/// suffix already used by another title in the batch.
pub fn sanitize_titles(items: &mut [Value], fallback_prefix: &str) {
    let mut taken = HashSet::new();

    for item in items.iter_mut() {
        let base = sanitize_file_name(&display_title(item, fallback_prefix));
        let title = unique_name(&base, &mut taken);
        if let Some(obj) = item.as_object_mut() {
            obj.insert("title".to_string(), Value::String(title));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Production Dashboard"), "production_dashboard");
        assert_eq!(sanitize_file_name("JVM: heap/GC (ms)"), "jvm__heap_gc__ms_");
        assert_eq!(sanitize_file_name("keep-this_one"), "keep-this_one");
        assert_eq!(sanitize_file_name(""), "untitled");
        assert_eq!(sanitize_file_name("Grüße"), "gr__e");
    }

    #[test]
    fn test_sanitize_file_name_is_idempotent() {
        for input in ["Production Dashboard", "", "a/b\\c", "ÄÖÜ", "x_2"] {
            let once = sanitize_file_name(input);
            assert_eq!(sanitize_file_name(&once), once);
        }
    }

    #[test]
    fn test_duplicates_get_numbered_suffixes() {
        let mut items = vec![
            json!({"id": "1", "title": "Overview"}),
            json!({"id": "2", "title": "overview"}),
            json!({"id": "3", "title": "Other"}),
            json!({"id": "4", "title": "OVERVIEW"}),
        ];
        sanitize_titles(&mut items, "dashboard");
        let titles: Vec<_> = items.iter().map(|i| i["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["overview", "overview_2", "other", "overview_3"]);
    }

    #[test]
    fn test_suffix_never_collides_with_literal_title() {
        let mut items = vec![
            json!({"id": "1", "title": "Overview"}),
            json!({"id": "2", "title": "Overview"}),
            json!({"id": "3", "title": "Overview_2"}),
        ];
        sanitize_titles(&mut items, "dashboard");
        let titles: Vec<_> = items.iter().map(|i| i["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["overview", "overview_2", "overview_2_2"]);
    }

    #[test]
    fn test_unique_name_skips_taken() {
        let mut taken: HashSet<String> = ["kafka_dashboard_1".to_string()].into();
        assert_eq!(unique_name("kafka_dashboard_1", &mut taken), "kafka_dashboard_1_2");
        assert_eq!(unique_name("kafka_dashboard_2", &mut taken), "kafka_dashboard_2");
        assert_eq!(taken.len(), 3);
    }

    #[test]
    fn test_fallback_chain() {
        let mut items = vec![
            json!({"id": "e1", "name": "Slow Requests"}),
            json!({"id": "e2"}),
            json!({"id": 42, "title": ""}),
        ];
        sanitize_titles(&mut items, "event");
        assert_eq!(items[0]["title"], "slow_requests");
        assert_eq!(items[1]["title"], "event-e2");
        assert_eq!(items[2]["title"], "event-42");
    }
}
