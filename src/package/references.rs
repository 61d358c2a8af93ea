//! Entity dashboard references.
//!
//! Entities own dashboards, but packages store them as separate files under
//! `dashboards/` and point at them with `{"reference": "<file name>"}`:
//!
//! - export moves each inline dashboard out of `data.dashboards` into its own
//!   file and leaves a reference behind
//! - import reads each referenced file back in before posting the entity
//!
//! The dashboards import pass uses [`get_entity_dashboard_refs`] to skip
//! those files, since they are not standalone dashboards.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tracing::info;

use super::file::{find_json_files, read_json, write_json_pretty};
use super::sanitize::unique_name;
use crate::error::{Error, Result};

/// The `reference` file name of a dashboards array entry, if it is one.
#[must_use]
pub fn reference_of(entry: &Value) -> Option<&str> {
    entry
        .get("reference")
        .and_then(Value::as_str)
        .filter(|r| !r.is_empty())
}

/// Referenced file names in an entity file's `data.dashboards`.
#[must_use]
pub fn dashboard_references(entity: &Value) -> Vec<String> {
    entity
        .get("data")
        .and_then(|d| d.get("dashboards"))
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(reference_of)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Every dashboard file name referenced by any entity under `entities_dir`.
///
/// Unreadable or malformed entity files contribute nothing.
#[must_use]
pub fn get_entity_dashboard_refs(entities_dir: &Path) -> HashSet<String> {
    find_json_files(entities_dir)
        .iter()
        .filter_map(|path| read_json(path).ok())
        .flat_map(|entity| dashboard_references(&entity))
        .collect()
}

/// Replace `{reference}` entries with the parsed files they point to.
///
/// Entries without a reference pass through unchanged.
///
/// # Errors
///
/// Returns an error naming the file if a reference is missing or unparsable.
pub fn resolve_dashboard_references(dashboards: &[Value], dashboards_dir: &Path) -> Result<Vec<Value>> {
    dashboards
        .iter()
        .map(|entry| {
            let Some(reference) = reference_of(entry) else {
                return Ok(entry.clone());
            };
            let path = dashboards_dir.join(reference);
            if !path.is_file() {
                return Err(Error::Other(format!(
                    "Dashboard reference not found: {}",
                    path.display()
                )));
            }
            read_json(&path).map_err(|e| {
                Error::Other(format!(
                    "Failed to read or parse dashboard at {}: {e}",
                    path.display()
                ))
            })
        })
        .collect()
}

/// Move an exported entity's inline dashboards into their own files.
///
/// Entry `i` of `data.dashboards` is written to
/// `<dashboards_dir>/<entity_name>_dashboard_<i+1>.json` and replaced by a
/// reference to it. A file stem already in `taken` gets a `_2`, `_3`, ...
/// suffix instead; every stem written is added to `taken`. Entries that
/// already are references stay as they are.
///
/// # Errors
///
/// Returns an error if a dashboard file cannot be written; the entity is
/// then left partly rewritten and must not be saved.
pub fn externalize_entity_dashboards(
    entity: &mut Value,
    entity_name: &str,
    dashboards_dir: &Path,
    taken: &mut HashSet<String>,
) -> Result<Vec<PathBuf>> {
    let Some(dashboards) = entity
        .get_mut("data")
        .and_then(|d| d.get_mut("dashboards"))
        .and_then(Value::as_array_mut)
    else {
        return Ok(Vec::new());
    };

    let mut written = Vec::new();
    for (index, entry) in dashboards.iter_mut().enumerate() {
        if reference_of(entry).is_some() {
            continue;
        }

        let stem = unique_name(&format!("{entity_name}_dashboard_{}", index + 1), taken);
        let file_name = format!("{stem}.json");
        let path = dashboards_dir.join(&file_name);
        info!("Saving entity dashboard to {} ...", path.display());
        write_json_pretty(&path, entry)?;

        *entry = json!({ "reference": file_name });
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_export_then_import_round_trip() {
        let dir = TempDir::new().unwrap();
        let dashboards_dir = dir.path().join("dashboards");

        let inline = vec![
            json!({"title": "Broker overview", "widgets": [{"id": "w1"}]}),
            json!({"title": "Broker JVM", "widgets": []}),
        ];
        let mut entity = json!({
            "id": "e1",
            "data": {"label": "Kafka Broker", "dashboards": inline.clone()}
        });

        let written =
            externalize_entity_dashboards(&mut entity, "kafka_broker", &dashboards_dir, &mut HashSet::new())
                .unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(
            entity["data"]["dashboards"],
            json!([
                {"reference": "kafka_broker_dashboard_1.json"},
                {"reference": "kafka_broker_dashboard_2.json"}
            ])
        );
        assert!(dashboards_dir.join("kafka_broker_dashboard_2.json").is_file());

        let refs = entity["data"]["dashboards"].as_array().unwrap().clone();
        let resolved = resolve_dashboard_references(&refs, &dashboards_dir).unwrap();
        assert_eq!(resolved, inline);
    }

    #[test]
    fn test_existing_references_are_kept() {
        let dir = TempDir::new().unwrap();
        let mut entity = json!({"data": {"dashboards": [{"reference": "shared.json"}, {"title": "x"}]}});
        externalize_entity_dashboards(&mut entity, "svc", dir.path(), &mut HashSet::new()).unwrap();
        assert_eq!(
            entity["data"]["dashboards"],
            json!([{"reference": "shared.json"}, {"reference": "svc_dashboard_2.json"}])
        );
    }

    #[test]
    fn test_taken_names_are_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let mut taken: HashSet<String> = ["kafka_dashboard_1".to_string()].into();
        let mut entity = json!({"data": {"dashboards": [{"title": "a"}, {"title": "b"}]}});

        externalize_entity_dashboards(&mut entity, "kafka", dir.path(), &mut taken).unwrap();
        assert_eq!(
            entity["data"]["dashboards"],
            json!([
                {"reference": "kafka_dashboard_1_2.json"},
                {"reference": "kafka_dashboard_2.json"}
            ])
        );
        assert!(taken.contains("kafka_dashboard_1_2"));
        assert!(taken.contains("kafka_dashboard_2"));
    }

    #[test]
    fn test_missing_reference_fails() {
        let dir = TempDir::new().unwrap();
        let refs = vec![json!({"reference": "nope.json"})];
        let err = resolve_dashboard_references(&refs, dir.path()).unwrap_err();
        assert!(err.to_string().contains("Dashboard reference not found"));

        fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let refs = vec![json!({"reference": "bad.json"})];
        assert!(resolve_dashboard_references(&refs, dir.path()).is_err());
    }

    #[test]
    fn test_get_entity_dashboard_refs_ignores_bad_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"{"data": {"dashboards": [{"reference": "a_dashboard_1.json"}, {"title": "inline"}]}}"#,
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested/b.json"),
            r#"{"data": {"dashboards": [{"reference": "b_dashboard_1.json"}]}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        let refs = get_entity_dashboard_refs(dir.path());
        assert_eq!(refs.len(), 2);
        assert!(refs.contains("a_dashboard_1.json"));
        assert!(refs.contains("b_dashboard_1.json"));
        assert!(get_entity_dashboard_refs(&dir.path().join("missing")).is_empty());
    }
}
