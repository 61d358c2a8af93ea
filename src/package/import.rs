//! Import of package files into the remote platform.
//!
//! Each file goes through the same steps:
//!
//! 1. Read and substitute `--set` parameters
//! 2. Parse as JSON
//! 3. Prepare by kind: dashboards get the global access rule, entities are
//!    flattened and their dashboard references resolved, smart alerts are
//!    classified to pick an endpoint
//! 4. POST
//!
//! Entities are the only kind that can be updated: a 409 on create starts
//! conflict reconciliation, which either skips (same data) or PUTs over the
//! existing entity.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use tracing::{debug, error, info, warn};

use super::compare::compare_entity_data;
use super::file::{find_json_files, find_matching_files, relative_display};
use super::references::{get_entity_dashboard_refs, reference_of, resolve_dashboard_references};
use super::template::render_template;
use super::types::{ElementKind, ImportOutcome, ImportStats};
use crate::api::{ApiClient, ApiError, ENTITIES_PATH, SmartAlertKind, classify_smart_alert};
use crate::config::LogSettings;
use crate::error::Result;

/// The access rule every imported dashboard must carry.
#[must_use]
pub fn global_access_rule() -> Value {
    json!({
        "accessType": "READ_WRITE",
        "relationType": "GLOBAL",
        "relatedId": ""
    })
}

/// True if `dashboard.accessRules` grants global read/write.
#[must_use]
pub fn has_global_access_rule(dashboard: &Value) -> bool {
    dashboard
        .get("accessRules")
        .and_then(Value::as_array)
        .is_some_and(|rules| {
            rules.iter().any(|rule| {
                rule.get("accessType").and_then(Value::as_str) == Some("READ_WRITE")
                    && rule.get("relationType").and_then(Value::as_str) == Some("GLOBAL")
            })
        })
}

/// Add the global access rule if missing. Returns whether it was added.
pub fn ensure_access_rules(dashboard: &mut Value) -> bool {
    if has_global_access_rule(dashboard) {
        return false;
    }
    let Some(obj) = dashboard.as_object_mut() else {
        return false;
    };

    let rules = obj
        .entry("accessRules")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !rules.is_array() {
        *rules = Value::Array(Vec::new());
    }
    if let Value::Array(rules) = rules {
        rules.push(global_access_rule());
    }
    true
}

/// Flatten an entity file's `{id, version, created, data: {...}}` shape into
/// the `{...data, id, version, created}` body the create endpoint expects.
fn flatten_entity(entity: Value) -> Value {
    let Value::Object(mut outer) = entity else {
        return entity;
    };
    let Some(Value::Object(data)) = outer.remove("data") else {
        return Value::Object(outer);
    };

    let mut flat: Map<String, Value> = data;
    for field in ["id", "version", "created"] {
        if let Some(value) = outer.remove(field) {
            flat.insert(field.to_string(), value);
        }
    }
    Value::Object(flat)
}

/// Id of the existing entity named by a 409 response body, if any.
fn conflicting_entity_id(error: &ApiError) -> Option<String> {
    let body = error.body()?;
    ["conflictingEntityId", "id"]
        .iter()
        .find_map(|key| match body.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
}

/// Importer for integration packages.
pub struct Importer<'a> {
    client: &'a ApiClient,
    package_dir: PathBuf,
    params: Value,
    log: LogSettings,
}

impl<'a> Importer<'a> {
    /// Create an importer for the package at `package_dir`.
    ///
    /// `params` is the tree built by [`parse_params`](super::parse_params).
    #[must_use]
    pub fn new(
        client: &'a ApiClient,
        package_dir: impl Into<PathBuf>,
        params: Value,
        log: LogSettings,
    ) -> Self {
        Self {
            client,
            package_dir: package_dir.into(),
            params,
            log,
        }
    }

    /// Get the package directory.
    #[must_use]
    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    /// Import every element folder.
    ///
    /// Order: entity dashboard scan, dashboards (skipping entity dashboards),
    /// events, entities, smart alerts.
    pub async fn import_all(&self) -> ImportStats {
        let refs = get_entity_dashboard_refs(&self.folder(ElementKind::Entity));

        let mut total = ImportStats::default();
        for kind in [
            ElementKind::Dashboard,
            ElementKind::Event,
            ElementKind::Entity,
            ElementKind::SmartAlert,
        ] {
            let folder = self.folder(kind);
            let files = find_json_files(&folder);
            let skip = if kind == ElementKind::Dashboard {
                refs.clone()
            } else {
                HashSet::new()
            };
            let pattern = format!("{}/**/*.json", folder.display());
            total.merge(&self.import_files(kind, &pattern, &files, &skip).await);
        }
        total
    }

    /// Import the files matching a glob relative to the package.
    ///
    /// The pattern picks one pipeline by the folder it names; `events` is
    /// checked first, then `entities`, `smart-alerts`, `dashboards`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid glob.
    pub async fn import_pattern(&self, pattern: &str) -> Result<ImportStats> {
        let Some(kind) = kind_for_pattern(pattern) else {
            warn!(
                "Include pattern '{pattern}' names none of dashboards, events, entities, smart-alerts; nothing to import"
            );
            return Ok(ImportStats::default());
        };

        let files = find_matching_files(&self.package_dir, pattern)?;
        let display = format!("{}/{pattern}", self.package_dir.display());

        let skip = if kind == ElementKind::Dashboard {
            let entities_dir = self.folder(ElementKind::Entity);
            if entities_dir.is_dir() {
                get_entity_dashboard_refs(&entities_dir)
            } else {
                warn!("No 'entities' folder found, cannot check for entity dashboards.");
                HashSet::new()
            }
        } else {
            HashSet::new()
        };

        Ok(self.import_files(kind, &display, &files, &skip).await)
    }

    /// Import `files` as elements of `kind`, skipping file names in `skip`.
    pub async fn import_files(
        &self,
        kind: ElementKind,
        pattern: &str,
        files: &[PathBuf],
        skip: &HashSet<String>,
    ) -> ImportStats {
        let mut stats = ImportStats::default();
        info!("Start to import the integration package from {pattern}");

        if files.is_empty() {
            warn!("No files found for pattern: {pattern}");
            return stats;
        }

        for path in files {
            let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
            if file_name.is_some_and(|n| skip.contains(&n)) {
                info!("Skipping entity dashboard file {} ...", self.display(path));
                continue;
            }

            let outcome = self.import_file(kind, path).await;
            if let ImportOutcome::Failed(reason) = &outcome {
                debug!(file = %self.display(path), "Import failed: {reason}");
            }
            stats.record(&outcome);
        }

        info!("{}", stats.summary());
        stats
    }

    /// Import one file.
    pub async fn import_file(&self, kind: ElementKind, path: &Path) -> ImportOutcome {
        let file = self.display(path);
        info!("Importing {file} ...");

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => return fail(format!("Failed to read {file}: {e}")),
        };

        let resolved = render_template(&content, &self.params);
        if self.log.debug {
            debug!("The content after parameters are replaced: \n{resolved}");
        }

        let mut payload: Value = match serde_json::from_str(&resolved) {
            Ok(payload) => payload,
            Err(e) => return fail(format!("Failed to parse the content for {file}: {e}")),
        };

        let api_path = match kind {
            ElementKind::Dashboard => {
                if ensure_access_rules(&mut payload) {
                    info!("Added the missing global access rule.");
                }
                kind.api_path()
            }
            ElementKind::Event => kind.api_path(),
            ElementKind::Entity => {
                payload = match self.prepare_entity(payload, &file) {
                    Ok(payload) => payload,
                    Err(reason) => return fail(reason),
                };
                kind.api_path()
            }
            ElementKind::SmartAlert => {
                let alert_kind = classify_smart_alert(&payload);
                if alert_kind == SmartAlertKind::Unknown {
                    return fail(format!("Unable to determine smart alert type for file {file}"));
                }
                info!("Detected {} in {file}", alert_kind.label());
                alert_kind.api_path()
            }
        };
        let Some(api_path) = api_path else {
            return fail(format!("No endpoint for {kind} file {file}"));
        };

        info!("Applying the {kind} to {} ...", self.client.url(api_path));
        match self.client.post_json(api_path, &payload).await {
            Ok(_) => {
                info!("Successfully applied {file}");
                ImportOutcome::Created
            }
            Err(e) if e.is_conflict() && kind == ElementKind::Entity => {
                self.reconcile_entity(&payload, &e, &file).await
            }
            Err(e) => fail(format!("Failed to apply {file}: {}", e.render(self.log.debug))),
        }
    }

    fn prepare_entity(&self, payload: Value, file: &str) -> std::result::Result<Value, String> {
        let mut entity = if payload.get("data").is_some_and(Value::is_object) {
            info!("Flattening the structure for entity file {file} ...");
            flatten_entity(payload)
        } else {
            payload
        };

        let has_references = entity
            .get("dashboards")
            .and_then(Value::as_array)
            .is_some_and(|d| d.iter().any(|e| reference_of(e).is_some()));

        if !has_references {
            if entity.get("dashboards").and_then(Value::as_array).is_none_or(Vec::is_empty) {
                info!("No entity dashboards defined in file {file}.");
            }
            return Ok(entity);
        }

        let dashboards_dir = self.folder(ElementKind::Dashboard);
        info!(
            "Resolving entity dashboard references in file {file} from: {} ...",
            dashboards_dir.display()
        );
        let entries = entity["dashboards"].as_array().cloned().unwrap_or_default();
        match resolve_dashboard_references(&entries, &dashboards_dir) {
            Ok(resolved) => {
                entity["dashboards"] = Value::Array(resolved);
                Ok(entity)
            }
            Err(e) => Err(format!("Failed to resolve entity dashboards in file {file}: {e}.")),
        }
    }

    /// Decide skip vs. update after a 409 on entity create.
    async fn reconcile_entity(&self, entity: &Value, conflict: &ApiError, file: &str) -> ImportOutcome {
        let label = entity.get("label").and_then(Value::as_str).unwrap_or_default();
        info!("Entity with label \"{label}\" already exists. Checking if update is needed ...");

        let conflicting_id = conflicting_entity_id(conflict);
        let Some(existing) = self.find_existing_entity(label, conflicting_id.as_deref()).await else {
            return fail(format!(
                "Entity with label \"{label}\" conflicts with existing entity but could not be found for comparison."
            ));
        };

        let existing_id = existing
            .get("id")
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .or(conflicting_id)
            .unwrap_or_default();
        info!("Found existing entity with label \"{label}\" (id={existing_id}).");

        if compare_entity_data(&existing, entity) {
            info!("Entity \"{label}\" already exists with the same data. Skipping import.");
            return ImportOutcome::Unchanged;
        }

        info!("Entity \"{label}\" exists but data is different. Updating ...");
        let path = format!("{ENTITIES_PATH}/{existing_id}");
        match self.client.put_json(&path, entity).await {
            Ok(_) => {
                info!("Successfully updated entity \"{label}\" from {file}.");
                ImportOutcome::Updated
            }
            Err(e) => fail(format!(
                "Failed to update entity \"{label}\" from {file}: {}",
                e.render(self.log.debug)
            )),
        }
    }

    /// Locate the entity a 409 collided with: by id if the server named one,
    /// otherwise (or if that fetch fails) by scanning the list for the label.
    async fn find_existing_entity(&self, label: &str, id: Option<&str>) -> Option<Value> {
        if let Some(id) = id {
            let path = format!("{ENTITIES_PATH}/{id}");
            info!("Fetching entity by ID \"{id}\" at {} ...", self.client.url(&path));
            match self.client.get_json(&path).await {
                Ok(entity) if !entity.is_null() => return Some(entity),
                Ok(_) => warn!("Entity with ID \"{id}\" returned an empty body"),
                Err(e) => error!("Error finding entity with ID \"{id}\": {}", e.render(self.log.debug)),
            }
        }

        let entities = match self.client.get_json(ENTITIES_PATH).await {
            Ok(Value::Array(entities)) => entities,
            Ok(_) => Vec::new(),
            Err(e) => {
                error!("Error finding entity with label \"{label}\": {}", e.render(self.log.debug));
                return None;
            }
        };

        let found = entities.into_iter().find(|entity| {
            let entity_label = entity
                .get("label")
                .and_then(Value::as_str)
                .or_else(|| entity.get("data").and_then(|d| d.get("label")).and_then(Value::as_str));
            entity_label == Some(label)
        });
        if found.is_none() {
            info!("No entity found with label \"{label}\".");
        }
        found
    }

    fn folder(&self, kind: ElementKind) -> PathBuf {
        self.package_dir.join(kind.folder())
    }

    fn display(&self, path: &Path) -> String {
        relative_display(path, &self.package_dir)
    }
}

/// Pipeline selected by an import `--include` pattern.
#[must_use]
pub fn kind_for_pattern(pattern: &str) -> Option<ElementKind> {
    [
        ElementKind::Event,
        ElementKind::Entity,
        ElementKind::SmartAlert,
        ElementKind::Dashboard,
    ]
    .into_iter()
    .find(|kind| pattern.contains(kind.folder()))
}

fn fail(reason: String) -> ImportOutcome {
    error!("{reason}");
    ImportOutcome::Failed(reason)
}
