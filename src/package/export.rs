//! Export of remote elements into a package directory.
//!
//! # Pipeline
//!
//! For each element kind, in the order dashboards, events, entities, smart
//! alerts, and only if some include clause applies to it:
//!
//! 1. Fetch the remote list, unless every applicable clause selects by `id=`
//! 2. Select candidates per clause (filter, or direct fetch by id)
//! 3. Fill in missing display names and assign batch-unique sanitized titles
//! 4. Fetch each candidate's full payload by id and write
//!    `<folder>/<title>.json`
//!
//! List entries are never written as-is, smart alerts included: every
//! exported file holds the payload of the by-id endpoint.
//!
//! Entities additionally move their inline dashboards into
//! `dashboards/<title>_dashboard_<n>.json`. Those names are claimed from the
//! same set as the standalone dashboard files, so neither overwrites the
//! other.
//!
//! List entries that are not JSON objects count as failed.
//!
//! # Safety Check
//!
//! Export never overwrites: if any element folder already holds JSON files
//! the run fails before the first request is sent.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use super::file::{check_export_dir, prepare_export_dirs, write_json_pretty};
use super::filter::filter_elements_by;
use super::include::IncludeSpec;
use super::references::externalize_entity_dashboards;
use super::sanitize::{id_string, sanitize_titles};
use super::types::{ElementKind, ExportStats};
use crate::api::{ApiClient, get_smart_alert, list_smart_alerts};
use crate::config::LogSettings;
use crate::error::Result;

/// An element chosen for export.
struct Candidate {
    /// List entry (or fetched payload), later given its sanitized `title`.
    summary: Value,
    /// Full payload, when already known.
    full: Option<Value>,
    /// Whether the selecting clause named its type explicitly.
    explicit: bool,
}

/// Exporter for integration packages.
///
/// Holds the API client and the target directory; all requests are awaited
/// sequentially so log output and file writes follow input order.
pub struct Exporter<'a> {
    client: &'a ApiClient,
    location: PathBuf,
    log: LogSettings,
}

impl<'a> Exporter<'a> {
    /// Create an exporter writing into `location`.
    #[must_use]
    pub fn new(client: &'a ApiClient, location: impl Into<PathBuf>, log: LogSettings) -> Self {
        Self {
            client,
            location: location.into(),
            log,
        }
    }

    /// Get the export directory.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Export every element selected by `specs`.
    ///
    /// Per-element failures are logged and counted in the returned stats.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An element folder already contains JSON files
    /// - The export folders cannot be created
    pub async fn export(&self, specs: &[IncludeSpec]) -> Result<ExportStats> {
        if self.location.exists() {
            check_export_dir(&self.location)?;
        }
        prepare_export_dirs(&self.location)?;

        let mut stats = ExportStats::default();
        let mut dashboard_files = HashSet::new();
        for kind in ElementKind::ALL {
            let applicable: Vec<&IncludeSpec> = specs.iter().filter(|s| s.applies_to(kind)).collect();
            if applicable.is_empty() {
                continue;
            }
            self.export_kind(kind, &applicable, &mut stats, &mut dashboard_files)
                .await;
        }

        if stats.is_empty() {
            error!("No elements were found or exported.");
        }
        Ok(stats)
    }

    async fn export_kind(
        &self,
        kind: ElementKind,
        specs: &[&IncludeSpec],
        stats: &mut ExportStats,
        dashboard_files: &mut HashSet<String>,
    ) {
        let needs_list = specs.iter().any(|s| !s.is_id_only());
        let list = if needs_list {
            self.fetch_list(kind).await
        } else {
            Vec::new()
        };

        let mut seen = HashSet::new();
        let mut batch = Vec::new();
        for spec in specs {
            let selected = if needs_list {
                select_from_list(kind, &list, spec)
            } else {
                self.select_by_id(kind, spec).await
            };

            if selected.is_empty() {
                report_missing(
                    spec.explicitly_typed,
                    &format!("No {kind}(s) found matching: {}", spec.conditions.join(", ")),
                );
                continue;
            }

            for candidate in selected {
                if !candidate.summary.is_object() {
                    error!("Skipping {kind} list entry that is not a JSON object: {}", candidate.summary);
                    stats.kind_mut(kind).failed += 1;
                    continue;
                }
                if seen.insert(id_string(&candidate.summary)) {
                    batch.push(candidate);
                }
            }
        }

        let mut summaries: Vec<Value> = batch.iter().map(|c| enrich(kind, &c.summary)).collect();
        sanitize_titles(&mut summaries, kind.fallback_prefix());

        for (candidate, summary) in batch.into_iter().zip(summaries) {
            let id = id_string(&summary);
            let Some(title) = summary.get("title").and_then(Value::as_str).map(ToString::to_string) else {
                error!("Skipping {kind} (id={id}): no title could be assigned");
                stats.kind_mut(kind).failed += 1;
                continue;
            };

            let payload = match candidate.full {
                Some(full) => Some(full),
                None => self.fetch_one(kind, &id).await,
            };
            let Some(payload) = payload else {
                report_missing(
                    candidate.explicit,
                    &format!("The {kind} with id={id} not found or failed to export."),
                );
                stats.kind_mut(kind).failed += 1;
                continue;
            };

            match self.save(kind, &id, &title, payload, stats, dashboard_files) {
                Ok(()) => stats.kind_mut(kind).exported += 1,
                Err(e) => {
                    error!("Error saving {kind} (id={id}): {e}");
                    stats.kind_mut(kind).failed += 1;
                }
            }
        }

        info!("Total {kind}(s) processed: {}", stats.kind(kind).exported);
    }

    async fn select_by_id(&self, kind: ElementKind, spec: &IncludeSpec) -> Vec<Candidate> {
        let mut selected = Vec::new();
        for id in spec.ids() {
            match self.fetch_one(kind, id).await {
                Some(mut full) => {
                    if let Some(obj) = full.as_object_mut() {
                        obj.entry("id").or_insert_with(|| Value::String(id.to_string()));
                    }
                    selected.push(Candidate {
                        summary: full.clone(),
                        full: Some(full),
                        explicit: spec.explicitly_typed,
                    });
                }
                None => report_missing(
                    spec.explicitly_typed,
                    &format!("The {kind} with id={id} not found or failed to export."),
                ),
            }
        }
        selected
    }

    async fn fetch_list(&self, kind: ElementKind) -> Vec<Value> {
        let Some(path) = kind.api_path() else {
            info!("Getting {kind} list from all alert endpoints ...");
            let alerts = list_smart_alerts(self.client, self.log.debug).await;
            info!("Successfully got {kind} list: {} item(s)", alerts.len());
            return alerts;
        };

        info!("Getting {kind} list from {} ...", self.client.url(path));
        match self.client.get_json(path).await {
            Ok(Value::Array(items)) => {
                info!("Successfully got {kind} list: {} item(s)", items.len());
                self.dump(&items);
                items
            }
            Ok(other) => {
                error!("Failed to get {kind} list: expected a JSON array");
                self.dump(&other);
                Vec::new()
            }
            Err(e) => {
                error!("Failed to get {kind} list: {}", e.render(self.log.debug));
                Vec::new()
            }
        }
    }

    async fn fetch_one(&self, kind: ElementKind, id: &str) -> Option<Value> {
        let Some(path) = kind.api_path() else {
            return get_smart_alert(self.client, id, self.log.debug)
                .await
                .map(|(alert_kind, alert)| {
                    info!("Successfully got {} (id={id})", alert_kind.label());
                    alert
                });
        };

        let path = format!("{path}/{id}");
        info!("Getting {kind} (id={id}) from {} ...", self.client.url(&path));
        match self.client.get_json(&path).await {
            Ok(payload) => {
                info!("Successfully got {kind} (id={id})");
                self.dump(&payload);
                Some(payload)
            }
            Err(e) => {
                error!("Failed to get {kind} (id={id}): {}", e.render(self.log.debug));
                None
            }
        }
    }

    fn save(
        &self,
        kind: ElementKind,
        id: &str,
        title: &str,
        mut payload: Value,
        stats: &mut ExportStats,
        dashboard_files: &mut HashSet<String>,
    ) -> Result<()> {
        match kind {
            ElementKind::Dashboard => {
                dashboard_files.insert(title.to_string());
            }
            ElementKind::Entity => {
                let dashboards_dir = self.location.join(ElementKind::Dashboard.folder());
                let written =
                    externalize_entity_dashboards(&mut payload, title, &dashboards_dir, dashboard_files)?;
                stats.entity_dashboards += written.len();
            }
            _ => {}
        }

        let path = self.location.join(kind.folder()).join(format!("{title}.json"));
        info!("Saving {kind} (id={id}) to {} ...", path.display());
        write_json_pretty(&path, &payload)?;
        info!("The {kind} (id={id}) saved successfully");
        Ok(())
    }

    fn dump<T: Serialize>(&self, payload: &T) {
        if self.log.debug {
            let text = serde_json::to_string(payload).unwrap_or_default();
            debug!("Response data: \n{text}");
        }
    }
}

fn select_from_list(kind: ElementKind, list: &[Value], spec: &IncludeSpec) -> Vec<Candidate> {
    let selected = filter_elements_by(kind, list, &spec.conditions);

    for id in spec.ids() {
        if !selected.iter().any(|item| id_string(item) == id) {
            report_missing(spec.explicitly_typed, &format!("The {kind} with id={id} not found."));
        }
    }

    selected
        .into_iter()
        .map(|summary| Candidate {
            summary,
            full: None,
            explicit: spec.explicitly_typed,
        })
        .collect()
}

/// Copy of a list entry with a display `name` guaranteed.
fn enrich(kind: ElementKind, item: &Value) -> Value {
    let mut item = item.clone();
    let has_name = item.get("name").and_then(Value::as_str).is_some_and(|n| !n.is_empty());
    if has_name {
        return item;
    }

    let label = match kind {
        ElementKind::Entity => item
            .get("data")
            .and_then(|d| d.get("label"))
            .and_then(Value::as_str)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string),
        _ => None,
    };
    let name = label.unwrap_or_else(|| format!("{}-{}", kind.fallback_prefix(), id_string(&item)));
    if let Some(obj) = item.as_object_mut() {
        obj.insert("name".to_string(), Value::String(name));
    }
    item
}

fn report_missing(explicit: bool, message: &str) {
    if explicit {
        error!("{message}");
    } else {
        debug!("{message}");
    }
}
