//! Element kinds and outcome bookkeeping for import/export runs.

use serde::Serialize;

use crate::api::{DASHBOARDS_PATH, ENTITIES_PATH, EVENTS_PATH};

/// The four element types an integration package bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Dashboard,
    Event,
    Entity,
    SmartAlert,
}

impl ElementKind {
    /// All kinds, in export processing order.
    pub const ALL: [Self; 4] = [Self::Dashboard, Self::Event, Self::Entity, Self::SmartAlert];

    /// Package sub-folder holding this kind's JSON files.
    #[must_use]
    pub const fn folder(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboards",
            Self::Event => "events",
            Self::Entity => "entities",
            Self::SmartAlert => "smart-alerts",
        }
    }

    /// `type=` value used in `--include` clauses.
    #[must_use]
    pub const fn include_type(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Event => "event",
            Self::Entity => "entity",
            Self::SmartAlert => "smart-alert",
        }
    }

    /// Singular label for log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Event => "event",
            Self::Entity => "entity",
            Self::SmartAlert => "smart alert",
        }
    }

    /// Collection path, or `None` for smart alerts which span three endpoints.
    #[must_use]
    pub const fn api_path(self) -> Option<&'static str> {
        match self {
            Self::Dashboard => Some(DASHBOARDS_PATH),
            Self::Event => Some(EVENTS_PATH),
            Self::Entity => Some(ENTITIES_PATH),
            Self::SmartAlert => None,
        }
    }

    /// Prefix for generated fallback titles (`<prefix>-<id>`).
    #[must_use]
    pub const fn fallback_prefix(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Event => "event",
            Self::Entity => "entity",
            Self::SmartAlert => "smart-alert",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of importing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// POST succeeded.
    Created,
    /// 409 with different data; the existing element was replaced.
    Updated,
    /// 409 with identical data; nothing written.
    Unchanged,
    /// Anything else. Carries the reason that was logged.
    Failed(String),
}

impl ImportOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Tally of import outcomes for one pipeline (or a whole run).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl ImportStats {
    pub fn record(&mut self, outcome: &ImportOutcome) {
        match outcome {
            ImportOutcome::Created => self.created += 1,
            ImportOutcome::Updated => self.updated += 1,
            ImportOutcome::Unchanged => self.unchanged += 1,
            ImportOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Files that ended in any success state.
    #[must_use]
    pub const fn succeeded(&self) -> usize {
        self.created + self.updated + self.unchanged
    }

    /// Files processed. Always `succeeded() + failed`.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.succeeded() + self.failed
    }

    pub fn merge(&mut self, other: &Self) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
    }

    /// One-line summary in the three shapes the import command logs.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.failed == 0 {
            format!("Successfully imported: {}", self.succeeded())
        } else if self.succeeded() == 0 {
            format!("Failed to import: {}", self.failed)
        } else {
            format!(
                "Total files: {} | Successfully imported: {} | Failed: {}",
                self.total(),
                self.succeeded(),
                self.failed
            )
        }
    }
}

/// Per-kind export counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KindExportStats {
    /// Elements written to disk.
    pub exported: usize,
    /// Elements selected but not written (fetch or write failure).
    pub failed: usize,
}

/// Statistics for an export run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub dashboards: KindExportStats,
    pub events: KindExportStats,
    pub entities: KindExportStats,
    pub smart_alerts: KindExportStats,
    /// Dashboard files externalized from entities.
    pub entity_dashboards: usize,
}

impl ExportStats {
    #[must_use]
    pub const fn kind(&self, kind: ElementKind) -> &KindExportStats {
        match kind {
            ElementKind::Dashboard => &self.dashboards,
            ElementKind::Event => &self.events,
            ElementKind::Entity => &self.entities,
            ElementKind::SmartAlert => &self.smart_alerts,
        }
    }

    pub fn kind_mut(&mut self, kind: ElementKind) -> &mut KindExportStats {
        match kind {
            ElementKind::Dashboard => &mut self.dashboards,
            ElementKind::Event => &mut self.events,
            ElementKind::Entity => &mut self.entities,
            ElementKind::SmartAlert => &mut self.smart_alerts,
        }
    }

    /// Elements exported across all kinds.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.dashboards.exported
            + self.events.exported
            + self.entities.exported
            + self.smart_alerts.exported
    }

    /// Returns true if nothing was exported.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_stats_totals_hold() {
        let mut stats = ImportStats::default();
        for outcome in [
            ImportOutcome::Created,
            ImportOutcome::Unchanged,
            ImportOutcome::Updated,
            ImportOutcome::Failed("boom".to_string()),
        ] {
            stats.record(&outcome);
        }
        assert_eq!(stats.succeeded(), 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total(), stats.succeeded() + stats.failed);
    }

    #[test]
    fn test_import_summary_variants() {
        let all_ok = ImportStats { created: 2, ..Default::default() };
        assert_eq!(all_ok.summary(), "Successfully imported: 2");

        let all_failed = ImportStats { failed: 3, ..Default::default() };
        assert_eq!(all_failed.summary(), "Failed to import: 3");

        let mixed = ImportStats { created: 1, unchanged: 1, failed: 1, ..Default::default() };
        assert_eq!(
            mixed.summary(),
            "Total files: 3 | Successfully imported: 2 | Failed: 1"
        );
    }

    #[test]
    fn test_export_stats() {
        let mut stats = ExportStats::default();
        assert!(stats.is_empty());

        stats.kind_mut(ElementKind::Dashboard).exported = 2;
        stats.kind_mut(ElementKind::SmartAlert).exported = 1;
        stats.entity_dashboards = 4;
        assert_eq!(stats.total(), 3);
        assert_eq!(stats.kind(ElementKind::Dashboard).exported, 2);
    }

    #[test]
    fn test_kind_folders() {
        let folders: Vec<_> = ElementKind::ALL.iter().map(|k| k.folder()).collect();
        assert_eq!(folders, vec!["dashboards", "events", "entities", "smart-alerts"]);
        assert_eq!(ElementKind::SmartAlert.api_path(), None);
    }
}
