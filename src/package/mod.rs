//! Integration package import/export.
//!
//! An integration package is a directory with up to four element folders:
//!
//! ```text
//! <package>/
//! ├── dashboards/     custom dashboards (plus entity dashboards)
//! ├── events/         custom event specifications
//! ├── entities/       custom entity types
//! └── smart-alerts/   mobile-app, application and infra alert configs
//! ```
//!
//! - **Export**: remote lists → include filters → sanitized titles → one JSON
//!   file per element ([`Exporter`])
//! - **Import**: JSON files → `--set` substitution → type-specific preparation
//!   → POST, with 409 reconciliation for entities ([`Importer`])
//!
//! Elements are processed one at a time. A failure for one element is logged
//! and counted; it never stops the batch.
//!
//! # Example
//!
//! ```ignore
//! use stanctl::package::{Exporter, parse_includes_from_argv};
//!
//! let specs = parse_includes_from_argv(&std::env::args().collect::<Vec<_>>());
//! let exporter = Exporter::new(&client, location, log);
//! let stats = exporter.export(&specs).await?;
//! ```

mod compare;
mod export;
mod file;
mod filter;
mod import;
mod include;
mod references;
mod sanitize;
mod template;
mod types;

pub use compare::{MANAGED_FIELDS, compare_entity_data, normalize_entity};
pub use export::Exporter;
pub use file::{
    check_export_dir, compile_glob, find_json_files, find_matching_files, prepare_export_dirs,
    read_json, relative_display, top_level_json_files, write_json_pretty,
};
pub use filter::{entity_label, filter_elements_by, find_by_id, matches_condition};
pub use import::{
    Importer, ensure_access_rules, global_access_rule, has_global_access_rule, kind_for_pattern,
};
pub use include::{IncludeSpec, TYPE_ALL, parse_includes_from_argv, split_condition, unquote};
pub use references::{
    dashboard_references, externalize_entity_dashboards, get_entity_dashboard_refs,
    reference_of, resolve_dashboard_references,
};
pub use sanitize::{display_title, id_string, sanitize_file_name, sanitize_titles, unique_name};
pub use template::{parse_params, render_template};
pub use types::{ElementKind, ExportStats, ImportOutcome, ImportStats, KindExportStats};
