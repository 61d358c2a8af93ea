//! Integration package linting.
//!
//! Checks a package directory before it is published:
//!
//! - `package.json`: naming convention, `x.y.z` version newer than the one on
//!   the npm registry, required fields, public publish access
//! - `README.md`: a heading for every section the package's folders need
//! - element files: dashboards carry the global access rule, events and
//!   entities have their required fields, smart alerts classify to a known
//!   endpoint and have the fields that endpoint needs
//!
//! Findings are collected into a [`LintReport`]; any error fails the lint.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use colored::Colorize;
use regex::Regex;
use semver::Version;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::api::{SmartAlertKind, classify_smart_alert};
use crate::config::DEFAULT_TIMEOUT;
use crate::error::{Error, Result};
use crate::package::{
    ElementKind, find_json_files, get_entity_dashboard_refs, global_access_rule, read_json,
    relative_display, top_level_json_files,
};

/// Public npm registry queried for the latest published version.
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@instana-integration/[a-zA-Z0-9\-_]+$").expect("package name pattern is valid")
});

/// Findings of one lint run.
#[derive(Debug, Default, Clone)]
pub struct LintReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub successes: Vec<String>,
}

impl LintReport {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn ok(&mut self, message: impl Into<String>) {
        self.successes.push(message.into());
    }

    /// True if no error was recorded.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    /// Print findings grouped by severity; successes only when `verbose`.
    pub fn print(&self, verbose: bool) {
        if verbose {
            for message in &self.successes {
                println!("{} {message}", "✓".green());
            }
        }
        if !self.warnings.is_empty() {
            println!("{}", "Warnings encountered during linting:".yellow().bold());
            for message in &self.warnings {
                println!("{} {message}", "!".yellow());
            }
        }
        if !self.errors.is_empty() {
            println!("{}", "Linting failed with the following errors:".red().bold());
            for message in &self.errors {
                println!("{} {message}", "✗".red());
            }
        }
    }
}

/// Latest version of a package according to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishedVersion {
    /// 404: never published.
    NotFound,
    /// Known to the registry without a `latest` dist-tag.
    NoVersions,
    Latest(String),
    /// The lookup itself failed.
    Failed(String),
}

/// Parse a strict `x.y.z` version: no pre-release or build suffix.
#[must_use]
pub fn parse_version(version: &str) -> Option<Version> {
    Version::parse(version)
        .ok()
        .filter(|v| v.pre.is_empty() && v.build.is_empty())
}

/// Read `<dir>/package.json`.
///
/// # Errors
///
/// Returns an error if the file is missing or not valid JSON.
pub fn read_package_json(dir: &Path) -> Result<Value> {
    let path = dir.join("package.json");
    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Other(format!("Failed to read {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&content)?)
}

/// True for `"private": true`.
#[must_use]
pub fn is_private_package(package: &Value) -> bool {
    package.get("private").and_then(Value::as_bool) == Some(true)
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(_) => false,
    }
}

fn is_blank_or_empty_object(value: Option<&Value>) -> bool {
    is_blank(value) || value.and_then(Value::as_object).is_some_and(serde_json::Map::is_empty)
}

/// Ask the registry for the `latest` dist-tag of `name`.
pub async fn fetch_published_version(registry: &str, name: &str) -> PublishedVersion {
    let client = match reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => return PublishedVersion::Failed(e.to_string()),
    };

    let url = format!("{}/{name}", registry.trim_end_matches('/'));
    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => return PublishedVersion::Failed(e.to_string()),
    };

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return PublishedVersion::NotFound;
    }
    if !status.is_success() {
        return PublishedVersion::Failed(format!("Request to {url} failed with status code {status}"));
    }

    match response.json::<Value>().await {
        Ok(body) => body
            .pointer("/dist-tags/latest")
            .and_then(Value::as_str)
            .map_or(PublishedVersion::NoVersions, |v| PublishedVersion::Latest(v.to_string())),
        Err(e) => PublishedVersion::Failed(e.to_string()),
    }
}

/// Check `package.json` fields against the published version.
pub fn validate_package_json(
    package: &Value,
    published: &PublishedVersion,
    strict: bool,
    report: &mut LintReport,
) {
    let name = package.get("name").and_then(Value::as_str).unwrap_or_default();
    let version = package.get("version").and_then(Value::as_str).unwrap_or_default();

    if PACKAGE_NAME.is_match(name) {
        report.ok("The package name is correctly defined.");
    } else {
        let message = format!(
            "Warning: Package name \"{name}\" does not align with the IBM package naming convention."
        );
        if strict {
            report.error(message);
        } else {
            report.warn(message);
        }
    }

    let parsed = parse_version(version);
    if parsed.is_some() {
        report.ok("The package version format is valid and follows the correct format.");
    } else {
        report.error(format!(
            "Invalid version \"{version}\". The version must follow the format \"x.y.z\"."
        ));
    }

    match published {
        PublishedVersion::NotFound => {
            report.ok(format!("The package \"{name}\" not found on npm. This is a new package."));
        }
        PublishedVersion::NoVersions => report.ok(format!(
            "The package \"{name}\" exists in the npm registry but has no published versions. Treating as a new package."
        )),
        PublishedVersion::Failed(message) => report.error(message.clone()),
        PublishedVersion::Latest(latest) => match (&parsed, Version::parse(latest).ok()) {
            (Some(local), Some(remote)) => match local.cmp(&remote) {
                Ordering::Equal => report.error(format!(
                    "The package version \"{version}\" is the same as the currently published version \"{latest}\". It must be greater than the currently published version."
                )),
                Ordering::Less => report.error(format!(
                    "The package version \"{version}\" is invalid. It must be greater than the currently published version \"{latest}\"."
                )),
                Ordering::Greater => {
                    report.ok("The package version is valid and greater than the currently published version.");
                }
            },
            (_, None) => report.warn(format!(
                "Warning: The published version \"{latest}\" is not a valid semantic version and was not compared."
            )),
            (None, Some(_)) => {}
        },
    }

    let mut present = Vec::new();
    let mut missing = Vec::new();
    for field in ["name", "version", "author", "license", "description"] {
        if !is_blank(package.get(field)) {
            present.push(field);
        } else if field == "description" {
            report.warn("Warning: The package description is missing. Adding a description is recommended.");
        } else {
            missing.push(field);
        }
    }
    if !present.is_empty() {
        report.ok(format!("The package field(s) {} are present.", present.join(", ")));
    }
    if !missing.is_empty() {
        report.error(format!(
            "The package is missing required field(s): {}.",
            missing.join(", ")
        ));
    }

    if package.pointer("/publishConfig/access").and_then(Value::as_str) == Some("public") {
        report.ok("The \"publishConfig.access\" is correctly set to \"public\".");
    } else {
        report.error(
            "\"publishConfig.access\" is missing or not set to \"public\". It is mandatory to include \"publishConfig\": { \"access\": \"public\" } for public packages.",
        );
    }
}

/// Sections the README of a package in `dir` must have.
#[must_use]
pub fn required_readme_sections(package_name: &str, dir: &Path) -> Vec<String> {
    let has = |kind: ElementKind| dir.join(kind.folder()).is_dir();

    let mut sections = vec![package_name.to_string()];
    if has(ElementKind::Dashboard) {
        sections.push("Dashboards".to_string());
    }
    sections.extend(["Metrics", "Semantic Conventions", "Resource Attributes"].map(String::from));
    if has(ElementKind::Event) {
        sections.push("Events".to_string());
    }
    if has(ElementKind::Entity) {
        sections.push("Entities".to_string());
    }
    if has(ElementKind::SmartAlert) {
        sections.push("Smart Alerts".to_string());
    }
    sections
}

/// Check that the README has a heading for every required section.
pub fn validate_readme(content: &str, package_name: &str, dir: &Path, report: &mut LintReport) {
    let headings: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let text = line.trim_start_matches('#');
            let level = line.len() - text.len();
            ((1..=6).contains(&level) && text.starts_with(char::is_whitespace))
                .then(|| text.trim().to_lowercase())
        })
        .collect();

    let missing: Vec<String> = required_readme_sections(package_name, dir)
        .into_iter()
        .filter(|section| !headings.contains(&section.to_lowercase()))
        .collect();

    if missing.is_empty() {
        report.ok("README.md contains all required sections.");
    } else {
        report.error(format!(
            "README.md is missing required sections: {}",
            missing.join(", ")
        ));
    }
}

/// Dashboards must carry the global access rule, except entity dashboards.
pub fn validate_dashboard_files(dir: &Path, entity_dashboards: &HashSet<String>, report: &mut LintReport) {
    let files = top_level_json_files(dir);
    if files.is_empty() {
        report.warn("No JSON files found in the dashboards folder.");
        return;
    }

    let required = global_access_rule();
    for path in files {
        let file = relative_display(&path, dir);
        if entity_dashboards.contains(&file) {
            report.ok(format!("Skipping accessRule validation for entity dashboard: {file} ..."));
            continue;
        }

        let dashboard = match read_json(&path) {
            Ok(dashboard) => dashboard,
            Err(e) => {
                report.error(format!("Error validating file {file}: {e}."));
                continue;
            }
        };

        match dashboard.get("accessRules").and_then(Value::as_array) {
            Some(rules) if !rules.is_empty() => {
                if rules.iter().any(|rule| {
                    ["accessType", "relationType", "relatedId"]
                        .iter()
                        .all(|key| rule.get(*key) == required.get(*key))
                }) {
                    report.ok(format!(
                        "The dashboard file {file} contains the required GLOBAL accessRule."
                    ));
                } else {
                    report.error(format!(
                        "The dashboard file {file} must include the required accessRule: {required}."
                    ));
                }
            }
            _ => report.error(format!("accessRules are missing in the dashboard file: {file}.")),
        }
    }
}

/// Shared shape of the per-file field checks.
fn check_fields(
    report: &mut LintReport,
    what: &str,
    file: &str,
    present: &[&str],
    missing: &[&str],
) {
    if !present.is_empty() {
        report.ok(format!(
            "The {what} field(s) {} are present in the file: {file}.",
            present.join(", ")
        ));
    }
    if missing.is_empty() {
        report.ok(format!("The {what} is correctly defined in the file: {file}."));
    } else {
        report.error(format!(
            "The {what} is missing required field(s): {} in file: {file}.",
            missing.join(", ")
        ));
        report.error(format!("The {what} is not correctly defined in the file: {file}."));
    }
}

fn for_each_json<F>(dir: &Path, folder_label: &str, report: &mut LintReport, mut check: F)
where
    F: FnMut(&str, &Value, &mut LintReport),
{
    let files = find_json_files(dir);
    if files.is_empty() {
        report.warn(format!("No JSON files found in the {folder_label} folder."));
        return;
    }

    for path in files {
        let file = relative_display(&path, dir);
        match read_json(&path) {
            Ok(value) => check(&file, &value, report),
            Err(e) => report.error(format!("Error validating file {}: {e}.", path.display())),
        }
    }
}

/// Events need `name`, `entityType` and non-empty `rules`.
pub fn validate_event_files(dir: &Path, report: &mut LintReport) {
    for_each_json(dir, "events", report, |file, event, report| {
        let (present, missing): (Vec<&str>, Vec<&str>) = ["name", "entityType", "rules"]
            .into_iter()
            .partition(|field| !is_blank(event.get(*field)));
        check_fields(report, "event", file, &present, &missing);
    });
}

/// Entities need a non-empty `data` with `label`, `identifiers` and
/// `tagFilterExpression`.
pub fn validate_entity_files(dir: &Path, report: &mut LintReport) {
    for_each_json(dir, "entities", report, |file, entity, report| {
        let Some(data) = entity.get("data").filter(|d| d.as_object().is_some_and(|o| !o.is_empty())) else {
            report.error(format!("Missing or invalid 'data' object in entity: {file}."));
            return;
        };
        let (present, missing): (Vec<&str>, Vec<&str>) = ["label", "identifiers", "tagFilterExpression"]
            .into_iter()
            .partition(|field| !is_blank_or_empty_object(data.get(*field)));
        check_fields(report, "entity", file, &present, &missing);
    });
}

/// Smart alerts must classify; infrastructure alerts need their rule fields.
pub fn validate_smart_alert_files(dir: &Path, report: &mut LintReport) {
    for_each_json(dir, "smart-alerts", report, |file, alert, report| {
        match classify_smart_alert(alert) {
            SmartAlertKind::Unknown => report.error(format!(
                "Unable to determine smart alert type in file: {file}."
            )),
            SmartAlertKind::Infra => {
                let (mut present, mut missing): (Vec<&str>, Vec<&str>) =
                    ["name", "granularity", "timeThreshold"]
                        .into_iter()
                        .partition(|field| !is_blank(alert.get(*field)));

                let present_or_null = |key: &str| alert.get(key).is_some_and(|v| !v.is_null());
                let has_rule_and_threshold = present_or_null("rule") && present_or_null("threshold");
                let has_rules = alert
                    .get("rules")
                    .and_then(Value::as_array)
                    .is_some_and(|r| !r.is_empty());
                if has_rule_and_threshold {
                    present.push("rule + threshold");
                } else if has_rules {
                    present.push("rules[]");
                } else {
                    missing.push("rule + threshold OR rules[]");
                }
                check_fields(report, "infra smart alert", file, &present, &missing);
            }
            kind => {
                let (present, missing): (Vec<&str>, Vec<&str>) =
                    ["name"].into_iter().partition(|field| !is_blank(alert.get(*field)));
                check_fields(report, kind.label(), file, &present, &missing);
            }
        }
    });
}

/// Lint the package in `dir`.
///
/// Returns `Ok(None)` for a private package, which is not linted.
///
/// # Errors
///
/// Returns an error only if `package.json` cannot be read; every other
/// problem is a finding in the report.
pub async fn lint_package(dir: &Path, strict: bool, registry: &str) -> Result<Option<LintReport>> {
    let package = read_package_json(dir)?;
    let name = package.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
    if is_private_package(&package) {
        info!("Skipping linting for package: {name}");
        return Ok(None);
    }

    let mut report = LintReport::default();

    match fs::read_to_string(dir.join("README.md")) {
        Ok(content) if !content.trim().is_empty() => validate_readme(&content, &name, dir, &mut report),
        _ => {
            error!("README.md is missing in the directory: {}", dir.display());
            report.error("README.md is missing or empty.");
        }
    }

    let published = fetch_published_version(registry, &name).await;
    validate_package_json(&package, &published, strict, &mut report);

    let folder = |kind: ElementKind| dir.join(kind.folder());

    let mut entity_dashboards = HashSet::new();
    if folder(ElementKind::Entity).is_dir() {
        entity_dashboards = get_entity_dashboard_refs(&folder(ElementKind::Entity));
        validate_entity_files(&folder(ElementKind::Entity), &mut report);
    } else {
        info!("No entities folder found for this package.");
    }

    if folder(ElementKind::Dashboard).is_dir() {
        validate_dashboard_files(&folder(ElementKind::Dashboard), &entity_dashboards, &mut report);
    } else {
        info!("No dashboards folder found for this package.");
    }

    if folder(ElementKind::Event).is_dir() {
        validate_event_files(&folder(ElementKind::Event), &mut report);
    } else {
        info!("No events folder found for this package.");
    }

    if folder(ElementKind::SmartAlert).is_dir() {
        validate_smart_alert_files(&folder(ElementKind::SmartAlert), &mut report);
    } else {
        info!("No smart alerts folder found for this package.");
    }

    if !report.warnings.is_empty() {
        warn!("{} lint warning(s)", report.warnings.len());
    }
    Ok(Some(report))
}
