//! New integration package scaffolding.
//!
//! Creates `<location>/<name>/` with one folder per element kind, a
//! `package.json` ready for publishing and a README skeleton that already has
//! every heading `lint` checks for.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::lint::parse_version;
use crate::package::ElementKind;

/// Inputs for a new package.
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub name: String,
    pub version: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub author: String,
    pub license: String,
    pub kinds: Vec<ElementKind>,
}

#[derive(Serialize)]
struct PublishConfig {
    access: &'static str,
}

#[derive(Serialize)]
struct PackageManifest<'a> {
    name: &'a str,
    version: &'a str,
    description: &'a str,
    scripts: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "no_keywords")]
    keywords: &'a [String],
    author: &'a str,
    license: &'a str,
    #[serde(rename = "publishConfig")]
    publish_config: PublishConfig,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn no_keywords(keywords: &&[String]) -> bool {
    keywords.is_empty()
}

/// Parse a comma-separated `--types` value such as `dashboards,events`.
///
/// # Errors
///
/// Returns `InvalidArgument` for an unknown type name.
pub fn parse_kinds(types: &str) -> Result<Vec<ElementKind>> {
    let mut kinds = Vec::new();
    for name in types.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let kind = ElementKind::ALL
            .into_iter()
            .find(|k| k.folder() == name)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "Unknown package type '{name}'. Expected any of: dashboards, events, entities, smart-alerts"
                ))
            })?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        return Err(Error::InvalidArgument("At least one package type is required".to_string()));
    }
    Ok(kinds)
}

/// Split a comma-separated keyword list, dropping blanks.
#[must_use]
pub fn parse_keywords(keywords: &str) -> Vec<String> {
    keywords
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Render `package.json` for a new package.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_package_json(options: &InitOptions) -> Result<String> {
    let manifest = PackageManifest {
        name: &options.name,
        version: &options.version,
        description: &options.description,
        scripts: serde_json::Map::new(),
        keywords: &options.keywords,
        author: &options.author,
        license: &options.license,
        publish_config: PublishConfig { access: "public" },
    };
    let mut text = serde_json::to_string_pretty(&manifest)?;
    text.push('\n');
    Ok(text)
}

/// Render the README skeleton.
#[must_use]
pub fn generate_readme(name: &str, kinds: &[ElementKind]) -> String {
    let mut readme = format!("# {name}\n\n");

    if kinds.contains(&ElementKind::Dashboard) {
        readme.push_str(
            "## Dashboards\n\n\
             Below are the dashboards that are currently supported by this integration package.\n\n\
             | Dashboard Title | Description |\n\
             |-----------------|-------------|\n\
             | Dashboard A     | Description of Dashboard A |\n\n",
        );
    }

    readme.push_str(
        "## Metrics\n\n\
         ### Semantic Conventions\n\n\
         Below are the metrics that are currently supported by this integration package.\n\n\
         | Metric Name | Description | Unit | Type |\n\
         |-------------|-------------|------|------|\n\
         | metric.name | Description of the metric | 1 | Gauge |\n\n\
         ### Resource Attributes\n\n\
         Below are the resource attributes that are currently supported by this integration package.\n\n\
         | Attribute Key | Type | Description |\n\
         |---------------|------|-------------|\n\
         | service.name  | string | The name of the service |\n\n",
    );

    if kinds.contains(&ElementKind::Event) {
        readme.push_str(
            "## Events\n\n\
             Below are the events that are currently supported by this integration package.\n\n\
             | Event Name | Description |\n\
             |------------|-------------|\n\
             | Event A    | Description of Event A |\n\n",
        );
    }

    if kinds.contains(&ElementKind::Entity) {
        readme.push_str(
            "## Entities\n\n\
             Below are the entity types that are currently supported by this integration package.\n\n\
             | Entity Type | Description |\n\
             |-------------|-------------|\n\
             | Entity A    | Description of Entity A |\n\n",
        );
    }

    if kinds.contains(&ElementKind::SmartAlert) {
        readme.push_str(
            "## Smart Alerts\n\n\
             Below are the smart alerts that are currently supported by this integration package.\n\n\
             | Smart Alert Name | Description |\n\
             |------------------|-------------|\n\
             | Smart Alert A    | Description of Smart Alert A |\n\n",
        );
    }

    let _ = write!(
        readme,
        "## Installation and Usage\n\n\
         With [Instana CLI for integration package management](https://github.com/instana/observability-as-code?tab=readme-ov-file#instana-cli-for-integration-package-management), you can manage the lifecycle of this package such as downloading the package and importing it into Instana.\n\n\
         Downloading the package:\n\n\
         ```shell\n\
         $ stanctl-integration download --package {name}\n\
         ```\n\n\
         Importing the package into Instana:\n\n\
         ```shell\n\
         $ stanctl-integration import \\\n  \
         --package {name} \\\n  \
         --server $INSTANA_SERVER \\\n  \
         --token $INSTANA_API_TOKEN\n\
         ```\n\n\
         - INSTANA_SERVER: The Instana server address.\n\
         - INSTANA_API_TOKEN: The API token used to access the Instana server.\n"
    );

    readme
}

/// Create the package directory and its files.
///
/// Returns the package root.
///
/// # Errors
///
/// Returns an error if:
/// - The version is not `x.y.z`
/// - The package directory already exists
/// - A file or folder cannot be written
pub fn create_package(location: &Path, options: &InitOptions) -> Result<PathBuf> {
    if parse_version(&options.version).is_none() {
        return Err(Error::InvalidArgument(format!(
            "Invalid version \"{}\". The version must follow the format \"x.y.z\".",
            options.version
        )));
    }

    let root = location.join(&options.name);
    if root.exists() {
        return Err(Error::InvalidArgument(format!(
            "Directory already exists: {}",
            root.display()
        )));
    }

    for kind in &options.kinds {
        fs::create_dir_all(root.join(kind.folder()))?;
    }
    fs::create_dir_all(&root)?;
    fs::write(root.join("package.json"), render_package_json(options)?)?;
    fs::write(root.join("README.md"), generate_readme(&options.name, &options.kinds))?;

    Ok(root)
}

/// Render `dir` as a tree rooted at `label`.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn directory_tree(dir: &Path, label: &str) -> Result<String> {
    let mut out = format!("{label}\n");
    walk_tree(dir, "", &mut out)?;
    Ok(out)
}

fn walk_tree(dir: &Path, prefix: &str, out: &mut String) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(std::fs::DirEntry::file_name);

    let count = entries.len();
    for (index, entry) in entries.into_iter().enumerate() {
        let last = index + 1 == count;
        let connector = if last { "└── " } else { "├── " };
        let _ = writeln!(out, "{prefix}{connector}{}", entry.file_name().to_string_lossy());

        if entry.file_type()?.is_dir() {
            let child = format!("{prefix}{}", if last { "    " } else { "│   " });
            walk_tree(&entry.path(), &child, out)?;
        }
    }
    Ok(())
}
