//! Publish command implementation.

use std::path::PathBuf;

use serde_json::Value;
use tracing::info;

use crate::cli::PublishArgs;
use crate::config::current_dir;
use crate::error::{Error, Result};
use crate::lint::read_package_json;
use crate::npm;

/// Publish a package directory to the npm registry.
///
/// `--package` is a path if it exists, otherwise a package name resolved
/// against the current directory.
///
/// # Errors
///
/// Returns an error if the package cannot be found, has no name, or npm
/// login/publish fails.
pub fn execute(args: &PublishArgs) -> Result<()> {
    info!("Start to publish the integration package: {}", args.package);

    let direct = PathBuf::from(&args.package);
    let (package_dir, package_name) = if direct.exists() {
        let manifest = read_package_json(&direct)?;
        let name = manifest
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::InvalidArgument("package.json has no \"name\"".to_string()))?
            .to_string();
        (direct, name)
    } else {
        let dir = current_dir()?.join(&args.package);
        if !dir.exists() {
            return Err(Error::PackageNotFound { path: dir });
        }
        (dir, args.package.clone())
    };

    npm::publish(&package_name, &package_dir, &args.registry_username, &args.registry_email)
}
