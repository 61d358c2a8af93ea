//! Import command implementation.

use tracing::info;

use super::{connect, location_or_cwd, runtime};
use crate::cli::ImportArgs;
use crate::config::{LogSettings, resolve_package_path};
use crate::error::{Error, Result};
use crate::package::{Importer, parse_params};

/// Import a package into the tenant.
///
/// Per-file failures are logged and counted; the command still succeeds.
///
/// # Errors
///
/// Returns an error if:
/// - A `--set` pair is malformed
/// - The package directory does not exist
/// - The connection settings are incomplete
/// - The include pattern is not a valid glob
pub fn execute(args: &ImportArgs) -> Result<()> {
    let params = parse_params(&args.set)?;
    let location = location_or_cwd(args.location.as_deref())?;
    let package_dir = resolve_package_path(&args.package, &location);
    if !package_dir.exists() {
        return Err(Error::PackageNotFound { path: package_dir });
    }

    let client = connect(&args.connection)?;
    let log = LogSettings::new(args.connection.debug);
    let importer = Importer::new(&client, &package_dir, params, log);

    info!("Importing the integration package from {} ...", package_dir.display());
    let stats = runtime()?.block_on(async {
        match &args.include {
            Some(pattern) => importer.import_pattern(pattern).await,
            None => Ok(importer.import_all().await),
        }
    })?;

    info!(
        created = stats.created,
        updated = stats.updated,
        unchanged = stats.unchanged,
        failed = stats.failed,
        "Import finished"
    );
    Ok(())
}
