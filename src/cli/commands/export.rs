//! Export command implementation.

use tracing::info;

use super::{connect, location_or_cwd, runtime};
use crate::cli::ExportArgs;
use crate::config::LogSettings;
use crate::error::Result;
use crate::package::{Exporter, check_export_dir, parse_includes_from_argv};

/// Export tenant elements into `--location`.
///
/// Include clauses are read from the raw `argv` rather than from clap, since
/// a clause is only delimited by the next flag.
///
/// # Errors
///
/// Returns an error if:
/// - An element folder already holds JSON files
/// - The connection settings are incomplete
pub fn execute(args: &ExportArgs, argv: &[String]) -> Result<()> {
    let location = location_or_cwd(args.location.as_deref())?;
    if location.exists() {
        check_export_dir(&location)?;
    }

    let specs = parse_includes_from_argv(argv);
    let client = connect(&args.connection)?;
    let exporter = Exporter::new(&client, &location, LogSettings::new(args.connection.debug));

    info!("Exporting to {} ...", exporter.location().display());
    let stats = runtime()?.block_on(exporter.export(&specs))?;

    if !stats.is_empty() {
        info!(
            total = stats.total(),
            entity_dashboards = stats.entity_dashboards,
            "Export finished"
        );
    }
    Ok(())
}
