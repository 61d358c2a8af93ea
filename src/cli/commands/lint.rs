//! Lint command implementation.

use tracing::{error, info};

use super::{location_or_cwd, runtime};
use crate::cli::LintArgs;
use crate::error::{Error, Result};
use crate::lint::lint_package;

/// Lint the package at `--path`.
///
/// # Errors
///
/// Returns `LintFailed` if any rule reported an error, or an error if
/// `package.json` cannot be read.
pub fn execute(args: &LintArgs) -> Result<()> {
    let dir = location_or_cwd(args.path.as_deref())?;
    info!("Linting the integration package at {} ...", dir.display());

    let Some(report) = runtime()?.block_on(lint_package(&dir, args.strict_mode, &args.registry))? else {
        return Ok(());
    };

    report.print(args.debug);
    if report.passed() {
        info!("Linting completed successfully.");
        Ok(())
    } else {
        error!("Linting failed.");
        Err(Error::LintFailed {
            errors: report.errors.len(),
        })
    }
}
