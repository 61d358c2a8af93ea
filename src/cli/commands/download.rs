//! Download command implementation.

use super::location_or_cwd;
use crate::cli::DownloadArgs;
use crate::error::Result;
use crate::npm;

/// Install the package with npm under `--location`.
pub fn execute(args: &DownloadArgs) -> Result<()> {
    let location = location_or_cwd(args.location.as_deref())?;
    npm::install(&args.package, &location)
}
