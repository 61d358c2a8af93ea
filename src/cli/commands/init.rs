//! Initialize a new integration package.
//!
//! Creates `<location>/<name>/` with the requested element folders, a
//! publish-ready `package.json` and a README skeleton, then prints the
//! resulting tree.

use tracing::info;

use super::location_or_cwd;
use crate::cli::InitArgs;
use crate::error::Result;
use crate::scaffold::{InitOptions, create_package, directory_tree, parse_keywords, parse_kinds};

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the arguments are invalid or the package directory
/// cannot be created.
pub fn execute(args: &InitArgs) -> Result<()> {
    let options = InitOptions {
        name: args.name.trim().to_string(),
        version: args.version_number.trim().to_string(),
        description: args.description.clone(),
        keywords: parse_keywords(&args.keywords),
        author: args.author.clone(),
        license: args.license.clone(),
        kinds: parse_kinds(&args.types)?,
    };

    let location = location_or_cwd(args.location.as_deref())?;
    let root = create_package(&location, &options)?;
    info!("Integration package created at {}", root.display());

    print!("{}", directory_tree(&root, &options.name)?);
    Ok(())
}
