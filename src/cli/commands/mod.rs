//! Command implementations.

pub mod completions;
pub mod download;
pub mod export;
pub mod import;
pub mod init;
pub mod lint;
pub mod publish;

use std::path::{Path, PathBuf};

use tokio::runtime::Runtime;

use crate::api::ApiClient;
use crate::cli::ConnectionArgs;
use crate::config::{ConnectionSettings, current_dir};
use crate::error::{Error, Result};

/// Create the runtime a command drives its requests on.
fn runtime() -> Result<Runtime> {
    Runtime::new().map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))
}

/// Build the API client from connection flags.
fn connect(args: &ConnectionArgs) -> Result<ApiClient> {
    let settings = ConnectionSettings::new(
        args.server.as_deref().unwrap_or_default(),
        args.token.as_deref().unwrap_or_default(),
        args.verify_tls,
    )?;
    Ok(ApiClient::new(&settings)?)
}

/// `--location` if given, else the current directory.
fn location_or_cwd(location: Option<&Path>) -> Result<PathBuf> {
    location.map_or_else(current_dir, |p| Ok(p.to_path_buf()))
}
