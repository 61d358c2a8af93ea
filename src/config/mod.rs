//! Configuration management.
//!
//! This module resolves the settings every command needs before it touches
//! the network or the filesystem:
//!
//! - **Connection**: server address, API token, TLS verification switch
//! - **Logging**: the debug decision passed explicitly into the orchestrators
//! - **Paths**: where a package lives and where the user's npm config is
//!
//! Values come from CLI flags first; clap fills them from environment
//! variables (`INSTANA_SERVER`, `INSTANA_API_TOKEN`, `STANCTL_VERIFY_TLS`)
//! when a flag is absent.

use crate::error::{Error, Result};

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing_subscriber::EnvFilter;

/// Default request timeout for remote API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings used to build the remote API client.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Base URL of the tenant, always with a scheme and without trailing `/`.
    pub base_url: String,
    /// API token sent as `Authorization: apiToken <token>`.
    pub token: String,
    /// Accept self-signed or otherwise invalid certificates.
    ///
    /// On by default to match the platform's internal/test environments;
    /// turned off by `--verify-tls`.
    pub accept_invalid_certs: bool,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ConnectionSettings {
    /// Build connection settings from raw CLI values.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the server or token is empty.
    pub fn new(server: &str, token: &str, verify_tls: bool) -> Result<Self> {
        let server = server.trim();
        if server.is_empty() {
            return Err(Error::Config("missing server address".to_string()));
        }
        if token.trim().is_empty() {
            return Err(Error::Config("missing API token".to_string()));
        }

        Ok(Self {
            base_url: normalize_base_url(server),
            token: token.trim().to_string(),
            accept_invalid_certs: !verify_tls,
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

/// Turn a `--server` value into a base URL.
///
/// A bare host gets `https://`; an explicit `http://` or `https://` URL is
/// kept as given. Trailing slashes are removed.
#[must_use]
pub fn normalize_base_url(server: &str) -> String {
    let trimmed = server.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Logging settings for one command invocation.
///
/// Passed by value into the orchestrators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSettings {
    /// Verbose mode: response bodies and payload dumps are logged.
    pub debug: bool,
}

impl LogSettings {
    #[must_use]
    pub const fn new(debug: bool) -> Self {
        Self { debug }
    }

    /// Build the tracing filter for this invocation.
    ///
    /// Priority:
    /// 1. `RUST_LOG`
    /// 2. `LOG_LEVEL` (e.g. `warn`, `debug`)
    /// 3. `debug` when `--debug` was passed, `info` otherwise
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        if std::env::var("RUST_LOG").is_ok() {
            return EnvFilter::from_default_env();
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            if !level.trim().is_empty() {
                return EnvFilter::new(level.trim());
            }
        }

        EnvFilter::new(self.default_directive())
    }

    /// Filter directive used when no environment override exists.
    #[must_use]
    pub const fn default_directive(&self) -> &'static str {
        if self.debug {
            "debug,hyper=info,reqwest=info,rustls=info"
        } else {
            "info"
        }
    }
}

/// Resolve where an integration package lives.
///
/// If `package` exists as a path it is used directly; otherwise the package
/// is assumed to be npm-installed under `<location>/node_modules/<package>`.
#[must_use]
pub fn resolve_package_path(package: &str, location: &Path) -> PathBuf {
    let direct = PathBuf::from(package);
    if direct.exists() {
        direct
    } else {
        location.join("node_modules").join(package)
    }
}

/// Current working directory, used as the default `--location`.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined.
pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir()
        .map_err(|e| Error::Other(format!("Failed to get current directory: {e}")))
}

/// Path to the user's `.npmrc`.
#[must_use]
pub fn npmrc_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".npmrc"))
}
