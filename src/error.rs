//! Error types for the integration package CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Process exit codes (`1` for fatal failures, `255` for lint failures)
//! - Context-aware recovery hints
//!
//! Per-element failures during import/export are not errors at this level:
//! they are logged and tallied by the orchestrators. Only conditions that
//! abort a whole command surface as [`Error`].

use std::path::PathBuf;
use thiserror::Error;

use crate::api::ApiError;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ExportDirNotEmpty,
    PackageNotFound,
    InvalidArgument,
    ApiError,
    ProcessFailed,
    LintFailed,
    ConfigError,
    IoError,
    JsonError,
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::ExportDirNotEmpty => "EXPORT_DIR_NOT_EMPTY",
            Self::PackageNotFound => "PACKAGE_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ApiError => "API_ERROR",
            Self::ProcessFailed => "PROCESS_FAILED",
            Self::LintFailed => "LINT_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Process exit code.
    ///
    /// Lint failures exit with `-1`, which the OS reports as `255`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::LintFailed => 255,
            _ => 1,
        }
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that abort a CLI command.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot export: folder {} contains existing JSON files", path.display())]
    ExportDirNotEmpty { path: PathBuf },

    #[error("Package path does not exist: {}", path.display())]
    PackageNotFound { path: PathBuf },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Remote API error: {0}")]
    Api(#[from] ApiError),

    #[error("{command} failed: {message}")]
    Process { command: String, message: String },

    #[error("Linting failed with {errors} error(s)")]
    LintFailed { errors: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ExportDirNotEmpty { .. } => ErrorCode::ExportDirNotEmpty,
            Self::PackageNotFound { .. } => ErrorCode::PackageNotFound,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Api(_) => ErrorCode::ApiError,
            Self::Process { .. } => ErrorCode::ProcessFailed,
            Self::LintFailed { .. } => ErrorCode::LintFailed,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ExportDirNotEmpty { .. } => Some(
                "The export directory must not contain any JSON files in dashboards/, events/, \
                 entities/ or smart-alerts/ folders.\n  \
                 Please clean the folder or choose a new one."
                    .to_string(),
            ),

            Self::PackageNotFound { path } => Some(format!(
                "Download the package first (`stanctl-integration download --package <name> \
                 --location {}`) or pass a path to a local package.",
                path.parent().map_or_else(|| ".".to_string(), |p| p.display().to_string())
            )),

            Self::Config(msg) if msg.contains("server") => {
                Some("Pass --server or set INSTANA_SERVER".to_string())
            }
            Self::Config(msg) if msg.contains("token") => {
                Some("Pass --token or set INSTANA_API_TOKEN".to_string())
            }

            Self::LintFailed { .. } => {
                Some("Re-run with --debug to list every lint message".to_string())
            }

            Self::InvalidArgument(_)
            | Self::Api(_)
            | Self::Process { .. }
            | Self::Config(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => None,
        }
    }
}
