//! CLI definitions using clap.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::lint::DEFAULT_REGISTRY;

pub mod commands;

/// Manage Instana integration packages
#[derive(Parser, Debug)]
#[command(name = "stanctl-integration", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Whether `--debug` was passed to the subcommand.
    #[must_use]
    pub const fn debug(&self) -> bool {
        match &self.command {
            Commands::Import(args) => args.connection.debug,
            Commands::Export(args) => args.connection.debug,
            Commands::Lint(args) => args.debug,
            Commands::Download(_)
            | Commands::Init(_)
            | Commands::Publish(_)
            | Commands::Completions { .. } => false,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download an integration package from the npm registry
    Download(DownloadArgs),

    /// Import an integration package into Instana
    Import(ImportArgs),

    /// Export Instana elements into a local integration package
    Export(ExportArgs),

    /// Create a new integration package skeleton
    Init(InitArgs),

    /// Publish an integration package to the npm registry
    Publish(PublishArgs),

    /// Check an integration package before publishing
    Lint(LintArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Flags shared by commands that talk to an Instana tenant.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Instana server address (host or base URL)
    #[arg(short = 'S', long, env = "INSTANA_SERVER")]
    pub server: Option<String>,

    /// API token used to access the Instana server
    #[arg(short = 't', long, env = "INSTANA_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Verify the server's TLS certificate
    #[arg(long, env = "STANCTL_VERIFY_TLS")]
    pub verify_tls: bool,

    /// Log response bodies and payloads
    #[arg(short = 'd', long)]
    pub debug: bool,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Package name on the npm registry
    #[arg(short = 'p', long)]
    pub package: String,

    /// Directory to install into (default: current directory)
    #[arg(short = 'l', long)]
    pub location: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Package name (installed under <location>/node_modules) or local path
    #[arg(short = 'p', long)]
    pub package: String,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Directory the package was downloaded into (default: current directory)
    #[arg(short = 'L', long)]
    pub location: Option<PathBuf>,

    /// Glob relative to the package, e.g. "dashboards/**/test-*.json"
    #[arg(short = 'i', long)]
    pub include: Option<String>,

    /// Template parameter as key=value (repeatable, dot paths allowed)
    #[arg(short = 's', long = "set", action = ArgAction::Append)]
    pub set: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Directory to export into (default: current directory)
    #[arg(short = 'L', long)]
    pub location: Option<PathBuf>,

    /// Selection clause: [type=<kind>] [key=value ...] (repeatable)
    ///
    /// Kinds: dashboard, event, entity, smart-alert. Keys: id, title, name,
    /// ownerid, annotation, label.
    #[arg(short = 'F', long = "include", num_args = 1.., action = ArgAction::Append)]
    pub include: Vec<String>,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Package name, e.g. @instana-integration/kafka
    #[arg(long)]
    pub name: String,

    /// Package version (x.y.z)
    #[arg(long = "version-number", default_value = "1.0.0")]
    pub version_number: String,

    /// Package description
    #[arg(long, default_value = "")]
    pub description: String,

    /// Comma-separated keywords
    #[arg(long, default_value = "")]
    pub keywords: String,

    /// Package author
    #[arg(long)]
    pub author: String,

    /// Package license
    #[arg(long, default_value = "MIT")]
    pub license: String,

    /// Comma-separated element types: dashboards, events, entities, smart-alerts
    #[arg(long, default_value = "dashboards")]
    pub types: String,

    /// Parent directory for the package (default: current directory)
    #[arg(long)]
    pub location: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Package name (relative to the current directory) or path
    #[arg(short = 'p', long)]
    pub package: String,

    /// npm registry user name
    #[arg(short = 'U', long)]
    pub registry_username: String,

    /// npm registry email
    #[arg(short = 'E', long)]
    pub registry_email: String,
}

#[derive(Args, Debug)]
pub struct LintArgs {
    /// Package directory (default: current directory)
    #[arg(short = 'p', long)]
    pub path: Option<PathBuf>,

    /// Treat package naming warnings as errors
    #[arg(short = 's', long)]
    pub strict_mode: bool,

    /// Print every lint message
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// npm registry queried for the published version
    #[arg(long, env = "STANCTL_NPM_REGISTRY", default_value = DEFAULT_REGISTRY, hide = true)]
    pub registry: String,
}

/// Supported shells for completions.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
    Elvish,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_include_clauses_are_accepted() {
        let cli = Cli::try_parse_from([
            "stanctl-integration",
            "export",
            "-S",
            "tenant.io",
            "-t",
            "tok",
            "--include",
            "type=dashboard",
            "title=Kafka",
            "-F",
            "type=event",
        ])
        .unwrap();
        let Commands::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.include, ["type=dashboard", "title=Kafka", "type=event"]);
        assert_eq!(args.connection.server.as_deref(), Some("tenant.io"));
    }

    #[test]
    fn test_import_set_is_repeatable() {
        let cli = Cli::try_parse_from([
            "stanctl-integration",
            "import",
            "-p",
            "./pkg",
            "--set",
            "owner.name=John",
            "-s",
            "env=prod",
            "--debug",
        ])
        .unwrap();
        assert!(cli.debug());
        let Commands::Import(args) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(args.set, ["owner.name=John", "env=prod"]);
    }
}
