//! stanctl-integration CLI entry point.

use clap::Parser;
use stanctl::cli::commands;
use stanctl::cli::{Cli, Commands};
use stanctl::config::LogSettings;
use stanctl::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().collect();
    let cli = Cli::parse_from(&argv);

    init_tracing(LogSettings::new(cli.debug()));

    match run(&cli, &argv) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(hint) = e.hint() {
                eprintln!("Error: {e}\n  Hint: {hint}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(log: LogSettings) {
    tracing_subscriber::fmt()
        .with_env_filter(log.env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli, argv: &[String]) -> Result<(), Error> {
    match &cli.command {
        Commands::Download(args) => commands::download::execute(args),
        Commands::Import(args) => commands::import::execute(args),
        Commands::Export(args) => commands::export::execute(args, argv),
        Commands::Init(args) => commands::init::execute(args),
        Commands::Publish(args) => commands::publish::execute(args),
        Commands::Lint(args) => commands::lint::execute(args),
        Commands::Completions { shell } => commands::completions::execute(*shell),
    }
}
