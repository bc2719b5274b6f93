// src/main.rs
mod commands;
mod config;
mod errors;
mod persistence;
mod schedule;
mod sla;
mod types;
mod utils;
mod worklog;

use clap::Parser;
use config::AppConfig;
use errors::AppResult;
use std::path::PathBuf;
use types::Commands;

/// SLA tracking for incident records: duration formatting, compliance calculation and reports.
#[derive(Parser, Debug)]
#[command(name = config::APP_NAME, version, about)]
struct Cli {
    /// SQLite database file (defaults to the user data directory)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// SLA settings file in TOML (defaults to the user data directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn run(cli: Cli) -> AppResult<()> {
    let Cli { database, settings, command } = cli;
    // Paths are only resolved for commands that touch the database or the settings.
    let resolve = move || -> AppResult<AppConfig> {
        let app_config = AppConfig::resolve(database, settings)?;
        log::debug!("Resolved configuration: {:?}", app_config);
        Ok(app_config)
    };

    match command {
        Commands::Format { durations } => commands::format::execute(&durations),
        Commands::Import { file } => commands::import::execute(&resolve()?, &file),
        Commands::List { filter } => commands::list::execute(&resolve()?, &filter),
        Commands::Calculate { codes, all } => commands::calculate::execute(&resolve()?, &codes, all),
        Commands::Export { output, filter } => commands::export::execute(&resolve()?, &output, &filter),
        Commands::Stats => commands::stats::execute(&resolve()?),
        Commands::Report { output, filter } => {
            commands::report::execute(&resolve()?, output.as_deref(), &filter)
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
