//! Campus Radar CLI - short-lived crowd hotspots and campus events from the terminal

mod cli;
mod commands;
mod config;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::config::run_config;
use crate::commands::events::run_events;
use crate::commands::list::run_list;
use crate::commands::report::run_report;
use crate::commands::watch::run_watch;
use crate::config::resolve_config_path;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {}", error.user_text());
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "radar=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config)?;

    match cli.command {
        Commands::List { json } => run_list(json, &config_path).await?,
        Commands::Report {
            lat,
            lon,
            label,
            json,
        } => run_report(lat, lon, label.as_deref(), json, &config_path).await?,
        Commands::Watch { seconds } => run_watch(seconds, &config_path).await?,
        Commands::Events { path, json } => run_events(path.as_deref(), json, &config_path)?,
        Commands::Config { command } => run_config(command, &config_path)?,
    }

    Ok(())
}
