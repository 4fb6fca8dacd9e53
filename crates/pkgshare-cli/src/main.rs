//! pkgshare CLI
//!
//! Manages NuGet packages stored on a network file share mapped to a drive.

mod cli;
mod commands;
mod error;
mod logging;

use std::path::Path;

use clap::Parser;
use colored::Colorize;
use pkgshare_store::{PackageStore, StoreConfig};

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path, force } => {
            logging::init(cli.verbose, None)?;
            commands::run_init(path.as_deref().unwrap_or(&cli.config), force)
        }
        Commands::Check { json } => {
            let config = load(&cli.config, cli.verbose)?;
            commands::run_check(&config, json)
        }
        Commands::Get {
            id,
            version,
            output,
        } => {
            let store = open_store(&cli.config, cli.verbose)?;
            commands::run_get(&store, &id, &version, output.as_deref()).map(drop)
        }
        Commands::Push { file } => {
            let store = open_store(&cli.config, cli.verbose)?;
            commands::run_push(&store, &file).map(drop)
        }
        Commands::Delete { id, version } => {
            let store = open_store(&cli.config, cli.verbose)?;
            commands::run_delete(&store, &id, &version)
        }
        Commands::Clean => {
            let store = open_store(&cli.config, cli.verbose)?;
            commands::run_clean(&store).map(drop)
        }
    }
}

/// Load the configuration and start logging to wherever it points.
fn load(config_path: &Path, verbose: bool) -> Result<StoreConfig> {
    let config = commands::load_config(config_path)?;
    logging::init(verbose, config.log_file_name.as_deref())?;
    tracing::debug!(config = %config_path.display(), "Configuration loaded");
    Ok(config)
}

fn open_store(config_path: &Path, verbose: bool) -> Result<PackageStore> {
    let config = load(config_path, verbose)?;
    Ok(PackageStore::from_config(&config)?)
}
