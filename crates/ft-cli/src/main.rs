use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ft_cli::commands::{run, sessions, status, summaries, summarize, switches, timeline, util};
use ft_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(ft_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = ft_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut stdout = std::io::stdout();

    match &cli.command {
        Some(Commands::Run) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            run::run(&mut stdout, db, &config)?;
        }
        Some(Commands::Status { limit, json }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            status::run(&mut stdout, &db, &config.database_path, *limit, *json)?;
        }
        Some(Commands::Sessions { json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            sessions::run(&mut stdout, &db, *json)?;
        }
        Some(Commands::Timeline { limit, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            timeline::run(&mut stdout, &db, *limit, *json)?;
        }
        Some(Commands::Switches { json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            switches::run(&mut stdout, &db, *json)?;
        }
        Some(Commands::Summaries { json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            summaries::run(&mut stdout, &db, *json)?;
        }
        Some(Commands::Summarize { start, end, json }) => {
            let start = util::parse_datetime(start)?;
            let end = end
                .as_deref()
                .map_or_else(|| Ok(chrono::Utc::now()), util::parse_datetime)?;
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            summarize::run(&mut stdout, &mut db, start, end, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
