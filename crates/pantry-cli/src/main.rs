//! Pantry CLI
//!
//! Command-line interface for Pantry - shopping list with optimistic saves.

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pantry_core::Config;

mod commands;
mod output;

use commands::Session;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "pantry")]
#[command(about = "Pantry - Shopping list with optimistic saves")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a specific config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an item (saved with `pantry save`)
    Add {
        /// Item name
        name: String,
        /// Budget for the item
        #[arg(short, long)]
        budget: f64,
        /// Priority from 1 to 5 (0 = unset)
        #[arg(short, long, default_value_t = 0)]
        priority: u8,
    },
    /// Remove an item (saved with `pantry save`)
    #[command(name = "rm", alias = "remove")]
    Remove {
        /// Item ID (full ID or prefix)
        id: String,
    },
    /// List items, including unsaved changes
    #[command(alias = "ls")]
    List,
    /// Save unsaved changes to the store
    Save,
    /// Show status (store, unsaved changes)
    Status,
    /// Print the list whenever it changes
    Watch,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, store_path, poll_interval_ms, image_search.*, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the store
    let command = match cli.command {
        Commands::Config { command } => {
            return handle_config_command(command, cli.config.as_ref(), &output);
        }
        command => command,
    };

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config);

    let session = Session::open(&config)?;

    let result = match command {
        Commands::Add {
            name,
            budget,
            priority,
        } => commands::item::add(&session, name, budget, priority, &output).await,
        Commands::Remove { id } => commands::item::remove(&session, id, &output).await,
        Commands::List => commands::item::list(&session, &output).await,
        Commands::Save => commands::save::save(&session, &output).await,
        Commands::Status => commands::status::show(&session, &config, &output).await,
        Commands::Watch => commands::watch::watch(&session, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    };

    session.close().await;
    result
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize logging when PANTRY_LOG is set
///
/// Logs go to the configured log file, or stderr when none is set.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("PANTRY_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "pantry_core={},pantry_cli={}",
        log_level, log_level
    ));

    match &config.log_file {
        Some(log_path) => {
            let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
                    return;
                }
            };

            // Ignore error if already initialized
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();

            info!("Logging to {:?}", log_path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
