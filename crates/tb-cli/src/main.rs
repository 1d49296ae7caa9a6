use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tb_cli::commands::{estimate, track};
use tb_cli::{Cli, Commands, Config};

/// Load and validate config.
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    config.validate().context("invalid configuration")?;
    Ok(config)
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

    match &cli.command {
        Some(Commands::Track {
            log,
            strategy,
            json,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            track::run(&mut std::io::stdout().lock(), &config, log, *strategy, *json)?;
        }
        Some(Commands::Estimate {
            guesses,
            risk,
            json,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            estimate::run(&mut std::io::stdout().lock(), &config, guesses, *risk, *json)?;
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
