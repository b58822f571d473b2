//! drivepick - random media from a remote folder tree
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use drivepick::cli::{Cli, Commands};
use drivepick::config::ConfigManager;
use drivepick::error::DrivepickResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> DrivepickResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("drivepick=warn"),
        1 => EnvFilter::new("drivepick=info"),
        _ => EnvFilter::new("drivepick=debug"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }
    debug!("Using config {}", config_manager.path().display());

    if !matches!(cli.command, Commands::Config(_)) {
        ConfigManager::ensure_state_dirs(&config).await?;
    }

    match cli.command {
        Commands::Pick(args) => drivepick::cli::commands::pick(args, &config).await,
        Commands::Warm(args) => drivepick::cli::commands::warm(args, &config).await,
        Commands::Weights(args) => drivepick::cli::commands::weights(args, &config).await,
        Commands::Cache(args) => drivepick::cli::commands::cache(args, &config).await,
        Commands::Config(args) => {
            drivepick::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
