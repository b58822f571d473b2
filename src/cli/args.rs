//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// drivepick - random media from a remote folder tree
///
/// Picks a random photo or video below a root folder, weighting top-level
/// folders by how many files they hold. Folder listings are cached on disk.
#[derive(Parser, Debug)]
#[command(name = "drivepick")]
#[command(author, version, long_about = None)]
#[command(about = "Pick random media from a remote folder tree")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DRIVEPICK_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pick and download random media
    Pick(PickArgs),

    /// Walk the whole folder tree into the cache
    Warm(WarmArgs),

    /// Show how top-level folders are weighted
    Weights(WeightsArgs),

    /// Inspect or maintain the folder cache
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the pick command
#[derive(Parser, Debug)]
pub struct PickArgs {
    /// Number of picks (0 = until interrupted)
    #[arg(short = 'n', long, default_value = "1")]
    pub count: u32,

    /// Seconds to wait between picks
    #[arg(short, long, default_value = "0")]
    pub interval: u64,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the warm command
#[derive(Parser, Debug)]
pub struct WarmArgs {
    /// Refetch every folder, even fresh ones
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the weights command
#[derive(Parser, Debug)]
pub struct WeightsArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., source.root_folder_id)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for pick and weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show entry counts and ages
    Info,

    /// Drop entries past the stale horizon
    Prune,

    /// Delete every cached folder
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn help_describes_the_tool() {
        let about = Cli::command().get_about().map(|a| a.to_string());
        assert_eq!(
            about.as_deref(),
            Some("Pick random media from a remote folder tree")
        );
    }

    #[test]
    fn cli_parses_pick_defaults() {
        let cli = Cli::parse_from(["drivepick", "pick"]);
        match cli.command {
            Commands::Pick(args) => {
                assert_eq!(args.count, 1);
                assert_eq!(args.interval, 0);
                assert_eq!(args.format, OutputFormat::Table);
            }
            _ => panic!("expected Pick command"),
        }
    }

    #[test]
    fn cli_parses_repeated_pick() {
        let cli = Cli::parse_from(["drivepick", "pick", "-n", "0", "--interval", "30", "-f", "json"]);
        match cli.command {
            Commands::Pick(args) => {
                assert_eq!(args.count, 0);
                assert_eq!(args.interval, 30);
                assert_eq!(args.format, OutputFormat::Json);
            }
            _ => panic!("expected Pick command"),
        }
    }

    #[test]
    fn cli_parses_warm_force() {
        let cli = Cli::parse_from(["drivepick", "warm", "--force"]);
        assert!(matches!(cli.command, Commands::Warm(WarmArgs { force: true })));
    }

    #[test]
    fn cli_parses_cache_clear() {
        let cli = Cli::parse_from(["drivepick", "cache", "clear", "-y"]);
        match cli.command {
            Commands::Cache(args) => {
                assert!(matches!(args.action, CacheAction::Clear { yes: true }))
            }
            _ => panic!("expected Cache command"),
        }
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from([
            "drivepick",
            "config",
            "set",
            "source.root_folder_id",
            "1AbC",
        ]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Set { key, value }),
            }) => {
                assert_eq!(key, "source.root_folder_id");
                assert_eq!(value, "1AbC");
            }
            _ => panic!("expected Config set command"),
        }
    }

    #[test]
    fn cli_verbose_counts() {
        let cli = Cli::parse_from(["drivepick", "-vv", "weights"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["drivepick", "weights", "-f", "xml"]).is_err());
    }
}
