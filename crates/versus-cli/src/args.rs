//! CLI argument definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Default configuration file name used across all CLI commands.
pub const DEFAULT_CONFIG_FILE: &str = "versus.toml";

#[derive(Parser)]
#[command(name = "versus")]
#[command(about = "Versus - side-by-side evaluation of function versions")]
#[command(
    long_about = r#"Versus - side-by-side evaluation of function versions

USAGE:
  versus demo                        # Run the built-in demonstration experiment
  versus demo --strategy pool -w 4   # Same, on a pool of four worker threads
  versus demo --strategy batch       # Same, including async versions

UTILITY COMMANDS:
  versus config init                 # Create config file
  versus config show                 # Show current config
  versus config validate             # Validate config file

Set RUST_LOG=debug for per-cell logging."#
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the built-in demonstration experiment
    Demo(DemoArgs),

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Clone, Debug)]
pub struct DemoArgs {
    /// Path to configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: PathBuf,

    /// Scheduling strategy, overriding the config file
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Worker threads for the pool strategy
    #[arg(long, short)]
    pub workers: Option<usize>,

    /// Maximum cells in flight for the batch strategy
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Report format: table, markdown or json
    #[arg(long, short)]
    pub format: Option<String>,

    /// Directory for the timestamp-named CSV file
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Skip the CSV export
    #[arg(long)]
    pub no_csv: bool,

    /// Print the summary only
    #[arg(long)]
    pub no_details: bool,

    /// Print progress for every cell
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyArg {
    /// One cell at a time, in row order
    Sequential,
    /// Bounded pool of worker threads
    Pool,
    /// Cooperative batch on the async runtime
    Batch,
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Display current configuration settings
    Show {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config_file: PathBuf,
    },

    /// Validate configuration file for errors
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config_file: PathBuf,
    },

    /// Create a new configuration file with defaults
    Init {
        /// Path for the new configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config_file: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}
