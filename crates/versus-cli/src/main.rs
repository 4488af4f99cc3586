//! Versus CLI application
//!
//! Runs the built-in demonstration experiment and manages harness
//! configuration files.
//!
//! # Installation
//!
//! ```bash
//! cargo install --path crates/versus-cli
//! ```

mod args;
mod commands;

use anyhow::Result;
use clap::Parser;

use args::{Cli, Commands, ConfigAction};

#[tokio::main]
async fn main() -> Result<()> {
    // Set RUST_LOG=debug for verbose logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Demo(args) => commands::demo::run(args).await,
        Commands::Config { action } => match action {
            ConfigAction::Show { config_file } => commands::config::show(&config_file),
            ConfigAction::Validate { config_file } => commands::config::validate(&config_file),
            ConfigAction::Init { config_file, force } => {
                commands::config::init(&config_file, force)
            }
        },
    }
}
