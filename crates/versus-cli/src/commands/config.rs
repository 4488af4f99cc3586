//! Configuration management commands

use std::path::Path;

use anyhow::{Context, Result, bail};
use versus_core::HarnessConfig;

use super::load_config;

/// Show current configuration
pub fn show(config_file: &Path) -> Result<()> {
    if config_file.exists() {
        println!("Loaded configuration from: {}\n", config_file.display());
    } else {
        println!(
            "Configuration file not found: {}\nUsing default configuration\n",
            config_file.display()
        );
    }

    let config = load_config(config_file)?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// Validate configuration
pub fn validate(config_file: &Path) -> Result<()> {
    if !config_file.exists() {
        bail!("Configuration file not found: {}", config_file.display());
    }

    let config = load_config(config_file)?;
    println!("Configuration is valid");
    println!("Strategy: {}", config.strategy.label());
    println!("Report format: {}", config.report_format.as_str());
    println!(
        "CSV export: {}",
        if config.save_csv { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Create a new configuration file with defaults
pub fn init(config_file: &Path, force: bool) -> Result<()> {
    if config_file.exists() && !force {
        bail!(
            "Configuration file already exists: {} (use --force to overwrite)",
            config_file.display()
        );
    }

    let content = HarnessConfig::default().to_toml_string()?;
    std::fs::write(config_file, content)
        .with_context(|| format!("Failed to write {}", config_file.display()))?;
    println!("Created configuration file: {}", config_file.display());
    Ok(())
}
