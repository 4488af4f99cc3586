//! CLI commands

pub mod config;
pub mod demo;

use std::path::Path;

use anyhow::{Context, Result};
use versus_core::HarnessConfig;

/// Load the harness configuration, falling back to defaults when the file is absent
pub fn load_config(config_file: &Path) -> Result<HarnessConfig> {
    if !config_file.exists() {
        tracing::debug!(path = %config_file.display(), "Config file not found, using defaults");
        return Ok(HarnessConfig::default());
    }
    HarnessConfig::from_file(config_file)
        .with_context(|| format!("Failed to load config from {}", config_file.display()))
}
