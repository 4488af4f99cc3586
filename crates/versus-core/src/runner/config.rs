//! Harness configuration
//!
//! Configuration options for running experiments.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HarnessError, HarnessResult};
use crate::report::ReportFormat;

/// How the sample x version grid is scheduled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Single-threaded, sample-major then version-minor
    #[default]
    Sequential,
    /// Bounded pool of OS threads, synchronous versions only
    WorkerPool { workers: usize },
    /// One task per cell on the async runtime
    CooperativeBatch {
        #[serde(default)]
        max_in_flight: Option<usize>,
    },
}

impl Strategy {
    /// Short label used in logs and span attributes
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::WorkerPool { .. } => "worker_pool",
            Strategy::CooperativeBatch { .. } => "cooperative_batch",
        }
    }

    /// Requested degree of parallelism, if bounded
    pub fn requested_workers(&self) -> Option<usize> {
        match self {
            Strategy::Sequential => Some(1),
            Strategy::WorkerPool { workers } => Some(*workers),
            Strategy::CooperativeBatch { max_in_flight } => *max_in_flight,
        }
    }
}

/// Configuration for experiment runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Scheduling strategy
    #[serde(default)]
    pub strategy: Strategy,

    /// Whether to export the detailed results as CSV
    #[serde(default = "default_save_csv")]
    pub save_csv: bool,

    /// Directory for timestamp-named CSV files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Explicit CSV path, overriding the timestamp-derived name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,

    /// Format used when rendering the report
    #[serde(default = "default_report_format")]
    pub report_format: ReportFormat,

    /// Whether the rendered report includes the per-cell table
    #[serde(default = "default_show_details")]
    pub show_details: bool,

    /// Whether to run in verbose mode
    #[serde(default)]
    pub verbose: bool,
}

fn default_save_csv() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_report_format() -> ReportFormat {
    ReportFormat::Table
}

fn default_show_details() -> bool {
    true
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            save_csv: default_save_csv(),
            output_dir: default_output_dir(),
            csv_path: None,
            report_format: default_report_format(),
            show_details: default_show_details(),
            verbose: false,
        }
    }
}

impl HarnessConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> HarnessResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> HarnessResult<String> {
        toml::to_string_pretty(self).map_err(|e| HarnessError::invalid_config(e.to_string()))
    }

    /// Check values that cannot drive a run
    pub fn validate(&self) -> HarnessResult<()> {
        match self.strategy {
            Strategy::WorkerPool { workers: 0 } => {
                Err(HarnessError::invalid_config("worker pool needs at least one worker"))
            }
            Strategy::CooperativeBatch {
                max_in_flight: Some(0),
            } => Err(HarnessError::invalid_config("max_in_flight must be at least 1")),
            _ => Ok(()),
        }
    }

    /// Set the scheduling strategy
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Use a worker pool of the given size
    pub fn with_workers(self, workers: usize) -> Self {
        self.with_strategy(Strategy::WorkerPool { workers })
    }

    /// Set output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Write the CSV to an explicit path
    pub fn with_csv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv_path = Some(path.into());
        self.save_csv = true;
        self
    }

    /// Disable CSV export
    pub fn without_csv(mut self) -> Self {
        self.save_csv = false;
        self
    }

    /// Set the report format
    pub fn with_report_format(mut self, format: ReportFormat) -> Self {
        self.report_format = format;
        self
    }

    /// Enable verbose mode
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Where the CSV for a run starting at `timestamp` goes
    pub fn resolve_csv_path(&self, timestamp: &chrono::DateTime<chrono::Local>) -> PathBuf {
        match &self.csv_path {
            Some(path) => path.clone(),
            None => self
                .output_dir
                .join(format!("run_{}.csv", timestamp.format("%Y-%m-%d_%H%M%S"))),
        }
    }
}
