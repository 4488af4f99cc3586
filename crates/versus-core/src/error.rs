//! Error types for the evaluation harness
//!
//! Only precondition violations surface as [`HarnessError`] from a run.
//! Failures of a version callable or a scoring function are captured per
//! cell or per metric and never propagate out of the scheduler.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum HarnessError {
    /// A metric with this name is already registered
    #[error("Metric '{name}' exists")]
    DuplicateMetric { name: String },

    /// The metric registration itself is malformed
    #[error("Invalid metric: {reason}")]
    InvalidMetric { reason: String },

    /// The synchronous entry point was called with asynchronous versions
    #[error("Sync run() called with async versions: {names:?}. Use arun().")]
    AsyncVersionInSyncRun { names: Vec<String> },

    /// The synchronous entry point was called with a cooperative strategy configured
    #[error("Cooperative batch strategy requires arun()")]
    CooperativeStrategyInSyncRun,

    /// Configuration values that cannot drive a run
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A matrix slot outside the pre-sized grid was addressed
    #[error("Cell ({sample_index}, {version_index}) is outside a {samples}x{versions} matrix")]
    SlotOutOfBounds {
        sample_index: usize,
        version_index: usize,
        samples: usize,
        versions: usize,
    },

    /// A matrix slot was written twice
    #[error("Cell ({sample_index}, {version_index}) was already populated")]
    SlotAlreadyFilled {
        sample_index: usize,
        version_index: usize,
    },

    /// Report rendering or export failed
    #[error("Reporting error for {path:?}: {message}")]
    Reporting { path: Option<PathBuf>, message: String },

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl HarnessError {
    /// Create an invalid-config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a reporting error
    pub fn reporting(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self::Reporting {
            path,
            message: message.into(),
        }
    }

    /// Whether this error was raised before any cell executed
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            HarnessError::AsyncVersionInSyncRun { .. }
                | HarnessError::CooperativeStrategyInSyncRun
                | HarnessError::InvalidConfig { .. }
        )
    }
}

/// Failure raised by a version callable
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct VersionError {
    pub message: String,
}

impl VersionError {
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Failure raised by a scoring function
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct MetricError {
    pub message: String,
}

impl MetricError {
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Extract a readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
