//! Per-cell outcome types
//!
//! A cell is one (sample, version) pairing. It is created exactly once and
//! never mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::metrics::{MetricOutcome, MetricRegistry, NOT_APPLICABLE_FUNC_ERR};
use crate::samples::{Sample, render_value};

/// Terminal state of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    /// The version returned a value and metrics were evaluated
    Success,
    /// The version failed; no metric was evaluated
    FunctionError,
    /// The scheduler lost the unit of work before it produced a result
    TaskFailure,
}

/// Classification of a cell failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellErrorKind {
    FunctionExecution,
    TaskInfrastructure,
}

/// Failure descriptor attached to a cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellError {
    pub kind: CellErrorKind,
    pub message: String,
}

impl CellError {
    /// Failure raised by the version callable
    pub fn function(message: impl Into<String>) -> Self {
        Self {
            kind: CellErrorKind::FunctionExecution,
            message: message.into(),
        }
    }

    /// Scheduling-level failure
    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self {
            kind: CellErrorKind::TaskInfrastructure,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Result of running one version against one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellResult {
    pub sample_index: usize,
    pub version_index: usize,
    pub version_name: String,

    /// Output of the version; `None` when it failed
    pub raw_output: Option<Value>,

    /// Outcome per metric, in registration order
    pub metric_results: Vec<(String, MetricOutcome)>,

    pub error: Option<CellError>,
    pub status: CellStatus,

    /// Wall-clock time spent inside the version callable
    pub duration_secs: f64,
}

impl CellResult {
    /// Build the result for a finished invocation, scoring it on success
    pub fn from_invocation(
        sample: &Sample,
        version_index: usize,
        version_name: &str,
        invocation: Result<Value, CellError>,
        duration_secs: f64,
        metrics: &MetricRegistry,
    ) -> Self {
        match invocation {
            Ok(output) => {
                let metric_results = metrics.evaluate_all(&output, sample);
                Self {
                    sample_index: sample.index,
                    version_index,
                    version_name: version_name.to_string(),
                    raw_output: Some(output),
                    metric_results,
                    error: None,
                    status: CellStatus::Success,
                    duration_secs,
                }
            }
            Err(error) => {
                let status = match error.kind {
                    CellErrorKind::FunctionExecution => CellStatus::FunctionError,
                    CellErrorKind::TaskInfrastructure => CellStatus::TaskFailure,
                };
                Self {
                    sample_index: sample.index,
                    version_index,
                    version_name: version_name.to_string(),
                    raw_output: None,
                    metric_results: metrics.not_applicable(),
                    error: Some(error),
                    status,
                    duration_secs,
                }
            }
        }
    }

    /// Synthetic result for a slot whose unit of work never reported back
    pub fn task_failure(
        sample_index: usize,
        version_index: usize,
        version_name: &str,
        message: impl Into<String>,
        metrics: &MetricRegistry,
    ) -> Self {
        Self {
            sample_index,
            version_index,
            version_name: version_name.to_string(),
            raw_output: None,
            metric_results: metrics.not_applicable(),
            error: Some(CellError::infrastructure(message)),
            status: CellStatus::TaskFailure,
            duration_secs: 0.0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Outcome of a metric by name
    pub fn metric(&self, name: &str) -> Option<&MetricOutcome> {
        self.metric_results
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    /// Rendering of the output for reports
    pub fn output_repr(&self) -> String {
        match (&self.error, &self.raw_output) {
            (None, Some(output)) => render_value(output),
            (None, None) => "null".to_string(),
            (Some(_), _) => NOT_APPLICABLE_FUNC_ERR.to_string(),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}
