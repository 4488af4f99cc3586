//! Core metric types for evaluation
//!
//! Defines scores, per-cell metric outcomes and summary entries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker text for a metric that was not evaluated because the version failed
pub const NOT_APPLICABLE_FUNC_ERR: &str = "N/A (Func Err)";

/// Value produced by a scoring function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Score {
    /// Numeric view of the score, booleans counting as 0/1
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Score::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Score::Int(i) => Some(*i as f64),
            Score::Float(f) => Some(*f),
            Score::Text(_) => None,
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Score::Bool(_))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Bool(true) => write!(f, "True"),
            Score::Bool(false) => write!(f, "False"),
            Score::Int(i) => write!(f, "{}", i),
            Score::Float(v) => write!(f, "{:?}", v),
            Score::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Score {
    fn from(value: bool) -> Self {
        Score::Bool(value)
    }
}

impl From<i64> for Score {
    fn from(value: i64) -> Self {
        Score::Int(value)
    }
}

impl From<i32> for Score {
    fn from(value: i32) -> Self {
        Score::Int(value as i64)
    }
}

impl From<f64> for Score {
    fn from(value: f64) -> Self {
        Score::Float(value)
    }
}

impl From<&str> for Score {
    fn from(value: &str) -> Self {
        Score::Text(value.to_string())
    }
}

impl From<String> for Score {
    fn from(value: String) -> Self {
        Score::Text(value)
    }
}

/// Outcome of one metric on one cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetricOutcome {
    /// The scoring function returned a value
    Score(Score),
    /// The scoring function failed; sibling metrics are unaffected
    Error(String),
    /// The version failed, so the metric was never evaluated
    NotApplicable,
}

impl MetricOutcome {
    pub fn score(&self) -> Option<&Score> {
        match self {
            MetricOutcome::Score(score) => Some(score),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, MetricOutcome::Error(_))
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self, MetricOutcome::NotApplicable)
    }
}

impl fmt::Display for MetricOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricOutcome::Score(score) => write!(f, "{}", score),
            MetricOutcome::Error(message) => write!(f, "Error: {}", message),
            MetricOutcome::NotApplicable => write!(f, "{}", NOT_APPLICABLE_FUNC_ERR),
        }
    }
}

/// How a summary value should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    /// Pass rate over boolean scores (0.0 - 1.0)
    Percentage,
    /// Arithmetic mean over numeric scores
    Mean,
    /// No valid scores were collected
    NotApplicable,
    /// Scores were neither boolean nor numeric
    Error,
}

/// Summary statistic for one (version, metric) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub version_name: String,
    pub metric_name: String,
    pub aggregate_value: f64,
    pub aggregate_kind: AggregateKind,
    /// Number of cells that contributed
    pub valid_count: usize,
}

impl SummaryEntry {
    /// Format the aggregate for display
    pub fn display_value(&self) -> String {
        match self.aggregate_kind {
            AggregateKind::Percentage => format!("{:.1}%", self.aggregate_value * 100.0),
            AggregateKind::Mean => format!("{:.4}", self.aggregate_value),
            AggregateKind::NotApplicable => "N/A".to_string(),
            AggregateKind::Error => "Error".to_string(),
        }
    }
}

/// Summary table, ordered by version then metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub entries: Vec<SummaryEntry>,
}

impl Summary {
    pub fn get(&self, version_name: &str, metric_name: &str) -> Option<&SummaryEntry> {
        self.entries
            .iter()
            .find(|e| e.version_name == version_name && e.metric_name == metric_name)
    }

    /// Entries for one version, in metric order
    pub fn for_version<'a>(&'a self, version_name: &'a str) -> impl Iterator<Item = &'a SummaryEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.version_name == version_name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
