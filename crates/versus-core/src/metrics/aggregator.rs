//! Metrics aggregation for evaluation results
//!
//! Aggregates per-cell metric outcomes into per-version summary statistics.

use super::types::{AggregateKind, Score, Summary, SummaryEntry};
use crate::runner::ResultMatrix;

/// Aggregator for computing summary metrics from a result matrix
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Aggregate every (version, metric) pair.
    ///
    /// Only cells without an execution error contribute. Entries are ordered
    /// by version then metric, following the given name orders.
    pub fn aggregate(matrix: &ResultMatrix, version_names: &[String], metric_names: &[String]) -> Summary {
        let mut entries = Vec::with_capacity(version_names.len() * metric_names.len());
        if matrix.is_empty() {
            return Summary { entries };
        }

        for (version_index, version_name) in version_names.iter().enumerate() {
            for metric_name in metric_names {
                let scores: Vec<&Score> = matrix
                    .column(version_index)
                    .filter(|cell| cell.error.is_none())
                    .filter_map(|cell| cell.metric(metric_name).and_then(|o| o.score()))
                    .collect();

                let (aggregate_value, aggregate_kind) = Self::summarize(&scores);
                entries.push(SummaryEntry {
                    version_name: version_name.clone(),
                    metric_name: metric_name.clone(),
                    aggregate_value,
                    aggregate_kind,
                    valid_count: scores.len(),
                });
            }
        }

        Summary { entries }
    }

    /// Reduce a column of scores to a single statistic.
    ///
    /// The first score picks the statistic: a boolean makes it a pass rate
    /// where only `true` counts as passing, a number makes it a mean.
    fn summarize(scores: &[&Score]) -> (f64, AggregateKind) {
        let Some(first) = scores.first() else {
            return (0.0, AggregateKind::NotApplicable);
        };

        if first.is_bool() {
            let passed = scores
                .iter()
                .filter(|s| matches!(s, Score::Bool(true)))
                .count();
            return (passed as f64 / scores.len() as f64, AggregateKind::Percentage);
        }

        let numeric: Option<Vec<f64>> = scores.iter().map(|s| s.as_f64()).collect();
        match numeric {
            Some(values) => {
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                (mean, AggregateKind::Mean)
            }
            None => (0.0, AggregateKind::Error),
        }
    }
}
