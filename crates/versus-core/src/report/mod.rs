//! Report generation for experiment runs
//!
//! Renders a [`RunOutcome`] as a terminal table, Markdown or JSON, and
//! exports the per-cell details as CSV.

mod csv;
mod json;
mod markdown;
mod table;

pub use csv::CsvExporter;
pub use json::JsonReporter;
pub use markdown::MarkdownReporter;
pub use table::TableReporter;

use serde::{Deserialize, Serialize};

use crate::error::HarnessResult;
use crate::metrics::MetricOutcome;
use crate::runner::{CellResult, RunOutcome};
use crate::samples::Sample;

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Markdown,
    Table,
}

impl ReportFormat {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            "table" | "text" => Some(ReportFormat::Table),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "markdown",
            ReportFormat::Table => "table",
        }
    }
}

/// Generate a report in the specified format
pub fn generate_report(
    outcome: &RunOutcome,
    format: ReportFormat,
    show_details: bool,
) -> HarnessResult<String> {
    match format {
        ReportFormat::Json => JsonReporter::generate(outcome, show_details),
        ReportFormat::Markdown => Ok(MarkdownReporter::generate(outcome, show_details)),
        ReportFormat::Table => Ok(TableReporter::generate(outcome, show_details)),
    }
}

/// Inputs column of the detailed views: positional args, then named args if any
fn inputs_repr(sample: &Sample) -> String {
    if sample.kwargs.is_empty() {
        sample.args_repr()
    } else {
        format!("{} {}", sample.args_repr(), sample.kwargs_repr())
    }
}

/// Metric cell of the detailed views
fn detail_metric(cell: &CellResult, metric_name: &str) -> String {
    match cell.metric(metric_name) {
        Some(MetricOutcome::NotApplicable) | None => "N/A".to_string(),
        Some(outcome) => outcome.to_string(),
    }
}

/// Summary row for one version, one value per metric
fn summary_row(outcome: &RunOutcome, version_name: &str) -> Vec<String> {
    let mut row = vec![version_name.to_string()];
    for metric_name in &outcome.metric_names {
        let value = outcome
            .summary
            .get(version_name, metric_name)
            .map(|entry| entry.display_value())
            .unwrap_or_else(|| "N/A".to_string());
        row.push(value);
    }
    row
}

/// Detailed rows, sample-major then version-minor
fn detail_rows(outcome: &RunOutcome) -> Vec<Vec<String>> {
    outcome
        .matrix
        .cells()
        .map(|cell| {
            let (case, inputs, ideal) = match outcome.samples.get(cell.sample_index) {
                Some(sample) => (
                    sample.number().to_string(),
                    inputs_repr(sample),
                    sample.ideal_repr(),
                ),
                None => ((cell.sample_index + 1).to_string(), String::new(), String::new()),
            };
            let mut row = vec![case, inputs, ideal, cell.version_name.clone(), cell.output_repr()];
            row.extend(
                outcome
                    .metric_names
                    .iter()
                    .map(|name| detail_metric(cell, name)),
            );
            row.push(cell.error_message().unwrap_or_default().to_string());
            row
        })
        .collect()
}

fn detail_headers(outcome: &RunOutcome) -> Vec<String> {
    let mut headers: Vec<String> = ["Case #", "Inputs", "Ideal", "Version", "Actual Output"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    headers.extend(outcome.metric_names.iter().cloned());
    headers.push("Error".to_string());
    headers
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::error::VersionError;
    use crate::metrics::Metric;
    use crate::runner::{Experiment, HarnessConfig, RunOutcome, VersionHandle};
    use serde_json::json;

    /// Two samples, one healthy and one fragile version
    pub(crate) fn outcome() -> RunOutcome {
        let mut experiment = Experiment::new(HarnessConfig::default().without_csv());
        experiment
            .add_case(4, vec![json!(2), json!(2)])
            .add_case(7, vec![json!(3), json!(4)]);
        experiment.metric("Exact Match", Metric::exact_match()).unwrap();
        experiment.metric("Abs Error", Metric::absolute_error()).unwrap();

        let add = VersionHandle::sync("add", |args, _| {
            Ok(json!(args.iter().filter_map(|v| v.as_i64()).sum::<i64>()))
        });
        let fragile = VersionHandle::sync("fragile", |args, _| {
            if args[0] == json!(3) {
                Err(VersionError::new("bad, input"))
            } else {
                Ok(json!(4))
            }
        });
        experiment.run(&[add, fragile]).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json));
        assert_eq!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown));
        assert_eq!(ReportFormat::from_str("table"), Some(ReportFormat::Table));
        assert_eq!(ReportFormat::from_str("html"), None);
    }

    #[test]
    fn test_detail_rows_order_and_markers() {
        let outcome = fixtures::outcome();
        let rows = detail_rows(&outcome);
        assert_eq!(rows.len(), 4);

        let keys: Vec<(&str, &str)> = rows.iter().map(|r| (r[0].as_str(), r[3].as_str())).collect();
        assert_eq!(keys, vec![("1", "add"), ("1", "fragile"), ("2", "add"), ("2", "fragile")]);

        let failed = &rows[3];
        assert_eq!(failed[4], "N/A (Func Err)");
        assert_eq!(failed[5], "N/A");
        assert_eq!(failed[7], "bad, input");
    }

    #[test]
    fn test_summary_row() {
        let outcome = fixtures::outcome();
        assert_eq!(summary_row(&outcome, "add"), vec!["add", "100.0%", "0.0000"]);
        assert_eq!(summary_row(&outcome, "fragile"), vec!["fragile", "100.0%", "0.0000"]);
    }
}
