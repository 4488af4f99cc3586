//! CSV export of per-cell results
//!
//! One row per (sample, version) cell, sample-major then version-minor.
//! Fields are quoted only when they contain a delimiter, a quote or a line
//! break.

use std::borrow::Cow;
use std::path::Path;

use crate::error::{HarnessError, HarnessResult};
use crate::metrics::MetricOutcome;
use crate::runner::{CellResult, RunOutcome};

/// CSV exporter for detailed results
pub struct CsvExporter;

impl CsvExporter {
    /// Column names: fixed leading columns, one per metric, trailing `Error`
    pub fn header(metric_names: &[String]) -> Vec<String> {
        let mut header: Vec<String> = ["Case #", "Args", "Kwargs", "Ideal", "Version", "Actual"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        header.extend(metric_names.iter().cloned());
        header.push("Error".to_string());
        header
    }

    /// Render the whole document
    pub fn render(outcome: &RunOutcome) -> String {
        let mut csv = String::new();
        push_record(&mut csv, &Self::header(&outcome.metric_names));
        for cell in outcome.matrix.cells() {
            push_record(&mut csv, &Self::row(outcome, cell));
        }
        csv
    }

    /// Write the document to `path`
    pub fn write(outcome: &RunOutcome, path: &Path) -> HarnessResult<()> {
        std::fs::write(path, Self::render(outcome))
            .map_err(|e| HarnessError::reporting(Some(path.to_path_buf()), e.to_string()))
    }

    /// Write the document to `path` without blocking the runtime
    pub async fn write_async(outcome: &RunOutcome, path: &Path) -> HarnessResult<()> {
        tokio::fs::write(path, Self::render(outcome))
            .await
            .map_err(|e| HarnessError::reporting(Some(path.to_path_buf()), e.to_string()))
    }

    fn row(outcome: &RunOutcome, cell: &CellResult) -> Vec<String> {
        let mut row = match outcome.samples.get(cell.sample_index) {
            Some(sample) => vec![
                sample.number().to_string(),
                sample.args_repr(),
                sample.kwargs_repr(),
                sample.ideal_repr(),
            ],
            None => vec![
                (cell.sample_index + 1).to_string(),
                String::new(),
                String::new(),
                String::new(),
            ],
        };
        row.push(cell.version_name.clone());
        row.push(cell.output_repr());
        for name in &outcome.metric_names {
            let value = cell
                .metric(name)
                .map(MetricOutcome::to_string)
                .unwrap_or_default();
            row.push(value);
        }
        row.push(cell.error_message().unwrap_or_default().to_string());
        row
    }
}

fn push_record(csv: &mut String, fields: &[String]) {
    let record: Vec<Cow<'_, str>> = fields.iter().map(|f| escape(f)).collect();
    csv.push_str(&record.join(","));
    csv.push('\n');
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
