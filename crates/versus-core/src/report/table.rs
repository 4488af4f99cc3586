//! Plain-text tables for terminal output

use super::{detail_headers, detail_rows, summary_row};
use crate::runner::RunOutcome;
use crate::samples::truncate;

/// Widest a single table cell may render
const MAX_CELL_WIDTH: usize = 32;

/// Terminal table report generator
pub struct TableReporter;

impl TableReporter {
    /// Generate the summary table, followed by the detailed table if requested
    pub fn generate(outcome: &RunOutcome, show_details: bool) -> String {
        let mut output = String::new();

        output.push_str(&format!("\n{:=<78}\n", "= Experiment Results "));
        output.push_str(&format!(
            "Run: {} | Mode: {} | Strategy: {}\n",
            outcome.run_id,
            outcome.execution_mode.as_str(),
            outcome.strategy.label()
        ));
        output.push_str(&format!(
            "Started: {} | Cases: {} | Versions: {} | Elapsed: {:.2}s\n",
            outcome.started_at.format("%Y-%m-%d %H:%M:%S"),
            outcome.samples.len(),
            outcome.version_names.len(),
            outcome.elapsed_secs
        ));
        output.push_str(&format!("{:=<78}\n\n", ""));

        output.push_str("SUMMARY\n");
        if outcome.metric_names.is_empty() || outcome.summary.is_empty() {
            output.push_str("No summary available.\n\n");
        } else {
            let mut headers = vec!["Version".to_string()];
            headers.extend(outcome.metric_names.iter().cloned());
            let rows: Vec<Vec<String>> = outcome
                .version_names
                .iter()
                .map(|name| summary_row(outcome, name))
                .collect();
            output.push_str(&render_grid(&headers, &rows));
            output.push('\n');
        }

        if show_details {
            output.push_str("DETAILS\n");
            if outcome.matrix.is_empty() {
                output.push_str("No cells were executed.\n");
            } else {
                output.push_str(&render_grid(&detail_headers(outcome), &detail_rows(outcome)));
            }
        }

        if let Some(path) = &outcome.csv_path {
            output.push_str(&format!("\nDetailed results saved to {}\n", path.display()));
        }
        for error in &outcome.report_errors {
            output.push_str(&format!("\nReport error: {}\n", error));
        }

        output
    }
}

/// Left-aligned grid with a rule under the header
fn render_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let cells: Vec<Vec<String>> = std::iter::once(headers)
        .chain(rows.iter().map(|r| r.as_slice()))
        .map(|row| {
            row.iter()
                .map(|c| truncate(&c.replace('\n', " "), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let mut widths = vec![0; headers.len()];
    for row in &cells {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    for (index, row) in cells.iter().enumerate() {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        output.push_str(line.join("  ").trim_end());
        output.push('\n');
        if index == 0 {
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            output.push_str(&rule.join("  "));
            output.push('\n');
        }
    }
    output
}
