//! Markdown report generation

use super::{detail_headers, detail_rows, summary_row};
use crate::runner::RunOutcome;

/// Markdown report generator
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// Generate a Markdown report
    pub fn generate(outcome: &RunOutcome, show_details: bool) -> String {
        let mut md = String::new();

        md.push_str("# Experiment Report\n\n");

        md.push_str("## Overview\n\n");
        md.push_str(&format!("- **Run ID**: {}\n", outcome.run_id));
        md.push_str(&format!("- **Mode**: {}\n", outcome.execution_mode.as_str()));
        md.push_str(&format!("- **Strategy**: {}\n", outcome.strategy.label()));
        md.push_str(&format!(
            "- **Started**: {}\n",
            outcome.started_at.format("%Y-%m-%d %H:%M:%S")
        ));
        md.push_str(&format!("- **Cases**: {}\n", outcome.samples.len()));
        md.push_str(&format!(
            "- **Versions**: {}\n",
            outcome.version_names.join(", ")
        ));
        md.push_str(&format!("- **Elapsed**: {:.2}s\n", outcome.elapsed_secs));
        if let Some(path) = &outcome.csv_path {
            md.push_str(&format!("- **CSV**: `{}`\n", path.display()));
        }
        md.push('\n');

        md.push_str("## Summary\n\n");
        if outcome.summary.is_empty() {
            md.push_str("_No summary available._\n\n");
        } else {
            let mut headers = vec!["Version".to_string()];
            headers.extend(outcome.metric_names.iter().cloned());
            let rows: Vec<Vec<String>> = outcome
                .version_names
                .iter()
                .map(|name| summary_row(outcome, name))
                .collect();
            push_table(&mut md, &headers, &rows);
            md.push('\n');
        }

        if show_details && !outcome.matrix.is_empty() {
            md.push_str("## Details\n\n");
            push_table(&mut md, &detail_headers(outcome), &detail_rows(outcome));
            md.push('\n');
        }

        let failed: Vec<_> = outcome
            .matrix
            .cells()
            .filter(|cell| cell.error.is_some())
            .collect();

        if !failed.is_empty() {
            md.push_str("## Failed Cells\n\n");

            for cell in failed {
                md.push_str(&format!(
                    "### Case {} / {}\n\n",
                    cell.sample_index + 1,
                    cell.version_name
                ));
                md.push_str(&format!("- **Status**: {:?}\n", cell.status));
                if let Some(error) = &cell.error {
                    md.push_str(&format!("- **Error**: {}\n", error.message));
                }
                md.push('\n');
            }
        }

        if !outcome.report_errors.is_empty() {
            md.push_str("## Report Errors\n\n");
            for error in &outcome.report_errors {
                md.push_str(&format!("- {}\n", error));
            }
            md.push('\n');
        }

        md
    }
}

fn push_table(md: &mut String, headers: &[String], rows: &[Vec<String>]) {
    md.push_str(&format!("| {} |\n", escape_row(headers)));
    md.push_str(&format!(
        "|{}|\n",
        headers.iter().map(|_| "---").collect::<Vec<_>>().join("|")
    ));
    for row in rows {
        md.push_str(&format!("| {} |\n", escape_row(row)));
    }
}

fn escape_row(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| c.replace('|', "\\|").replace('\n', "<br>"))
        .collect::<Vec<_>>()
        .join(" | ")
}
