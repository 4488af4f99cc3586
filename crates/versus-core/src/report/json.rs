//! JSON report generation

use serde_json::json;

use crate::error::{HarnessError, HarnessResult};
use crate::runner::RunOutcome;

/// JSON report generator
pub struct JsonReporter;

impl JsonReporter {
    /// Generate a JSON report.
    ///
    /// Without details only the run metadata and the summary are emitted.
    pub fn generate(outcome: &RunOutcome, show_details: bool) -> HarnessResult<String> {
        let rendered = if show_details {
            serde_json::to_string_pretty(outcome)
        } else {
            serde_json::to_string_pretty(&json!({
                "run_id": outcome.run_id,
                "execution_mode": outcome.execution_mode,
                "strategy": outcome.strategy,
                "version_names": outcome.version_names,
                "metric_names": outcome.metric_names,
                "summary": outcome.summary,
                "csv_path": outcome.csv_path,
                "report_errors": outcome.report_errors,
                "elapsed_secs": outcome.elapsed_secs,
            }))
        };
        rendered.map_err(|e| HarnessError::reporting(None, e.to_string()))
    }

    /// Generate a compact JSON report (no pretty printing)
    pub fn generate_compact(outcome: &RunOutcome) -> HarnessResult<String> {
        serde_json::to_string(outcome).map_err(|e| HarnessError::reporting(None, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;
    use serde_json::Value;

    #[test]
    fn test_json_generation() {
        let outcome = fixtures::outcome();
        let json = JsonReporter::generate(&outcome, true).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["execution_mode"], "sync");
        assert_eq!(value["strategy"]["kind"], "sequential");
        assert_eq!(value["matrix"]["cells"].as_array().unwrap().len(), 4);
        assert_eq!(value["summary"]["entries"][0]["aggregate_kind"], "percentage");
    }

    #[test]
    fn test_json_summary_only() {
        let outcome = fixtures::outcome();
        let json = JsonReporter::generate(&outcome, false).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert!(value.get("matrix").is_none());
        assert_eq!(value["version_names"], serde_json::json!(["add", "fragile"]));
    }

    #[test]
    fn test_compact_is_single_line() {
        let outcome = fixtures::outcome();
        let json = JsonReporter::generate_compact(&outcome).unwrap();
        assert!(!json.contains('\n'));
    }
}
