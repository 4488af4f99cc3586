//! End-to-end experiment scenarios
//!
//! Runs complete experiments through the public API and checks the
//! resulting matrices, summaries and CSV exports.

use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;
use versus::{
    AggregateKind, CellStatus, Experiment, HarnessConfig, Metric, MetricError, MetricOutcome,
    RecordingTracer, Strategy, VersionError, VersionHandle,
};

fn sum(args: &[Value]) -> i64 {
    args.iter().filter_map(Value::as_i64).sum()
}

fn add() -> VersionHandle {
    VersionHandle::sync("add", |args, _| Ok(json!(sum(args))))
}

fn scenario_a() -> Experiment {
    let mut experiment = Experiment::new(HarnessConfig::default().without_csv());
    experiment
        .add_case(4, vec![json!(2), json!(2)])
        .add_case(5, vec![json!(2), json!(2)]);
    experiment.metric("Exact Match", Metric::exact_match()).unwrap();
    experiment
}

#[test]
fn test_scenario_a_exact_match_pass_rate() {
    let outcome = scenario_a().run(&[add()]).unwrap();

    let first = outcome.matrix.get(0, 0).unwrap();
    assert_eq!(first.raw_output, Some(json!(4)));
    assert_eq!(first.metric("Exact Match"), Some(&MetricOutcome::Score(true.into())));

    let second = outcome.matrix.get(1, 0).unwrap();
    assert_eq!(second.raw_output, Some(json!(4)));
    assert_eq!(second.metric("Exact Match"), Some(&MetricOutcome::Score(false.into())));

    let entry = outcome.summary.get("add", "Exact Match").unwrap();
    assert_eq!(entry.aggregate_kind, AggregateKind::Percentage);
    assert_eq!(entry.aggregate_value, 0.5);
    assert_eq!(entry.display_value(), "50.0%");
}

#[test]
fn test_scenario_b_denominator_excludes_failed_cells() {
    let mut experiment = Experiment::new(HarnessConfig::default().without_csv());
    experiment
        .add_case(4, vec![json!(2), json!(2)])
        .add_case(6, vec![json!(3), json!(3)])
        .add_case(9, vec![json!(4), json!(4)]);
    experiment.metric("Exact Match", Metric::exact_match()).unwrap();

    let fragile = VersionHandle::sync("fragile", |args, _| {
        if args[0] == json!(3) {
            Err(VersionError::new("cannot handle threes"))
        } else {
            Ok(json!(sum(args)))
        }
    });
    let outcome = experiment.run(&[fragile]).unwrap();

    let failed = outcome.matrix.get(1, 0).unwrap();
    assert_eq!(failed.status, CellStatus::FunctionError);
    assert_eq!(failed.error_message(), Some("cannot handle threes"));

    let entry = outcome.summary.get("fragile", "Exact Match").unwrap();
    assert_eq!(entry.valid_count, 2);
    assert_eq!(entry.aggregate_value, 0.5);
}

#[test]
fn test_scenario_c_duplicate_names_are_disambiguated() {
    let versions = [
        VersionHandle::sync("solve", |args, _| Ok(json!(sum(args)))),
        VersionHandle::sync("baseline", |_, _| Ok(json!(0))),
        VersionHandle::sync("solve", |args, _| Ok(json!(sum(args) + 1))),
    ];

    let first = scenario_a().run(&versions).unwrap();
    let second = scenario_a().run(&versions).unwrap();

    assert_eq!(first.version_names, vec!["solve (1)", "baseline", "solve (2)"]);
    assert_eq!(first.version_names, second.version_names);
    assert!(first.summary.get("solve (1)", "Exact Match").is_some());
    assert!(first.summary.get("solve (2)", "Exact Match").is_some());
}

#[test]
fn test_renamed_versions_keep_their_own_summary() {
    let versions = [
        add(),
        add(),
        VersionHandle::sync("add (1)", |_, _| Ok(json!(0))),
    ];
    let outcome = scenario_a().run(&versions).unwrap();

    assert_eq!(outcome.version_names, vec!["add (2)", "add (3)", "add (1)"]);
    assert_eq!(
        outcome.summary.get("add (2)", "Exact Match").unwrap().display_value(),
        "50.0%"
    );
    assert_eq!(
        outcome.summary.get("add (1)", "Exact Match").unwrap().display_value(),
        "0.0%"
    );
}

#[test]
fn test_scenario_d_csv_export() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.csv");

    let mut experiment = Experiment::new(HarnessConfig::default().with_csv_path(&path));
    experiment
        .add_case(4, vec![json!(2), json!(2)])
        .add_case(5, vec![json!(2), json!(3)])
        .add_case(7, vec![json!(3), json!(4)]);
    experiment.metric("Exact Match", Metric::exact_match()).unwrap();

    let broken = VersionHandle::sync("broken", |_, _| Err(VersionError::new("boom")));
    let outcome = experiment.run(&[add(), broken]).unwrap();
    assert_eq!(outcome.csv_path.as_deref(), Some(path.as_path()));

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1 + 3 * 2);
    assert!(lines[0].ends_with(",Error"));

    let failed_rows: Vec<&&str> = lines.iter().filter(|l| l.contains(",broken,")).collect();
    assert_eq!(failed_rows.len(), 3);
    for row in failed_rows {
        assert!(row.contains(",broken,N/A (Func Err),"));
        assert!(row.ends_with(",boom"));
    }
}

#[test]
fn test_matrix_is_full_for_every_strategy() {
    let versions = [
        add(),
        VersionHandle::sync("panics", |_, _| panic!("unexpected input")),
    ];
    for strategy in [
        Strategy::Sequential,
        Strategy::WorkerPool { workers: 1 },
        Strategy::WorkerPool { workers: 8 },
    ] {
        let config = HarnessConfig::default().without_csv().with_strategy(strategy);
        let mut experiment = Experiment::new(config).with_samples(scenario_a().samples().clone());
        experiment.metric("Exact Match", Metric::exact_match()).unwrap();

        let outcome = experiment.run(&versions).unwrap();
        assert_eq!(outcome.matrix.len(), 4);
        assert!(outcome.matrix.is_complete());
        assert!(
            outcome
                .matrix
                .column(1)
                .all(|c| c.error_message() == Some("unexpected input"))
        );
    }
}

#[test]
fn test_row_and_column_order() {
    let versions = [
        VersionHandle::sync("first", |args, _| Ok(json!(sum(args)))),
        VersionHandle::sync("second", |args, _| Ok(json!(sum(args) * 2))),
    ];
    let outcome = Experiment::new(
        HarnessConfig::default()
            .without_csv()
            .with_workers(4),
    )
    .with_samples(scenario_a().samples().clone())
    .run(&versions)
    .unwrap();

    let order: Vec<(usize, &str)> = outcome
        .matrix
        .cells()
        .map(|c| (c.sample_index, c.version_name.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![(0, "first"), (0, "second"), (1, "first"), (1, "second")]
    );
}

#[test]
fn test_repeated_runs_are_deterministic() {
    let first = scenario_a().run(&[add()]).unwrap();
    let second = scenario_a().run(&[add()]).unwrap();
    assert_eq!(first.summary, second.summary);
}

#[test]
fn test_always_failing_version() {
    let mut experiment = scenario_a();
    experiment.metric("Abs Error", Metric::absolute_error()).unwrap();
    let broken = VersionHandle::sync("broken", |_, _| Err(VersionError::new("always")));
    let outcome = experiment.run(&[broken]).unwrap();

    for cell in outcome.matrix.cells() {
        assert!(cell.error.is_some());
        assert!(cell.metric_results.iter().all(|(_, o)| o.is_not_applicable()));
    }
    for entry in &outcome.summary.entries {
        assert_eq!(entry.aggregate_kind, AggregateKind::NotApplicable);
    }
}

#[test]
fn test_always_failing_metric() {
    let mut experiment = scenario_a();
    experiment
        .metric(
            "Broken",
            Metric::simple(|_, _| Err(MetricError::new("scorer failed"))),
        )
        .unwrap();
    let outcome = experiment.run(&[add()]).unwrap();

    for cell in outcome.matrix.cells() {
        assert_eq!(
            cell.metric("Broken"),
            Some(&MetricOutcome::Error("scorer failed".to_string()))
        );
        assert!(cell.metric("Exact Match").unwrap().score().is_some());
    }
    assert_eq!(
        outcome.summary.get("add", "Broken").unwrap().aggregate_kind,
        AggregateKind::NotApplicable
    );
    assert_eq!(
        outcome.summary.get("add", "Exact Match").unwrap().display_value(),
        "50.0%"
    );
}

#[test]
fn test_zero_samples() {
    let tracer = RecordingTracer::new();
    let mut experiment = Experiment::new(HarnessConfig::default().without_csv())
        .with_tracer(Arc::new(tracer.clone()));
    experiment.metric("Exact Match", Metric::exact_match()).unwrap();

    let outcome = experiment.run(&[add()]).unwrap();
    assert!(outcome.is_empty());
    assert!(outcome.summary.is_empty());
    assert!(tracer.spans().is_empty());
}

#[tokio::test]
async fn test_async_run_matches_sync_run() {
    let sync_outcome = scenario_a().run(&[add()]).unwrap();

    let async_add = VersionHandle::new_async("add", |args, _| async move {
        tokio::task::yield_now().await;
        Ok(json!(sum(&args)))
    });
    let async_outcome = scenario_a().arun(&[async_add]).await.unwrap();

    assert_eq!(sync_outcome.summary, async_outcome.summary);
    let outputs = |o: &versus::RunOutcome| -> Vec<Option<Value>> {
        o.matrix.cells().map(|c| c.raw_output.clone()).collect()
    };
    assert_eq!(outputs(&sync_outcome), outputs(&async_outcome));
}
