//! Built-in demonstration experiment

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use versus_core::{
    CellProgress, Experiment, HarnessConfig, Metric, MetricError, NamedArgs, ReportFormat, Score,
    Strategy, VersionError, VersionHandle,
};

use super::load_config;
use crate::args::{DemoArgs, StrategyArg};

/// Run the demonstration experiment and print its report
pub async fn run(args: DemoArgs) -> Result<()> {
    let config = apply_overrides(load_config(&args.config_file)?, &args)?;
    let format = config.report_format;
    let show_details = config.show_details;
    let verbose = config.verbose;
    let cooperative = matches!(config.strategy, Strategy::CooperativeBatch { .. });

    let mut experiment = build_experiment(config)?;
    if verbose {
        experiment.set_progress_callback(Arc::new(|progress: CellProgress| {
            println!(
                "[{}/{}] case {} - {} {}",
                progress.completed,
                progress.total,
                progress.sample_index + 1,
                progress.version_name,
                if progress.failed { "failed" } else { "ok" }
            );
        }));
    }

    println!("Starting experiment...\n");

    let outcome = if cooperative {
        experiment.arun(&all_versions()).await?
    } else {
        experiment.run(&sync_versions())?
    };

    let report = outcome
        .render(format, show_details)
        .context("Failed to render report")?;
    println!("{}", report);

    println!(
        "\nExperiment complete: {} cells, {} failed ({:.2}s)",
        outcome.matrix.len(),
        outcome.failed_cells(),
        outcome.elapsed_secs
    );

    Ok(())
}

fn apply_overrides(mut config: HarnessConfig, args: &DemoArgs) -> Result<HarnessConfig> {
    if let Some(strategy) = args.strategy {
        config = config.with_strategy(match strategy {
            StrategyArg::Sequential => Strategy::Sequential,
            StrategyArg::Pool => Strategy::WorkerPool {
                workers: args.workers.unwrap_or(4),
            },
            StrategyArg::Batch => Strategy::CooperativeBatch {
                max_in_flight: args.max_in_flight,
            },
        });
    } else if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }

    if let Some(format) = &args.format {
        let parsed = ReportFormat::from_str(format).unwrap_or_else(|| {
            tracing::warn!(format = %format, "Unknown report format, using table");
            ReportFormat::Table
        });
        config = config.with_report_format(parsed);
    }
    if let Some(output) = &args.output {
        config = config.with_output_dir(output);
    }
    if args.no_csv {
        config = config.without_csv();
    }
    if args.no_details {
        config.show_details = false;
    }
    if args.verbose {
        config = config.verbose();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_experiment(config: HarnessConfig) -> Result<Experiment> {
    let mut experiment = Experiment::new(config);

    experiment
        .add_case(4, vec![json!(2), json!(2)])
        .add_case(5, vec![json!(2), json!(2)])
        .add_case(7, vec![json!(3), json!(4)])
        .add_case(7, vec![json!(10), json!(-3)])
        .add_sample(
            6,
            vec![json!(1), json!(2)],
            NamedArgs::from([("offset".to_string(), json!(3))]),
        );

    experiment
        .metric("Exact Match", Metric::exact_match())?
        .metric("Abs Error", Metric::absolute_error())?
        .metric("Relative Error", Metric::contextual(relative_error))?;

    Ok(experiment)
}

/// Absolute error scaled by the magnitude of the inputs
fn relative_error(
    actual: &Value,
    ideal: &Value,
    args: &[Value],
    _kwargs: &NamedArgs,
) -> Result<Score, MetricError> {
    let actual = actual
        .as_f64()
        .ok_or_else(|| MetricError::new("actual output is not numeric"))?;
    let ideal = ideal
        .as_f64()
        .ok_or_else(|| MetricError::new("ideal is not numeric"))?;
    let scale: f64 = args.iter().filter_map(Value::as_f64).map(f64::abs).sum();
    Ok(Score::Float((actual - ideal).abs() / scale.max(1.0)))
}

fn integers(args: &[Value]) -> Result<Vec<i64>, VersionError> {
    args.iter()
        .map(|v| {
            v.as_i64()
                .ok_or_else(|| VersionError::new(format!("{} is not an integer", v)))
        })
        .collect()
}

fn offset(kwargs: &NamedArgs) -> i64 {
    kwargs.get("offset").and_then(Value::as_i64).unwrap_or(0)
}

fn sync_versions() -> Vec<VersionHandle> {
    vec![
        VersionHandle::sync("add", |args, kwargs| {
            Ok(json!(integers(args)?.iter().sum::<i64>() + offset(kwargs)))
        }),
        VersionHandle::sync("add", |args, kwargs| {
            let total = integers(args)?
                .into_iter()
                .fold(offset(kwargs), |acc, v| acc + v);
            Ok(json!(total))
        }),
        VersionHandle::sync("add_unsigned", |args, _| {
            let values = integers(args)?;
            if values.iter().any(|v| *v < 0) {
                return Err(VersionError::new("negative operand"));
            }
            Ok(json!(values.iter().sum::<i64>()))
        })
        .with_version("add_v0"),
    ]
}

fn all_versions() -> Vec<VersionHandle> {
    let mut versions = sync_versions();
    versions.push(VersionHandle::new_async("remote_add", |args, kwargs| async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let total = integers(&args)?.iter().sum::<i64>() + offset(&kwargs);
        Ok::<_, VersionError>(json!(total))
    }));
    versions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_args() -> DemoArgs {
        DemoArgs {
            config_file: "absent.toml".into(),
            strategy: None,
            workers: None,
            max_in_flight: None,
            format: None,
            output: None,
            no_csv: true,
            no_details: false,
            verbose: false,
        }
    }

    #[test]
    fn test_overrides() {
        let args = DemoArgs {
            strategy: Some(StrategyArg::Pool),
            workers: Some(3),
            format: Some("md".to_string()),
            ..demo_args()
        };
        let config = apply_overrides(HarnessConfig::default(), &args).unwrap();
        assert_eq!(config.strategy, Strategy::WorkerPool { workers: 3 });
        assert_eq!(config.report_format, ReportFormat::Markdown);
        assert!(!config.save_csv);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let args = DemoArgs {
            workers: Some(0),
            ..demo_args()
        };
        assert!(apply_overrides(HarnessConfig::default(), &args).is_err());
    }

    #[test]
    fn test_demo_experiment_runs() {
        let experiment = build_experiment(HarnessConfig::default().without_csv()).unwrap();
        let outcome = experiment.run(&sync_versions()).unwrap();

        assert_eq!(outcome.version_names, vec!["add (1)", "add (2)", "add_v0"]);
        assert_eq!(outcome.matrix.len(), 15);
        assert_eq!(outcome.failed_cells(), 1);
        assert_eq!(
            outcome.summary.get("add (1)", "Exact Match").unwrap().display_value(),
            "80.0%"
        );
    }

    #[tokio::test]
    async fn test_demo_experiment_runs_async() {
        let experiment = build_experiment(HarnessConfig::default().without_csv()).unwrap();
        let outcome = experiment.arun(&all_versions()).await.unwrap();
        assert_eq!(outcome.matrix.len(), 20);
        assert!(outcome.matrix.is_complete());
    }
}
