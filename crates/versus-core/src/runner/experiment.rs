//! Orchestration of a complete run
//!
//! An [`Experiment`] owns the samples and metrics, drives the scheduler and
//! turns the populated matrix into a [`RunOutcome`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{HarnessConfig, ProgressCallback, ResultMatrix, Strategy, VersionHandle};
use crate::error::HarnessResult;
use crate::metrics::{Metric, MetricRegistry, MetricsAggregator, Summary};
use crate::report::{CsvExporter, ReportFormat, generate_report};
use crate::samples::{NamedArgs, SampleSet};
use crate::scheduler::ExecutionScheduler;
use crate::trace::{Attributes, LogTracer, Span, Tracer, attr};

/// Which entry point produced a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Sync,
    Async,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Sync => "sync",
            ExecutionMode::Async => "async",
        }
    }

    fn span_name(&self) -> String {
        format!("Experiment.run[{}]", self.as_str())
    }
}

/// Everything a run produced
#[derive(Debug, Serialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub execution_mode: ExecutionMode,
    pub strategy: Strategy,
    /// Samples the run was evaluated against, in row order
    pub samples: SampleSet,
    /// Display names, in version argument order
    pub version_names: Vec<String>,
    /// Metric names, in registration order
    pub metric_names: Vec<String>,
    pub matrix: ResultMatrix,
    pub summary: Summary,
    /// Where the CSV was written, if it was
    pub csv_path: Option<PathBuf>,
    /// Non-fatal failures while producing report artifacts
    pub report_errors: Vec<String>,
    pub started_at: DateTime<Local>,
    pub elapsed_secs: f64,
}

impl RunOutcome {
    /// Whether the run executed nothing
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    /// Number of cells whose version failed
    pub fn failed_cells(&self) -> usize {
        self.matrix.cells().filter(|c| c.error.is_some()).count()
    }

    /// Render the run in the given format
    pub fn render(&self, format: ReportFormat, show_details: bool) -> HarnessResult<String> {
        generate_report(self, format, show_details)
    }

    /// Export one CSV row per cell to `path`
    pub fn export_csv(&self, path: impl AsRef<Path>) -> HarnessResult<()> {
        CsvExporter::write(self, path.as_ref())
    }
}

/// Compares versions of a callable over a shared set of samples
pub struct Experiment {
    samples: SampleSet,
    metrics: MetricRegistry,
    config: HarnessConfig,
    tracer: Arc<dyn Tracer>,
    progress_callback: Option<ProgressCallback>,
}

impl Experiment {
    /// Create an experiment that traces through `tracing`
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            samples: SampleSet::new(),
            metrics: MetricRegistry::new(),
            config,
            tracer: Arc::new(LogTracer),
            progress_callback: None,
        }
    }

    /// Replace the tracer
    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Use a prepared sample set
    pub fn with_samples(mut self, samples: SampleSet) -> Self {
        self.samples = samples;
        self
    }

    /// Set progress callback
    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress_callback = Some(callback);
    }

    /// Add a sample with positional and named arguments
    pub fn add_sample(
        &mut self,
        ideal: impl Into<Value>,
        args: Vec<Value>,
        kwargs: NamedArgs,
    ) -> &mut Self {
        self.samples.add_sample(ideal, args, kwargs);
        self
    }

    /// Add a sample with positional arguments only
    pub fn add_case(&mut self, ideal: impl Into<Value>, args: Vec<Value>) -> &mut Self {
        self.add_sample(ideal, args, NamedArgs::new())
    }

    /// Register a metric under a unique name
    pub fn metric(&mut self, name: impl Into<String>, metric: Metric) -> HarnessResult<&mut Self> {
        self.metrics.register(name, metric)?;
        Ok(self)
    }

    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    pub fn metrics(&self) -> &MetricRegistry {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut MetricRegistry {
        &mut self.metrics
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run every version on every sample with a synchronous strategy
    pub fn run(&self, versions: &[VersionHandle]) -> HarnessResult<RunOutcome> {
        let strategy = self.config.strategy;
        let scheduler = self.scheduler(versions);
        scheduler.check_sync(strategy)?;
        if let Some(outcome) = self.empty_outcome(ExecutionMode::Sync, strategy, &scheduler) {
            return Ok(outcome);
        }

        let started = Instant::now();
        let started_at = Local::now();
        let run_id = Uuid::new_v4();
        let mut span = self.open_run_span(ExecutionMode::Sync, strategy, &scheduler, run_id);

        let matrix = scheduler.run(strategy)?;
        let mut outcome = self.assemble(
            ExecutionMode::Sync,
            strategy,
            &scheduler,
            matrix,
            run_id,
            started_at,
        );

        if self.config.save_csv {
            let path = self.config.resolve_csv_path(&started_at);
            let written = CsvExporter::write(&outcome, &path);
            record_csv(&mut outcome, &mut *span, path, written);
        }

        Ok(self.finish(outcome, span, started))
    }

    /// Run every version on every sample as one cooperative batch.
    ///
    /// Accepts any mix of synchronous and asynchronous versions.
    pub async fn arun(&self, versions: &[VersionHandle]) -> HarnessResult<RunOutcome> {
        let max_in_flight = match self.config.strategy {
            Strategy::CooperativeBatch { max_in_flight } => max_in_flight,
            _ => None,
        };
        let strategy = Strategy::CooperativeBatch { max_in_flight };
        let scheduler = self.scheduler(versions);
        if let Some(outcome) = self.empty_outcome(ExecutionMode::Async, strategy, &scheduler) {
            return Ok(outcome);
        }

        let started = Instant::now();
        let started_at = Local::now();
        let run_id = Uuid::new_v4();
        let mut span = self.open_run_span(ExecutionMode::Async, strategy, &scheduler, run_id);

        let matrix = scheduler.run_async(max_in_flight).await;
        let mut outcome = self.assemble(
            ExecutionMode::Async,
            strategy,
            &scheduler,
            matrix,
            run_id,
            started_at,
        );

        if self.config.save_csv {
            let path = self.config.resolve_csv_path(&started_at);
            let written = CsvExporter::write_async(&outcome, &path).await;
            record_csv(&mut outcome, &mut *span, path, written);
        }

        Ok(self.finish(outcome, span, started))
    }

    fn scheduler(&self, versions: &[VersionHandle]) -> ExecutionScheduler {
        ExecutionScheduler::new(
            &self.samples,
            &self.metrics,
            versions,
            Arc::clone(&self.tracer),
            self.progress_callback.clone(),
        )
    }

    fn empty_outcome(
        &self,
        mode: ExecutionMode,
        strategy: Strategy,
        scheduler: &ExecutionScheduler,
    ) -> Option<RunOutcome> {
        if self.samples.is_empty() {
            tracing::warn!("No test cases added. Nothing to run");
        } else if scheduler.version_names().is_empty() {
            tracing::warn!("No versions selected. Nothing to run");
        } else {
            return None;
        }

        Some(RunOutcome {
            run_id: Uuid::new_v4(),
            execution_mode: mode,
            strategy,
            samples: self.samples.clone(),
            version_names: scheduler.version_names().to_vec(),
            metric_names: self.metrics.names(),
            matrix: ResultMatrix::new(self.samples.len(), scheduler.version_names().len()),
            summary: Summary::default(),
            csv_path: None,
            report_errors: Vec::new(),
            started_at: Local::now(),
            elapsed_secs: 0.0,
        })
    }

    fn open_run_span(
        &self,
        mode: ExecutionMode,
        strategy: Strategy,
        scheduler: &ExecutionScheduler,
        run_id: Uuid,
    ) -> Box<dyn Span> {
        tracing::info!(
            run_id = %run_id,
            mode = mode.as_str(),
            strategy = strategy.label(),
            cases = self.samples.len(),
            versions = scheduler.version_names().len(),
            "Starting experiment run"
        );
        if self.metrics.is_empty() {
            tracing::warn!("No metrics added. Skipping summary");
        }

        let mut attributes: Attributes = vec![
            attr("experiment.run_id", run_id.to_string()),
            attr("experiment.execution_mode", mode.as_str()),
            attr("experiment.strategy", strategy.label()),
            attr("experiment.num_cases", self.samples.len()),
            attr("experiment.num_versions", scheduler.version_names().len()),
            attr("experiment.metric_names", self.metrics.names()),
            attr("experiment.version_names", scheduler.version_names().to_vec()),
        ];
        if let Some(workers) = strategy.requested_workers() {
            attributes.push(attr("experiment.requested_workers", workers));
        }

        let mut span = self.tracer.start(&mode.span_name());
        span.set_attributes(attributes);
        span
    }

    fn assemble(
        &self,
        mode: ExecutionMode,
        strategy: Strategy,
        scheduler: &ExecutionScheduler,
        matrix: ResultMatrix,
        run_id: Uuid,
        started_at: DateTime<Local>,
    ) -> RunOutcome {
        let version_names = scheduler.version_names().to_vec();
        let metric_names = self.metrics.names();
        let summary = if metric_names.is_empty() {
            Summary::default()
        } else {
            MetricsAggregator::aggregate(&matrix, &version_names, &metric_names)
        };

        RunOutcome {
            run_id,
            execution_mode: mode,
            strategy,
            samples: self.samples.clone(),
            version_names,
            metric_names,
            matrix,
            summary,
            csv_path: None,
            report_errors: Vec::new(),
            started_at,
            elapsed_secs: 0.0,
        }
    }

    fn finish(&self, mut outcome: RunOutcome, span: Box<dyn Span>, started: Instant) -> RunOutcome {
        span.close();
        outcome.elapsed_secs = started.elapsed().as_secs_f64();
        tracing::info!(
            run_id = %outcome.run_id,
            cells = outcome.matrix.len(),
            failed = outcome.failed_cells(),
            elapsed_secs = outcome.elapsed_secs,
            "Experiment run complete"
        );
        outcome
    }
}

fn record_csv(
    outcome: &mut RunOutcome,
    span: &mut dyn Span,
    path: PathBuf,
    written: HarnessResult<()>,
) {
    match written {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Detailed results saved");
            span.set_attributes(vec![attr(
                "experiment.csv_output_file",
                path.display().to_string(),
            )]);
            outcome.csv_path = Some(path);
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to save CSV");
            span.record_error(&e.to_string());
            outcome.report_errors.push(e.to_string());
        }
    }
}
