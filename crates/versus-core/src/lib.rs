//! Versus evaluation harness
//!
//! Runs several versions of a callable over a shared set of labeled samples,
//! scores every output with a registry of metrics and reports the results
//! side by side.
//!
//! # Features
//!
//! - **Isolated cells**: a failing or panicking version only affects its own
//!   (sample, version) cell; a failing metric only affects its own score
//! - **Three strategies**: sequential, a bounded worker pool, and a
//!   cooperative batch on the tokio runtime for async versions
//! - **Aggregation**: pass rates for boolean metrics, means for numeric ones
//! - **Reports**: terminal tables, Markdown, JSON and CSV export
//! - **Tracing**: one span per run and per cell through a pluggable [`Tracer`]
//!
//! # Example
//!
//! ```rust,ignore
//! use versus_core::{Experiment, HarnessConfig, Metric, VersionHandle};
//! use serde_json::json;
//!
//! let mut experiment = Experiment::new(HarnessConfig::default());
//! experiment.add_case(4, vec![json!(2), json!(2)]);
//! experiment.metric("Exact Match", Metric::exact_match())?;
//!
//! let add = VersionHandle::sync("add", |args, _| {
//!     Ok(json!(args.iter().filter_map(|v| v.as_i64()).sum::<i64>()))
//! });
//! let outcome = experiment.run(&[add])?;
//! println!("{}", outcome.render(ReportFormat::Table, true)?);
//! ```

pub mod error;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod samples;
pub mod scheduler;
pub mod trace;

// Re-exports for convenience
pub use error::{HarnessError, HarnessResult, MetricError, VersionError};
pub use metrics::{
    AggregateKind, Metric, MetricOutcome, MetricRegistry, MetricsAggregator, Score, Summary,
    SummaryEntry,
};
pub use report::{CsvExporter, ReportFormat, generate_report};
pub use runner::{
    CellError, CellErrorKind, CellProgress, CellResult, CellStatus, ExecutionMode, Experiment,
    HarnessConfig, ProgressCallback, ResultMatrix, RunOutcome, Strategy, VersionHandle,
};
pub use samples::{NamedArgs, Sample, SampleSet};
pub use scheduler::ExecutionScheduler;
pub use trace::{LogTracer, NoopTracer, RecordingTracer, Span, Tracer};
