//! Execution of a single cell
//!
//! Every path through here yields a [`CellResult`]; failures of the version
//! or of a scoring function are values, not unwinding control flow.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use super::RunContext;
use crate::error::panic_message;
use crate::metrics::{MetricOutcome, NOT_APPLICABLE_FUNC_ERR, Score};
use crate::runner::{CellError, CellResult};
use crate::trace::{AttributeValue, Span, attr};

/// Run one cell on the current thread
pub(crate) fn execute_cell(ctx: &RunContext, sample_index: usize, version_index: usize) -> CellResult {
    let span = open_cell_span(ctx, sample_index, version_index);
    let started = Instant::now();
    let invocation = ctx.versions[version_index].invoke_blocking(&ctx.samples[sample_index]);
    finish_cell(ctx, sample_index, version_index, invocation, started, span)
}

/// Run one cell, turning a panic outside the version and metric calls
/// into a task failure for that slot alone
pub(crate) fn execute_cell_isolated(
    ctx: &RunContext,
    sample_index: usize,
    version_index: usize,
) -> CellResult {
    match catch_unwind(AssertUnwindSafe(|| execute_cell(ctx, sample_index, version_index))) {
        Ok(cell) => cell,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(
                case = sample_index + 1,
                version = %ctx.version_names[version_index],
                error = %message,
                "Cell unit of work panicked"
            );
            CellResult::task_failure(
                sample_index,
                version_index,
                &ctx.version_names[version_index],
                format!("Unit of work panicked: {}", message),
                &ctx.metrics,
            )
        }
    }
}

/// Run one cell on the async runtime.
///
/// Synchronous versions are offloaded to the blocking pool so they never
/// stall the cooperative scheduler.
pub(crate) async fn execute_cell_async(
    ctx: Arc<RunContext>,
    sample_index: usize,
    version_index: usize,
) -> CellResult {
    let span = open_cell_span(&ctx, sample_index, version_index);
    let started = Instant::now();

    let version = &ctx.versions[version_index];
    let invocation = if version.is_async() {
        version.invoke(&ctx.samples[sample_index]).await
    } else {
        let worker_ctx = Arc::clone(&ctx);
        let joined = tokio::task::spawn_blocking(move || {
            worker_ctx.versions[version_index].invoke_blocking(&worker_ctx.samples[sample_index])
        })
        .await;
        match joined {
            Ok(invocation) => invocation,
            Err(e) => Err(CellError::infrastructure(format!("Blocking worker failed: {}", e))),
        }
    };

    finish_cell(&ctx, sample_index, version_index, invocation, started, span)
}

fn open_cell_span(ctx: &RunContext, sample_index: usize, version_index: usize) -> Box<dyn Span> {
    let sample = &ctx.samples[sample_index];
    let version_name = &ctx.version_names[version_index];

    tracing::debug!(case = sample.number(), version = %version_name, "Cell running");

    let mut span = ctx
        .tracer
        .start(&format!("case_{}_{}", sample.number(), version_name));
    span.set_attributes(vec![
        attr("experiment.case.index", sample.number()),
        attr("experiment.case.args", sample.args_repr()),
        attr("experiment.case.kwargs", sample.kwargs_repr()),
        attr("experiment.case.ideal", sample.ideal_repr()),
        attr("experiment.version.name", version_name.as_str()),
    ]);
    span
}

fn finish_cell(
    ctx: &RunContext,
    sample_index: usize,
    version_index: usize,
    invocation: Result<Value, CellError>,
    started: Instant,
    mut span: Box<dyn Span>,
) -> CellResult {
    let duration_secs = started.elapsed().as_secs_f64();
    let cell = CellResult::from_invocation(
        &ctx.samples[sample_index],
        version_index,
        &ctx.version_names[version_index],
        invocation,
        duration_secs,
        &ctx.metrics,
    );

    let mut attributes = Vec::with_capacity(cell.metric_results.len() + 1);
    match &cell.error {
        Some(error) => {
            tracing::debug!(
                case = sample_index + 1,
                version = %cell.version_name,
                error = %error,
                "Version failed"
            );
            span.record_error(&error.message);
            attributes.push(attr("experiment.result.actual", NOT_APPLICABLE_FUNC_ERR));
        }
        None => attributes.push(attr("experiment.result.actual", cell.output_repr())),
    }
    for (name, outcome) in &cell.metric_results {
        attributes.push((format!("experiment.metric.{}", name), outcome_attribute(outcome)));
    }
    span.set_attributes(attributes);
    span.close();

    ctx.notify(&cell);
    cell
}

fn outcome_attribute(outcome: &MetricOutcome) -> AttributeValue {
    match outcome {
        MetricOutcome::Score(Score::Bool(b)) => AttributeValue::Bool(*b),
        MetricOutcome::Score(Score::Int(i)) => AttributeValue::Int(*i),
        MetricOutcome::Score(Score::Float(f)) => AttributeValue::Float(*f),
        MetricOutcome::Score(Score::Text(s)) => AttributeValue::Str(s.clone()),
        other => AttributeValue::Str(other.to_string()),
    }
}
