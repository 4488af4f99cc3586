//! Cooperative batch on the async runtime
//!
//! Every cell is its own task and the whole grid is awaited as one batch.
//! A task that dies is converted into a synthetic cell result.

use std::sync::Arc;

use tokio::sync::Semaphore;

use super::RunContext;
use super::execute::execute_cell_async;
use crate::runner::{CellResult, ResultMatrix};

pub(super) async fn run(ctx: Arc<RunContext>, max_in_flight: Option<usize>) -> ResultMatrix {
    let matrix = ResultMatrix::new(ctx.samples.len(), ctx.versions.len());
    let limiter = max_in_flight.map(|n| Arc::new(Semaphore::new(n.max(1))));

    let mut slots = Vec::with_capacity(matrix.len());
    let mut handles = Vec::with_capacity(matrix.len());
    for sample_index in 0..ctx.samples.len() {
        for version_index in 0..ctx.versions.len() {
            let task_ctx = Arc::clone(&ctx);
            let limiter = limiter.clone();
            slots.push((sample_index, version_index));
            handles.push(tokio::spawn(async move {
                let _permit = match limiter {
                    Some(limiter) => limiter.acquire_owned().await.ok(),
                    None => None,
                };
                execute_cell_async(task_ctx, sample_index, version_index).await
            }));
        }
    }

    let joined = futures::future::join_all(handles).await;

    for ((sample_index, version_index), outcome) in slots.into_iter().zip(joined) {
        let cell = match outcome {
            Ok(cell) => cell,
            Err(e) => {
                tracing::error!(
                    case = sample_index + 1,
                    version = %ctx.version_names[version_index],
                    error = %e,
                    "Cell task failed"
                );
                CellResult::task_failure(
                    sample_index,
                    version_index,
                    &ctx.version_names[version_index],
                    format!("Task failed: {}", e),
                    &ctx.metrics,
                )
            }
        };
        if let Err(e) = matrix.populate(sample_index, version_index, cell) {
            tracing::error!(error = %e, "Failed to record cell result");
        }
    }

    matrix
}
