//! Bounded pool of OS threads
//!
//! Workers claim cells from a shared counter. Each claimed offset maps to
//! exactly one slot, so placement never depends on completion order.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::RunContext;
use super::execute::execute_cell_isolated;
use crate::runner::ResultMatrix;

pub(super) fn run(ctx: &RunContext, workers: usize) -> ResultMatrix {
    let matrix = ResultMatrix::new(ctx.samples.len(), ctx.versions.len());
    let total = matrix.len();
    if total == 0 {
        return matrix;
    }

    let next = AtomicUsize::new(0);
    let worker_count = workers.clamp(1, total);

    std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(worker_count);
        for worker in 0..worker_count {
            let spawned = std::thread::Builder::new()
                .name(format!("versus-worker-{}", worker))
                .spawn_scoped(scope, || work(ctx, &matrix, &next));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => tracing::error!(worker, error = %e, "Failed to spawn worker"),
            }
        }

        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("Worker thread terminated abnormally");
            }
        }
    });

    matrix
}

fn work(ctx: &RunContext, matrix: &ResultMatrix, next: &AtomicUsize) {
    let versions = matrix.versions();
    loop {
        let offset = next.fetch_add(1, Ordering::Relaxed);
        if offset >= matrix.len() {
            break;
        }
        let (sample_index, version_index) = (offset / versions, offset % versions);
        let cell = execute_cell_isolated(ctx, sample_index, version_index);
        if let Err(e) = matrix.populate(sample_index, version_index, cell) {
            tracing::error!(error = %e, "Failed to record cell result");
        }
    }
}
