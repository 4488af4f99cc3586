//! Single-threaded traversal, sample-major then version-minor

use super::RunContext;
use super::execute::execute_cell_isolated;
use crate::runner::ResultMatrix;

pub(super) fn run(ctx: &RunContext) -> ResultMatrix {
    let matrix = ResultMatrix::new(ctx.samples.len(), ctx.versions.len());

    for sample_index in 0..ctx.samples.len() {
        for version_index in 0..ctx.versions.len() {
            let cell = execute_cell_isolated(ctx, sample_index, version_index);
            if let Err(e) = matrix.populate(sample_index, version_index, cell) {
                tracing::error!(error = %e, "Failed to record cell result");
            }
        }
    }

    matrix
}
