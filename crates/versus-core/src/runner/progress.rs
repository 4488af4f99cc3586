//! Progress notifications emitted as cells complete

use std::sync::Arc;

/// Callback for progress updates during a run
pub type ProgressCallback = Arc<dyn Fn(CellProgress) + Send + Sync>;

/// Progress update for one completed cell
#[derive(Debug, Clone)]
pub struct CellProgress {
    /// Cells completed so far, including this one
    pub completed: usize,
    /// Total number of cells in the run
    pub total: usize,
    /// Sample index of the completed cell (0-based)
    pub sample_index: usize,
    /// Display name of the version
    pub version_name: String,
    /// Whether the version failed on this cell
    pub failed: bool,
}

impl CellProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}
