//! Experiment runner components
//!
//! This module provides the cell model, the result matrix, version handles
//! and the orchestration of a complete run.

mod cell;
mod config;
mod experiment;
mod matrix;
mod progress;
mod version;

pub use cell::{CellError, CellErrorKind, CellResult, CellStatus};
pub use config::{HarnessConfig, Strategy};
pub use experiment::{ExecutionMode, Experiment, RunOutcome};
pub use matrix::ResultMatrix;
pub use progress::{CellProgress, ProgressCallback};
pub use version::{AsyncVersionFn, SyncVersionFn, VersionFn, VersionHandle, resolve_version_names};
