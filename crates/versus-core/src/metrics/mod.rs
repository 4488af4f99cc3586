//! Metric registration, scoring and aggregation
//!
//! This module provides the scoring side of the harness: the registry of
//! named scoring functions and the aggregation of their outcomes.

mod aggregator;
mod registry;
mod types;

pub use aggregator::MetricsAggregator;
pub use registry::{ContextualMetricFn, Metric, MetricDescriptor, MetricRegistry, SimpleMetricFn};
pub use types::{
    AggregateKind, MetricOutcome, NOT_APPLICABLE_FUNC_ERR, Score, Summary, SummaryEntry,
};
