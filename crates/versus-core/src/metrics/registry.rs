//! Metric registration and evaluation
//!
//! Metrics declare at registration time whether they need the sample's
//! arguments. Registration order is the column order in every report.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde_json::Value;

use super::types::{MetricOutcome, Score};
use crate::error::{HarnessError, HarnessResult, MetricError, panic_message};
use crate::samples::{NamedArgs, Sample};

/// Scoring function comparing actual output to the ideal
pub type SimpleMetricFn = dyn Fn(&Value, &Value) -> Result<Score, MetricError> + Send + Sync;

/// Scoring function that also receives the sample's arguments
pub type ContextualMetricFn =
    dyn Fn(&Value, &Value, &[Value], &NamedArgs) -> Result<Score, MetricError> + Send + Sync;

/// A scoring function with its calling convention
#[derive(Clone)]
pub enum Metric {
    /// Invoked with `(actual, ideal)`
    Simple(Arc<SimpleMetricFn>),
    /// Invoked with `(actual, ideal, args, kwargs)`
    Contextual(Arc<ContextualMetricFn>),
}

impl Metric {
    pub fn simple<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<Score, MetricError> + Send + Sync + 'static,
    {
        Metric::Simple(Arc::new(f))
    }

    pub fn contextual<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value, &[Value], &NamedArgs) -> Result<Score, MetricError>
            + Send
            + Sync
            + 'static,
    {
        Metric::Contextual(Arc::new(f))
    }

    pub fn accepts_context(&self) -> bool {
        matches!(self, Metric::Contextual(_))
    }

    /// Boolean equality of actual and ideal
    pub fn exact_match() -> Self {
        Metric::simple(|actual, ideal| Ok(Score::Bool(actual == ideal)))
    }

    /// Absolute numeric difference between actual and ideal
    pub fn absolute_error() -> Self {
        Metric::simple(|actual, ideal| {
            let a = actual
                .as_f64()
                .ok_or_else(|| MetricError::new(format!("actual {} is not numeric", actual)))?;
            let i = ideal
                .as_f64()
                .ok_or_else(|| MetricError::new(format!("ideal {} is not numeric", ideal)))?;
            Ok(Score::Float((a - i).abs()))
        })
    }

    fn call(&self, actual: &Value, sample: &Sample) -> Result<Score, MetricError> {
        match self {
            Metric::Simple(f) => f(actual, &sample.ideal),
            Metric::Contextual(f) => f(actual, &sample.ideal, &sample.args, &sample.kwargs),
        }
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Simple(_) => write!(f, "Metric::Simple"),
            Metric::Contextual(_) => write!(f, "Metric::Contextual"),
        }
    }
}

/// A registered metric
#[derive(Debug, Clone)]
pub struct MetricDescriptor {
    pub name: String,
    pub metric: Metric,
}

impl MetricDescriptor {
    pub fn accepts_context(&self) -> bool {
        self.metric.accepts_context()
    }

    /// Evaluate against one successful output.
    ///
    /// An error or panic from the scoring function becomes
    /// [`MetricOutcome::Error`] for this metric only.
    pub fn evaluate(&self, actual: &Value, sample: &Sample) -> MetricOutcome {
        match catch_unwind(AssertUnwindSafe(|| self.metric.call(actual, sample))) {
            Ok(Ok(score)) => MetricOutcome::Score(score),
            Ok(Err(e)) => MetricOutcome::Error(e.message),
            Err(payload) => MetricOutcome::Error(panic_message(payload.as_ref())),
        }
    }
}

/// Named scoring functions, in registration order
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    metrics: Vec<MetricDescriptor>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a metric under a unique, non-empty name
    pub fn register(&mut self, name: impl Into<String>, metric: Metric) -> HarnessResult<&mut Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(HarnessError::InvalidMetric {
                reason: "Metric name must be non-empty".to_string(),
            });
        }
        if self.contains(&name) {
            return Err(HarnessError::DuplicateMetric { name });
        }
        tracing::debug!(metric = %name, contextual = metric.accepts_context(), "Registered metric");
        self.metrics.push(MetricDescriptor { name, metric });
        Ok(self)
    }

    /// Register a `(actual, ideal)` scoring function
    pub fn register_simple<F>(&mut self, name: impl Into<String>, f: F) -> HarnessResult<&mut Self>
    where
        F: Fn(&Value, &Value) -> Result<Score, MetricError> + Send + Sync + 'static,
    {
        self.register(name, Metric::simple(f))
    }

    /// Register a scoring function that also receives the sample's arguments
    pub fn register_contextual<F>(&mut self, name: impl Into<String>, f: F) -> HarnessResult<&mut Self>
    where
        F: Fn(&Value, &Value, &[Value], &NamedArgs) -> Result<Score, MetricError>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, Metric::contextual(f))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.metrics.iter().any(|m| m.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.metrics.iter().map(|m| m.name.clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetricDescriptor> {
        self.metrics.iter()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Evaluate every metric independently against a successful output
    pub fn evaluate_all(&self, actual: &Value, sample: &Sample) -> Vec<(String, MetricOutcome)> {
        self.metrics
            .iter()
            .map(|m| (m.name.clone(), m.evaluate(actual, sample)))
            .collect()
    }

    /// Every metric marked as not applicable, without invoking any scorer
    pub fn not_applicable(&self) -> Vec<(String, MetricOutcome)> {
        self.metrics
            .iter()
            .map(|m| (m.name.clone(), MetricOutcome::NotApplicable))
            .collect()
    }
}
