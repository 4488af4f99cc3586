//! Span interface consumed by the scheduler
//!
//! The harness opens one span per run and one per cell. Export and transport
//! are the tracer implementation's business.

mod log;
mod recording;

pub use log::LogTracer;
pub use recording::{RecordedSpan, RecordingTracer};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute value attached to a span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    StrList(Vec<String>),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{:?}", v),
            AttributeValue::Str(s) => write!(f, "{}", s),
            AttributeValue::StrList(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<usize> for AttributeValue {
    fn from(value: usize) -> Self {
        AttributeValue::Int(value as i64)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        AttributeValue::StrList(value)
    }
}

/// Ordered attribute list
pub type Attributes = Vec<(String, AttributeValue)>;

/// Build an attribute entry
pub fn attr(key: impl Into<String>, value: impl Into<AttributeValue>) -> (String, AttributeValue) {
    (key.into(), value.into())
}

/// An open span
pub trait Span: Send {
    fn set_attributes(&mut self, attributes: Attributes);

    /// Record a failure; marks the span as errored
    fn record_error(&mut self, error: &str);

    fn close(self: Box<Self>);
}

/// Opens spans
pub trait Tracer: Send + Sync {
    fn start(&self, name: &str) -> Box<dyn Span>;
}

/// Tracer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

struct NoopSpan;

impl Span for NoopSpan {
    fn set_attributes(&mut self, _attributes: Attributes) {}

    fn record_error(&mut self, _error: &str) {}

    fn close(self: Box<Self>) {}
}

impl Tracer for NoopTracer {
    fn start(&self, _name: &str) -> Box<dyn Span> {
        Box::new(NoopSpan)
    }
}
