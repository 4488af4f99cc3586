//! In-memory tracer for inspecting the spans a run produced

use std::sync::Arc;

use parking_lot::Mutex;

use super::{AttributeValue, Attributes, Span, Tracer};

/// A span after it was closed
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSpan {
    pub name: String,
    pub attributes: Attributes,
    pub errors: Vec<String>,
}

impl RecordedSpan {
    /// Last value set for an attribute key
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn is_error(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Keeps closed spans in memory, in close order
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    closed: Arc<Mutex<Vec<RecordedSpan>>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the closed spans
    pub fn spans(&self) -> Vec<RecordedSpan> {
        self.closed.lock().clone()
    }

    /// Closed span by name
    pub fn find(&self, name: &str) -> Option<RecordedSpan> {
        self.closed.lock().iter().find(|s| s.name == name).cloned()
    }

    pub fn clear(&self) {
        self.closed.lock().clear();
    }
}

struct OpenSpan {
    record: RecordedSpan,
    sink: Arc<Mutex<Vec<RecordedSpan>>>,
}

impl Span for OpenSpan {
    fn set_attributes(&mut self, attributes: Attributes) {
        self.record.attributes.extend(attributes);
    }

    fn record_error(&mut self, error: &str) {
        self.record.errors.push(error.to_string());
    }

    fn close(self: Box<Self>) {
        let OpenSpan { record, sink } = *self;
        sink.lock().push(record);
    }
}

impl Tracer for RecordingTracer {
    fn start(&self, name: &str) -> Box<dyn Span> {
        Box::new(OpenSpan {
            record: RecordedSpan {
                name: name.to_string(),
                attributes: Vec::new(),
                errors: Vec::new(),
            },
            sink: Arc::clone(&self.closed),
        })
    }
}
