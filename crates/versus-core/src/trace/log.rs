//! Tracer that maps span lifecycles onto the `tracing` crate

use std::time::Instant;

use super::{Attributes, Span, Tracer};

/// Emits each span as a `tracing` span with attribute and error events
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

struct LogSpan {
    span: tracing::Span,
    name: String,
    started: Instant,
    errored: bool,
}

impl Span for LogSpan {
    fn set_attributes(&mut self, attributes: Attributes) {
        for (key, value) in attributes {
            tracing::trace!(parent: &self.span, attribute = %key, value = %value, "span attribute");
        }
    }

    fn record_error(&mut self, error: &str) {
        self.errored = true;
        tracing::warn!(parent: &self.span, span_name = %self.name, error = %error, "span recorded error");
    }

    fn close(self: Box<Self>) {
        let status = if self.errored { "error" } else { "ok" };
        tracing::debug!(
            parent: &self.span,
            span_name = %self.name,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            status = status,
            "span closed"
        );
    }
}

impl Tracer for LogTracer {
    fn start(&self, name: &str) -> Box<dyn Span> {
        Box::new(LogSpan {
            span: tracing::debug_span!("experiment", span_name = %name),
            name: name.to_string(),
            started: Instant::now(),
            errored: false,
        })
    }
}
