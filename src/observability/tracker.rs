//! Span bookkeeping shared by every instrumented operation.
//!
//! Spans that use [`OperationTracker`] must declare the `operation.duration_ms`,
//! `operation.success` and `error.message` fields as `tracing::field::Empty`.

use std::time::{Duration, Instant};
use tracing::Span;

/// Records duration and outcome of one operation on its span
#[derive(Debug)]
pub struct OperationTracker {
    start: Instant,
    span: Span,
}

impl OperationTracker {
    pub fn new(span: Span) -> Self {
        Self {
            start: Instant::now(),
            span,
        }
    }

    pub fn record_success(&self) {
        self.span.record("operation.success", true);
        self.span
            .record("operation.duration_ms", duration_ms(self.elapsed()));
    }

    pub fn record_error(&self, error_message: &str) {
        self.span.record("operation.success", false);
        self.span.record("error.message", error_message);
        self.span
            .record("operation.duration_ms", duration_ms(self.elapsed()));
    }

    /// Record the outcome of `result` and hand it back unchanged
    pub fn finish<T, E: std::fmt::Display>(&self, result: Result<T, E>) -> Result<T, E> {
        match &result {
            Ok(_) => self.record_success(),
            Err(e) => self.record_error(&e.to_string()),
        }
        result
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
