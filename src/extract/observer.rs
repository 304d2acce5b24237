//! Injected observer for extraction events.
//!
//! The assembler reports progress through this trait instead of a process-wide
//! logger, so tests can run silent and embedders can collect their own
//! telemetry.

use crate::model::{ExtractionError, ExtractionMethod, ExtractionStatus};

pub trait ExtractionObserver: Send + Sync {
    fn field_extracted(&self, _slug: &str, _field: &str, _method: ExtractionMethod, _confidence: f32) {}

    fn field_error(&self, _slug: &str, _error: &ExtractionError) {}

    fn document_finished(&self, _slug: &str, _status: ExtractionStatus, _overall_confidence: f32) {}
}

/// Observer that forwards events to `tracing`.
pub struct TracingObserver;

impl ExtractionObserver for TracingObserver {
    fn field_extracted(&self, slug: &str, field: &str, method: ExtractionMethod, confidence: f32) {
        tracing::debug!(slug, field, method = ?method, confidence, "field extracted");
    }

    fn field_error(&self, slug: &str, error: &ExtractionError) {
        tracing::debug!(
            slug,
            field = error.field_name.as_str(),
            kind = ?error.kind,
            message = error.message.as_str(),
            "field extraction error"
        );
    }

    fn document_finished(&self, slug: &str, status: ExtractionStatus, overall_confidence: f32) {
        tracing::info!(
            slug,
            status = status.as_str(),
            overall_confidence,
            "document extraction finished"
        );
    }
}

/// Observer that discards every event. Default for unit tests.
pub struct NullObserver;

impl ExtractionObserver for NullObserver {}
