//! A single extraction worker.
//!
//! Each worker owns its parsing context and drains the shared capture queue.
//! The pure pipeline runs on the blocking pool under a wall-clock timeout;
//! the only async suspension points are reading source bytes and writing to
//! the sink.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::error::EngineError;
use crate::extract::assembler::{self, ExtractionOutcome};
use crate::extract::observer::TracingObserver;
use crate::model::{
    CaptureRecord, ErrorKind, ExtractionError, ExtractionMethod, ExtractionStatus, SchoolRecord,
};
use crate::sink::RecordSink;
use crate::utils::fmt_duration;
use crate::validate::RankingLedger;

/// Per-worker counters, folded into the batch summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerStats {
    pub documents: usize,
    pub extracted: usize,
    pub partial: usize,
    pub failed: usize,
    pub conflicts: usize,
}

pub struct Worker {
    id: usize,
    queue: Arc<Mutex<VecDeque<CaptureRecord>>>,
    document_timeout: Duration,
    ledger: Arc<RankingLedger>,
    sink: Arc<dyn RecordSink>,
}

impl Worker {
    pub fn new(
        id: usize,
        queue: Arc<Mutex<VecDeque<CaptureRecord>>>,
        document_timeout: Duration,
        ledger: Arc<RankingLedger>,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        Self {
            id,
            queue,
            document_timeout,
            ledger,
            sink,
        }
    }

    /// Drain the queue until it is empty or shutdown is signalled.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> WorkerStats {
        info!(worker_id = self.id, "worker started");
        let mut stats = WorkerStats::default();

        loop {
            // Cancellation is only honored between documents.
            if shutdown_rx.try_recv().is_ok() {
                info!(worker_id = self.id, "worker received shutdown signal, exiting");
                break;
            }

            let capture = {
                let mut queue = self.queue.lock().expect("capture queue lock poisoned");
                queue.pop_front()
            };
            let Some(capture) = capture else {
                debug!(worker_id = self.id, "queue drained, worker exiting");
                break;
            };

            let start = std::time::Instant::now();
            let outcome = self.process_document(&capture).await;
            stats.documents += 1;

            let mut record = outcome.record;
            if outcome.accepted {
                let conflicts = self.ledger.admit(&mut record);
                // A nulled rank leaves the record without its ranking; it no
                // longer qualifies as a complete extraction.
                if record.extraction_status == ExtractionStatus::Extracted
                    && !record.is_unranked
                    && record.national_rank.is_none()
                    && record.state_rank.is_none()
                {
                    record.extraction_status = ExtractionStatus::Partial;
                }
                stats.conflicts += conflicts.len();
            }

            match record.extraction_status {
                ExtractionStatus::Extracted => stats.extracted += 1,
                ExtractionStatus::Partial => stats.partial += 1,
                _ => stats.failed += 1,
            }

            debug_assert!(
                record.invariant_violations().is_empty(),
                "assembled record violates invariants: {:?}",
                record.invariant_violations()
            );

            if let Err(e) = self.sink.write(&record) {
                match &e {
                    EngineError::RecordSerialize { .. } => {
                        error!(
                            worker_id = self.id,
                            slug = capture.slug.as_str(),
                            error = ?e,
                            "record not serializable, dropping"
                        );
                    }
                    _ => {
                        error!(
                            worker_id = self.id,
                            slug = capture.slug.as_str(),
                            error = ?e,
                            "failed to write record to sink"
                        );
                    }
                }
            }

            debug!(
                worker_id = self.id,
                slug = capture.slug.as_str(),
                status = record.extraction_status.as_str(),
                duration = fmt_duration(start.elapsed()),
                "document processed"
            );
        }

        stats
    }

    /// Read the capture's bytes and run the pure pipeline under the timeout.
    async fn process_document(&self, capture: &CaptureRecord) -> ExtractionOutcome {
        let bytes = match tokio::fs::read(&capture.file).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(
                    worker_id = self.id,
                    slug = capture.slug.as_str(),
                    file = %capture.file.display(),
                    error = %e,
                    "failed to read capture bytes"
                );
                return failed_outcome(
                    capture,
                    format!("failed to read source bytes: {e}"),
                );
            }
        };

        let capture_for_task = capture.clone();
        let pipeline = task::spawn_blocking(move || {
            assembler::extract_record(&bytes, &capture_for_task, &TracingObserver)
        });

        match time::timeout(self.document_timeout, pipeline).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => {
                error!(
                    worker_id = self.id,
                    slug = capture.slug.as_str(),
                    error = %join_error,
                    "extraction task failed"
                );
                failed_outcome(capture, format!("extraction task failed: {join_error}"))
            }
            Err(_elapsed) => {
                warn!(
                    worker_id = self.id,
                    slug = capture.slug.as_str(),
                    timeout = fmt_duration(self.document_timeout),
                    "document extraction timed out"
                );
                failed_outcome(
                    capture,
                    format!(
                        "extraction timed out after {}",
                        fmt_duration(self.document_timeout)
                    ),
                )
            }
        }
    }
}

/// A `failed` record carrying a single synthetic error.
fn failed_outcome(capture: &CaptureRecord, message: String) -> ExtractionOutcome {
    let mut record = SchoolRecord::new(
        capture.slug.clone(),
        capture.source_year,
        capture.file.to_string_lossy(),
    );
    record.extraction_status = ExtractionStatus::Failed;
    record.errors.push(ExtractionError::new(
        "document",
        ErrorKind::MethodFailure,
        ExtractionMethod::Heuristic,
        message,
    ));
    ExtractionOutcome {
        record,
        accepted: false,
    }
}
