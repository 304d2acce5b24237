//! Batch extraction over captured documents.
//!
//! Per-document extraction is CPU-bound and independent, so the batch runner
//! fans captures out to a worker pool. The uniqueness ledger is the only
//! shared structure; everything else is per-worker.

pub mod worker;

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::model::CaptureRecord;
use crate::sink::RecordSink;
use crate::validate::RankingLedger;
use worker::{Worker, WorkerStats};

/// Totals for one batch run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchSummary {
    pub documents: usize,
    pub extracted: usize,
    pub partial: usize,
    pub failed: usize,
    pub conflicts: usize,
}

impl BatchSummary {
    fn absorb(&mut self, stats: &WorkerStats) {
        self.documents += stats.documents;
        self.extracted += stats.extracted;
        self.partial += stats.partial;
        self.failed += stats.failed;
        self.conflicts += stats.conflicts;
    }
}

/// Load a JSONL manifest of capture records.
///
/// Bad lines are skipped with a warning; only an unreadable file aborts.
pub fn load_manifest(path: &Path) -> Result<Vec<CaptureRecord>, EngineError> {
    let unreadable = |source| EngineError::ManifestUnreadable {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(&unreadable)?;
    let reader = BufReader::new(file);

    let mut captures = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(&unreadable)?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CaptureRecord>(&line) {
            Ok(capture) => captures.push(capture),
            Err(e) => {
                warn!(
                    line = line_number + 1,
                    error = %e,
                    "skipping unparseable manifest line"
                );
            }
        }
    }
    Ok(captures)
}

/// Run the worker pool to completion over `captures`.
///
/// Cancellation propagates between documents: a worker in flight completes
/// its current document (or hits its timeout) before exiting.
pub async fn run(
    captures: Vec<CaptureRecord>,
    worker_count: usize,
    document_timeout: Duration,
    ledger: Arc<RankingLedger>,
    sink: Arc<dyn RecordSink>,
    shutdown_tx: &broadcast::Sender<()>,
) -> BatchSummary {
    let total = captures.len();
    let queue = Arc::new(Mutex::new(VecDeque::from(captures)));
    let worker_count = worker_count.max(1);

    info!(total, worker_count, "starting batch extraction");
    let start = std::time::Instant::now();

    let mut join_set = JoinSet::new();
    for id in 0..worker_count {
        let worker = Worker::new(
            id,
            Arc::clone(&queue),
            document_timeout,
            Arc::clone(&ledger),
            Arc::clone(&sink),
        );
        let shutdown_rx = shutdown_tx.subscribe();
        join_set.spawn(async move { worker.run(shutdown_rx).await });
    }

    let mut summary = BatchSummary::default();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(stats) => summary.absorb(&stats),
            Err(e) => warn!(error = %e, "worker task failed"),
        }
    }

    info!(
        documents = summary.documents,
        extracted = summary.extracted,
        partial = summary.partial,
        failed = summary.failed,
        conflicts = summary.conflicts,
        elapsed = crate::utils::fmt_duration(start.elapsed()),
        "batch extraction finished"
    );
    summary
}
