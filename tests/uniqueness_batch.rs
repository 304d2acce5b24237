//! Batch-level uniqueness enforcement across accepted records.

mod helpers;

use helpers::{make_capture, profile_page};
use prospectus::batch;
use prospectus::model::{CaptureRecord, ExtractionStatus};
use prospectus::sink::{RecordSink, VecSink};
use prospectus::validate::RankingLedger;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn write_capture(dir: &Path, slug: &str, year: u16, html: &str) -> CaptureRecord {
    let mut capture = make_capture(slug, year);
    let path = dir.join(format!("{slug}-{year}.html"));
    fs::write(&path, html).unwrap();
    capture.file = path;
    capture.byte_len = html.len() as u64;
    capture
}

async fn run_batch(captures: Vec<CaptureRecord>) -> (Vec<prospectus::model::SchoolRecord>, batch::BatchSummary) {
    let sink = Arc::new(VecSink::new());
    let ledger = Arc::new(RankingLedger::new());
    let (shutdown_tx, _) = broadcast::channel(1);

    // One worker keeps admission order deterministic.
    let summary = batch::run(
        captures,
        1,
        Duration::from_secs(30),
        ledger,
        Arc::clone(&sink) as Arc<dyn RecordSink>,
        &shutdown_tx,
    )
    .await;

    (sink.records(), summary)
}

#[tokio::test]
async fn bucket_one_collision_keeps_first_record() {
    let dir = tempfile::tempdir().unwrap();
    let html = profile_page("ranked #21");
    let captures = vec![
        write_capture(dir.path(), "alpha-high-school", 2024, &html),
        write_capture(dir.path(), "beta-high-school", 2024, &html),
    ];

    let (records, summary) = run_batch(captures).await;
    assert_eq!(records.len(), 2);

    let first = records.iter().find(|r| r.slug == "alpha-high-school").unwrap();
    let second = records.iter().find(|r| r.slug == "beta-high-school").unwrap();

    assert_eq!(first.national_rank, Some(21));
    assert_eq!(second.national_rank, None);
    assert_eq!(second.national_rank_precision, None);
    assert_eq!(summary.conflicts, 1);

    // Identical pages score identically before the published -50 penalty.
    assert!((first.overall_confidence - second.overall_confidence - 50.0).abs() < 0.01);
}

#[tokio::test]
async fn same_rank_across_years_is_not_a_collision() {
    let dir = tempfile::tempdir().unwrap();
    let html = profile_page("ranked #21");
    let captures = vec![
        write_capture(dir.path(), "alpha-high-school", 2024, &html),
        write_capture(dir.path(), "alpha-high-school", 2025, &html),
    ];

    let (records, summary) = run_batch(captures).await;
    assert_eq!(summary.conflicts, 0);
    assert!(records.iter().all(|r| r.national_rank == Some(21)));
}

#[tokio::test]
async fn range_band_duplicates_coexist() {
    let dir = tempfile::tempdir().unwrap();
    let html = profile_page("#13,427-17,901");
    let captures = vec![
        write_capture(dir.path(), "alpha-high-school", 2024, &html),
        write_capture(dir.path(), "beta-high-school", 2024, &html),
        write_capture(dir.path(), "gamma-high-school", 2024, &html),
    ];

    let (records, summary) = run_batch(captures).await;
    assert_eq!(summary.conflicts, 0);
    assert!(records.iter().all(|r| r.national_rank == Some(13427)));
    assert!(records.iter().all(|r| r.national_rank_end == Some(17901)));
}

#[tokio::test]
async fn unreadable_capture_yields_failed_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut missing = make_capture("ghost-high-school", 2024);
    missing.file = dir.path().join("does-not-exist.html");

    let (records, summary) = run_batch(vec![missing]).await;
    assert_eq!(summary.failed, 1);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].extraction_status, ExtractionStatus::Failed);
    assert_eq!(records[0].errors.len(), 1);
}

#[tokio::test]
async fn batch_outputs_one_record_per_capture_with_valid_invariants() {
    let dir = tempfile::tempdir().unwrap();
    let captures = vec![
        write_capture(
            dir.path(),
            "composite-high-school",
            2024,
            &profile_page("#1,102 in National Rankings #10 in South Carolina High Schools"),
        ),
        write_capture(dir.path(), "band-high-school", 2024, &profile_page("#13,427-17,901")),
        write_capture(
            dir.path(),
            "state-only-high-school",
            2024,
            &profile_page("#1,092 in Texas High Schools"),
        ),
        write_capture(dir.path(), "silent-high-school", 2024, &profile_page("")),
    ];

    let (records, summary) = run_batch(captures).await;
    assert_eq!(records.len(), 4);
    assert_eq!(summary.documents, 4);
    for record in &records {
        let violations = record.invariant_violations();
        assert!(
            violations.is_empty(),
            "{} violates: {violations:?}",
            record.slug
        );
    }
}
