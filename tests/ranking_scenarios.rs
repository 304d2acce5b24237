//! End-to-end ranking extraction over full profile pages.

mod helpers;

use helpers::{extract, profile_page};
use prospectus::model::{ExtractionStatus, RankPrecision};

#[test]
fn composite_text_yields_both_ranks() {
    let html = profile_page("#1,102 in National Rankings #10 in South Carolina High Schools");
    let outcome = extract(&html, "abbeville-high-school", 2024);
    let record = &outcome.record;

    assert_eq!(record.national_rank, Some(1102));
    assert_eq!(record.national_rank_precision, Some(RankPrecision::Exact));
    assert_eq!(record.state_rank, Some(10));
    assert_eq!(record.state_rank_precision, Some(RankPrecision::Exact));
    assert!(record.category_confidences.rankings >= 90.0);
    assert!(record.invariant_violations().is_empty());
}

#[test]
fn bucket_two_range_sets_both_endpoints() {
    let html = profile_page("#13,427-17,901");
    let outcome = extract(&html, "abbeville-high-school", 2024);
    let record = &outcome.record;

    assert_eq!(record.national_rank, Some(13427));
    assert_eq!(record.national_rank_end, Some(17901));
    assert_eq!(record.national_rank_precision, Some(RankPrecision::Range));
    assert!(record.category_confidences.rankings >= 90.0);
    assert!(record.invariant_violations().is_empty());
}

#[test]
fn state_only_text_leaves_national_null() {
    let html = profile_page("#1,092 in Texas High Schools");
    let outcome = extract(&html, "lone-star-high-school", 2024);
    let record = &outcome.record;

    assert_eq!(record.state_rank, Some(1092));
    assert_eq!(record.state_rank_precision, Some(RankPrecision::StateOnly));
    assert_eq!(record.national_rank, None);
    assert_eq!(record.national_rank_precision, None);
}

#[test]
fn authoritative_inline_preempts_range_in_broader_context() {
    // The rank badge (priority 0) carries the authoritative statement; a
    // broader ranking section offers a bucket-2 range that must lose.
    let html = r#"<html><body>
            <h1 data-testid="school-name">Jefferson Science Academy</h1>
            <span data-testid="rank-badge">ranked #397</span>
            <section id="rankings-section">Peer band: #14,000-17,901</section>
        </body></html>"#;
    let outcome = extract(html, "jefferson-science-academy", 2024);
    let record = &outcome.record;

    assert_eq!(record.national_rank, Some(397));
    assert_eq!(record.national_rank_precision, Some(RankPrecision::Exact));
    assert_eq!(record.national_rank_end, None);
}

#[test]
fn fully_populated_page_reaches_extracted_status() {
    let html = profile_page("#2,847 in National Rankings");
    let outcome = extract(&html, "abbeville-high-school", 2024);
    let record = &outcome.record;

    // name, grades, locality, region, postal, telephone, enrollment, ratio,
    // graduation rate, and ranking resolution: 10/10 mandatory.
    assert_eq!(record.extraction_status, ExtractionStatus::Extracted);
    assert!(outcome.accepted);
    assert_eq!(record.name.as_deref(), Some("Abbeville High School"));
    assert_eq!(record.telephone.as_deref(), Some("(864) 366-5076"));
    assert_eq!(record.postal_code.as_deref(), Some("29620"));
    assert_eq!(record.enrollment, Some(812));
    assert_eq!(record.student_teacher_ratio.as_deref(), Some("14:1"));
    assert_eq!(record.graduation_rate, Some(89.0));
    assert!(record.overall_confidence >= 60.0);
}

#[test]
fn every_outcome_respects_model_invariants() {
    // A grid of pages with varied ranking shapes; whatever the dispatcher
    // decides, the assembled record must satisfy the model invariants.
    let badges = [
        "",
        "ranked #1",
        "ranked #13,426",
        "#13,427-17,901",
        "#13,500-14,000",
        "#1,102 in National Rankings #10 in South Carolina High Schools",
        "#9,999 in National Rankings",
        "#18,000 in National Rankings",
        "#1,092 in Texas High Schools",
        "#3 in Springfield High Schools",
        "#60,123 in National Rankings",
        "no ranking text at all",
    ];

    for badge in badges {
        let html = profile_page(badge);
        let outcome = extract(&html, "grid-school", 2024);
        let violations = outcome.record.invariant_violations();
        assert!(
            violations.is_empty(),
            "badge {badge:?} produced violations: {violations:?}"
        );
    }
}

#[test]
fn extraction_is_deterministic() {
    let html = profile_page("#1,102 in National Rankings #10 in South Carolina High Schools");
    let first = extract(&html, "abbeville-high-school", 2024);
    let second = extract(&html, "abbeville-high-school", 2024);

    assert_eq!(first.record.national_rank, second.record.national_rank);
    assert_eq!(first.record.state_rank, second.record.state_rank);
    assert_eq!(first.record.overall_confidence, second.record.overall_confidence);
    assert_eq!(first.record.extraction_status, second.record.extraction_status);
}
