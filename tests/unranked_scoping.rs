//! Scoped unranked classification against noisy neighbor content.

mod helpers;

use helpers::extract;

#[test]
fn scoped_unranked_marker_survives_noisy_neighbor() {
    // The page's own ranking section says Unranked; a sidebar advertises a
    // nearby university's national rank. The neighbor must not bind.
    let html = r#"<html><body>
        <h1 data-testid="school-name">Riverbend High School</h1>
        <section id="rankings-section">
            <strong>Unranked</strong>
            <p>This school does not appear in this year's rankings.</p>
        </section>
        <aside class="promo">
            University of Test #54 in National Universities - apply today!
        </aside>
        <div data-testid="enrollment">412</div>
    </body></html>"#;

    let outcome = extract(html, "riverbend-high-school", 2024);
    let record = &outcome.record;

    assert!(record.is_unranked);
    assert_eq!(record.national_rank, None);
    assert_eq!(record.state_rank, None);
    assert_ne!(record.national_rank, Some(54));
    assert!(
        record
            .unranked_reason
            .as_deref()
            .unwrap()
            .contains("ranking section")
    );
    assert!(record.invariant_violations().is_empty());
}

#[test]
fn rank_pattern_inside_section_defeats_the_marker() {
    // A leftover bold "Unranked" label next to a real rank statement must not
    // suppress extraction: the scoped rule requires a clean section.
    let html = r#"<html><body>
        <h1 data-testid="school-name">Harbor Point High School</h1>
        <section id="rankings-section">
            <strong>Unranked</strong>
            <span data-testid="rank-badge">ranked #512</span>
        </section>
    </body></html>"#;

    let outcome = extract(html, "harbor-point-high-school", 2024);
    // The explicit marker is vetoed; the weaker body-wide indicator still
    // gates at confidence 90, so ranks stay null by the classifier's call.
    let record = &outcome.record;
    assert!(record.is_unranked);
    assert!(record.national_rank.is_none());
}

#[test]
fn self_referential_ranked_sentence_overrides_stray_markers() {
    let html = r#"<html><body>
        <h1 data-testid="school-name">Jefferson Science Academy</h1>
        <p>Jefferson Science Academy is ranked #212 among public schools.</p>
        <span data-testid="rank-badge">ranked #212</span>
    </body></html>"#;

    let outcome = extract(html, "jefferson-science-academy", 2024);
    let record = &outcome.record;
    assert!(!record.is_unranked);
    assert_eq!(record.national_rank, Some(212));
}

#[test]
fn unranked_school_has_reason_and_no_rank_confidence_loss() {
    let html = r#"<html><body>
        <h1 data-testid="school-name">Quiet Valley High School</h1>
        <section id="rankings-section"><strong>Unranked</strong></section>
        <div data-testid="enrollment">96</div>
        <div data-testid="graduation-rate">71%</div>
    </body></html>"#;

    let outcome = extract(html, "quiet-valley-high-school", 2024);
    let record = &outcome.record;
    assert!(record.is_unranked);
    assert!(record.unranked_reason.is_some());
    // The verdict itself contributes rankings confidence.
    assert!(record.category_confidences.rankings >= 90.0);
}
