//! Unranked-vs-ranked classification.
//!
//! Runs before the ranking dispatcher and gates it: a high-confidence
//! unranked verdict means the dispatcher is never consulted. The first rule
//! is scoped to the page's own ranking section so that promotional blurbs
//! about nearby institutions cannot flip the verdict.

use regex::Regex;
use std::sync::LazyLock;

use crate::html::{Document, Section};

/// Selectors that anchor the document's own ranking section, most specific first.
pub const RANKING_SECTION_SELECTORS: &[&str] = &[
    "[data-testid='rankings-section']",
    "#rankings-section",
    "section.rankings",
    ".profile-rankings",
];

/// Any visible rank statement. Presence inside the ranking section vetoes the
/// explicit unranked marker.
static VISIBLE_RANK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ranked\s*#\s*\d+|#\d{1,5}\s+in\s+(national|state)").unwrap()
});

static SELF_RANKED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)is\s+ranked\s*#\s*\d+").unwrap());

static SELF_UNRANKED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)this\s+school\s+is\s+(?:currently\s+)?unranked|is\s+not\s+ranked\b").unwrap()
});

static UNRANKED_INDICATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ranking\s+not\s+available|insufficient\s+data\s+for\s+ranking").unwrap()
});

/// Classifier output. `confidence` is 0-100; a verdict of unranked with
/// confidence >= 90 skips rank extraction entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct UnrankedVerdict {
    pub unranked: bool,
    pub confidence: f32,
    pub reason: Option<String>,
}

impl UnrankedVerdict {
    fn ranked(confidence: f32) -> Self {
        Self {
            unranked: false,
            confidence,
            reason: None,
        }
    }

    fn unranked(confidence: f32, reason: &str) -> Self {
        Self {
            unranked: true,
            confidence,
            reason: Some(reason.to_string()),
        }
    }

    /// True when this verdict is strong enough to gate the dispatcher.
    pub fn gates_ranking(&self) -> bool {
        self.unranked && self.confidence >= 90.0
    }
}

/// Words of the slug without any trailing numeric id, for self-reference checks.
fn slug_words(slug: &str) -> String {
    slug.split('-')
        .filter(|part| !part.is_empty() && !part.chars().all(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The document's ranking section, if any anchor selector matches.
pub fn ranking_section<'a>(doc: &'a Document) -> Option<Section<'a>> {
    RANKING_SECTION_SELECTORS
        .iter()
        .find_map(|selector| doc.scoped(selector))
}

/// Decide unranked vs ranked. First rule to fire wins.
pub fn classify(doc: &Document, slug: &str, name: Option<&str>) -> UnrankedVerdict {
    // Rule 1: explicit marker, scoped. A strong-emphasis "Unranked" inside the
    // ranking section is authoritative only when that same subtree shows no
    // visible rank statement.
    if let Some(section) = ranking_section(doc) {
        let has_marker = section
            .select_all("strong, b")
            .iter()
            .any(|node| node.text().eq_ignore_ascii_case("unranked"));
        if has_marker && !VISIBLE_RANK_RE.is_match(&section.text()) {
            return UnrankedVerdict::unranked(95.0, "explicit marker in ranking section");
        }
    }

    let body = doc.body_text();

    // Rule 2: counted body markers. Case-sensitive so that "Unranked School"
    // does not also count as "Ranked School".
    let ranked_markers = body.matches("Ranked School").count();
    let unranked_markers = body.matches("Unranked School").count();
    if ranked_markers > unranked_markers {
        return UnrankedVerdict::ranked(90.0);
    }

    // Rule 3: a "<school> is ranked #N" sentence about this school itself.
    let own_names: Vec<String> = name
        .map(|n| n.to_lowercase())
        .into_iter()
        .chain(Some(slug_words(slug)))
        .filter(|n| !n.is_empty())
        .collect();
    for found in SELF_RANKED_RE.find_iter(&body) {
        let prefix_start = found.start().saturating_sub(100);
        let prefix = body[prefix_start..found.start()].to_lowercase();
        if own_names.iter().any(|n| prefix.contains(n.as_str())) {
            return UnrankedVerdict::ranked(95.0);
        }
    }

    // Rule 4: self-referential unranked sentence.
    if SELF_UNRANKED_RE.is_match(&body) {
        return UnrankedVerdict::unranked(90.0, "self-referential unranked sentence");
    }

    // Rule 5: strong textual unranked indicators anywhere on the page.
    let strong_unranked = doc
        .select_all("strong, b")
        .iter()
        .any(|node| node.text().eq_ignore_ascii_case("unranked"));
    if strong_unranked || UNRANKED_INDICATOR_RE.is_match(&body) {
        return UnrankedVerdict::unranked(90.0, "unranked indicator text");
    }

    // Default: let the dispatcher do the work.
    UnrankedVerdict::ranked(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Document {
        Document::parse(html.as_bytes())
    }

    #[test]
    fn test_scoped_marker_wins_over_noisy_neighbor() {
        let doc = doc(
            "<section id=\"rankings-section\"><strong>Unranked</strong></section>\
             <aside>University of Test #54 in National Universities</aside>",
        );
        let verdict = classify(&doc, "test-high-school", None);
        assert!(verdict.unranked);
        assert_eq!(verdict.confidence, 95.0);
        assert!(verdict.reason.unwrap().contains("ranking section"));
    }

    #[test]
    fn test_marker_vetoed_by_rank_pattern_in_same_section() {
        let doc = doc(
            "<section id=\"rankings-section\"><strong>Unranked</strong>\
             <p>#1,204 in National Rankings</p></section>",
        );
        let verdict = classify(&doc, "test-high-school", None);
        // Rule 1 must not fire; rule 5 then sees the strong marker, but the
        // gate decision belongs to the caller either way.
        assert!(verdict.confidence < 95.0);
    }

    #[test]
    fn test_counted_body_markers_prefer_ranked() {
        let doc = doc(
            "<div><span class=\"badge\">Ranked School</span>\
             <p>Compare with an Unranked School nearby. Ranked School badge.</p></div>",
        );
        let verdict = classify(&doc, "test-high-school", None);
        assert!(!verdict.unranked);
        assert_eq!(verdict.confidence, 90.0);
    }

    #[test]
    fn test_self_referential_ranked_sentence() {
        let doc = doc("<p>Jefferson Science Academy is ranked #212 nationally.</p>");
        let verdict = classify(&doc, "jefferson-science-academy-4410", None);
        assert!(!verdict.unranked);
        assert_eq!(verdict.confidence, 95.0);
    }

    #[test]
    fn test_ranked_sentence_about_other_entity_does_not_bind() {
        let doc = doc("<p>Nearby, Central Prep is ranked #9 in the region.</p>");
        let verdict = classify(&doc, "jefferson-science-academy-4410", None);
        // Falls through to the default.
        assert_eq!(verdict.confidence, 0.0);
        assert!(!verdict.unranked);
    }

    #[test]
    fn test_self_referential_unranked_sentence() {
        let doc = doc("<p>This school is currently unranked.</p>");
        let verdict = classify(&doc, "any-school", None);
        assert!(verdict.unranked);
        assert_eq!(verdict.confidence, 90.0);
    }

    #[test]
    fn test_strong_unranked_indicator_without_section() {
        let doc = doc("<div><strong>Unranked</strong></div>");
        let verdict = classify(&doc, "any-school", None);
        assert!(verdict.unranked);
        assert_eq!(verdict.confidence, 90.0);
    }

    #[test]
    fn test_insufficient_data_indicator() {
        let doc = doc("<p>Insufficient data for ranking this year.</p>");
        let verdict = classify(&doc, "any-school", None);
        assert!(verdict.unranked);
    }

    #[test]
    fn test_default_is_ranked_with_zero_confidence() {
        let doc = doc("<p>A fine school in a quiet town.</p>");
        let verdict = classify(&doc, "any-school", None);
        assert!(!verdict.unranked);
        assert_eq!(verdict.confidence, 0.0);
        assert!(!verdict.gates_ranking());
    }

    #[test]
    fn test_gate_requires_high_confidence_unranked() {
        assert!(UnrankedVerdict::unranked(95.0, "x").gates_ranking());
        assert!(!UnrankedVerdict::unranked(89.0, "x").gates_ranking());
        assert!(!UnrankedVerdict::ranked(95.0).gates_ranking());
    }
}
