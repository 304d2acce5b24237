//! Ranking pattern dispatcher.
//!
//! Discriminates the four ranking text shapes (national-only, state-only,
//! composite, range-bucket) in a strict precedence order over text fragments
//! annotated with their source selector's priority. The authoritative inline
//! pattern only binds inside priority-0 fragments, which is what lets it
//! preempt everything found in broader-context selectors.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::{
    EXACT_RANK_MAX, NATIONAL_RANK_MAX, RANGE_RANK_MAX, RANGE_RANK_MIN, RankPrecision,
    STATE_RANK_MAX,
};

/// Confidence for the authoritative inline rank (pattern 1).
const AUTHORITATIVE_CONFIDENCE: f32 = 98.0;
/// Confidence for the anchored patterns 2-5.
const ANCHORED_CONFIDENCE: f32 = 95.0;
/// Confidence for the loose fallbacks (patterns 6-7).
const LOOSE_CONFIDENCE: f32 = 85.0;

/// One piece of dispatcher input. Priority 0 marks the authoritative selector.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub text: String,
    pub priority: usize,
}

impl Fragment {
    pub fn new(text: impl Into<String>, priority: usize) -> Self {
        Self {
            text: text.into(),
            priority,
        }
    }
}

/// A single recognized rank with its precision tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRanking {
    pub rank: u32,
    pub rank_end: Option<u32>,
    pub precision: RankPrecision,
    pub confidence: f32,
}

/// Dispatcher output; either side may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingExtraction {
    pub national: Option<ParsedRanking>,
    pub state: Option<ParsedRanking>,
}

impl RankingExtraction {
    pub fn is_empty(&self) -> bool {
        self.national.is_none() && self.state.is_none()
    }
}

const RANK_NUM: &str = r"(\d{1,2},\d{3}|\d{1,5})";

static AUTHORITATIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)ranked\s*#\s*{RANK_NUM}")).unwrap());

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#\s*(\d{1,2},\d{3})\s*-\s*#?\s*(\d{1,2},\d{3})").unwrap()
});

static COMPOSITE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)#\s*{RANK_NUM}\s+in\s+national\s+rankings\s+#\s*{RANK_NUM}\s+in\s+([a-z][a-z .]*?)\s+high\s+schools?"
    ))
    .unwrap()
});

static STATE_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)#\s*{RANK_NUM}\s+in\s+([a-z][a-z .]*?)\s+high\s+schools?"
    ))
    .unwrap()
});

static NATIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)#\s*{RANK_NUM}\s+in\s+national\s+rankings?")).unwrap()
});

static LOOSE_NATIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)#\s*{RANK_NUM}[^#]{{0,120}}?\bnational\b")).unwrap()
});

// Case-sensitive: the trailing word must actually be capitalized.
static LOOSE_STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"#\s*{RANK_NUM}\s+(?:in\s+)?([A-Z][A-Za-z]+)")).unwrap()
});

/// The closed list of rankable state and territory names, lowercase.
const STATE_NAMES: &[&str] = &[
    "alabama",
    "alaska",
    "arizona",
    "arkansas",
    "california",
    "colorado",
    "connecticut",
    "delaware",
    "district of columbia",
    "florida",
    "georgia",
    "guam",
    "hawaii",
    "idaho",
    "illinois",
    "indiana",
    "iowa",
    "kansas",
    "kentucky",
    "louisiana",
    "maine",
    "maryland",
    "massachusetts",
    "michigan",
    "minnesota",
    "mississippi",
    "missouri",
    "montana",
    "nebraska",
    "nevada",
    "new hampshire",
    "new jersey",
    "new mexico",
    "new york",
    "north carolina",
    "north dakota",
    "ohio",
    "oklahoma",
    "oregon",
    "pennsylvania",
    "puerto rico",
    "rhode island",
    "south carolina",
    "south dakota",
    "tennessee",
    "texas",
    "utah",
    "vermont",
    "virgin islands",
    "virginia",
    "washington",
    "west virginia",
    "wisconsin",
    "wyoming",
];

/// Case-insensitive, space-tolerant membership test against the closed list.
fn is_state_name(name: &str) -> bool {
    let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    STATE_NAMES.contains(&normalized.as_str())
}

/// Precision of a national rank value: exact within bucket 1, range within
/// bucket 2, estimated below the cutoff.
pub fn derive_precision(rank: u32) -> RankPrecision {
    if rank <= EXACT_RANK_MAX {
        RankPrecision::Exact
    } else if rank <= RANGE_RANK_MAX {
        RankPrecision::Range
    } else {
        RankPrecision::Estimated
    }
}

/// Strip thousands separators and parse, rejecting ranks outside [1, 50000].
fn parse_rank_capture(digits: &str) -> Option<u32> {
    let value: u32 = digits.replace(',', "").parse().ok()?;
    (1..=NATIONAL_RANK_MAX).contains(&value).then_some(value)
}

/// Same, with the tighter state-rank ceiling.
fn parse_state_rank_capture(digits: &str) -> Option<u32> {
    parse_rank_capture(digits).filter(|&value| value <= STATE_RANK_MAX)
}

fn national_ranking(rank: u32, confidence: f32) -> ParsedRanking {
    let precision = derive_precision(rank);
    ParsedRanking {
        rank,
        rank_end: (precision == RankPrecision::Range).then_some(RANGE_RANK_MAX),
        precision,
        confidence,
    }
}

/// Run the pattern precedence machine over the annotated fragments.
///
/// Patterns 1-5 are mutually exclusive: the first to produce a valid capture
/// ends the primary phase. Patterns 6 and 7 are fallbacks that fill whichever
/// side is still empty. Pure over its input, so running it twice on the same
/// fragments yields identical output.
pub fn dispatch(fragments: &[Fragment]) -> RankingExtraction {
    let mut ordered: Vec<&Fragment> = fragments.iter().collect();
    ordered.sort_by_key(|f| f.priority);

    let full_text = ordered
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let authoritative_text = ordered
        .iter()
        .filter(|f| f.priority == 0)
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let mut extraction = RankingExtraction::default();

    // Pattern 1: authoritative inline rank, restricted to priority-0 text.
    for captures in AUTHORITATIVE_RE.captures_iter(&authoritative_text) {
        if let Some(rank) = parse_rank_capture(&captures[1]) {
            extraction.national = Some(national_ranking(rank, AUTHORITATIVE_CONFIDENCE));
            break;
        }
    }

    if extraction.national.is_none() {
        primary_phase(&full_text, &mut extraction);
    }

    // Pattern 6: loose national, only when nothing earlier matched national.
    if extraction.national.is_none() {
        for captures in LOOSE_NATIONAL_RE.captures_iter(&full_text) {
            if let Some(rank) = parse_rank_capture(&captures[1]) {
                extraction.national = Some(national_ranking(rank, LOOSE_CONFIDENCE));
                break;
            }
        }
    }

    // Pattern 7: loose state, only when nothing earlier matched state and the
    // trailing word is not "National". A number already bound to the national
    // side must not re-bind as a state rank.
    if extraction.state.is_none() {
        let national_rank = extraction.national.as_ref().map(|n| n.rank);
        for captures in LOOSE_STATE_RE.captures_iter(&full_text) {
            if &captures[2] == "National" {
                continue;
            }
            if parse_rank_capture(&captures[1]) == national_rank {
                continue;
            }
            if let Some(rank) = parse_state_rank_capture(&captures[1]) {
                extraction.state = Some(ParsedRanking {
                    rank,
                    rank_end: None,
                    precision: RankPrecision::Estimated,
                    confidence: LOOSE_CONFIDENCE,
                });
                break;
            }
        }
    }

    extraction
}

/// Patterns 2-5 in precedence order; the first valid capture wins outright.
fn primary_phase(text: &str, extraction: &mut RankingExtraction) {
    // Pattern 2: bucket-2 range. Endpoints outside the bucket reject the match.
    for captures in RANGE_RE.captures_iter(text) {
        let (Some(start), Some(end)) = (
            parse_rank_capture(&captures[1]),
            parse_rank_capture(&captures[2]),
        ) else {
            continue;
        };
        if (RANGE_RANK_MIN..=RANGE_RANK_MAX).contains(&start) && (start..=RANGE_RANK_MAX).contains(&end)
        {
            extraction.national = Some(ParsedRanking {
                rank: start,
                rank_end: Some(end),
                precision: RankPrecision::Range,
                confidence: ANCHORED_CONFIDENCE,
            });
            return;
        }
    }

    // Pattern 3: composite national + state. Tried before its substring
    // state-only pattern, so both sides bind together.
    for captures in COMPOSITE_RE.captures_iter(text) {
        let (Some(national), Some(state)) = (
            parse_rank_capture(&captures[1]),
            parse_state_rank_capture(&captures[2]),
        ) else {
            continue;
        };
        if !is_state_name(&captures[3]) {
            continue;
        }
        extraction.national = Some(national_ranking(national, ANCHORED_CONFIDENCE));
        extraction.state = Some(ParsedRanking {
            rank: state,
            rank_end: None,
            precision: RankPrecision::Exact,
            confidence: ANCHORED_CONFIDENCE,
        });
        return;
    }

    // Pattern 4: state-only. The location word must be a real state name,
    // never "National".
    for captures in STATE_ONLY_RE.captures_iter(text) {
        let name = &captures[2];
        if name.eq_ignore_ascii_case("national") || !is_state_name(name) {
            continue;
        }
        if let Some(rank) = parse_state_rank_capture(&captures[1]) {
            extraction.state = Some(ParsedRanking {
                rank,
                rank_end: None,
                precision: RankPrecision::StateOnly,
                confidence: ANCHORED_CONFIDENCE,
            });
            return;
        }
    }

    // Pattern 5: standard national.
    for captures in NATIONAL_RE.captures_iter(text) {
        if let Some(rank) = parse_rank_capture(&captures[1]) {
            extraction.national = Some(national_ranking(rank, ANCHORED_CONFIDENCE));
            return;
        }
    }
}
