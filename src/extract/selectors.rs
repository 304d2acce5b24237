//! Selector-driven field extraction.
//!
//! Each field carries an ordered selector list, most-specific first. The first
//! selector that yields a validating value wins; confidence is positional
//! (first 95, middle 85, last 70) scaled by a validation factor (strict 1.0,
//! loose 0.6). Failures accumulate as errors and leave the field null.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::extract::numeric::{self, DecimalPolicy};
use crate::extract::ranking::Fragment;
use crate::html::{Document, clean_text};
use crate::model::{ErrorKind, ExtractionError, ExtractionMethod, FieldCategory};

/// Validation factor for a strict-format match.
const STRICT_FACTOR: f32 = 1.0;
/// Validation factor for a loose match that needed repair.
const LOOSE_FACTOR: f32 = 0.6;

/// Ranking-context selectors, most authoritative first. Their matched text
/// becomes the dispatcher's priority-annotated fragments.
pub const RANKING_CONTEXT_SELECTORS: &[&str] = &[
    "[data-testid='rank-badge']",
    ".rankings-summary .rank-text",
    "#rankings-section",
    ".profile-rankings",
];

/// Phrases that mark an error page rather than a school name.
const NAME_BLACKLIST: &[&str] = &[
    "page not found",
    "access denied",
    "internal server error",
    "loading",
    "school profile",
];

static GRADES_STRICT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:PK|K|\d{1,2})-\d{1,2}$").unwrap());
static GRADES_LOOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:PK|K|\d{1,2})\s*(?:-|to|\u{2013})\s*(\d{1,2})").unwrap());
static POSTAL_STRICT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").unwrap());
static POSTAL_LOOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{5}").unwrap());
static REGION_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{2}$").unwrap());

/// What shape a field's raw text must take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Name,
    Grades,
    Street,
    Locality,
    Region,
    Postal,
    Telephone,
    Website,
    Setting,
    Enrollment,
    TeacherCount,
    Ratio,
    Percentage,
}

/// A typed, validated field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(u32),
    Percentage(f32),
}

/// One field's extraction spec: where to look and how to validate.
pub struct FieldSpec {
    pub name: &'static str,
    pub category: FieldCategory,
    pub kind: FieldKind,
    pub selectors: &'static [&'static str],
}

/// The selector-extractable fields, in assembly order.
pub const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec {
        name: "name",
        category: FieldCategory::Identity,
        kind: FieldKind::Name,
        selectors: &[
            "h1[data-testid='school-name']",
            "h1.school-profile-name",
            "h1",
        ],
    },
    FieldSpec {
        name: "grades",
        category: FieldCategory::Identity,
        kind: FieldKind::Grades,
        selectors: &[
            "[data-testid='grades-range']",
            ".school-grades .value",
            ".quick-stats .grades",
        ],
    },
    FieldSpec {
        name: "setting",
        category: FieldCategory::Identity,
        kind: FieldKind::Setting,
        selectors: &["[data-testid='school-setting']", ".school-setting .value"],
    },
    FieldSpec {
        name: "street",
        category: FieldCategory::Location,
        kind: FieldKind::Street,
        selectors: &["[data-testid='address-street']", ".school-address .street"],
    },
    FieldSpec {
        name: "locality",
        category: FieldCategory::Location,
        kind: FieldKind::Locality,
        selectors: &["[data-testid='address-city']", ".school-address .city"],
    },
    FieldSpec {
        name: "region",
        category: FieldCategory::Location,
        kind: FieldKind::Region,
        selectors: &["[data-testid='address-state']", ".school-address .state"],
    },
    FieldSpec {
        name: "postal_code",
        category: FieldCategory::Location,
        kind: FieldKind::Postal,
        selectors: &["[data-testid='address-zip']", ".school-address .zip"],
    },
    FieldSpec {
        name: "telephone",
        category: FieldCategory::Location,
        kind: FieldKind::Telephone,
        selectors: &[
            "[data-testid='school-phone']",
            ".school-contact .phone",
            "a[href^='tel:']",
        ],
    },
    FieldSpec {
        name: "website",
        category: FieldCategory::Location,
        kind: FieldKind::Website,
        selectors: &[
            "[data-testid='school-website'] a",
            ".school-contact a.website",
        ],
    },
    FieldSpec {
        name: "enrollment",
        category: FieldCategory::Capacity,
        kind: FieldKind::Enrollment,
        selectors: &[
            "[data-testid='enrollment']",
            ".enrollment .value",
            ".quick-stats .enrollment",
        ],
    },
    FieldSpec {
        name: "student_teacher_ratio",
        category: FieldCategory::Capacity,
        kind: FieldKind::Ratio,
        selectors: &[
            "[data-testid='student-teacher-ratio']",
            ".student-teacher-ratio .value",
        ],
    },
    FieldSpec {
        name: "full_time_teachers",
        category: FieldCategory::Capacity,
        kind: FieldKind::TeacherCount,
        selectors: &["[data-testid='full-time-teachers']", ".teachers .value"],
    },
    FieldSpec {
        name: "ap_participation",
        category: FieldCategory::Performance,
        kind: FieldKind::Percentage,
        selectors: &["[data-testid='ap-participation']", ".ap-participation .value"],
    },
    FieldSpec {
        name: "ap_pass_rate",
        category: FieldCategory::Performance,
        kind: FieldKind::Percentage,
        selectors: &["[data-testid='ap-pass-rate']", ".ap-passed .value"],
    },
    FieldSpec {
        name: "math_proficiency",
        category: FieldCategory::Performance,
        kind: FieldKind::Percentage,
        selectors: &["[data-testid='math-proficiency']", ".proficiency-math .value"],
    },
    FieldSpec {
        name: "reading_proficiency",
        category: FieldCategory::Performance,
        kind: FieldKind::Percentage,
        selectors: &[
            "[data-testid='reading-proficiency']",
            ".proficiency-reading .value",
        ],
    },
    FieldSpec {
        name: "science_proficiency",
        category: FieldCategory::Performance,
        kind: FieldKind::Percentage,
        selectors: &[
            "[data-testid='science-proficiency']",
            ".proficiency-science .value",
        ],
    },
    FieldSpec {
        name: "graduation_rate",
        category: FieldCategory::Performance,
        kind: FieldKind::Percentage,
        selectors: &["[data-testid='graduation-rate']", ".graduation-rate .value"],
    },
    FieldSpec {
        name: "college_readiness",
        category: FieldCategory::Performance,
        kind: FieldKind::Percentage,
        selectors: &[
            "[data-testid='college-readiness']",
            ".college-readiness .value",
        ],
    },
    FieldSpec {
        name: "pct_white",
        category: FieldCategory::Demographics,
        kind: FieldKind::Percentage,
        selectors: &["[data-testid='demo-white']", ".demographics .white .value"],
    },
    FieldSpec {
        name: "pct_asian",
        category: FieldCategory::Demographics,
        kind: FieldKind::Percentage,
        selectors: &["[data-testid='demo-asian']", ".demographics .asian .value"],
    },
    FieldSpec {
        name: "pct_hispanic",
        category: FieldCategory::Demographics,
        kind: FieldKind::Percentage,
        selectors: &[
            "[data-testid='demo-hispanic']",
            ".demographics .hispanic .value",
        ],
    },
    FieldSpec {
        name: "pct_black",
        category: FieldCategory::Demographics,
        kind: FieldKind::Percentage,
        selectors: &["[data-testid='demo-black']", ".demographics .black .value"],
    },
    FieldSpec {
        name: "pct_american_indian",
        category: FieldCategory::Demographics,
        kind: FieldKind::Percentage,
        selectors: &[
            "[data-testid='demo-american-indian']",
            ".demographics .american-indian .value",
        ],
    },
    FieldSpec {
        name: "pct_two_or_more",
        category: FieldCategory::Demographics,
        kind: FieldKind::Percentage,
        selectors: &[
            "[data-testid='demo-two-or-more']",
            ".demographics .two-or-more .value",
        ],
    },
    FieldSpec {
        name: "pct_female",
        category: FieldCategory::Demographics,
        kind: FieldKind::Percentage,
        selectors: &["[data-testid='demo-female']", ".demographics .female .value"],
    },
    FieldSpec {
        name: "pct_male",
        category: FieldCategory::Demographics,
        kind: FieldKind::Percentage,
        selectors: &["[data-testid='demo-male']", ".demographics .male .value"],
    },
    FieldSpec {
        name: "pct_economically_disadvantaged",
        category: FieldCategory::Demographics,
        kind: FieldKind::Percentage,
        selectors: &[
            "[data-testid='demo-econ-disadvantaged']",
            ".demographics .econ-disadvantaged .value",
        ],
    },
];

/// A validated extraction for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub field: &'static str,
    pub category: FieldCategory,
    pub value: FieldValue,
    pub confidence: f32,
}

enum Validation {
    Valid { value: FieldValue, factor: f32 },
    Invalid { kind: ErrorKind, reason: String },
}

/// Selector-rank confidence: first 95, last 70, anything between 85.
fn position_confidence(index: usize, total: usize) -> f32 {
    if index == 0 {
        95.0
    } else if index + 1 == total {
        70.0
    } else {
        85.0
    }
}

fn invalid(kind: ErrorKind, reason: impl Into<String>) -> Validation {
    Validation::Invalid {
        kind,
        reason: reason.into(),
    }
}

fn valid_text(value: String, factor: f32) -> Validation {
    Validation::Valid {
        value: FieldValue::Text(value),
        factor,
    }
}

/// Normalize ten digits into `(NNN) NNN-NNNN`.
fn format_phone(digits: &str) -> String {
    format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..10])
}

/// Normalize any phone-shaped string to `(NNN) NNN-NNNN`.
///
/// `None` unless exactly ten digits remain after stripping (a leading country
/// code of 1 is tolerated). Shared with the structured-data seeding path.
pub fn normalize_telephone(text: &str) -> Option<String> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        10 => Some(format_phone(&digits)),
        11 if digits.starts_with('1') => Some(format_phone(&digits[1..])),
        _ => None,
    }
}

fn validate(kind: FieldKind, raw: &str) -> Validation {
    let text = clean_text(raw);
    if text.is_empty() {
        return invalid(ErrorKind::Parse, "empty text");
    }

    match kind {
        FieldKind::Name => {
            let lowered = text.to_lowercase();
            if NAME_BLACKLIST.iter().any(|phrase| lowered.contains(phrase)) {
                return invalid(ErrorKind::Validation, format!("blacklisted name text: {text}"));
            }
            if !(5..=100).contains(&text.len()) {
                return invalid(ErrorKind::Validation, format!("name length {} outside [5, 100]", text.len()));
            }
            valid_text(text, STRICT_FACTOR)
        }
        FieldKind::Grades => {
            if GRADES_STRICT_RE.is_match(&text) {
                return valid_text(text, STRICT_FACTOR);
            }
            match GRADES_LOOSE_RE.find(&text) {
                Some(found) => {
                    let repaired = found.as_str().split_whitespace().collect::<String>().replace("to", "-").replace('\u{2013}', "-");
                    valid_text(repaired, LOOSE_FACTOR)
                }
                None => invalid(ErrorKind::Parse, format!("unrecognized grade range: {text}")),
            }
        }
        FieldKind::Street | FieldKind::Locality | FieldKind::Setting => {
            if text.len() > 100 {
                return invalid(ErrorKind::Validation, "text too long");
            }
            valid_text(text, STRICT_FACTOR)
        }
        FieldKind::Region => {
            if REGION_CODE_RE.is_match(&text) {
                valid_text(text, STRICT_FACTOR)
            } else if (3..=30).contains(&text.len()) {
                valid_text(text, LOOSE_FACTOR)
            } else {
                invalid(ErrorKind::Validation, format!("implausible region: {text}"))
            }
        }
        FieldKind::Postal => {
            if POSTAL_STRICT_RE.is_match(&text) {
                return valid_text(text, STRICT_FACTOR);
            }
            match POSTAL_LOOSE_RE.find(&text) {
                Some(found) => valid_text(found.as_str().to_string(), LOOSE_FACTOR),
                None => invalid(ErrorKind::Parse, format!("no postal code in: {text}")),
            }
        }
        FieldKind::Telephone => {
            let digits: String = text.chars().filter(char::is_ascii_digit).collect();
            if digits.len() == 10 {
                valid_text(format_phone(&digits), STRICT_FACTOR)
            } else if digits.len() == 11 && digits.starts_with('1') {
                valid_text(format_phone(&digits[1..]), LOOSE_FACTOR)
            } else {
                invalid(
                    ErrorKind::Validation,
                    format!("expected ten digits, got {}", digits.len()),
                )
            }
        }
        FieldKind::Website => match Url::parse(&text) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
                valid_text(url.to_string(), STRICT_FACTOR)
            }
            _ => {
                // Scheme-relative or bare-domain links are repaired on emit.
                let candidate = format!("https://{}", text.trim_start_matches("//"));
                match Url::parse(&candidate) {
                    Ok(url) if url.host_str().is_some_and(|h| h.contains('.')) => {
                        valid_text(url.to_string(), LOOSE_FACTOR)
                    }
                    _ => invalid(ErrorKind::Parse, format!("not a URL: {text}")),
                }
            }
        },
        FieldKind::Enrollment => match numeric::parse_integer(&text) {
            Some(parsed) if (1..=100_000).contains(&parsed.value) => Validation::Valid {
                value: FieldValue::Integer(parsed.value),
                factor: STRICT_FACTOR,
            },
            Some(parsed) => invalid(
                ErrorKind::Validation,
                format!("implausible enrollment: {}", parsed.value),
            ),
            None => invalid(ErrorKind::Parse, format!("not an integer: {text}")),
        },
        FieldKind::TeacherCount => match numeric::parse_integer(&text) {
            Some(parsed) if (1..=5_000).contains(&parsed.value) => Validation::Valid {
                value: FieldValue::Integer(parsed.value),
                factor: STRICT_FACTOR,
            },
            Some(parsed) => invalid(
                ErrorKind::Validation,
                format!("implausible teacher count: {}", parsed.value),
            ),
            None => invalid(ErrorKind::Parse, format!("not an integer: {text}")),
        },
        FieldKind::Ratio => match numeric::parse_ratio(&text) {
            Some(parsed) => {
                let numerator: u32 = parsed
                    .value
                    .split(':')
                    .next()
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(0);
                if (5..=50).contains(&numerator) {
                    valid_text(parsed.value, STRICT_FACTOR)
                } else {
                    invalid(
                        ErrorKind::Validation,
                        format!("ratio numerator {numerator} outside [5, 50]"),
                    )
                }
            }
            None => invalid(ErrorKind::Parse, format!("not a ratio: {text}")),
        },
        FieldKind::Percentage => match numeric::parse_percentage(&text, DecimalPolicy::Reject) {
            Some(parsed) => Validation::Valid {
                value: FieldValue::Percentage(parsed.value),
                factor: STRICT_FACTOR,
            },
            None => invalid(ErrorKind::Parse, format!("not a percentage in [0, 100]: {text}")),
        },
    }
}

/// Raw candidate text for a selector match. Websites read `href` over text;
/// `tel:` links read the scheme-specific part.
fn candidate_text(spec: &FieldSpec, node: &crate::html::Node<'_>) -> String {
    match spec.kind {
        FieldKind::Website => node
            .attr("href")
            .map(str::to_string)
            .unwrap_or_else(|| node.text()),
        FieldKind::Telephone => match node.attr("href") {
            Some(href) if href.starts_with("tel:") => href.trim_start_matches("tel:").to_string(),
            _ => node.text(),
        },
        _ => node.text(),
    }
}

/// Extract one field by walking its selector list.
///
/// Returns the winning value (if any) plus every error accumulated on the way.
pub fn extract_field(doc: &Document, spec: &FieldSpec) -> (Option<Extracted>, Vec<ExtractionError>) {
    let mut errors = Vec::new();
    let mut any_match = false;

    for (index, selector) in spec.selectors.iter().enumerate() {
        let nodes = doc.select_all(selector);
        let Some(node) = nodes.first() else {
            continue;
        };
        any_match = true;

        let raw = candidate_text(spec, node);
        match validate(spec.kind, &raw) {
            Validation::Valid { value, factor } => {
                // Multiple matches with differing text means the selector was
                // ambiguous; keep the first but record it.
                let distinct: std::collections::HashSet<String> = nodes
                    .iter()
                    .map(|n| candidate_text(spec, n))
                    .collect();
                if distinct.len() > 1 {
                    errors.push(ExtractionError::new(
                        spec.name,
                        ErrorKind::Ambiguous,
                        ExtractionMethod::Selector,
                        format!(
                            "{} candidates matched '{selector}'; kept the first",
                            distinct.len()
                        ),
                    ));
                }

                let confidence = position_confidence(index, spec.selectors.len()) * factor;
                return (
                    Some(Extracted {
                        field: spec.name,
                        category: spec.category,
                        value,
                        confidence,
                    }),
                    errors,
                );
            }
            Validation::Invalid { kind, reason } => {
                errors.push(ExtractionError::new(
                    spec.name,
                    kind,
                    ExtractionMethod::Selector,
                    format!("'{selector}': {reason}"),
                ));
            }
        }
    }

    if !any_match {
        errors.push(ExtractionError::new(
            spec.name,
            ErrorKind::SelectorMiss,
            ExtractionMethod::Selector,
            "no selector matched",
        ));
    }

    (None, errors)
}

/// Extract every selector-driven field.
pub fn extract_all(doc: &Document) -> (Vec<Extracted>, Vec<ExtractionError>) {
    let mut extracted = Vec::new();
    let mut errors = Vec::new();

    for spec in FIELD_SPECS {
        let (value, mut field_errors) = extract_field(doc, spec);
        extracted.extend(value);
        errors.append(&mut field_errors);
    }

    (extracted, errors)
}

/// Collect ranking-context text as priority-annotated dispatcher fragments.
pub fn ranking_fragments(doc: &Document) -> Vec<Fragment> {
    RANKING_CONTEXT_SELECTORS
        .iter()
        .enumerate()
        .filter_map(|(priority, selector)| {
            let text = doc
                .select_all(selector)
                .iter()
                .map(|node| node.text())
                .collect::<Vec<_>>()
                .join(" ");
            let text = text.trim().to_string();
            (!text.is_empty()).then(|| Fragment::new(text, priority))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Document {
        Document::parse(html.as_bytes())
    }

    fn spec(name: &str) -> &'static FieldSpec {
        FIELD_SPECS.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn test_first_selector_wins_with_full_confidence() {
        let doc = doc(
            "<h1 data-testid=\"school-name\">Abbeville High School</h1>\
             <h1>Something Else Entirely</h1>",
        );
        let (value, errors) = extract_field(&doc, spec("name"));
        let value = value.unwrap();
        assert_eq!(value.value, FieldValue::Text("Abbeville High School".into()));
        assert_eq!(value.confidence, 95.0);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_last_selector_scores_seventy() {
        let doc = doc("<h1>Abbeville High School</h1>");
        let value = extract_field(&doc, spec("name")).0.unwrap();
        assert_eq!(value.confidence, 70.0);
    }

    #[test]
    fn test_selector_miss_recorded_when_nothing_matches() {
        let doc = doc("<p>bare page</p>");
        let (value, errors) = extract_field(&doc, spec("enrollment"));
        assert!(value.is_none());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::SelectorMiss);
    }

    #[test]
    fn test_invalid_value_falls_through_to_next_selector() {
        let doc = doc(
            "<div data-testid=\"enrollment\">N/A</div>\
             <div class=\"enrollment\"><span class=\"value\">1,482</span></div>",
        );
        let (value, errors) = extract_field(&doc, spec("enrollment"));
        let value = value.unwrap();
        assert_eq!(value.value, FieldValue::Integer(1482));
        assert_eq!(value.confidence, 85.0);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Parse);
    }

    #[test]
    fn test_blacklisted_name_is_rejected() {
        let doc = doc("<h1 data-testid=\"school-name\">Page Not Found</h1>");
        let (value, errors) = extract_field(&doc, spec("name"));
        assert!(value.is_none());
        assert!(errors.iter().any(|e| e.kind == ErrorKind::Validation));
    }

    #[test]
    fn test_postal_strict_and_loose() {
        assert!(matches!(
            validate(FieldKind::Postal, "29620"),
            Validation::Valid { factor, .. } if factor == STRICT_FACTOR
        ));
        assert!(matches!(
            validate(FieldKind::Postal, "29620-1234"),
            Validation::Valid { factor, .. } if factor == STRICT_FACTOR
        ));
        assert!(matches!(
            validate(FieldKind::Postal, "ZIP: 29620 (Abbeville)"),
            Validation::Valid { value: FieldValue::Text(v), factor } if v == "29620" && factor == LOOSE_FACTOR
        ));
        assert!(matches!(
            validate(FieldKind::Postal, "unknown"),
            Validation::Invalid { .. }
        ));
    }

    #[test]
    fn test_telephone_normalization() {
        assert!(matches!(
            validate(FieldKind::Telephone, "864.366.5076"),
            Validation::Valid { value: FieldValue::Text(v), .. } if v == "(864) 366-5076"
        ));
        assert!(matches!(
            validate(FieldKind::Telephone, "1-864-366-5076"),
            Validation::Valid { value: FieldValue::Text(v), factor } if v == "(864) 366-5076" && factor == LOOSE_FACTOR
        ));
        assert!(matches!(
            validate(FieldKind::Telephone, "366-5076"),
            Validation::Invalid { .. }
        ));
    }

    #[test]
    fn test_telephone_from_tel_href() {
        let doc = doc("<a href=\"tel:8643665076\">Call us</a>");
        let value = extract_field(&doc, spec("telephone")).0.unwrap();
        assert_eq!(value.value, FieldValue::Text("(864) 366-5076".into()));
    }

    #[test]
    fn test_website_scheme_repair() {
        assert!(matches!(
            validate(FieldKind::Website, "https://www.abbeville.k12.sc.us/ahs"),
            Validation::Valid { factor, .. } if factor == STRICT_FACTOR
        ));
        assert!(matches!(
            validate(FieldKind::Website, "www.abbeville.k12.sc.us"),
            Validation::Valid { value: FieldValue::Text(v), factor }
                if v.starts_with("https://www.abbeville") && factor == LOOSE_FACTOR
        ));
        assert!(matches!(
            validate(FieldKind::Website, "not a url"),
            Validation::Invalid { .. }
        ));
    }

    #[test]
    fn test_grades_strict_and_loose() {
        assert!(matches!(
            validate(FieldKind::Grades, "9-12"),
            Validation::Valid { factor, .. } if factor == STRICT_FACTOR
        ));
        assert!(matches!(
            validate(FieldKind::Grades, "K-12"),
            Validation::Valid { factor, .. } if factor == STRICT_FACTOR
        ));
        assert!(matches!(
            validate(FieldKind::Grades, "Grades 9 to 12"),
            Validation::Valid { factor, .. } if factor == LOOSE_FACTOR
        ));
        assert!(matches!(
            validate(FieldKind::Grades, "All grades"),
            Validation::Invalid { .. }
        ));
    }

    #[test]
    fn test_percentage_rejects_bare_fraction() {
        // The scaled-decimal path is opt-in and selector fields never opt in.
        assert!(matches!(
            validate(FieldKind::Percentage, "0.54"),
            Validation::Invalid { .. }
        ));
        assert!(matches!(
            validate(FieldKind::Percentage, "54%"),
            Validation::Valid { value: FieldValue::Percentage(v), .. } if v == 54.0
        ));
    }

    #[test]
    fn test_ratio_bounds() {
        assert!(matches!(
            validate(FieldKind::Ratio, "17:1"),
            Validation::Valid { value: FieldValue::Text(v), .. } if v == "17:1"
        ));
        assert!(matches!(
            validate(FieldKind::Ratio, "3:1"),
            Validation::Invalid { kind: ErrorKind::Validation, .. }
        ));
    }

    #[test]
    fn test_ambiguous_candidates_recorded() {
        let doc = doc(
            "<div class=\"enrollment\"><span class=\"value\">1,482</span></div>\
             <div class=\"enrollment\"><span class=\"value\">1,490</span></div>",
        );
        let (value, errors) = extract_field(&doc, spec("enrollment"));
        assert_eq!(value.unwrap().value, FieldValue::Integer(1482));
        assert!(errors.iter().any(|e| e.kind == ErrorKind::Ambiguous));
    }

    #[test]
    fn test_ranking_fragments_carry_selector_priority() {
        let doc = doc(
            "<span data-testid=\"rank-badge\">ranked #397</span>\
             <section id=\"rankings-section\">#13,427-17,901</section>",
        );
        let fragments = ranking_fragments(&doc);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].priority, 0);
        assert_eq!(fragments[0].text, "ranked #397");
        assert_eq!(fragments[1].priority, 2);
    }

    #[test]
    fn test_extract_all_covers_demographics() {
        let doc = doc(
            "<div data-testid=\"demo-white\">45%</div>\
             <div data-testid=\"demo-black\">30%</div>",
        );
        let (extracted, _) = extract_all(&doc);
        let fields: Vec<&str> = extracted.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"pct_white"));
        assert!(fields.contains(&"pct_black"));
    }
}
