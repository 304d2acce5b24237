//! Free-form numeric parsing with strict range checks.
//!
//! Every parser returns `Option<Parsed<T>>`; a parse failure is `None`, never
//! an error, and a success carries the base confidence for its shape. Lower
//! base confidences signal that downstream validation is obligatory.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::NATIONAL_RANK_MAX;

/// Base confidence for values recovered from loose text (ratios, ranks in prose).
pub const TEXT_BASE_CONFIDENCE: f32 = 85.0;
/// Base confidence for clean integer parses.
pub const INTEGER_BASE_CONFIDENCE: f32 = 90.0;
/// Base confidence for an in-range percentage.
pub const PERCENT_BASE_CONFIDENCE: f32 = 95.0;
/// Base confidence for a decimal fraction scaled into percent space.
pub const SCALED_DECIMAL_CONFIDENCE: f32 = 80.0;

/// Integers longer than this are never school-profile values.
const MAX_INTEGER_DIGITS: usize = 6;

/// A parsed value plus the confidence of the parse, 0-100.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub confidence: f32,
}

impl<T> Parsed<T> {
    pub fn new(value: T, confidence: f32) -> Self {
        Self { value, confidence }
    }
}

/// Whether a bare decimal fraction in [0, 1] may be scaled into percent space.
///
/// Scaling is opt-in per call site; selector-extracted percentage fields
/// reject fractions so that a stray "0.54" cannot silently become 54%.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalPolicy {
    Reject,
    Scale,
}

static RANK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:ranked|rank)?\s*#?\s*(\d{1,2},\d{3}|\d{1,5})$").unwrap()
});

static RATIO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\s*(?::|to)\s*1$").unwrap());

/// Parse a non-negative integer, tolerating thousands separators and
/// currency/percent glyphs. Rejects negatives and implausibly large values.
pub fn parse_integer(text: &str) -> Option<Parsed<u32>> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() || cleaned.starts_with('-') {
        return None;
    }
    if cleaned.len() > MAX_INTEGER_DIGITS {
        return None;
    }

    cleaned
        .parse::<u32>()
        .ok()
        .map(|value| Parsed::new(value, INTEGER_BASE_CONFIDENCE))
}

/// Parse a percentage into [0, 100].
///
/// A trailing `%` is stripped. A bare decimal fraction in [0, 1] is only
/// accepted under [`DecimalPolicy::Scale`], at reduced confidence.
pub fn parse_percentage(text: &str, policy: DecimalPolicy) -> Option<Parsed<f32>> {
    let trimmed = text.trim();
    let (body, had_percent_sign) = match trimmed.strip_suffix('%') {
        Some(stripped) => (stripped.trim_end(), true),
        None => (trimmed, false),
    };

    let value: f32 = body.replace(',', "").parse().ok()?;
    if value < 0.0 {
        return None;
    }

    // Fraction path: "0.54" with no percent sign reads as 54% only when the
    // caller opted in.
    if !had_percent_sign && body.contains('.') && value <= 1.0 {
        return match policy {
            DecimalPolicy::Scale => Some(Parsed::new(value * 100.0, SCALED_DECIMAL_CONFIDENCE)),
            DecimalPolicy::Reject => None,
        };
    }

    (value <= 100.0).then(|| Parsed::new(value, PERCENT_BASE_CONFIDENCE))
}

/// Parse a rank in [1, 50000] from shapes like `#397`, `rank 397`, `1,102`.
pub fn parse_rank(text: &str) -> Option<Parsed<u32>> {
    let captures = RANK_RE.captures(text.trim())?;
    let digits = captures[1].replace(',', "");
    let value: u32 = digits.parse().ok()?;
    (1..=NATIONAL_RANK_MAX)
        .contains(&value)
        .then(|| Parsed::new(value, INTEGER_BASE_CONFIDENCE))
}

/// Parse a student-teacher ratio, canonicalized to `N:1` with N in [1, 50].
pub fn parse_ratio(text: &str) -> Option<Parsed<String>> {
    let captures = RATIO_RE.captures(text.trim())?;
    let numerator: u32 = captures[1].parse().ok()?;
    (1..=50)
        .contains(&numerator)
        .then(|| Parsed::new(format!("{numerator}:1"), TEXT_BASE_CONFIDENCE))
}
