//! Output record types, error taxonomy, and the capture-metadata input contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Highest national rank that is published exactly (bucket 1).
pub const EXACT_RANK_MAX: u32 = 13426;
/// Lower bound of the wide-band estimate range (bucket 2).
pub const RANGE_RANK_MIN: u32 = 13427;
/// Upper bound of the wide-band estimate range (bucket 2).
pub const RANGE_RANK_MAX: u32 = 17901;
/// No national rank above this is ever accepted.
pub const NATIONAL_RANK_MAX: u32 = 50000;
/// No state rank above this is ever accepted.
pub const STATE_RANK_MAX: u32 = 10000;

/// How a rank value should be compared by downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankPrecision {
    /// Published exactly; unique per year within bucket 1.
    Exact,
    /// Published only as a wide band; `national_rank_end` carries the band end.
    Range,
    /// Derived or below-cutoff; not comparable to exact ranks.
    Estimated,
    /// Only a state rank was published.
    StateOnly,
}

impl RankPrecision {
    pub fn as_str(self) -> &'static str {
        match self {
            RankPrecision::Exact => "exact",
            RankPrecision::Range => "range",
            RankPrecision::Estimated => "estimated",
            RankPrecision::StateOnly => "state_only",
        }
    }
}

/// Lifecycle status of a single record extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Pending,
    Extracting,
    Extracted,
    Partial,
    Failed,
}

impl ExtractionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionStatus::Pending => "pending",
            ExtractionStatus::Extracting => "extracting",
            ExtractionStatus::Extracted => "extracted",
            ExtractionStatus::Partial => "partial",
            ExtractionStatus::Failed => "failed",
        }
    }
}

/// What went wrong for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No selector in the field's list matched.
    SelectorMiss,
    /// A matched string failed numeric/format parsing.
    Parse,
    /// A parsed value violated a field invariant.
    Validation,
    /// Multiple candidates validated; tie-break policy chose one.
    Ambiguous,
    /// A structural precondition was absent (e.g. no ranking section).
    MissingElement,
    /// A component raised an unexpected internal failure.
    MethodFailure,
}

/// Which extraction tier produced (or failed to produce) a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    StructuredData,
    Selector,
    Regex,
    Heuristic,
}

/// A single per-field failure, accumulated during one record extraction.
///
/// Failures are local: they leave the field null and never abort the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionError {
    pub field_name: String,
    pub kind: ErrorKind,
    pub message: String,
    pub method: ExtractionMethod,
    pub timestamp: DateTime<Utc>,
}

impl ExtractionError {
    pub fn new(
        field_name: impl Into<String>,
        kind: ErrorKind,
        method: ExtractionMethod,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            kind,
            message: message.into(),
            method,
            timestamp: Utc::now(),
        }
    }
}

/// Semantic grouping of record fields, used for confidence rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Identity,
    Location,
    Capacity,
    Rankings,
    Performance,
    Demographics,
}

impl FieldCategory {
    pub const ALL: [FieldCategory; 6] = [
        FieldCategory::Identity,
        FieldCategory::Location,
        FieldCategory::Capacity,
        FieldCategory::Rankings,
        FieldCategory::Performance,
        FieldCategory::Demographics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldCategory::Identity => "identity",
            FieldCategory::Location => "location",
            FieldCategory::Capacity => "capacity",
            FieldCategory::Rankings => "rankings",
            FieldCategory::Performance => "performance",
            FieldCategory::Demographics => "demographics",
        }
    }
}

/// Per-category confidence rollup, 0-100 each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfidences {
    pub identity: f32,
    pub location: f32,
    pub capacity: f32,
    pub rankings: f32,
    pub performance: f32,
    pub demographics: f32,
}

impl CategoryConfidences {
    pub fn get(&self, category: FieldCategory) -> f32 {
        match category {
            FieldCategory::Identity => self.identity,
            FieldCategory::Location => self.location,
            FieldCategory::Capacity => self.capacity,
            FieldCategory::Rankings => self.rankings,
            FieldCategory::Performance => self.performance,
            FieldCategory::Demographics => self.demographics,
        }
    }

    pub fn set(&mut self, category: FieldCategory, value: f32) {
        match category {
            FieldCategory::Identity => self.identity = value,
            FieldCategory::Location => self.location = value,
            FieldCategory::Capacity => self.capacity = value,
            FieldCategory::Rankings => self.rankings = value,
            FieldCategory::Performance => self.performance = value,
            FieldCategory::Demographics => self.demographics = value,
        }
    }
}

/// A fully assembled school-profile record.
///
/// Every non-identity field is optional; absence means the field could not be
/// extracted with enough confidence, with the reason recorded in `errors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolRecord {
    // Identity attributes
    pub slug: String,
    pub source_year: u16,
    pub source_document: String,

    // Identity & location
    pub name: Option<String>,
    pub grades: Option<String>,
    pub street: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub telephone: Option<String>,
    pub website: Option<String>,
    pub setting: Option<String>,

    // Capacity
    pub enrollment: Option<u32>,
    pub student_teacher_ratio: Option<String>,
    pub full_time_teachers: Option<u32>,

    // Rankings
    pub national_rank: Option<u32>,
    pub national_rank_end: Option<u32>,
    pub national_rank_precision: Option<RankPrecision>,
    pub state_rank: Option<u32>,
    pub state_rank_precision: Option<RankPrecision>,
    pub is_unranked: bool,
    pub unranked_reason: Option<String>,

    // Performance
    pub ap_participation: Option<f32>,
    pub ap_pass_rate: Option<f32>,
    pub math_proficiency: Option<f32>,
    pub reading_proficiency: Option<f32>,
    pub science_proficiency: Option<f32>,
    pub graduation_rate: Option<f32>,
    pub college_readiness: Option<f32>,

    // Demographics
    pub pct_white: Option<f32>,
    pub pct_asian: Option<f32>,
    pub pct_hispanic: Option<f32>,
    pub pct_black: Option<f32>,
    pub pct_american_indian: Option<f32>,
    pub pct_two_or_more: Option<f32>,
    pub pct_female: Option<f32>,
    pub pct_male: Option<f32>,
    pub pct_economically_disadvantaged: Option<f32>,

    // Provenance
    pub extraction_status: ExtractionStatus,
    pub overall_confidence: f32,
    pub category_confidences: CategoryConfidences,
    pub errors: Vec<ExtractionError>,
}

impl SchoolRecord {
    /// A blank record carrying only identity attributes, status `pending`.
    pub fn new(slug: impl Into<String>, source_year: u16, source_document: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            source_year,
            source_document: source_document.into(),
            name: None,
            grades: None,
            street: None,
            locality: None,
            region: None,
            postal_code: None,
            telephone: None,
            website: None,
            setting: None,
            enrollment: None,
            student_teacher_ratio: None,
            full_time_teachers: None,
            national_rank: None,
            national_rank_end: None,
            national_rank_precision: None,
            state_rank: None,
            state_rank_precision: None,
            is_unranked: false,
            unranked_reason: None,
            ap_participation: None,
            ap_pass_rate: None,
            math_proficiency: None,
            reading_proficiency: None,
            science_proficiency: None,
            graduation_rate: None,
            college_readiness: None,
            pct_white: None,
            pct_asian: None,
            pct_hispanic: None,
            pct_black: None,
            pct_american_indian: None,
            pct_two_or_more: None,
            pct_female: None,
            pct_male: None,
            pct_economically_disadvantaged: None,
            extraction_status: ExtractionStatus::Pending,
            overall_confidence: 0.0,
            category_confidences: CategoryConfidences::default(),
            errors: Vec::new(),
        }
    }

    /// All percentage fields, paired with their names for invariant reporting.
    pub fn percentage_fields(&self) -> [(&'static str, Option<f32>); 16] {
        [
            ("ap_participation", self.ap_participation),
            ("ap_pass_rate", self.ap_pass_rate),
            ("math_proficiency", self.math_proficiency),
            ("reading_proficiency", self.reading_proficiency),
            ("science_proficiency", self.science_proficiency),
            ("graduation_rate", self.graduation_rate),
            ("college_readiness", self.college_readiness),
            ("pct_white", self.pct_white),
            ("pct_asian", self.pct_asian),
            ("pct_hispanic", self.pct_hispanic),
            ("pct_black", self.pct_black),
            ("pct_american_indian", self.pct_american_indian),
            ("pct_two_or_more", self.pct_two_or_more),
            ("pct_female", self.pct_female),
            ("pct_male", self.pct_male),
            (
                "pct_economically_disadvantaged",
                self.pct_economically_disadvantaged,
            ),
        ]
    }

    /// Race percentage fields that participate in the sum-to-100 check.
    pub fn race_percentages(&self) -> [Option<f32>; 6] {
        [
            self.pct_white,
            self.pct_asian,
            self.pct_hispanic,
            self.pct_black,
            self.pct_american_indian,
            self.pct_two_or_more,
        ]
    }

    /// Check the universal record invariants, returning a description per
    /// violation.
    ///
    /// An empty vec means the record is structurally consistent. Used by tests
    /// and by the batch runner's debug assertions; violations found here point
    /// at an assembler bug, not bad input.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for (name, value) in self.percentage_fields() {
            if let Some(v) = value
                && !(0.0..=100.0).contains(&v)
            {
                violations.push(format!("{name} = {v} outside [0, 100]"));
            }
        }

        if let Some(rank) = self.national_rank {
            if !(1..=NATIONAL_RANK_MAX).contains(&rank) {
                violations.push(format!("national_rank = {rank} outside [1, {NATIONAL_RANK_MAX}]"));
            }
            match self.national_rank_precision {
                Some(RankPrecision::Exact) if rank > EXACT_RANK_MAX => {
                    violations.push(format!("exact national_rank = {rank} above {EXACT_RANK_MAX}"));
                }
                Some(RankPrecision::Range) => {
                    let end = self.national_rank_end.unwrap_or(0);
                    if rank < RANGE_RANK_MIN || end > RANGE_RANK_MAX || end < rank {
                        violations.push(format!(
                            "range national_rank [{rank}, {end}] outside [{RANGE_RANK_MIN}, {RANGE_RANK_MAX}]"
                        ));
                    }
                }
                _ => {}
            }
        }

        if self.national_rank_precision != Some(RankPrecision::Range)
            && self.national_rank_end.is_some()
        {
            violations.push("national_rank_end set without range precision".to_string());
        }

        if let Some(rank) = self.state_rank
            && !(1..=STATE_RANK_MAX).contains(&rank)
        {
            violations.push(format!("state_rank = {rank} outside [1, {STATE_RANK_MAX}]"));
        }

        if self.is_unranked && (self.national_rank.is_some() || self.state_rank.is_some()) {
            violations.push("unranked record carries a rank".to_string());
        }

        // Exactly one of: unranked, at least one rank, or rankless non-extracted.
        let has_rank = self.national_rank.is_some() || self.state_rank.is_some();
        if !self.is_unranked
            && !has_rank
            && self.extraction_status == ExtractionStatus::Extracted
        {
            violations.push("extracted record has neither ranks nor an unranked verdict".to_string());
        }

        // Group-sum and capacity-ratio consistency are scored, not enforced:
        // the confidence scorer penalizes them, and a penalized record is
        // still a valid output.

        if !(0.0..=100.0).contains(&self.overall_confidence) {
            violations.push(format!(
                "overall_confidence = {} outside [0, 100]",
                self.overall_confidence
            ));
        }
        for category in FieldCategory::ALL {
            let value = self.category_confidences.get(category);
            if !(0.0..=100.0).contains(&value) {
                violations.push(format!("{} confidence = {value} outside [0, 100]", category.as_str()));
            }
        }

        violations
    }
}

/// Sum of a percentage group, or `None` unless every member is present.
pub fn sum_if_all_present(values: &[Option<f32>]) -> Option<f32> {
    values.iter().copied().sum::<Option<f32>>()
}

/// Capture metadata for one scraped document. The engine reads bytes by
/// reference through `file`; it never fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub slug: String,
    pub source_year: u16,
    pub file: PathBuf,
    pub captured_at: DateTime<Utc>,
    pub byte_len: u64,
    pub content_hash: String,
}
