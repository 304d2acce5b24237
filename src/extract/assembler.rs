//! Record assembly orchestration.
//!
//! Runs the component pipeline in its mandatory order: parse, structured-data
//! seed, unranked gate, ranking dispatch, selector sweep, confidence scoring.
//! Merging is conservative: a later contribution only replaces an earlier one
//! when its confidence is strictly higher and the value validates.

use std::collections::HashMap;

use crate::extract::confidence::{self, ConfidenceReport};
use crate::extract::observer::ExtractionObserver;
use crate::extract::ranking::{self, Fragment, RankingExtraction};
use crate::extract::selectors::{self, FieldValue};
use crate::extract::structured::{
    self, STRUCTURED_ADDRESS_CONFIDENCE, STRUCTURED_IDENTITY_CONFIDENCE,
};
use crate::extract::unranked;
use crate::html::Document;
use crate::model::{
    CaptureRecord, ErrorKind, ExtractionError, ExtractionMethod, ExtractionStatus, FieldCategory,
    SchoolRecord,
};

/// Fields counted toward the extracted/partial/failed status cut. Ranking
/// resolution (a rank or an unranked verdict) counts as the tenth.
const MANDATORY_FIELDS: &[&str] = &[
    "name",
    "grades",
    "locality",
    "region",
    "postal_code",
    "telephone",
    "enrollment",
    "student_teacher_ratio",
    "graduation_rate",
];

/// Share of mandatory fields required for `extracted` status.
const EXTRACTED_CUTOFF: f32 = 0.8;
/// Share of mandatory fields required for `partial` status.
const PARTIAL_CUTOFF: f32 = 0.3;

/// One assembled record plus the acceptance verdict that gates the
/// uniqueness ledger.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub record: SchoolRecord,
    pub accepted: bool,
}

/// Tracks the winning confidence per field so later contributions only
/// override strictly better ones.
struct MergeState {
    confidences: HashMap<&'static str, (FieldCategory, f32)>,
}

impl MergeState {
    fn new() -> Self {
        Self {
            confidences: HashMap::new(),
        }
    }

    /// True when `confidence` beats the current holder of `field`.
    fn wins(&self, field: &'static str, confidence: f32) -> bool {
        self.confidences
            .get(field)
            .is_none_or(|&(_, existing)| confidence > existing)
    }

    fn record(&mut self, field: &'static str, category: FieldCategory, confidence: f32) {
        self.confidences.insert(field, (category, confidence));
    }

    fn category_pairs(&self) -> Vec<(FieldCategory, f32)> {
        self.confidences.values().copied().collect()
    }
}

/// Extract one document into a record. Never fails: every outcome is a record
/// with a status and an error list.
pub fn extract_record(
    bytes: &[u8],
    capture: &CaptureRecord,
    observer: &dyn ExtractionObserver,
) -> ExtractionOutcome {
    let mut record = SchoolRecord::new(
        capture.slug.clone(),
        capture.source_year,
        capture.file.to_string_lossy(),
    );

    // Step 1: parse. A contentless document aborts with a single synthetic error.
    let doc = Document::parse(bytes);
    if doc.is_empty() {
        let error = ExtractionError::new(
            "document",
            ErrorKind::MissingElement,
            ExtractionMethod::Heuristic,
            "document parsed empty",
        );
        observer.field_error(&capture.slug, &error);
        record.errors.push(error);
        record.extraction_status = ExtractionStatus::Failed;
        observer.document_finished(&capture.slug, ExtractionStatus::Failed, 0.0);
        return ExtractionOutcome {
            record,
            accepted: false,
        };
    }

    record.extraction_status = ExtractionStatus::Extracting;
    let mut merge = MergeState::new();

    // Step 2: seed identity and location from structured data.
    let (profile, structured_errors) = structured::extract(&doc);
    for error in &structured_errors {
        observer.field_error(&capture.slug, error);
    }
    record.errors.extend(structured_errors);

    let description = profile.as_ref().and_then(|p| p.description.clone());
    if let Some(profile) = profile {
        let seeds: [(&'static str, Option<String>, FieldCategory, f32); 6] = [
            ("name", profile.name, FieldCategory::Identity, STRUCTURED_IDENTITY_CONFIDENCE),
            ("telephone", profile.telephone, FieldCategory::Location, STRUCTURED_IDENTITY_CONFIDENCE),
            ("street", profile.street, FieldCategory::Location, STRUCTURED_ADDRESS_CONFIDENCE),
            ("locality", profile.locality, FieldCategory::Location, STRUCTURED_ADDRESS_CONFIDENCE),
            ("region", profile.region, FieldCategory::Location, STRUCTURED_ADDRESS_CONFIDENCE),
            ("postal_code", profile.postal_code, FieldCategory::Location, STRUCTURED_ADDRESS_CONFIDENCE),
        ];
        for (field, value, category, confidence) in seeds {
            let Some(mut value) = value else { continue };
            if field == "telephone" {
                match selectors::normalize_telephone(&value) {
                    Some(normalized) => value = normalized,
                    None => {
                        let error = ExtractionError::new(
                            field,
                            ErrorKind::Validation,
                            ExtractionMethod::StructuredData,
                            format!("telephone not ten digits: {value}"),
                        );
                        observer.field_error(&capture.slug, &error);
                        record.errors.push(error);
                        continue;
                    }
                }
            }
            if apply_field(&mut record, field, &FieldValue::Text(value)) {
                merge.record(field, category, confidence);
                observer.field_extracted(
                    &capture.slug,
                    field,
                    ExtractionMethod::StructuredData,
                    confidence,
                );
            }
        }
    }

    // Step 3: unranked gate, before any rank extraction.
    let verdict = unranked::classify(&doc, &capture.slug, record.name.as_deref());
    if verdict.gates_ranking() {
        record.is_unranked = true;
        record.unranked_reason = verdict.reason.clone();
        merge.record("is_unranked", FieldCategory::Rankings, verdict.confidence);
        observer.field_extracted(
            &capture.slug,
            "is_unranked",
            ExtractionMethod::Heuristic,
            verdict.confidence,
        );
    } else {
        // Step 4: ranking dispatch over the body's ranking context, falling
        // back to the structured-data description when the body is silent.
        let fragments = selectors::ranking_fragments(&doc);
        if fragments.is_empty() {
            let error = ExtractionError::new(
                "national_rank",
                ErrorKind::MissingElement,
                ExtractionMethod::Selector,
                "no ranking-context selector matched",
            );
            observer.field_error(&capture.slug, &error);
            record.errors.push(error);
        }

        let mut extraction = ranking::dispatch(&fragments);
        let mut method = ExtractionMethod::Regex;
        if extraction.is_empty()
            && let Some(description) = description
        {
            extraction = ranking::dispatch(&[Fragment::new(description, 0)]);
            method = ExtractionMethod::StructuredData;
        }

        apply_ranking(&mut record, &mut merge, &extraction, method, &capture.slug, observer);
    }

    // Step 5: selector sweep over the remaining fields.
    let (extracted, selector_errors) = selectors::extract_all(&doc);
    for error in &selector_errors {
        observer.field_error(&capture.slug, error);
    }
    record.errors.extend(selector_errors);

    for item in extracted {
        if !merge.wins(item.field, item.confidence) {
            continue;
        }
        if apply_field(&mut record, item.field, &item.value) {
            merge.record(item.field, item.category, item.confidence);
            observer.field_extracted(
                &capture.slug,
                item.field,
                ExtractionMethod::Selector,
                item.confidence,
            );
        } else {
            let error = ExtractionError::new(
                item.field,
                ErrorKind::MethodFailure,
                ExtractionMethod::Selector,
                "typed value did not fit the record field",
            );
            observer.field_error(&capture.slug, &error);
            record.errors.push(error);
        }
    }

    // Step 6-7: score and tag status.
    let report = confidence::score(&record, &merge.category_pairs());
    finalize(&mut record, &report);
    observer.document_finished(&capture.slug, record.extraction_status, record.overall_confidence);

    ExtractionOutcome {
        record,
        accepted: report.accepted,
    }
}

/// Copy dispatcher output into the record, tracking rankings confidence.
fn apply_ranking(
    record: &mut SchoolRecord,
    merge: &mut MergeState,
    extraction: &RankingExtraction,
    method: ExtractionMethod,
    slug: &str,
    observer: &dyn ExtractionObserver,
) {
    if let Some(national) = &extraction.national {
        record.national_rank = Some(national.rank);
        record.national_rank_end = national.rank_end;
        record.national_rank_precision = Some(national.precision);
        merge.record("national_rank", FieldCategory::Rankings, national.confidence);
        observer.field_extracted(slug, "national_rank", method, national.confidence);
    }
    if let Some(state) = &extraction.state {
        record.state_rank = Some(state.rank);
        record.state_rank_precision = Some(state.precision);
        merge.record("state_rank", FieldCategory::Rankings, state.confidence);
        observer.field_extracted(slug, "state_rank", method, state.confidence);
    }
}

/// Write a typed value into its record slot. False on a type mismatch.
fn apply_field(record: &mut SchoolRecord, field: &str, value: &FieldValue) -> bool {
    match (field, value) {
        ("name", FieldValue::Text(v)) => record.name = Some(v.clone()),
        ("grades", FieldValue::Text(v)) => record.grades = Some(v.clone()),
        ("setting", FieldValue::Text(v)) => record.setting = Some(v.clone()),
        ("street", FieldValue::Text(v)) => record.street = Some(v.clone()),
        ("locality", FieldValue::Text(v)) => record.locality = Some(v.clone()),
        ("region", FieldValue::Text(v)) => record.region = Some(v.clone()),
        ("postal_code", FieldValue::Text(v)) => record.postal_code = Some(v.clone()),
        ("telephone", FieldValue::Text(v)) => record.telephone = Some(v.clone()),
        ("website", FieldValue::Text(v)) => record.website = Some(v.clone()),
        ("student_teacher_ratio", FieldValue::Text(v)) => {
            record.student_teacher_ratio = Some(v.clone())
        }
        ("enrollment", FieldValue::Integer(v)) => record.enrollment = Some(*v),
        ("full_time_teachers", FieldValue::Integer(v)) => record.full_time_teachers = Some(*v),
        ("ap_participation", FieldValue::Percentage(v)) => record.ap_participation = Some(*v),
        ("ap_pass_rate", FieldValue::Percentage(v)) => record.ap_pass_rate = Some(*v),
        ("math_proficiency", FieldValue::Percentage(v)) => record.math_proficiency = Some(*v),
        ("reading_proficiency", FieldValue::Percentage(v)) => {
            record.reading_proficiency = Some(*v)
        }
        ("science_proficiency", FieldValue::Percentage(v)) => {
            record.science_proficiency = Some(*v)
        }
        ("graduation_rate", FieldValue::Percentage(v)) => record.graduation_rate = Some(*v),
        ("college_readiness", FieldValue::Percentage(v)) => record.college_readiness = Some(*v),
        ("pct_white", FieldValue::Percentage(v)) => record.pct_white = Some(*v),
        ("pct_asian", FieldValue::Percentage(v)) => record.pct_asian = Some(*v),
        ("pct_hispanic", FieldValue::Percentage(v)) => record.pct_hispanic = Some(*v),
        ("pct_black", FieldValue::Percentage(v)) => record.pct_black = Some(*v),
        ("pct_american_indian", FieldValue::Percentage(v)) => {
            record.pct_american_indian = Some(*v)
        }
        ("pct_two_or_more", FieldValue::Percentage(v)) => record.pct_two_or_more = Some(*v),
        ("pct_female", FieldValue::Percentage(v)) => record.pct_female = Some(*v),
        ("pct_male", FieldValue::Percentage(v)) => record.pct_male = Some(*v),
        ("pct_economically_disadvantaged", FieldValue::Percentage(v)) => {
            record.pct_economically_disadvantaged = Some(*v)
        }
        _ => return false,
    }
    true
}

/// Fill provenance fields and derive the status from mandatory-field coverage.
fn finalize(record: &mut SchoolRecord, report: &ConfidenceReport) {
    record.overall_confidence = report.overall;
    record.category_confidences = report.categories;

    let mut populated = MANDATORY_FIELDS
        .iter()
        .filter(|&&field| mandatory_field_present(record, field))
        .count();
    // Ranking resolution counts as one mandatory field, and is a hard
    // requirement for `extracted`: a record with neither ranks nor an
    // unranked verdict is at best partial.
    let ranking_resolved =
        record.is_unranked || record.national_rank.is_some() || record.state_rank.is_some();
    if ranking_resolved {
        populated += 1;
    }
    let total = MANDATORY_FIELDS.len() + 1;
    let share = populated as f32 / total as f32;

    record.extraction_status = if share >= EXTRACTED_CUTOFF && ranking_resolved {
        ExtractionStatus::Extracted
    } else if share >= PARTIAL_CUTOFF {
        ExtractionStatus::Partial
    } else {
        ExtractionStatus::Failed
    };
}

fn mandatory_field_present(record: &SchoolRecord, field: &str) -> bool {
    match field {
        "name" => record.name.is_some(),
        "grades" => record.grades.is_some(),
        "locality" => record.locality.is_some(),
        "region" => record.region.is_some(),
        "postal_code" => record.postal_code.is_some(),
        "telephone" => record.telephone.is_some(),
        "enrollment" => record.enrollment.is_some(),
        "student_teacher_ratio" => record.student_teacher_ratio.is_some(),
        "graduation_rate" => record.graduation_rate.is_some(),
        _ => false,
    }
}
