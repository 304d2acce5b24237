//! Confidence rollups and the acceptance decision.
//!
//! Per-category confidence is the max of the contributing field confidences
//! (a category is as good as its best-extracted member). Overall confidence
//! is the weighted mean of the non-zero categories, re-normalized over the
//! categories actually present, then nudged by cross-field sanity checks.

use crate::model::{CategoryConfidences, FieldCategory, SchoolRecord, sum_if_all_present};

const WEIGHT_IDENTITY: f32 = 0.25;
const WEIGHT_RANKINGS: f32 = 0.20;
const WEIGHT_PERFORMANCE: f32 = 0.20;
const WEIGHT_DEMOGRAPHICS: f32 = 0.15;
const WEIGHT_LOCATION: f32 = 0.10;
const WEIGHT_CAPACITY: f32 = 0.10;

/// Minimum overall confidence for acceptance.
const MIN_OVERALL: f32 = 60.0;
/// Minimum identity confidence for acceptance.
const MIN_IDENTITY: f32 = 40.0;
/// At least one non-identity category must reach this.
const MIN_SECONDARY: f32 = 50.0;

fn weight(category: FieldCategory) -> f32 {
    match category {
        FieldCategory::Identity => WEIGHT_IDENTITY,
        FieldCategory::Rankings => WEIGHT_RANKINGS,
        FieldCategory::Performance => WEIGHT_PERFORMANCE,
        FieldCategory::Demographics => WEIGHT_DEMOGRAPHICS,
        FieldCategory::Location => WEIGHT_LOCATION,
        FieldCategory::Capacity => WEIGHT_CAPACITY,
    }
}

/// Scorer output: adjusted categories, the weighted overall, and whether the
/// record clears the acceptance bar.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceReport {
    pub overall: f32,
    pub categories: CategoryConfidences,
    pub accepted: bool,
}

/// Roll field confidences up into categories, apply cross-field sanity
/// adjustments, and compute the weighted overall.
pub fn score(record: &SchoolRecord, field_confidences: &[(FieldCategory, f32)]) -> ConfidenceReport {
    let mut categories = CategoryConfidences::default();
    for &(category, confidence) in field_confidences {
        if confidence > categories.get(category) {
            categories.set(category, confidence);
        }
    }

    apply_sanity_adjustments(record, &mut categories);

    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for category in FieldCategory::ALL {
        let value = categories.get(category);
        if value > 0.0 {
            weighted_sum += weight(category) * value;
            weight_sum += weight(category);
        }
    }
    let overall = if weight_sum > 0.0 {
        (weighted_sum / weight_sum).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let secondary_ok = FieldCategory::ALL
        .iter()
        .filter(|&&c| c != FieldCategory::Identity)
        .any(|&c| categories.get(c) >= MIN_SECONDARY);
    let accepted =
        overall >= MIN_OVERALL && categories.identity >= MIN_IDENTITY && secondary_ok;

    ConfidenceReport {
        overall,
        categories,
        accepted,
    }
}

/// Cross-field sanity adjustments, clamped into [0, 100] per category.
fn apply_sanity_adjustments(record: &SchoolRecord, categories: &mut CategoryConfidences) {
    let bump = |categories: &mut CategoryConfidences, category: FieldCategory, delta: f32| {
        let adjusted = (categories.get(category) + delta).clamp(0.0, 100.0);
        categories.set(category, adjusted);
    };

    if let Some(race_sum) = sum_if_all_present(&record.race_percentages()) {
        if (95.0..=105.0).contains(&race_sum) {
            bump(categories, FieldCategory::Demographics, 10.0);
        } else if !(80.0..=110.0).contains(&race_sum) {
            bump(categories, FieldCategory::Demographics, -15.0);
        }
    }

    if let (Some(female), Some(male)) = (record.pct_female, record.pct_male) {
        let gender_sum = female + male;
        if (95.0..=105.0).contains(&gender_sum) {
            bump(categories, FieldCategory::Demographics, 5.0);
        } else {
            bump(categories, FieldCategory::Demographics, -10.0);
        }
    }

    if let (Some(national), Some(state)) = (record.national_rank, record.state_rank) {
        if national > state {
            bump(categories, FieldCategory::Rankings, 5.0);
        } else {
            bump(categories, FieldCategory::Rankings, -10.0);
        }
    }

    if let (Some(enrollment), Some(teachers)) = (record.enrollment, record.full_time_teachers)
        && teachers > 0
    {
        let ratio = enrollment as f32 / teachers as f32;
        if (8.0..=35.0).contains(&ratio) {
            bump(categories, FieldCategory::Capacity, 5.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SchoolRecord {
        SchoolRecord::new("test-high", 2024, "test-high-2024.html")
    }

    #[test]
    fn test_category_takes_max_of_members() {
        let report = score(
            &record(),
            &[
                (FieldCategory::Identity, 70.0),
                (FieldCategory::Identity, 95.0),
                (FieldCategory::Identity, 85.0),
            ],
        );
        assert_eq!(report.categories.identity, 95.0);
    }

    #[test]
    fn test_overall_renormalizes_over_present_categories() {
        // Only identity and rankings present: weights 0.25 and 0.20.
        let report = score(
            &record(),
            &[
                (FieldCategory::Identity, 90.0),
                (FieldCategory::Rankings, 45.0),
            ],
        );
        let expected = (0.25 * 90.0 + 0.20 * 45.0) / 0.45;
        assert!((report.overall - expected).abs() < 0.01);
    }

    #[test]
    fn test_empty_input_scores_zero() {
        let report = score(&record(), &[]);
        assert_eq!(report.overall, 0.0);
        assert!(!report.accepted);
    }

    #[test]
    fn test_race_sum_bonus_and_penalty() {
        let mut good = record();
        good.pct_white = Some(45.0);
        good.pct_asian = Some(5.0);
        good.pct_hispanic = Some(20.0);
        good.pct_black = Some(25.0);
        good.pct_american_indian = Some(1.0);
        good.pct_two_or_more = Some(4.0);
        let report = score(&good, &[(FieldCategory::Demographics, 80.0)]);
        assert_eq!(report.categories.demographics, 90.0);

        let mut bad = good.clone();
        bad.pct_white = Some(5.0); // sum drops to 60
        let report = score(&bad, &[(FieldCategory::Demographics, 80.0)]);
        assert_eq!(report.categories.demographics, 65.0);
    }

    #[test]
    fn test_race_sum_dead_zone_leaves_confidence_alone() {
        let mut record = record();
        record.pct_white = Some(50.0);
        record.pct_asian = Some(5.0);
        record.pct_hispanic = Some(20.0);
        record.pct_black = Some(30.0);
        record.pct_american_indian = Some(1.0);
        record.pct_two_or_more = Some(2.0);
        // Sum = 108: neither bonus nor penalty.
        let report = score(&record, &[(FieldCategory::Demographics, 80.0)]);
        assert_eq!(report.categories.demographics, 80.0);
    }

    #[test]
    fn test_gender_sum_adjustments() {
        let mut record = record();
        record.pct_female = Some(51.0);
        record.pct_male = Some(49.0);
        let report = score(&record, &[(FieldCategory::Demographics, 80.0)]);
        assert_eq!(report.categories.demographics, 85.0);

        record.pct_male = Some(20.0);
        let report = score(&record, &[(FieldCategory::Demographics, 80.0)]);
        assert_eq!(report.categories.demographics, 70.0);
    }

    #[test]
    fn test_rank_ordering_adjustment() {
        let mut record = record();
        record.national_rank = Some(1102);
        record.state_rank = Some(10);
        let report = score(&record, &[(FieldCategory::Rankings, 90.0)]);
        assert_eq!(report.categories.rankings, 95.0);

        record.national_rank = Some(5);
        let report = score(&record, &[(FieldCategory::Rankings, 90.0)]);
        assert_eq!(report.categories.rankings, 80.0);
    }

    #[test]
    fn test_capacity_ratio_bonus() {
        let mut record = record();
        record.enrollment = Some(1200);
        record.full_time_teachers = Some(60);
        let report = score(&record, &[(FieldCategory::Capacity, 80.0)]);
        assert_eq!(report.categories.capacity, 85.0);
    }

    #[test]
    fn test_acceptance_threshold() {
        let accepted = score(
            &record(),
            &[
                (FieldCategory::Identity, 95.0),
                (FieldCategory::Rankings, 95.0),
                (FieldCategory::Performance, 85.0),
            ],
        );
        assert!(accepted.accepted);

        // Identity too weak.
        let rejected = score(
            &record(),
            &[
                (FieldCategory::Identity, 35.0),
                (FieldCategory::Rankings, 95.0),
                (FieldCategory::Performance, 95.0),
            ],
        );
        assert!(!rejected.accepted);

        // No secondary category above 50.
        let rejected = score(
            &record(),
            &[
                (FieldCategory::Identity, 95.0),
                (FieldCategory::Rankings, 45.0),
            ],
        );
        assert!(!rejected.accepted);
    }

    #[test]
    fn test_confidences_stay_in_range() {
        let mut record = record();
        record.pct_female = Some(50.0);
        record.pct_male = Some(50.0);
        let report = score(&record, &[(FieldCategory::Demographics, 98.0)]);
        assert!(report.categories.demographics <= 100.0);
        assert!(report.overall <= 100.0);
    }
}
