//! Per-year ranking uniqueness enforcement.
//!
//! The ledger is the pipeline's only shared mutable structure: a per-year map
//! from national rank to the cohort of record slugs holding it. All mutation
//! goes through `admit`, behind one coarse lock; batch workers call it
//! serially as records are accepted. Ranks are never compared across years
//! except for the global-frequency alert.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;

use crate::model::{RankPrecision, SchoolRecord};

/// Confidence penalty for a bucket-1 collision.
const BUCKET_ONE_PENALTY: f32 = 50.0;
/// Confidence penalty for breaking the per-rank cluster bound.
const CLUSTER_PENALTY: f32 = 40.0;
/// Confidence penalty for a same-state state-rank duplicate.
const STATE_DUPLICATE_PENALTY: f32 = 30.0;

/// Most records one national rank value may host within a year (any precision).
const MAX_CLUSTER: usize = 10;
/// Width of the soft clustering window.
const WINDOW_WIDTH: u32 = 40;
/// A window may hold at most this many "hot" ranks.
const WINDOW_MAX_HOT_RANKS: usize = 2;
/// A rank is "hot" once its cohort reaches this size.
const WINDOW_HOT_COHORT: usize = 5;
/// Cross-year appearances of a single rank value that signal a systemic
/// extractor error.
const GLOBAL_FREQUENCY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    BucketOneCollision,
    ClusterBound,
    WindowClustering,
    GlobalFrequency,
    StateDuplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    /// The offending field was nulled.
    Fatal,
    /// Logged only; data unchanged.
    Warning,
    /// Systemic extractor problem; investigate the pipeline, not the record.
    Alert,
}

/// A structured conflict report.
#[derive(Debug, Clone, Serialize)]
pub struct RankingConflict {
    pub rank: u32,
    pub year: u16,
    pub offender: String,
    pub existing_cohort: Vec<String>,
    pub kind: ConflictKind,
    pub severity: ConflictSeverity,
}

#[derive(Debug, Default)]
struct RankCohort {
    members: Vec<String>,
    /// Subset of members holding the rank at exact precision.
    exact: Vec<String>,
}

#[derive(Debug, Default)]
struct LedgerState {
    /// year -> national rank -> cohort.
    national: HashMap<u16, HashMap<u32, RankCohort>>,
    /// (year, region, state rank) -> slugs.
    state: HashMap<(u16, String, u32), Vec<String>>,
    /// national rank -> appearances across every year.
    global: HashMap<u32, usize>,
}

/// Shared per-year rank ledger with single-writer discipline.
#[derive(Debug, Default)]
pub struct RankingLedger {
    state: Mutex<LedgerState>,
}

impl RankingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit an accepted record, enforcing the per-year invariants.
    ///
    /// Strict violations null the offending rank on the record (the
    /// first-written holder is always retained) and reduce its overall
    /// confidence by the published penalty. Soft violations only report.
    pub fn admit(&self, record: &mut SchoolRecord) -> Vec<RankingConflict> {
        let mut conflicts = Vec::new();
        let mut state = self.state.lock().expect("ranking ledger lock poisoned");

        if let Some(rank) = record.national_rank {
            self.admit_national(&mut state, record, rank, &mut conflicts);
        }

        if let (Some(state_rank), Some(region)) = (record.state_rank, record.region.clone()) {
            let key = (record.source_year, region, state_rank);
            let cohort = state.state.entry(key).or_default();
            if !cohort.is_empty() {
                let conflict = RankingConflict {
                    rank: state_rank,
                    year: record.source_year,
                    offender: record.slug.clone(),
                    existing_cohort: cohort.clone(),
                    kind: ConflictKind::StateDuplicate,
                    severity: ConflictSeverity::Warning,
                };
                warn!(
                    rank = state_rank,
                    year = record.source_year,
                    offender = record.slug.as_str(),
                    "state rank already held in this state and year"
                );
                record.overall_confidence =
                    (record.overall_confidence - STATE_DUPLICATE_PENALTY).max(0.0);
                conflicts.push(conflict);
            }
            cohort.push(record.slug.clone());
        }

        conflicts
    }

    fn admit_national(
        &self,
        state: &mut LedgerState,
        record: &mut SchoolRecord,
        rank: u32,
        conflicts: &mut Vec<RankingConflict>,
    ) {
        let year = record.source_year;
        let year_map = state.national.entry(year).or_default();
        let cohort = year_map.entry(rank).or_default();
        let is_exact = record.national_rank_precision == Some(RankPrecision::Exact);

        // Bucket-1 uniqueness: an exact rank may have exactly one holder per
        // year. The first-written record is retained; duplicates are nulled.
        if is_exact && !cohort.exact.is_empty() {
            let conflict = RankingConflict {
                rank,
                year,
                offender: record.slug.clone(),
                existing_cohort: cohort.exact.clone(),
                kind: ConflictKind::BucketOneCollision,
                severity: ConflictSeverity::Fatal,
            };
            warn!(
                rank,
                year,
                offender = record.slug.as_str(),
                holder = cohort.exact[0].as_str(),
                "bucket-1 rank collision, nulling duplicate"
            );
            null_national_rank(record);
            record.overall_confidence =
                (record.overall_confidence - BUCKET_ONE_PENALTY).max(0.0);
            conflicts.push(conflict);
            return;
        }

        // Cluster bound: no rank value hosts more than MAX_CLUSTER records.
        if cohort.members.len() >= MAX_CLUSTER {
            let conflict = RankingConflict {
                rank,
                year,
                offender: record.slug.clone(),
                existing_cohort: cohort.members.clone(),
                kind: ConflictKind::ClusterBound,
                severity: ConflictSeverity::Fatal,
            };
            warn!(
                rank,
                year,
                offender = record.slug.as_str(),
                cohort_size = cohort.members.len(),
                "rank cluster bound exceeded, nulling duplicate"
            );
            null_national_rank(record);
            record.overall_confidence = (record.overall_confidence - CLUSTER_PENALTY).max(0.0);
            conflicts.push(conflict);
            return;
        }

        cohort.members.push(record.slug.clone());
        if is_exact {
            cohort.exact.push(record.slug.clone());
        }

        // Global frequency: the only cross-year aggregation.
        let global = state.global.entry(rank).or_insert(0);
        *global += 1;
        if *global > GLOBAL_FREQUENCY_LIMIT {
            let conflict = RankingConflict {
                rank,
                year,
                offender: record.slug.clone(),
                existing_cohort: Vec::new(),
                kind: ConflictKind::GlobalFrequency,
                severity: ConflictSeverity::Alert,
            };
            warn!(
                rank,
                appearances = *global,
                "rank value recurs across years beyond the systemic threshold"
            );
            conflicts.push(conflict);
        }

        // Window clustering (soft): in any 40-wide window, at most two ranks
        // may each host five or more records.
        let year_map = state
            .national
            .get(&year)
            .expect("year map inserted above");
        let window_start_low = rank.saturating_sub(WINDOW_WIDTH - 1);
        for window_start in window_start_low..=rank {
            let window_end = window_start + WINDOW_WIDTH - 1;
            let hot_ranks = year_map
                .iter()
                .filter(|(r, c)| {
                    (window_start..=window_end).contains(r) && c.members.len() >= WINDOW_HOT_COHORT
                })
                .count();
            if hot_ranks > WINDOW_MAX_HOT_RANKS {
                let conflict = RankingConflict {
                    rank,
                    year,
                    offender: record.slug.clone(),
                    existing_cohort: Vec::new(),
                    kind: ConflictKind::WindowClustering,
                    severity: ConflictSeverity::Warning,
                };
                warn!(
                    rank,
                    year,
                    window_start,
                    window_end,
                    hot_ranks,
                    "rank window hosts too many crowded values"
                );
                conflicts.push(conflict);
                break;
            }
        }
    }

    /// Number of records admitted with a national rank for `year`.
    pub fn national_count(&self, year: u16) -> usize {
        let state = self.state.lock().expect("ranking ledger lock poisoned");
        state
            .national
            .get(&year)
            .map(|ranks| ranks.values().map(|c| c.members.len()).sum())
            .unwrap_or(0)
    }

    /// A consistent point-in-time view of the ledger for reporting.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.lock().expect("ranking ledger lock poisoned");
        let mut years: Vec<YearSummary> = state
            .national
            .iter()
            .map(|(&year, ranks)| YearSummary {
                year,
                ranked_records: ranks.values().map(|c| c.members.len()).sum(),
                distinct_ranks: ranks.len(),
                shared_ranks: ranks.values().filter(|c| c.members.len() > 1).count(),
            })
            .collect();
        years.sort_by_key(|s| s.year);
        LedgerSnapshot { years }
    }
}

/// Per-year admission totals.
#[derive(Debug, Clone, Serialize)]
pub struct YearSummary {
    pub year: u16,
    pub ranked_records: usize,
    pub distinct_ranks: usize,
    /// Rank values held by more than one record (legal only outside bucket 1).
    pub shared_ranks: usize,
}

/// Point-in-time ledger report.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    pub years: Vec<YearSummary>,
}

fn null_national_rank(record: &mut SchoolRecord) {
    record.national_rank = None;
    record.national_rank_end = None;
    record.national_rank_precision = None;
}
