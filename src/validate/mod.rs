//! Cross-record integrity validation.

pub mod uniqueness;

pub use uniqueness::{ConflictKind, ConflictSeverity, RankingConflict, RankingLedger};
