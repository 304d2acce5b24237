//! Extraction engine for scraped school-profile documents.
//!
//! Converts raw, semi-structured profile HTML into normalized,
//! confidence-scored records with precise ranking semantics. The pipeline per
//! document: parse, structured-data seed, unranked gate, ranking dispatch,
//! selector sweep, confidence scoring. Across documents, the uniqueness
//! ledger enforces per-year ranking invariants.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod html;
pub mod logging;
pub mod model;
pub mod sink;
pub mod utils;
pub mod validate;
