//! Command-line arguments.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "prospectus", version, about = "School-profile extraction engine")]
pub struct Args {
    /// JSONL manifest of capture records to extract.
    #[arg(long)]
    pub manifest: PathBuf,

    /// Output file for extracted records, one JSON object per line.
    #[arg(long, default_value = "records.jsonl")]
    pub output: PathBuf,

    /// Only process captures from this source year.
    #[arg(long)]
    pub year: Option<u16>,

    /// Log output format.
    #[arg(long, value_enum, default_value = "pretty")]
    pub tracing: TracingFormat,
}
