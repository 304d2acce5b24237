//! Builds a capture manifest from a directory of scraped profile documents.
//!
//! File names follow `<slug>-<year>.html`; byte length and content hash are
//! computed from the file itself, and the capture timestamp is the file's
//! modification time.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use prospectus::model::CaptureRecord;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "manifest",
    version,
    about = "Build a capture manifest from scraped profile documents"
)]
struct Args {
    /// Directory of `<slug>-<year>.html` capture files.
    #[arg(long)]
    input: PathBuf,

    /// Manifest output path, one capture record per line.
    #[arg(long, default_value = "manifest.jsonl")]
    output: PathBuf,
}

/// Split `<slug>-<year>` out of a capture file name.
fn parse_file_name(path: &Path) -> Option<(String, u16)> {
    let stem = path.file_stem()?.to_str()?;
    let (slug, year) = stem.rsplit_once('-')?;
    let year: u16 = year.parse().ok()?;
    (!slug.is_empty() && (1990..=2100).contains(&year)).then(|| (slug.to_string(), year))
}

fn capture_for(path: &Path) -> Result<CaptureRecord> {
    let (slug, source_year) =
        parse_file_name(path).context("file name is not <slug>-<year>.html")?;
    let bytes =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    Ok(CaptureRecord {
        slug,
        source_year,
        file: path.to_path_buf(),
        captured_at: modified,
        byte_len: bytes.len() as u64,
        content_hash: format!("{:x}", Sha256::digest(&bytes)),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut paths: Vec<PathBuf> = fs::read_dir(&args.input)
        .with_context(|| format!("failed to read directory {}", args.input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "html"))
        .collect();
    paths.sort();

    let mut writer = BufWriter::new(
        File::create(&args.output)
            .with_context(|| format!("failed to create {}", args.output.display()))?,
    );

    let mut written = 0usize;
    for path in paths {
        match capture_for(&path) {
            Ok(capture) => {
                serde_json::to_writer(&mut writer, &capture)?;
                writeln!(writer)?;
                written += 1;
            }
            Err(e) => warn!(file = %path.display(), error = ?e, "skipping capture file"),
        }
    }
    writer.flush()?;

    info!(written, output = %args.output.display(), "manifest written");
    Ok(())
}
