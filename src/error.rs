//! Error types for the extraction engine's I/O boundaries.
//!
//! Per-field extraction failures never surface here; they accumulate as
//! `ExtractionError` values on the record. This type covers the two places
//! the engine actually touches the outside world: reading the capture
//! manifest and writing records through the sink.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("manifest {} is unreadable", path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create sink at {}", path.display())]
    SinkCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("record for {slug} is not serializable")]
    RecordSerialize {
        slug: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write record for {slug}")]
    SinkWrite {
        slug: String,
        #[source]
        source: std::io::Error,
    },
}
