//! Output sinks for extracted records.
//!
//! The engine never owns storage; accepted records flow through an injected
//! sink. The JSONL sink is what the batch CLI uses.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::error::EngineError;
use crate::model::SchoolRecord;

pub trait RecordSink: Send + Sync {
    fn write(&self, record: &SchoolRecord) -> Result<(), EngineError>;
}

/// Writes one JSON object per line.
#[derive(Debug)]
pub struct JsonlSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonlSink {
    pub fn create(path: &Path) -> Result<Self, EngineError> {
        let file = File::create(path).map_err(|source| EngineError::SinkCreate {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl RecordSink for JsonlSink {
    fn write(&self, record: &SchoolRecord) -> Result<(), EngineError> {
        let line =
            serde_json::to_string(record).map_err(|source| EngineError::RecordSerialize {
                slug: record.slug.clone(),
                source,
            })?;
        let io_error = |source| EngineError::SinkWrite {
            slug: record.slug.clone(),
            source,
        };

        let mut writer = self.writer.lock().expect("sink lock poisoned");
        writeln!(writer, "{line}").map_err(&io_error)?;
        writer.flush().map_err(&io_error)?;
        Ok(())
    }
}

/// In-memory sink for tests.
#[derive(Default)]
pub struct VecSink {
    records: Mutex<Vec<SchoolRecord>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<SchoolRecord> {
        self.records.lock().expect("sink lock poisoned").clone()
    }
}

impl RecordSink for VecSink {
    fn write(&self, record: &SchoolRecord) -> Result<(), EngineError> {
        self.records
            .lock()
            .expect("sink lock poisoned")
            .push(record.clone());
        Ok(())
    }
}
