use crate::record::RawRecord;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read visitor log: {0}")]
    Io(#[from] io::Error),
    #[error("invalid visitor record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Supplies the full raw record set. Failures are returned to the caller
/// as-is; nothing is retried here.
pub trait RecordSource {
    fn load_all(&self) -> Result<Vec<RawRecord>, SourceError>;
}

/// Visitor log on disk, either a JSON array or JSON lines.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for JsonFileSource {
    fn load_all(&self) -> Result<Vec<RawRecord>, SourceError> {
        let text = std::fs::read_to_string(&self.path)?;
        let records = parse_records(&text)?;
        debug!(path = %self.path.display(), records = records.len(), "loaded visitor log");
        Ok(records)
    }
}

pub fn load_from_reader<R: Read>(mut reader: R) -> Result<Vec<RawRecord>, SourceError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_records(&text)
}

pub fn parse_records(text: &str) -> Result<Vec<RawRecord>, SourceError> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| SourceError::Parse { line: e.line(), source: e });
    }
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let rec = serde_json::from_str::<RawRecord>(line).map_err(|e| SourceError::Parse { line: i + 1, source: e })?;
        out.push(rec);
    }
    Ok(out)
}
