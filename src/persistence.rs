//! # Result Persistence
//!
//! The reporter hands every `(category, metric, value)` triple it produces to
//! a [`ResultPersistence`] implementation and closes it once per reporting
//! pass. What the sink does with the triples is its own business:
//!
//! - [`NonePersistence`] drops them
//! - [`CsvPersistence`] writes `category,metric,value` rows to a file
//! - [`JsonPersistence`] buffers them and writes one JSON document on close
//! - [`MemoryPersistence`] keeps them in a shared list for inspection
//!
//! [`PersistenceFactory`] builds the sink selected on the command line.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info};

/// Category used for whole-run metrics
pub const TOTAL_CATEGORY: &str = "total";

/// Errors raised by persistence sinks
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("persistence sink already closed")]
    Closed,

    #[error("failed to write results to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode results: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Destination for computed benchmark results
pub trait ResultPersistence: Send {
    /// Record one result value
    fn save_result(
        &mut self,
        category: &str,
        metric: &str,
        value: &str,
    ) -> Result<(), PersistenceError>;

    /// Flush and release held resources
    fn close(&mut self) -> Result<(), PersistenceError>;
}

/// One persisted result triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub category: String,
    pub metric: String,
    pub value: String,
}

impl ResultRecord {
    fn new(category: &str, metric: &str, value: &str) -> Self {
        Self {
            category: category.to_string(),
            metric: metric.to_string(),
            value: value.to_string(),
        }
    }
}

/// Available persistence sinks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum PersistenceKind {
    /// Discard results
    #[default]
    #[clap(name = "none")]
    None,

    /// Comma-separated values file
    #[clap(name = "csv")]
    Csv,

    /// JSON document
    #[clap(name = "json")]
    Json,
}

impl std::fmt::Display for PersistenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceKind::None => write!(f, "None"),
            PersistenceKind::Csv => write!(f, "CSV"),
            PersistenceKind::Json => write!(f, "JSON"),
        }
    }
}

/// Sink that accepts and drops every result
#[derive(Debug, Default)]
pub struct NonePersistence {
    closed: bool,
}

impl NonePersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultPersistence for NonePersistence {
    fn save_result(&mut self, _: &str, _: &str, _: &str) -> Result<(), PersistenceError> {
        if self.closed {
            return Err(PersistenceError::Closed);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), PersistenceError> {
        if std::mem::replace(&mut self.closed, true) {
            return Err(PersistenceError::Closed);
        }
        Ok(())
    }
}

/// Sink writing one CSV row per result
pub struct CsvPersistence {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl CsvPersistence {
    /// Create or append to `path`; a header row is written to new files
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| PersistenceError::Io {
            path: path.clone(),
            source,
        };

        let is_new = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        if is_new {
            writeln!(writer, "category,metric,value").map_err(io_err)?;
        }

        debug!("Opened CSV persistence at {:?}", path);
        Ok(Self {
            path,
            writer: Some(writer),
        })
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ResultPersistence for CsvPersistence {
    fn save_result(
        &mut self,
        category: &str,
        metric: &str,
        value: &str,
    ) -> Result<(), PersistenceError> {
        let writer = self.writer.as_mut().ok_or(PersistenceError::Closed)?;
        let row = writeln!(
            writer,
            "{},{},{}",
            csv_field(category),
            csv_field(metric),
            csv_field(value)
        );
        row.map_err(|e| self.io_error(e))
    }

    fn close(&mut self) -> Result<(), PersistenceError> {
        let mut writer = self.writer.take().ok_or(PersistenceError::Closed)?;
        writer.flush().map_err(|e| self.io_error(e))?;
        info!("Results written to: {:?}", self.path);
        Ok(())
    }
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// JSON document written by [`JsonPersistence`]
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonResultDocument {
    pub version: String,
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub results: Vec<ResultRecord>,
}

/// Sink buffering results and writing them as one JSON document on close
pub struct JsonPersistence {
    path: PathBuf,
    run_id: String,
    records: Vec<ResultRecord>,
    closed: bool,
}

impl JsonPersistence {
    pub fn new<P: AsRef<Path>>(path: P, run_id: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            run_id: run_id.into(),
            records: Vec::new(),
            closed: false,
        }
    }
}

impl ResultPersistence for JsonPersistence {
    fn save_result(
        &mut self,
        category: &str,
        metric: &str,
        value: &str,
    ) -> Result<(), PersistenceError> {
        if self.closed {
            return Err(PersistenceError::Closed);
        }
        self.records.push(ResultRecord::new(category, metric, value));
        Ok(())
    }

    fn close(&mut self) -> Result<(), PersistenceError> {
        if std::mem::replace(&mut self.closed, true) {
            return Err(PersistenceError::Closed);
        }

        let document = JsonResultDocument {
            version: crate::VERSION.to_string(),
            run_id: self.run_id.clone(),
            timestamp: Utc::now(),
            results: std::mem::take(&mut self.records),
        };
        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(&self.path, json).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!("Results written to: {:?}", self.path);
        Ok(())
    }
}

/// Sink keeping results in memory.
///
/// Clones share the same record list, so a caller can keep one handle and
/// give the other to the reporter.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    records: Arc<Mutex<Vec<ResultRecord>>>,
    closes: Arc<Mutex<usize>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records saved so far
    pub fn records(&self) -> Vec<ResultRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Value saved under `(category, metric)`, if any
    pub fn value(&self, category: &str, metric: &str) -> Option<String> {
        self.records()
            .into_iter()
            .find(|r| r.category == category && r.metric == metric)
            .map(|r| r.value)
    }

    /// Number of times `close` has been called
    pub fn close_count(&self) -> usize {
        self.closes.lock().map_or_else(|p| *p.into_inner(), |c| *c)
    }
}

impl ResultPersistence for MemoryPersistence {
    fn save_result(
        &mut self,
        category: &str,
        metric: &str,
        value: &str,
    ) -> Result<(), PersistenceError> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        records.push(ResultRecord::new(category, metric, value));
        Ok(())
    }

    fn close(&mut self) -> Result<(), PersistenceError> {
        let mut closes = self
            .closes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *closes += 1;
        Ok(())
    }
}

/// Builds persistence sinks from configuration
pub struct PersistenceFactory;

impl PersistenceFactory {
    /// Create the sink for `kind`.
    ///
    /// File-backed sinks require `path`; a missing path falls back to
    /// `defaults::RESULT_FILE_STEM` with the matching extension.
    pub fn create(
        kind: PersistenceKind,
        path: Option<&Path>,
        run_id: &str,
    ) -> Result<Box<dyn ResultPersistence>, PersistenceError> {
        let path_or_default = |ext: &str| {
            path.map(Path::to_path_buf).unwrap_or_else(|| {
                PathBuf::from(format!("{}.{}", crate::defaults::RESULT_FILE_STEM, ext))
            })
        };

        match kind {
            PersistenceKind::None => Ok(Box::new(NonePersistence::new())),
            PersistenceKind::Csv => Ok(Box::new(CsvPersistence::open(path_or_default("csv"))?)),
            PersistenceKind::Json => Ok(Box::new(JsonPersistence::new(
                path_or_default("json"),
                run_id,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_none_persistence_rejects_after_close() {
        let mut sink = NonePersistence::new();
        sink.save_result("total", "elapsedTime", "1.0").unwrap();
        sink.close().unwrap();

        assert!(matches!(
            sink.save_result("total", "elapsedTime", "1.0"),
            Err(PersistenceError::Closed)
        ));
        assert!(matches!(sink.close(), Err(PersistenceError::Closed)));
    }

    #[test]
    fn test_csv_persistence_writes_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let mut sink = CsvPersistence::open(&path).unwrap();
        sink.save_result("total", "elapsedTime", "10").unwrap();
        sink.save_result("INGESTION", "note", "a,b").unwrap();
        sink.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "category,metric,value");
        assert_eq!(lines[1], "total,elapsedTime,10");
        assert_eq!(lines[2], "INGESTION,note,\"a,b\"");
    }

    #[test]
    fn test_csv_persistence_appends_without_second_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        for value in ["1", "2"] {
            let mut sink = CsvPersistence::open(&path).unwrap();
            sink.save_result("total", "elapsedTime", value).unwrap();
            sink.close().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("category,metric,value").count(), 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_csv_persistence_closed() {
        let dir = tempdir().unwrap();
        let mut sink = CsvPersistence::open(dir.path().join("r.csv")).unwrap();
        sink.close().unwrap();
        assert!(matches!(sink.close(), Err(PersistenceError::Closed)));
    }

    #[test]
    fn test_json_persistence_writes_on_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");

        let mut sink = JsonPersistence::new(&path, "run-1");
        sink.save_result("total", "createSchemaTime", "0.5").unwrap();
        assert!(!path.exists());
        sink.close().unwrap();

        let document: JsonResultDocument =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document.run_id, "run-1");
        assert_eq!(document.version, crate::VERSION);
        assert_eq!(
            document.results,
            vec![ResultRecord::new("total", "createSchemaTime", "0.5")]
        );
    }

    #[test]
    fn test_memory_persistence_shares_records() {
        let handle = MemoryPersistence::new();
        let mut sink: Box<dyn ResultPersistence> = Box::new(handle.clone());

        sink.save_result("INGESTION", "okPointNum", "42").unwrap();
        sink.close().unwrap();

        assert_eq!(handle.value("INGESTION", "okPointNum").as_deref(), Some("42"));
        assert_eq!(handle.value("INGESTION", "missing"), None);
        assert_eq!(handle.close_count(), 1);
    }

    #[test]
    fn test_factory_creates_requested_sink() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut sink = PersistenceFactory::create(PersistenceKind::Csv, Some(path.as_path()), "id").unwrap();
        sink.close().unwrap();
        assert!(path.exists());

        let mut none = PersistenceFactory::create(PersistenceKind::None, None, "id").unwrap();
        none.close().unwrap();
    }
}
