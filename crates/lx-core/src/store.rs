//! Latest-results store and persisted record log
//!
//! Holds the most recent run's records together with the active field
//! schema, and appends completed runs onto a durable JSON record file.
//! `replace` serves the interactive view; `append_persist` feeds the record
//! file. These are two independent consumers of a run's output, not two
//! behaviors of one operation.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{ExtractionRecord, ResultSet};
use crate::schema::FieldSchema;

struct StoreInner {
    latest: ResultSet,
    schema: FieldSchema,
}

/// Shared store for extraction results
///
/// In-memory state sits behind a mutex; record-file appends are serialized
/// separately so concurrent triggers cannot interleave writes.
pub struct RecordStore {
    inner: Mutex<StoreInner>,
    data_path: PathBuf,
    file_lock: tokio::sync::Mutex<()>,
}

impl RecordStore {
    /// Create a store persisting to `data_path`
    pub fn new(data_path: impl Into<PathBuf>, schema: FieldSchema) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                latest: Vec::new(),
                schema,
            }),
            data_path: data_path.into(),
            file_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Path of the persisted record file
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Replace the latest result set (interactive re-run)
    pub fn replace(&self, records: ResultSet) {
        let mut inner = self.inner.lock().expect("record store poisoned");
        debug!(
            previous = inner.latest.len(),
            new = records.len(),
            "replacing latest result set"
        );
        inner.latest = records;
    }

    /// The latest result set
    pub fn current(&self) -> ResultSet {
        self.inner.lock().expect("record store poisoned").latest.clone()
    }

    /// The active field schema
    pub fn current_schema(&self) -> FieldSchema {
        self.inner.lock().expect("record store poisoned").schema.clone()
    }

    /// Replace the active field schema
    ///
    /// Does not touch stored records; a record captured under the previous
    /// schema stays as captured and is re-filtered at export time.
    pub fn set_schema(&self, schema: FieldSchema) {
        let mut inner = self.inner.lock().expect("record store poisoned");
        info!(fields = ?schema.fields(), "replacing active field schema");
        inner.schema = schema;
    }

    /// Append records onto the persisted record file
    ///
    /// Prior entries are preserved indefinitely; no dedup, no cap. Returns
    /// the total number of persisted records. A record file that no longer
    /// parses is left untouched and reported as an error.
    pub async fn append_persist(&self, records: &[ExtractionRecord]) -> Result<usize> {
        let _guard = self.file_lock.lock().await;

        let mut existing: ResultSet = match tokio::fs::read(&self.data_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                Error::Store(format!(
                    "record file {} is not valid JSON: {e}",
                    self.data_path.display()
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(Error::Io(e)),
        };

        existing.extend_from_slice(records);

        if let Some(parent) = self.data_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(&existing)?;
        tokio::fs::write(&self.data_path, json).await?;

        info!(
            appended = records.len(),
            total = existing.len(),
            path = %self.data_path.display(),
            "data saved to record file"
        );
        Ok(existing.len())
    }
}
