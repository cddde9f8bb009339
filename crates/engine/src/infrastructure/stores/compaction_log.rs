//! Compaction-log pack store.
//!
//! A newline-delimited JSON file with one document per line. Later lines
//! supersede earlier lines with the same `_id`; `{"$$deleted": true}` lines
//! are tombstones and `$$indexCreated` lines describe secondary indexes.
//! Replacing a record appends one line. Closing compacts the file down to one
//! line per live document.
//!
//! A final line with no terminating newline that does not parse is a write
//! cut short by a crash. It is dropped with a warning rather than failing the
//! whole store.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::infrastructure::ports::{RecordStore, StoreBackend, StoreError, StoredRecord};

const DELETED: &str = "$$deleted";
const INDEX_CREATED: &str = "$$indexCreated";
const INDEX_REMOVED: &str = "$$indexRemoved";

/// An opened compaction-log file.
pub struct CompactionLogStore {
    path: PathBuf,
    documents: BTreeMap<String, Value>,
    /// Index definitions keyed by field name, kept verbatim.
    indexes: BTreeMap<String, Value>,
    appender: Option<File>,
    /// The file ends in a dropped partial line; the next append starts a new one.
    torn_tail: bool,
    closed: bool,
}

impl CompactionLogStore {
    /// Read the whole log into memory.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let contents = fs::read_to_string(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        let mut store = Self {
            path,
            documents: BTreeMap::new(),
            indexes: BTreeMap::new(),
            appender: None,
            torn_tail: false,
            closed: false,
        };
        let unterminated = !contents.is_empty() && !contents.ends_with('\n');
        let last_line = contents.lines().count();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match store.apply_line(index + 1, line) {
                Err(StoreError::Corrupt { message, .. })
                    if unterminated && index + 1 == last_line =>
                {
                    tracing::warn!(
                        path = %store.path.display(),
                        line = last_line,
                        error = %message,
                        "Dropping partially written final line"
                    );
                    store.torn_tail = true;
                }
                result => result?,
            }
        }

        tracing::debug!(
            path = %store.path.display(),
            documents = store.documents.len(),
            indexes = store.indexes.len(),
            "Opened compaction-log store"
        );
        Ok(store)
    }

    fn apply_line(&mut self, line_number: usize, line: &str) -> Result<(), StoreError> {
        let corrupt = |message: &str| StoreError::corrupt(&self.path, line_number, message);

        let document: Map<String, Value> = match serde_json::from_str(line) {
            Ok(Value::Object(document)) => document,
            Ok(_) => return Err(corrupt("line is not a JSON object")),
            Err(e) => return Err(corrupt(&e.to_string())),
        };

        if let Some(index) = document.get(INDEX_CREATED) {
            let field = index
                .get("fieldName")
                .and_then(Value::as_str)
                .ok_or_else(|| corrupt("index line without fieldName"))?;
            self.indexes
                .insert(field.to_string(), Value::Object(document.clone()));
            return Ok(());
        }

        if let Some(field) = document.get(INDEX_REMOVED) {
            if let Some(field) = field.as_str() {
                self.indexes.remove(field);
            }
            return Ok(());
        }

        let id = document
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| corrupt("document without _id"))?
            .to_string();

        if document.get(DELETED) == Some(&Value::Bool(true)) {
            self.documents.remove(&id);
        } else {
            self.documents.insert(id, Value::Object(document));
        }
        Ok(())
    }

    async fn appender(&mut self) -> Result<&mut File, StoreError> {
        if self.appender.is_none() {
            let file = OpenOptions::new()
                .append(true)
                .open(&self.path)
                .await
                .map_err(|e| StoreError::io(&self.path, e))?;
            self.appender = Some(file);
        }
        self.appender
            .as_mut()
            .ok_or_else(|| StoreError::database("append", "append handle unavailable"))
    }

    /// Rewrite the log as one line per live document followed by the index
    /// lines, then swap it in for the original.
    async fn compact(&mut self) -> Result<(), StoreError> {
        let mut contents = String::new();
        for document in self.documents.values().chain(self.indexes.values()) {
            contents.push_str(&serde_json::to_string(document)?);
            contents.push('\n');
        }

        let mut temp_name = self.path.clone().into_os_string();
        temp_name.push("~");
        let temp_path = PathBuf::from(temp_name);

        let mut temp = File::create(&temp_path)
            .await
            .map_err(|e| StoreError::io(&temp_path, e))?;
        temp.write_all(contents.as_bytes())
            .await
            .map_err(|e| StoreError::io(&temp_path, e))?;
        temp.sync_all()
            .await
            .map_err(|e| StoreError::io(&temp_path, e))?;
        drop(temp);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for CompactionLogStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::CompactionLog
    }

    async fn load_records(&mut self) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self
            .documents
            .iter()
            .map(|(key, document)| StoredRecord {
                key: key.clone(),
                document: document.clone(),
            })
            .collect())
    }

    /// Append `record` as the newest line for `key`.
    ///
    /// The key is authoritative: the written line always carries `_id = key`.
    async fn replace_record(&mut self, key: &str, record: &Value) -> Result<(), StoreError> {
        let mut document = record.clone();
        if let Value::Object(fields) = &mut document {
            fields.insert("_id".to_string(), Value::String(key.to_string()));
        }

        let mut line = String::new();
        if self.torn_tail {
            line.push('\n');
        }
        line.push_str(&serde_json::to_string(&document)?);
        line.push('\n');

        let path = self.path.clone();
        let appender = self.appender().await?;
        appender
            .write_all(line.as_bytes())
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        appender
            .flush()
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        self.torn_tail = false;
        self.documents.insert(key.to_string(), document);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        if self.closed {
            return Ok(());
        }
        if let Some(appender) = self.appender.take() {
            appender
                .sync_all()
                .await
                .map_err(|e| StoreError::io(&self.path, e))?;
        }
        self.compact().await?;
        self.closed = true;
        tracing::debug!(path = %self.path.display(), "Compacted store");
        Ok(())
    }
}
