//! Pack store port.

use async_trait::async_trait;
use serde_json::Value;

use super::error::StoreError;

/// On-disk format of a pack store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// One JSON document per line; later lines supersede earlier ones.
    CompactionLog,
    /// Key-ordered entries in a LevelDB directory.
    SortedLog,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CompactionLog => write!(f, "compaction-log"),
            Self::SortedLog => write!(f, "sorted-log"),
        }
    }
}

/// One aggregate record as read from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Storage key; replacements are written back under it.
    pub key: String,
    pub document: Value,
}

/// An opened pack store.
///
/// Implementations hold the store open until [`RecordStore::close`]. Writes
/// go through `&mut self`, so one handle never has two writes in flight.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send {
    fn backend(&self) -> StoreBackend;

    /// Every live aggregate record, in storage order.
    async fn load_records(&mut self) -> Result<Vec<StoredRecord>, StoreError>;

    /// Replace the record under `key` with `record` in one atomic step.
    async fn replace_record(&mut self, key: &str, record: &Value) -> Result<(), StoreError>;

    /// Flush and release the store.
    async fn close(&mut self) -> Result<(), StoreError>;
}
