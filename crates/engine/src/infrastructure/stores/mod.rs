//! Pack store backends and the adapter that runs conversions over them.

mod adapter;
mod compaction_log;
mod sorted_log;

use std::path::Path;

use crate::infrastructure::ports::{RecordStore, StoreBackend, StoreError};

pub use adapter::{RecordFailure, StoreAdapter, StoreReport, DEFAULT_CONCURRENCY};
pub use compaction_log::CompactionLogStore;
pub use sorted_log::{SortedLogStore, ADVENTURE_PREFIX, CURRENT_FILE};
#[cfg(test)]
pub(crate) use sorted_log::seed_leveldb;

/// Name prefix of LevelDB manifest files.
const MANIFEST_PREFIX: &str = "MANIFEST-";

impl StoreBackend {
    /// Work out which backend the store at `path` uses.
    ///
    /// A regular file is a compaction log. A directory is a sorted log when
    /// it holds a LevelDB [`CURRENT_FILE`] or a `MANIFEST-*` file.
    pub async fn detect(path: &Path) -> Result<Self, StoreError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| StoreError::io(path, e))?;

        if metadata.is_file() {
            return Ok(Self::CompactionLog);
        }
        if metadata.is_dir() && is_leveldb_dir(path).await? {
            return Ok(Self::SortedLog);
        }
        Err(StoreError::UnknownBackend(path.to_path_buf()))
    }
}

async fn is_leveldb_dir(path: &Path) -> Result<bool, StoreError> {
    if tokio::fs::try_exists(path.join(CURRENT_FILE))
        .await
        .map_err(|e| StoreError::io(path, e))?
    {
        return Ok(true);
    }

    let mut entries = tokio::fs::read_dir(path)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StoreError::io(path, e))?
    {
        if entry
            .file_name()
            .to_string_lossy()
            .starts_with(MANIFEST_PREFIX)
        {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Open the store at `path` with whichever backend it uses.
pub async fn open_store(path: &Path) -> Result<Box<dyn RecordStore>, StoreError> {
    let backend = StoreBackend::detect(path).await?;
    tracing::debug!(path = %path.display(), %backend, "Detected store backend");

    let store: Box<dyn RecordStore> = match backend {
        StoreBackend::CompactionLog => Box::new(CompactionLogStore::open(path).await?),
        StoreBackend::SortedLog => Box::new(SortedLogStore::open(path).await?),
    };
    Ok(store)
}
