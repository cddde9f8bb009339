//! Record-level conversion over an opened pack store.

use std::future::Future;
use std::path::Path;

use futures_util::stream::{self, StreamExt};
use serde_json::Value;

use super::open_store;
use crate::infrastructure::ports::{RecordStore, StoreBackend, StoreError};

/// Default number of records converted at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// A record whose conversion failed. The stored record is left untouched.
#[derive(Debug)]
pub struct RecordFailure<E> {
    pub key: String,
    pub error: E,
}

/// Outcome of one pass over a store.
#[derive(Debug)]
pub struct StoreReport<E> {
    pub backend: StoreBackend,
    pub converted: usize,
    pub failures: Vec<RecordFailure<E>>,
}

impl<E> StoreReport<E> {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Opens stores and rewrites every aggregate record in them.
#[derive(Debug, Clone)]
pub struct StoreAdapter {
    concurrency: usize,
}

impl Default for StoreAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl StoreAdapter {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Open the store at `path`, detecting its backend.
    pub async fn open_for_conversion(
        &self,
        path: &Path,
    ) -> Result<Box<dyn RecordStore>, StoreError> {
        open_store(path).await
    }

    /// Convert every record with `convert` and write successes back under
    /// their original keys.
    ///
    /// Up to `concurrency` conversions run at once; writes happen one at a
    /// time in storage order. A failed conversion is recorded and the run
    /// continues. A failed write aborts the run.
    pub async fn for_each_record<F, Fut, E>(
        &self,
        store: &mut dyn RecordStore,
        convert: F,
    ) -> Result<StoreReport<E>, StoreError>
    where
        F: Fn(Value) -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: std::fmt::Display,
    {
        let records = store.load_records().await?;
        let total = records.len();
        tracing::info!(backend = %store.backend(), records = total, "Converting records");

        let mut results = stream::iter(records)
            .map(|record| {
                let converted = convert(record.document);
                async move { (record.key, converted.await) }
            })
            .buffered(self.concurrency);

        let mut report = StoreReport {
            backend: store.backend(),
            converted: 0,
            failures: Vec::new(),
        };

        while let Some((key, result)) = results.next().await {
            match result {
                Ok(document) => {
                    store.replace_record(&key, &document).await?;
                    report.converted += 1;
                }
                Err(error) => {
                    tracing::warn!(key = %key, error = %error, "Record conversion failed");
                    report.failures.push(RecordFailure { key, error });
                }
            }
        }

        tracing::info!(
            converted = report.converted,
            failed = report.failures.len(),
            "Finished converting records"
        );
        Ok(report)
    }

    pub async fn close(&self, store: &mut dyn RecordStore) -> Result<(), StoreError> {
        store.close().await
    }

    /// Open, convert and close the store at `path`.
    ///
    /// The store is closed on every exit path; a conversion-pass error wins
    /// over a close error.
    pub async fn convert_store<F, Fut, E>(
        &self,
        path: &Path,
        convert: F,
    ) -> Result<StoreReport<E>, StoreError>
    where
        F: Fn(Value) -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: std::fmt::Display,
    {
        let mut store = self.open_for_conversion(path).await?;
        let outcome = self.for_each_record(store.as_mut(), convert).await;
        let closed = self.close(store.as_mut()).await;

        match (outcome, closed) {
            (Ok(report), Ok(())) => Ok(report),
            (Err(e), _) | (Ok(_), Err(e)) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockRecordStore, StoredRecord};
    use mockall::predicate::{always, eq};
    use serde_json::json;

    fn record(key: &str, value: i64) -> StoredRecord {
        StoredRecord {
            key: key.to_string(),
            document: json!({ "_id": key, "value": value }),
        }
    }

    async fn double(mut document: Value) -> Result<Value, String> {
        let value = document["value"].as_i64();
        match value {
            Some(value) if value >= 0 => {
                document["value"] = json!(value * 2);
                Ok(document)
            }
            _ => Err(format!("bad value in {}", document["_id"])),
        }
    }

    #[tokio::test]
    async fn successes_are_written_and_failures_reported() {
        let mut store = MockRecordStore::new();
        store
            .expect_backend()
            .return_const(StoreBackend::CompactionLog);
        store
            .expect_load_records()
            .times(1)
            .returning(|| Ok(vec![record("a", 1), record("b", -1), record("c", 3)]));
        store
            .expect_replace_record()
            .with(eq("a"), eq(json!({ "_id": "a", "value": 2 })))
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_replace_record()
            .with(eq("c"), eq(json!({ "_id": "c", "value": 6 })))
            .times(1)
            .returning(|_, _| Ok(()));

        let report = StoreAdapter::new(2)
            .for_each_record(&mut store, double)
            .await
            .expect("pass");

        assert_eq!(report.backend, StoreBackend::CompactionLog);
        assert_eq!(report.converted, 2);
        assert!(!report.is_clean());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].key, "b");
        assert_eq!(report.failures[0].error, "bad value in \"b\"");
    }

    #[tokio::test]
    async fn write_failure_aborts_the_pass() {
        let mut store = MockRecordStore::new();
        store.expect_backend().return_const(StoreBackend::SortedLog);
        store
            .expect_load_records()
            .returning(|| Ok(vec![record("a", 1), record("b", 2)]));
        store
            .expect_replace_record()
            .with(eq("a"), always())
            .times(1)
            .returning(|_, _| Err(StoreError::database("replace_record", "disk full")));

        let result = StoreAdapter::default()
            .for_each_record(&mut store, double)
            .await;

        assert!(matches!(result, Err(StoreError::Database { .. })));
    }

    #[tokio::test]
    async fn convert_store_rewrites_and_closes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("adventures.db");
        tokio::fs::write(
            &path,
            "{\"_id\":\"a\",\"value\":1}\n{\"_id\":\"b\",\"value\":-5}\n{\"_id\":\"a\",\"value\":4}\n",
        )
        .await
        .expect("write");

        let report = StoreAdapter::default()
            .convert_store(&path, double)
            .await
            .expect("convert");
        assert_eq!(report.converted, 1);
        assert_eq!(report.failures[0].key, "b");

        // Compacted on close, failed record untouched
        let contents = tokio::fs::read_to_string(&path).await.expect("read");
        assert_eq!(
            contents,
            "{\"_id\":\"a\",\"value\":8}\n{\"_id\":\"b\",\"value\":-5}\n"
        );
    }

    #[tokio::test]
    async fn convert_store_fails_on_unknown_layout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = StoreAdapter::default()
            .convert_store(dir.path(), double)
            .await;
        assert!(matches!(result, Err(StoreError::UnknownBackend(_))));
    }
}
