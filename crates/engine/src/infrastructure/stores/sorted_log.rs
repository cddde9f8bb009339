//! Sorted-log pack store: a LevelDB directory.
//!
//! Adventure aggregates are stored under `!adventures!<id>`; other keys
//! belong to other collections and are never read or written here.
//!
//! The database handle cannot leave the thread that opened it, so each store
//! owns a worker thread that holds the handle and serves commands from the
//! async side.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use rusty_leveldb::{LdbIterator, Options, DB};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::infrastructure::ports::{RecordStore, StoreBackend, StoreError, StoredRecord};

/// Key prefix of adventure aggregates.
pub const ADVENTURE_PREFIX: &str = "!adventures!";

/// First key past the adventure range (`!` + 1 = `"`).
const ADVENTURE_END: &str = "!adventures\"";

/// File every LevelDB directory carries, naming the live manifest.
pub const CURRENT_FILE: &str = "CURRENT";

type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

enum Command {
    Load(Reply<Vec<StoredRecord>>),
    Put {
        key: String,
        value: Vec<u8>,
        reply: Reply<()>,
    },
    Close(Reply<()>),
}

/// An opened LevelDB store.
pub struct SortedLogStore {
    path: PathBuf,
    commands: Option<mpsc::Sender<Command>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SortedLogStore {
    /// Open the existing database in directory `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let (commands, receiver) = mpsc::channel();
        let (opened_tx, opened_rx) = oneshot::channel();

        let db_path = path.clone();
        let worker = thread::Builder::new()
            .name("sorted-log-store".into())
            .spawn(move || {
                let options = Options {
                    create_if_missing: false,
                    ..Options::default()
                };
                match DB::open(&db_path, options) {
                    Ok(db) => {
                        let _ = opened_tx.send(Ok(()));
                        serve(db, db_path, receiver);
                    }
                    Err(e) => {
                        let _ = opened_tx.send(Err(StoreError::database("open", e)));
                    }
                }
            })
            .map_err(|e| StoreError::io(&path, e))?;

        match opened_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(StoreError::database("open", "store worker exited")),
        }

        tracing::debug!(path = %path.display(), "Opened sorted-log store");
        Ok(Self {
            path,
            commands: Some(commands),
            worker: Some(worker),
        })
    }

    /// Send one command and wait for the worker's answer.
    async fn request<T>(
        &self,
        operation: &'static str,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, StoreError> {
        let commands = self
            .commands
            .as_ref()
            .ok_or_else(|| StoreError::database(operation, "store is closed"))?;
        let (reply, answer) = oneshot::channel();
        commands
            .send(command(reply))
            .map_err(|_| StoreError::database(operation, "store worker exited"))?;
        answer
            .await
            .map_err(|_| StoreError::database(operation, "store worker exited"))?
    }
}

/// Worker loop: owns the database until `Close` arrives or the store drops.
fn serve(mut db: DB, path: PathBuf, commands: mpsc::Receiver<Command>) {
    for command in commands {
        match command {
            Command::Load(reply) => {
                let _ = reply.send(read_adventures(&mut db, &path));
            }
            Command::Put { key, value, reply } => {
                let result = db
                    .put(key.as_bytes(), &value)
                    .map_err(|e| StoreError::database("replace_record", e));
                let _ = reply.send(result);
            }
            Command::Close(reply) => {
                let result = db.flush().map_err(|e| StoreError::database("close", e));
                drop(db);
                let _ = reply.send(result);
                return;
            }
        }
    }
}

/// Every value in the adventure key range, in key order.
fn read_adventures(db: &mut DB, path: &Path) -> Result<Vec<StoredRecord>, StoreError> {
    let mut entries = db
        .new_iter()
        .map_err(|e| StoreError::database("load_records", e))?;

    let mut records = Vec::new();
    while let Some((key, value)) = LdbIterator::next(&mut entries) {
        let key = String::from_utf8_lossy(&key).into_owned();
        if key.as_str() >= ADVENTURE_END {
            break;
        }
        if !key.starts_with(ADVENTURE_PREFIX) {
            continue;
        }
        let document = serde_json::from_slice(&value).map_err(|e| {
            StoreError::corrupt(path, records.len() + 1, format!("{key}: {e}"))
        })?;
        records.push(StoredRecord { key, document });
    }
    Ok(records)
}

#[async_trait]
impl RecordStore for SortedLogStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::SortedLog
    }

    async fn load_records(&mut self) -> Result<Vec<StoredRecord>, StoreError> {
        self.request("load_records", Command::Load).await
    }

    async fn replace_record(&mut self, key: &str, record: &Value) -> Result<(), StoreError> {
        let value = serde_json::to_vec(record)?;
        let key = key.to_string();
        self.request("replace_record", |reply| Command::Put { key, value, reply })
            .await
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        if self.commands.is_none() {
            return Ok(());
        }
        let result = self.request("close", Command::Close).await;
        self.commands = None;
        if let Some(worker) = self.worker.take() {
            tokio::task::spawn_blocking(move || worker.join())
                .await
                .map_err(|e| StoreError::database("close", e))?
                .map_err(|_| StoreError::database("close", "store worker panicked"))?;
        }
        result?;

        tracing::debug!(path = %self.path.display(), "Closed sorted-log store");
        Ok(())
    }
}

/// Write raw entries into a fresh LevelDB directory.
#[cfg(test)]
pub(crate) fn seed_leveldb(path: &Path, entries: &[(&str, &str)]) {
    let options = Options {
        create_if_missing: true,
        ..Options::default()
    };
    let mut db = DB::open(path, options).expect("create leveldb");
    for (key, value) in entries {
        db.put(key.as_bytes(), value.as_bytes()).expect("put");
    }
    db.flush().expect("flush");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn adventures_load_in_key_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("adventures");
        seed_leveldb(
            &db_path,
            &[
                ("!adventures!b", r#"{"_id":"b"}"#),
                ("!adventures!a", r#"{"_id":"a"}"#),
                ("!actors!x", r#"{"_id":"x"}"#),
                ("!adventures.actors!a.x", r#"{"_id":"x"}"#),
                ("!folders!f", "not json"),
            ],
        );

        let mut store = SortedLogStore::open(&db_path).await.expect("open");
        let records = store.load_records().await.expect("load");
        let keys: Vec<_> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["!adventures!a", "!adventures!b"]);
        assert_eq!(records[0].document, json!({ "_id": "a" }));
        assert_eq!(store.backend(), StoreBackend::SortedLog);
        store.close().await.expect("close");
    }

    #[tokio::test]
    async fn replace_is_an_upsert_that_survives_close() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("adventures");
        seed_leveldb(&db_path, &[("!adventures!a", r#"{"_id":"a","v":0}"#)]);

        let mut store = SortedLogStore::open(&db_path).await.expect("open");
        store
            .replace_record("!adventures!a", &json!({ "_id": "a", "v": 1 }))
            .await
            .expect("update");
        store
            .replace_record("!adventures!a", &json!({ "_id": "a", "v": 2 }))
            .await
            .expect("update again");
        store.close().await.expect("close");
        store.close().await.expect("close again");

        let mut reopened = SortedLogStore::open(&db_path).await.expect("reopen");
        let records = reopened.load_records().await.expect("load");
        assert_eq!(
            records,
            vec![StoredRecord {
                key: "!adventures!a".to_string(),
                document: json!({ "_id": "a", "v": 2 }),
            }]
        );
        reopened.close().await.expect("close");
    }

    #[tokio::test]
    async fn closed_store_rejects_requests() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("adventures");
        seed_leveldb(&db_path, &[]);

        let mut store = SortedLogStore::open(&db_path).await.expect("open");
        store.close().await.expect("close");
        assert!(matches!(
            store.load_records().await,
            Err(StoreError::Database { operation: "load_records", .. })
        ));
    }

    #[tokio::test]
    async fn unparsable_value_is_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("adventures");
        seed_leveldb(
            &db_path,
            &[
                ("!adventures!a", r#"{"_id":"a"}"#),
                ("!adventures!b", "{truncated"),
            ],
        );

        let mut store = SortedLogStore::open(&db_path).await.expect("open");
        match store.load_records().await {
            Err(StoreError::Corrupt { line, message, .. }) => {
                assert_eq!(line, 2);
                assert!(message.starts_with("!adventures!b"));
            }
            other => panic!("expected Corrupt, got {other:?}"),
        }
        store.close().await.expect("close");
    }

    #[tokio::test]
    async fn missing_database_fails_to_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = SortedLogStore::open(dir.path().join("absent")).await;
        assert!(matches!(
            result,
            Err(StoreError::Database { operation: "open", .. })
        ));
    }
}
