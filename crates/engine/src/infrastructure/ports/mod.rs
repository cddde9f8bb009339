//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Pack stores (compaction-log file or LevelDB sorted log)
//! - Id generation (for testing)

mod error;
mod stores;
mod testing;

pub use error::StoreError;
pub use stores::{RecordStore, StoreBackend, StoredRecord};
pub use testing::IdGenerator;

#[cfg(test)]
pub use stores::MockRecordStore;
#[cfg(test)]
pub use testing::MockIdGenerator;
