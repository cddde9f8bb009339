//! Use cases - orchestration over entity converters and pack stores.

pub mod migrate;

use std::sync::Arc;

pub use migrate::{MigrateModule, MigrationError, MigrationSummary, PackSummary, RecordError};

/// Container for the migration use cases.
pub struct MigrationUseCases {
    pub migrate: Arc<MigrateModule>,
}

impl MigrationUseCases {
    pub fn new(migrate: Arc<MigrateModule>) -> Self {
        Self { migrate }
    }
}
