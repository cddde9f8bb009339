//! Module migration: convert every adventure pack a module ships.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::conversion::ConversionError;
use crate::entities::Converter;
use crate::infrastructure::files::{load_manifest, LoadError};
use crate::infrastructure::ports::{StoreBackend, StoreError};
use crate::infrastructure::stores::{RecordFailure, StoreAdapter};

/// Pack type holding adventure aggregates.
const ADVENTURE_PACK: &str = "Adventure";

/// Why a single record was not converted.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Conversion task failed: {0}")]
    Task(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Cannot read module manifest: {0}")]
    Manifest(#[source] LoadError),

    #[error("Cannot load rule tables: {0}")]
    Rules(#[source] LoadError),

    #[error("Cannot load macro overrides: {0}")]
    Overrides(#[source] LoadError),

    #[error("Cannot build converter: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Store error in {}: {source}", .path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("{} record(s) failed to convert in {}", .failures.len(), .path.display())]
    RecordsFailed {
        path: PathBuf,
        failures: Vec<RecordFailure<RecordError>>,
    },

    #[error("Pack task failed: {0}")]
    Task(String),

    #[error("{} pack(s) failed to migrate", .0.len())]
    PacksFailed(Vec<MigrationError>),
}

/// A pack that converted cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSummary {
    pub path: PathBuf,
    pub backend: StoreBackend,
    pub converted: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub packs: Vec<PackSummary>,
}

impl MigrationSummary {
    pub fn records(&self) -> usize {
        self.packs.iter().map(|p| p.converted).sum()
    }
}

/// Converts the adventure packs of one module in place.
pub struct MigrateModule {
    converter: Arc<Converter>,
    adapter: StoreAdapter,
}

impl MigrateModule {
    pub fn new(converter: Arc<Converter>, adapter: StoreAdapter) -> Self {
        Self { converter, adapter }
    }

    /// Convert every `Adventure` pack listed in `<module_path>/module.json`.
    ///
    /// Packs run concurrently and independently: a failing pack does not stop
    /// the others. All failures are reported together at the end.
    pub async fn execute(&self, module_path: &Path) -> Result<MigrationSummary, MigrationError> {
        let manifest = load_manifest(module_path)
            .await
            .map_err(MigrationError::Manifest)?;

        let mut tasks = Vec::new();
        for pack in manifest.packs {
            if pack.kind != ADVENTURE_PACK {
                tracing::debug!(pack = %pack.path, kind = %pack.kind, "Skipping pack");
                continue;
            }
            let path = module_path.join(&pack.path);
            let converter = self.converter.clone();
            let adapter = self.adapter.clone();
            tasks.push(tokio::spawn(async move {
                migrate_pack(converter, adapter, path).await
            }));
        }

        tracing::info!(
            module = %module_path.display(),
            packs = tasks.len(),
            "Migrating adventure packs"
        );

        let mut summary = MigrationSummary::default();
        let mut errors = Vec::new();
        for joined in futures_util::future::join_all(tasks).await {
            match joined {
                Ok(Ok(pack)) => summary.packs.push(pack),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Pack migration failed");
                    errors.push(e);
                }
                Err(e) => errors.push(MigrationError::Task(e.to_string())),
            }
        }

        match errors.len() {
            0 => {
                tracing::info!(
                    packs = summary.packs.len(),
                    records = summary.records(),
                    "Migration complete"
                );
                Ok(summary)
            }
            1 => Err(errors.remove(0)),
            _ => Err(MigrationError::PacksFailed(errors)),
        }
    }
}

/// Convert one pack store; the store is closed whatever happens.
async fn migrate_pack(
    converter: Arc<Converter>,
    adapter: StoreAdapter,
    path: PathBuf,
) -> Result<PackSummary, MigrationError> {
    tracing::info!(path = %path.display(), "Converting pack");

    let report = adapter
        .convert_store(&path, |document: Value| {
            let converter = converter.clone();
            async move {
                match tokio::task::spawn_blocking(move || converter.convert_adventure(document))
                    .await
                {
                    Ok(result) => result.map_err(RecordError::from),
                    Err(e) => Err(RecordError::Task(e.to_string())),
                }
            }
        })
        .await
        .map_err(|source| MigrationError::Store {
            path: path.clone(),
            source,
        })?;

    if !report.is_clean() {
        return Err(MigrationError::RecordsFailed {
            path,
            failures: report.failures,
        });
    }

    tracing::info!(
        path = %path.display(),
        backend = %report.backend,
        records = report.converted,
        "Pack converted"
    );
    Ok(PackSummary {
        path,
        backend: report.backend,
        converted: report.converted,
    })
}
