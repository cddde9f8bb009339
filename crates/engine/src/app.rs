//! Application state and composition.

use std::path::PathBuf;
use std::sync::Arc;

use rulecast_domain::{RuleTables, SOURCE_SYSTEM_ID, TARGET_SYSTEM_ID};

use crate::conversion::ModuleIds;
use crate::entities::{Converter, MacroOverrides};
use crate::infrastructure::{
    config::MigrationConfig,
    files::{load_macro_overrides, load_rule_tables},
    ids::SystemIds,
    ports::IdGenerator,
    stores::StoreAdapter,
};
use crate::use_cases::{self, MigrationError, MigrationSummary};

/// Main application state.
///
/// Holds the use cases for one module migration.
pub struct App {
    pub module_path: PathBuf,
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub migration: use_cases::MigrationUseCases,
}

impl App {
    /// Create a new App around an already built converter.
    pub fn new(module_path: PathBuf, converter: Arc<Converter>, adapter: StoreAdapter) -> Self {
        let migrate = Arc::new(use_cases::MigrateModule::new(converter, adapter));
        Self {
            module_path,
            use_cases: UseCases {
                migration: use_cases::MigrationUseCases::new(migrate),
            },
        }
    }

    /// Load rule tables and macro overrides named by `config` and wire
    /// everything up.
    pub async fn from_config(config: &MigrationConfig) -> Result<Self, MigrationError> {
        let rules = match &config.rules_path {
            Some(path) => load_rule_tables(path)
                .await
                .map_err(MigrationError::Rules)?,
            None => RuleTables::default(),
        };

        let macros = match &config.macro_overrides {
            Some(dir) => load_macro_overrides(dir)
                .await
                .map_err(MigrationError::Overrides)?,
            None => MacroOverrides::default(),
        };

        let ids: Arc<dyn IdGenerator> = Arc::new(SystemIds::new());
        let converter = Converter::new(
            Arc::new(rules),
            ModuleIds::new(&config.source_module, &config.target_module),
            macros,
            ids,
        )?;

        tracing::info!(
            from = SOURCE_SYSTEM_ID,
            to = TARGET_SYSTEM_ID,
            source = %config.source_module,
            target = %config.target_module,
            concurrency = config.concurrency,
            "Converter ready"
        );

        Ok(Self::new(
            config.module_path.clone(),
            Arc::new(converter),
            StoreAdapter::new(config.concurrency),
        ))
    }

    /// Migrate the configured module.
    pub async fn run(&self) -> Result<MigrationSummary, MigrationError> {
        self.use_cases
            .migration
            .migrate
            .execute(&self.module_path)
            .await
    }
}
