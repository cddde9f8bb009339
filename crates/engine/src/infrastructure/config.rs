//! Migration configuration, read from the environment.

use std::path::PathBuf;

use rulecast_domain::TARGET_SYSTEM_ID;

use crate::infrastructure::stores::DEFAULT_CONCURRENCY;

pub const MODULE_PATH_VAR: &str = "RULECAST_MODULE_PATH";
pub const SOURCE_MODULE_VAR: &str = "RULECAST_SOURCE_MODULE";
pub const TARGET_MODULE_VAR: &str = "RULECAST_TARGET_MODULE";
pub const MACRO_OVERRIDES_VAR: &str = "RULECAST_MACRO_OVERRIDES";
pub const RULES_VAR: &str = "RULECAST_RULES";
pub const CONCURRENCY_VAR: &str = "RULECAST_CONCURRENCY";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var}={value:?} is invalid: {message}")]
    Invalid {
        var: &'static str,
        value: String,
        message: String,
    },
}

/// Everything one migration run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Root of the (already copied) module, holding `module.json`.
    pub module_path: PathBuf,
    /// Module id the content was authored under.
    pub source_module: String,
    /// Module id the content is migrated to.
    pub target_module: String,
    pub macro_overrides: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
    /// Records (and packs) converted at once.
    pub concurrency: usize,
}

impl MigrationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let module_path = get(MODULE_PATH_VAR)
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing(MODULE_PATH_VAR))?;

        let source_module = match get(SOURCE_MODULE_VAR) {
            Some(source) => source,
            None => module_path
                .file_name()
                .and_then(|name| name.to_str())
                .map(String::from)
                .ok_or_else(|| ConfigError::Invalid {
                    var: MODULE_PATH_VAR,
                    value: module_path.display().to_string(),
                    message: format!("cannot derive a module id; set {SOURCE_MODULE_VAR}"),
                })?,
        };

        let target_module = get(TARGET_MODULE_VAR)
            .unwrap_or_else(|| format!("{source_module}-{TARGET_SYSTEM_ID}"));

        let concurrency = match get(CONCURRENCY_VAR) {
            Some(value) => match value.parse::<usize>() {
                Ok(n) if n > 0 => n,
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        var: CONCURRENCY_VAR,
                        value,
                        message: "must be at least 1".to_string(),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: CONCURRENCY_VAR,
                        message: e.to_string(),
                        value,
                    })
                }
            },
            None => DEFAULT_CONCURRENCY,
        };

        Ok(Self {
            module_path,
            source_module,
            target_module,
            macro_overrides: get(MACRO_OVERRIDES_VAR).map(PathBuf::from),
            rules_path: get(RULES_VAR).map(PathBuf::from),
            concurrency,
        })
    }
}
