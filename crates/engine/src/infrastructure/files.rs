//! Loaders for the files around a migration: the module manifest, rule
//! tables and macro override scripts.

use std::io;
use std::path::{Path, PathBuf};

use rulecast_domain::RuleTables;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::entities::MacroOverrides;

/// Extension of macro override scripts.
const OVERRIDE_EXTENSION: &str = "js";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One compendium pack listed in `module.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackEntry {
    /// Store location relative to the module root.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The parts of `module.json` a migration reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ModuleManifest {
    #[serde(default)]
    pub packs: Vec<PackEntry>,
}

/// Read and deserialize a JSON file.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let contents = tokio::fs::read(path)
        .await
        .map_err(|e| LoadError::io(path, e))?;
    serde_json::from_slice(&contents).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub async fn load_manifest(module_path: &Path) -> Result<ModuleManifest, LoadError> {
    read_json(&module_path.join("module.json")).await
}

/// Rule tables from a JSON file. Tables the file leaves out keep their
/// built-in values.
pub async fn load_rule_tables(path: &Path) -> Result<RuleTables, LoadError> {
    let rules: RuleTables = read_json(path).await?;
    tracing::info!(path = %path.display(), "Loaded rule tables");
    Ok(rules)
}

/// Every `<macroId>.js` script in `dir`, keyed by macro id.
pub async fn load_macro_overrides(dir: &Path) -> Result<MacroOverrides, LoadError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| LoadError::io(dir, e))?;

    let mut overrides = MacroOverrides::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| LoadError::io(dir, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(OVERRIDE_EXTENSION) {
            continue;
        }
        let Some(macro_id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| LoadError::io(&path, e))?;
        if !file_type.is_file() {
            continue;
        }

        let command = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LoadError::io(&path, e))?;
        overrides.insert(macro_id, command);
    }

    tracing::info!(
        dir = %dir.display(),
        count = overrides.len(),
        "Loaded macro overrides"
    );
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manifest_keeps_only_packs() {
        let dir = tempfile::tempdir().expect("tempdir");
        tokio::fs::write(
            dir.path().join("module.json"),
            r#"{
                "id": "lost-mine",
                "title": "Lost Mine",
                "packs": [
                    { "name": "adventures", "path": "packs/adventures", "type": "Adventure" },
                    { "name": "monsters", "path": "packs/monsters.db", "type": "Actor" }
                ]
            }"#,
        )
        .await
        .expect("write");

        let manifest = load_manifest(dir.path()).await.expect("manifest");
        assert_eq!(
            manifest.packs,
            vec![
                PackEntry {
                    path: "packs/adventures".to_string(),
                    kind: "Adventure".to_string(),
                },
                PackEntry {
                    path: "packs/monsters.db".to_string(),
                    kind: "Actor".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn missing_manifest_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = load_manifest(dir.path()).await;
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[tokio::test]
    async fn partial_rule_tables_keep_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.json");
        tokio::fs::write(&path, r#"{ "coreSkills": ["Notice"] }"#)
            .await
            .expect("write");

        let rules = load_rule_tables(&path).await.expect("rules");
        assert_eq!(rules.core_skills, vec!["Notice".to_string()]);
        assert_eq!(rules.item_types, RuleTables::default().item_types);

        tokio::fs::write(&path, "{ not json").await.expect("write");
        assert!(matches!(
            load_rule_tables(&path).await,
            Err(LoadError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn overrides_load_js_files_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        tokio::fs::write(dir.path().join("aDxy7bzpgQgqzY9E.js"), "ui.notifications.info('hi');")
            .await
            .expect("write");
        tokio::fs::write(dir.path().join("README.md"), "notes")
            .await
            .expect("write");
        tokio::fs::create_dir(dir.path().join("nested.js"))
            .await
            .expect("mkdir");

        let overrides = load_macro_overrides(dir.path()).await.expect("overrides");
        assert_eq!(overrides.len(), 1);
        assert_eq!(
            overrides.get("aDxy7bzpgQgqzY9E"),
            Some("ui.notifications.info('hi');")
        );
    }
}
