//! Macro conversion.
//!
//! Macro scripts are opaque except for asset paths and calls scoped to the
//! module id (`game.settings.get('<module>', ...)`, `getFlag('<module>', ...)`).
//! Scripts that need more than that are replaced wholesale by an override.

use std::collections::HashMap;

use regex_lite::Regex;
use serde_json::Value;

use super::Converter;
use crate::conversion::ConversionError;

/// Replacement macro scripts keyed by macro `_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroOverrides {
    commands: HashMap<String, String>,
}

impl MacroOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, macro_id: impl Into<String>, command: impl Into<String>) {
        self.commands.insert(macro_id.into(), command.into());
    }

    pub fn get(&self, macro_id: &str) -> Option<&str> {
        self.commands.get(macro_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl FromIterator<(String, String)> for MacroOverrides {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

/// Matches `get('<source>'`, `set("<source>"`, `getFlag(...` and `register(...`.
pub(super) fn module_call_pattern(source: &str) -> Result<Regex, ConversionError> {
    let pattern = format!(
        r#"\b(get|set|getFlag|register)\((['"]){}(['"])"#,
        regex_lite::escape(source)
    );
    Regex::new(&pattern).map_err(|e| ConversionError::invalid_rule("module-calls", e))
}

impl Converter {
    /// Rewrite a macro's paths and module-scoped calls, applying any override.
    pub fn convert_macro(&self, macro_doc: Value) -> Value {
        let Value::Object(mut doc) = macro_doc else {
            return macro_doc;
        };

        self.modules.rewrite_path_field(&mut doc, "img");
        self.modules.rewrite_path_field(&mut doc, "command");

        let id = doc.get("_id").and_then(Value::as_str).unwrap_or_default();
        if let Some(command) = self.macros.get(id) {
            tracing::debug!(macro_id = %id, "Applying macro override");
            doc.insert("command".to_string(), Value::String(command.to_string()));
        }

        if let Some(Value::String(command)) = doc.get_mut("command") {
            let target = &self.modules.target;
            *command = self
                .module_calls
                .replace_all(command, |caps: &regex_lite::Captures<'_>| {
                    format!("{}({}{}{}", &caps[1], &caps[2], target, &caps[3])
                })
                .into_owned();
        }

        self.modules.migrate_flags(&mut doc);

        Value::Object(doc)
    }
}
