//! Pieces shared by several converters.

use serde::Serialize;
use serde_json::Value;

use super::Converter;
use crate::conversion::document::{for_each_object, Document};

/// An item the migration creates rather than converts.
#[derive(Debug, Serialize)]
pub(super) struct DerivedItem<S> {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub img: &'static str,
    pub system: S,
    pub effects: Vec<Value>,
}

/// Upper-case the first character.
pub(super) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Converter {
    /// Disable every effect and migrate its flags.
    ///
    /// Effects target source-schema attribute keys, so none stays active.
    pub(super) fn convert_effects(&self, doc: &mut Document) {
        for_each_object(doc, "effects", |effect| {
            effect.insert("disabled".to_string(), Value::Bool(true));
            self.modules.migrate_flags(effect);
        });
    }

    /// Target attribute fed by a source ability code.
    pub(super) fn attribute_for_ability(&self, ability: &str) -> Option<&str> {
        self.rules
            .attribute_sources
            .iter()
            .find(|source| source.abilities.iter().any(|a| a == ability))
            .map(|source| source.attribute.as_str())
    }

    pub(super) fn derived_item<S>(
        &self,
        name: &str,
        kind: &'static str,
        system: S,
    ) -> DerivedItem<S> {
        DerivedItem {
            id: self.ids.generate_id(),
            name: name.to_string(),
            kind,
            img: "",
            system,
            effects: Vec::new(),
        }
    }
}
