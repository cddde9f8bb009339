//! Conversion error types.

use rulecast_domain::DomainError;
use serde_json::Value;

/// A document that cannot be converted.
///
/// Fatal for the aggregate record being converted; the record is left
/// untouched in its store and reported at the end of the run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    /// Item `type` outside the source vocabulary. Carries the offending item.
    #[error("Unknown item type `{item_type}` on item {}", document_label(.item))]
    UnknownItemType { item_type: String, item: Box<Value> },

    /// A field the conversion cannot do without.
    #[error("{entity} {} is missing `{field}`", document_label(.payload))]
    MissingField {
        entity: &'static str,
        field: &'static str,
        payload: Box<Value>,
    },

    /// A text rule could not be built from the rule tables.
    #[error("Invalid text rule `{rule}`: {message}")]
    InvalidRule { rule: &'static str, message: String },

    #[error(transparent)]
    Rules(#[from] DomainError),

    /// A converted block could not be represented as JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ConversionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl ConversionError {
    pub fn unknown_item_type(item_type: impl Into<String>, item: Value) -> Self {
        Self::UnknownItemType {
            item_type: item_type.into(),
            item: Box::new(item),
        }
    }

    pub fn missing_field(entity: &'static str, field: &'static str, payload: Value) -> Self {
        Self::MissingField {
            entity,
            field,
            payload: Box::new(payload),
        }
    }

    pub fn invalid_rule(rule: &'static str, message: impl ToString) -> Self {
        Self::InvalidRule {
            rule,
            message: message.to_string(),
        }
    }

    /// The document that failed, when the error carries one.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::UnknownItemType { item, .. } => Some(item.as_ref()),
            Self::MissingField { payload, .. } => Some(payload.as_ref()),
            Self::InvalidRule { .. } | Self::Rules(_) | Self::Serialization(_) => None,
        }
    }
}

/// `"Name" (id)` for error messages.
fn document_label(document: &Value) -> String {
    let name = document.get("name").and_then(Value::as_str);
    let id = document.get("_id").and_then(Value::as_str);
    match (name, id) {
        (Some(name), Some(id)) => format!("\"{name}\" ({id})"),
        (Some(name), None) => format!("\"{name}\""),
        (None, Some(id)) => id.to_string(),
        (None, None) => "<unnamed>".to_string(),
    }
}
