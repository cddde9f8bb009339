//! Field-level helpers over schemaless JSON documents.
//!
//! Every helper is a soft operation: a missing or differently shaped field
//! is left alone rather than reported.

use rulecast_domain::feet_to_inches;
use serde_json::{Map, Value};

use super::error::ConversionError;

pub(crate) type Document = Map<String, Value>;

/// Unwrap an object, or fail naming the field the converter needed first.
pub(crate) fn into_document(
    value: Value,
    entity: &'static str,
    field: &'static str,
) -> Result<Document, ConversionError> {
    match value {
        Value::Object(doc) => Ok(doc),
        other => Err(ConversionError::missing_field(entity, field, other)),
    }
}

/// Source and target module ids, used for asset paths and flag scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleIds {
    pub source: String,
    pub target: String,
    source_prefix: String,
    target_prefix: String,
}

impl ModuleIds {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            source_prefix: format!("modules/{source}/"),
            target_prefix: format!("modules/{target}/"),
            source,
            target,
        }
    }

    /// Point `modules/<source>/...` asset paths at the target module.
    pub fn rewrite_path(&self, text: &str) -> String {
        text.replace(&self.source_prefix, &self.target_prefix)
    }

    /// Move the flag bundle scoped to the source module under the target id.
    ///
    /// A bundle already under the target id is overwritten.
    pub(crate) fn migrate_flags(&self, doc: &mut Document) {
        if self.source == self.target {
            return;
        }
        let Some(Value::Object(flags)) = doc.get_mut("flags") else {
            return;
        };
        match flags.remove(&self.source) {
            Some(Value::Null) | None => {}
            Some(bundle) => {
                flags.insert(self.target.clone(), bundle);
            }
        }
    }

    /// Rewrite `doc[key]` when it is a string.
    pub(crate) fn rewrite_path_field(&self, doc: &mut Document, key: &str) {
        if let Some(Value::String(path)) = doc.get_mut(key) {
            *path = self.rewrite_path(path);
        }
    }

    /// Rewrite `doc[parent][key]` when it is a string.
    pub(crate) fn rewrite_nested_path(&self, doc: &mut Document, parent: &str, key: &str) {
        if let Some(Value::Object(inner)) = doc.get_mut(parent) {
            self.rewrite_path_field(inner, key);
        }
    }
}

/// JSON number that stays an integer when `n` is whole.
pub(crate) fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// JSON number for a distance in feet, converted to inches.
pub(crate) fn inches_value(feet: f64) -> Value {
    number_value(feet_to_inches(feet))
}

/// Convert `doc[key]` from feet to inches when it is a number.
pub(crate) fn scale_distance(doc: &mut Document, key: &str) {
    if let Some(value) = doc.get_mut(key) {
        if let Some(feet) = value.as_f64() {
            *value = inches_value(feet);
        }
    }
}

/// Convert `doc[parent][key]` from feet to inches when it is a number.
pub(crate) fn scale_nested_distance(doc: &mut Document, parent: &str, key: &str) {
    if let Some(Value::Object(inner)) = doc.get_mut(parent) {
        scale_distance(inner, key);
    }
}

/// Run `f` on every object element of the array `doc[key]`.
pub(crate) fn for_each_object(doc: &mut Document, key: &str, mut f: impl FnMut(&mut Document)) {
    if let Some(Value::Array(elements)) = doc.get_mut(key) {
        for element in elements.iter_mut() {
            if let Value::Object(inner) = element {
                f(inner);
            }
        }
    }
}

/// Replace every element of the array `doc[key]` with `f(element)`.
pub(crate) fn map_values(doc: &mut Document, key: &str, mut f: impl FnMut(Value) -> Value) {
    if let Some(Value::Array(elements)) = doc.get_mut(key) {
        for element in elements.iter_mut() {
            *element = f(std::mem::take(element));
        }
    }
}

/// Fallible [`map_values`].
///
/// Stops at the first error, leaving `doc[key]` an empty array. Callers
/// discard the document on error.
pub(crate) fn map_array<E>(
    doc: &mut Document,
    key: &str,
    mut f: impl FnMut(Value) -> Result<Value, E>,
) -> Result<(), E> {
    if let Some(Value::Array(elements)) = doc.get_mut(key) {
        let converted = std::mem::take(elements)
            .into_iter()
            .map(&mut f)
            .collect::<Result<Vec<_>, E>>()?;
        *elements = converted;
    }
    Ok(())
}

/// JavaScript-style truthiness of an optional field.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Non-empty string at a JSON pointer.
pub(crate) fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Number at a JSON pointer, accepting numeric strings and `{ "value": n }`.
pub(crate) fn number_at(value: &Value, pointer: &str) -> Option<f64> {
    fn number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Object(inner) => inner.get("value").and_then(number),
            _ => None,
        }
    }
    value.pointer(pointer).and_then(number)
}

/// Whether an item carries a property code.
///
/// Properties are stored either as `{ "fin": true, ... }` or as `["fin", ...]`.
pub(crate) fn has_property(system: &Value, code: &str) -> bool {
    match system.get("properties") {
        Some(Value::Object(properties)) => is_truthy(properties.get(code)),
        Some(Value::Array(properties)) => properties.iter().any(|p| p.as_str() == Some(code)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn modules() -> ModuleIds {
        ModuleIds::new("lost-mine", "lost-mine-swade")
    }

    #[test]
    fn rewrite_path_only_touches_module_prefix() {
        let m = modules();
        assert_eq!(
            m.rewrite_path("modules/lost-mine/art/goblin.webp"),
            "modules/lost-mine-swade/art/goblin.webp"
        );
        assert_eq!(m.rewrite_path("icons/svg/mystery-man.svg"), "icons/svg/mystery-man.svg");
        assert_eq!(
            m.rewrite_path("<img src=\"modules/lost-mine/a.png\"> modules/lost-mine-extra/b.png"),
            "<img src=\"modules/lost-mine-swade/a.png\"> modules/lost-mine-extra/b.png"
        );
    }

    #[test]
    fn migrate_flags_moves_source_bundle() {
        let m = modules();
        let mut d = doc(json!({
            "flags": {
                "lost-mine": { "chapter": 2 },
                "lost-mine-swade": { "stale": true },
                "core": { "sheetClass": "" }
            }
        }));
        m.migrate_flags(&mut d);
        assert_eq!(
            Value::Object(d),
            json!({
                "flags": {
                    "lost-mine-swade": { "chapter": 2 },
                    "core": { "sheetClass": "" }
                }
            })
        );
    }

    #[test]
    fn migrate_flags_tolerates_missing_flags() {
        let m = modules();
        let mut d = doc(json!({ "name": "x" }));
        m.migrate_flags(&mut d);
        assert_eq!(Value::Object(d), json!({ "name": "x" }));

        let mut d = doc(json!({ "flags": null }));
        m.migrate_flags(&mut d);
        assert_eq!(Value::Object(d), json!({ "flags": null }));
    }

    #[test]
    fn distances_divide_by_five() {
        let mut d = doc(json!({ "bright": 30, "dim": 7, "range": "far", "light": { "dim": 60.0 } }));
        scale_distance(&mut d, "bright");
        scale_distance(&mut d, "dim");
        scale_distance(&mut d, "range");
        scale_distance(&mut d, "missing");
        scale_nested_distance(&mut d, "light", "dim");
        assert_eq!(
            Value::Object(d),
            json!({ "bright": 6, "dim": 1.4, "range": "far", "light": { "dim": 12 } })
        );
    }

    #[test]
    fn map_array_stops_at_first_error() {
        let mut d = doc(json!({ "items": [1, 2, 3] }));
        let result = map_array(&mut d, "items", |v| match v.as_i64() {
            Some(2) => Err("two"),
            _ => Ok(v),
        });
        assert_eq!(result, Err("two"));
        assert_eq!(d["items"], json!([]));

        let mut d = doc(json!({ "items": [1, 2] }));
        map_array::<()>(&mut d, "items", |v| Ok(json!(v.as_i64().unwrap_or(0) * 10)))
            .expect("maps");
        assert_eq!(d["items"], json!([10, 20]));
    }

    #[test]
    fn numbers_are_read_leniently() {
        let v = json!({ "save": { "dc": "13" }, "range": { "value": 30 }, "cr": { "value": 0.5 } });
        assert_eq!(number_at(&v, "/save/dc"), Some(13.0));
        assert_eq!(number_at(&v, "/range/value"), Some(30.0));
        assert_eq!(number_at(&v, "/cr"), Some(0.5));
        assert_eq!(number_at(&v, "/missing"), None);
        assert_eq!(number_value(4.0), json!(4));
        assert_eq!(number_value(0.25), json!(0.25));
    }

    #[test]
    fn into_document_rejects_non_objects() {
        assert!(into_document(json!({}), "Actor", "system").is_ok());
        let err = into_document(json!("nope"), "Actor", "system").expect_err("string");
        assert_eq!(err.payload(), Some(&json!("nope")));
    }

    #[test]
    fn truthiness_matches_javascript() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(is_truthy(Some(&json!(1))));
        assert!(is_truthy(Some(&json!("x"))));
        assert!(is_truthy(Some(&json!([]))));
    }

    #[test]
    fn properties_accept_both_shapes() {
        assert!(has_property(&json!({ "properties": { "fin": true } }), "fin"));
        assert!(!has_property(&json!({ "properties": { "fin": false } }), "fin"));
        assert!(has_property(&json!({ "properties": ["thr", "fin"] }), "fin"));
        assert!(!has_property(&json!({ "properties": ["thr"] }), "fin"));
        assert!(!has_property(&json!({}), "fin"));
    }
}
