//! Token conversion, shared by placed scene tokens and actor prototype tokens.

use serde_json::{json, Value};

use super::Converter;
use crate::conversion::document::scale_nested_distance;

impl Converter {
    /// Reset actor overrides, clear resource bars and rescale vision and light.
    ///
    /// Never fails; anything but an object is returned unchanged.
    pub fn convert_token(&self, token: Value) -> Value {
        let Value::Object(mut doc) = token else {
            return token;
        };

        doc.insert("actorData".to_string(), json!({}));
        if doc.contains_key("delta") {
            doc.insert("delta".to_string(), json!({}));
        }

        self.modules.rewrite_nested_path(&mut doc, "texture", "src");

        for bar in ["bar1", "bar2"] {
            match doc.get_mut(bar) {
                Some(Value::Object(inner)) => {
                    inner.insert("attribute".to_string(), Value::Null);
                }
                _ => {
                    doc.insert(bar.to_string(), json!({ "attribute": null }));
                }
            }
        }

        self.modules.migrate_flags(&mut doc);

        scale_nested_distance(&mut doc, "light", "bright");
        scale_nested_distance(&mut doc, "light", "dim");
        scale_nested_distance(&mut doc, "sight", "range");

        Value::Object(doc)
    }
}

#[cfg(test)]
mod tests {
    use crate::entities::test_support::{converter, TARGET};
    use serde_json::{json, Value};

    #[test]
    fn token_is_reset_and_rescaled() {
        let token = json!({
            "name": "Goblin",
            "actorData": { "name": "Boss Goblin" },
            "delta": { "system": { "hp": 3 } },
            "texture": { "src": "modules/lost-mine/tokens/goblin.webp" },
            "bar1": { "attribute": "attributes.hp" },
            "light": { "bright": 20, "dim": 40 },
            "sight": { "range": 60, "enabled": true },
            "flags": { "lost-mine": { "boss": true } }
        });

        assert_eq!(
            converter().convert_token(token),
            json!({
                "name": "Goblin",
                "actorData": {},
                "delta": {},
                "texture": { "src": "modules/lost-mine-swade/tokens/goblin.webp" },
                "bar1": { "attribute": null },
                "bar2": { "attribute": null },
                "light": { "bright": 4, "dim": 8 },
                "sight": { "range": 12, "enabled": true },
                "flags": { TARGET: { "boss": true } }
            })
        );
    }

    #[test]
    fn light_radii_divide_by_five() {
        let token = json!({ "light": { "bright": 30, "dim": 60 } });
        let converted = converter().convert_token(token);
        assert_eq!(converted["light"], json!({ "bright": 6, "dim": 12 }));
    }

    #[test]
    fn delta_only_reset_when_present() {
        let converted = converter().convert_token(json!({}));
        assert!(converted.get("delta").is_none());
        assert_eq!(converted["actorData"], json!({}));
    }

    #[test]
    fn non_object_token_passes_through() {
        assert_eq!(converter().convert_token(Value::Null), Value::Null);
    }
}
