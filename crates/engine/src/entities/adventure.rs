//! Adventure conversion: the aggregate stored as one record per adventure.

use serde_json::Value;

use super::Converter;
use crate::conversion::document::{for_each_object, into_document, map_array, map_values};
use crate::conversion::ConversionError;

impl Converter {
    /// Convert an adventure and every collection it owns.
    ///
    /// Collections are converted in a fixed order; the first failing document
    /// fails the whole adventure. The adventure `_id` is never touched.
    pub fn convert_adventure(&self, adventure: Value) -> Result<Value, ConversionError> {
        let mut doc = into_document(adventure, "Adventure", "_id")?;

        self.modules.rewrite_path_field(&mut doc, "img");
        self.modules.migrate_flags(&mut doc);

        map_array(&mut doc, "actors", |actor| self.convert_actor(actor))?;
        map_array(&mut doc, "items", |item| self.convert_item(item))?;
        map_values(&mut doc, "journal", |journal| self.convert_journal(journal));
        map_values(&mut doc, "macros", |macro_doc| self.convert_macro(macro_doc));
        map_values(&mut doc, "playlists", |playlist| self.convert_playlist(playlist));
        map_values(&mut doc, "scenes", |scene| self.convert_scene(scene));
        map_values(&mut doc, "tables", |table| self.convert_table(table));

        for collection in ["folders", "combats", "cards"] {
            for_each_object(&mut doc, collection, |owned| self.modules.migrate_flags(owned));
        }

        Ok(Value::Object(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::test_support::{converter, SOURCE, TARGET};
    use serde_json::json;

    fn phandelver() -> Value {
        json!({
            "_id": "adv0000000000001",
            "name": "Lost Mine",
            "img": "modules/lost-mine/cover.webp",
            "flags": { "lost-mine": { "imported": true }, "core": { "sort": 1 } },
            "actors": [{
                "_id": "act0000000000001",
                "name": "Sildar Hallwinter",
                "img": "modules/lost-mine/actors/sildar.webp",
                "system": {
                    "abilities": { "str": { "value": 14 }, "dex": { "value": 12 } }
                },
                "items": [
                    {
                        "_id": "itm0000000000001",
                        "name": "Shield of Faith",
                        "type": "spell",
                        "system": { "description": { "value": "" } },
                        "flags": { "lost-mine": { "i": 1 } }
                    },
                    {
                        "_id": "itm0000000000002",
                        "name": "Longsword",
                        "type": "weapon",
                        "system": {
                            "actionType": "mwak",
                            "proficient": true,
                            "damage": { "parts": [["1d8 + @mod", "slashing"]] }
                        }
                    }
                ],
                "prototypeToken": { "bar1": { "attribute": "attributes.hp" } },
                "effects": [],
                "flags": { "lost-mine": { "npc": true } }
            }],
            "items": [],
            "journal": [{
                "name": "Goblin Arrows",
                "pages": [{ "text": { "content": "<p>A DC 10 Wisdom (Survival) check.</p>" } }],
                "flags": { "lost-mine": { "j": 1 } }
            }],
            "macros": [{
                "_id": "mac0000000000001",
                "command": "game.settings.get('lost-mine', 'mode')",
                "flags": { "lost-mine": { "m": 1 } }
            }],
            "playlists": [{ "sounds": [{ "path": "modules/lost-mine/audio/ambush.ogg" }] }],
            "scenes": [{
                "name": "Goblin Ambush",
                "lights": [{ "config": { "bright": 20, "dim": 40 } }],
                "tokens": [{
                    "actorId": "act0000000000001",
                    "bar1": { "attribute": "attributes.hp" },
                    "bar2": { "attribute": "attributes.ac.value" },
                    "texture": { "src": "modules/lost-mine/tokens/sildar.webp" },
                    "flags": { "lost-mine": { "t": 1 } }
                }],
                "flags": { "lost-mine": { "s": 1 } }
            }],
            "tables": [{
                "results": [{ "text": "Perception", "flags": { "lost-mine": { "r": 1 } } }]
            }],
            "folders": [{ "name": "Chapter 1", "type": "Scene", "flags": { "lost-mine": { "f": 1 } } }],
            "combats": [{ "round": 0, "flags": { "lost-mine": { "c": 1 } } }],
            "cards": [{ "name": "Initiative", "flags": { "lost-mine": { "k": 1 } } }]
        })
    }

    /// Every flag bundle keyed by `module` anywhere in the tree.
    fn flag_bundles_for(value: &Value, module: &str) -> usize {
        match value {
            Value::Object(map) => {
                let here = map
                    .get("flags")
                    .and_then(Value::as_object)
                    .is_some_and(|flags| flags.contains_key(module));
                usize::from(here) + map.values().map(|v| flag_bundles_for(v, module)).sum::<usize>()
            }
            Value::Array(values) => values.iter().map(|v| flag_bundles_for(v, module)).sum(),
            _ => 0,
        }
    }

    fn item_named<'a>(actor: &'a Value, name: &str) -> &'a Value {
        actor["items"]
            .as_array()
            .and_then(|items| items.iter().find(|item| item["name"] == name))
            .unwrap_or_else(|| panic!("no item named {name}"))
    }

    #[test]
    fn adventure_end_to_end() {
        let converted = converter().convert_adventure(phandelver()).expect("convert");

        assert_eq!(converted["_id"], "adv0000000000001");
        assert_eq!(converted["img"], "modules/lost-mine-swade/cover.webp");

        let actor = &converted["actors"][0];
        assert_eq!(actor["_id"], "act0000000000001");
        assert_eq!(item_named(actor, "Shield of Faith")["type"], "power");

        let longsword = item_named(actor, "Longsword");
        assert_eq!(longsword["type"], "weapon");
        assert_eq!(longsword["system"]["actions"]["skill"], "Fighting");

        let fighting = item_named(actor, "Fighting");
        assert_eq!(fighting["type"], "skill");
        assert_eq!(fighting["system"]["die"], json!({ "sides": 8, "modifier": 0 }));

        let scene = &converted["scenes"][0];
        assert_eq!(scene["lights"][0]["config"], json!({ "bright": 4, "dim": 8 }));
        assert_eq!(scene["tokens"][0]["bar1"]["attribute"], json!(null));
        assert_eq!(scene["tokens"][0]["bar2"]["attribute"], json!(null));
        assert_eq!(
            scene["tokens"][0]["texture"]["src"],
            "modules/lost-mine-swade/tokens/sildar.webp"
        );

        assert_eq!(
            converted["journal"][0]["pages"][0]["text"]["content"],
            r#"<p>A <span title="DC 10">+2 🎲</span> <span title="Wisdom (Survival)">Survival</span> check.</p>"#
        );
        assert_eq!(
            converted["macros"][0]["command"],
            "game.settings.get('lost-mine-swade', 'mode')"
        );
        assert_eq!(
            converted["playlists"][0]["sounds"][0]["path"],
            "modules/lost-mine-swade/audio/ambush.ogg"
        );
        assert_eq!(
            converted["tables"][0]["results"][0]["text"],
            r#"<span title="Perception">Notice</span>"#
        );
    }

    #[test]
    fn no_source_flags_remain() {
        let source = phandelver();
        let bundles = flag_bundles_for(&source, SOURCE);
        assert!(bundles > 0);

        let converted = converter().convert_adventure(source).expect("convert");

        assert_eq!(flag_bundles_for(&converted, SOURCE), 0);
        assert_eq!(flag_bundles_for(&converted, TARGET), bundles);
        assert_eq!(converted["flags"]["core"], json!({ "sort": 1 }));
        for collection in ["folders", "combats", "cards"] {
            assert!(converted[collection][0]["flags"].get(TARGET).is_some(), "{collection}");
        }
        assert!(!converted.to_string().contains("modules/lost-mine/"));
    }

    #[test]
    fn unknown_item_fails_the_adventure() {
        let mut adventure = phandelver();
        adventure["items"] = json!([{ "_id": "bad", "name": "Half-Elf", "type": "race", "system": {} }]);

        match converter().convert_adventure(adventure) {
            Err(ConversionError::UnknownItemType { item_type, item }) => {
                assert_eq!(item_type, "race");
                assert_eq!(item["_id"], "bad");
            }
            other => panic!("expected UnknownItemType, got {other:?}"),
        }
    }

    #[test]
    fn missing_collections_are_left_alone() {
        let converted = converter()
            .convert_adventure(json!({ "_id": "adv2", "name": "Stub" }))
            .expect("convert");
        assert_eq!(converted, json!({ "_id": "adv2", "name": "Stub" }));
    }

    #[test]
    fn non_object_record_is_rejected() {
        let result = converter().convert_adventure(json!("not an adventure"));
        assert!(matches!(
            result,
            Err(ConversionError::MissingField { entity: "Adventure", .. })
        ));
    }
}
