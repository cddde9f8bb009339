//! Item conversion.

use std::collections::BTreeMap;

use rulecast_domain::game_systems::swade::{ATHLETICS, FIGHTING, SHOOTING};
use rulecast_domain::{difficulty_to_modifier, modifier_label, weapon_range};
use serde::Serialize;
use serde_json::Value;

use super::common::capitalize;
use super::Converter;
use crate::conversion::document::{has_property, into_document, number_at, str_at};
use crate::conversion::ConversionError;

/// Weapon properties worth a note, in note order.
const NOTED_PROPERTIES: [(&str, &str); 5] = [
    ("mgc", "magic"),
    ("ada", "adamantine"),
    ("sil", "alchemical silver"),
    ("rch", "reach"),
    ("two", "two hands"),
];

/// Replacement `system` block for a converted item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemSystem {
    description: String,
    is_arcane_background: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantity: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<Value>,
    category: String,
    is_ammo: bool,
    equippable: bool,
    #[serde(flatten)]
    weapon: Option<WeaponStats>,
    #[serde(flatten)]
    armor: Option<ArmorStats>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WeaponStats {
    actions: WeaponActions,
    ap: &'static str,
    current_shots: &'static str,
    shots: &'static str,
    damage: String,
    equip_status: u8,
    min_str: String,
    notes: String,
    parry: i32,
    range: String,
    rof: &'static str,
    is_heavy_weapon: bool,
    auto_reload: bool,
}

#[derive(Debug, Serialize)]
struct WeaponActions {
    skill: &'static str,
    additional: BTreeMap<String, AdditionalAction>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdditionalAction {
    name: &'static str,
    rof: Option<i32>,
    shots_used: Option<i32>,
    skill_mod: &'static str,
    skill_override: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArmorStats {
    armor: i32,
    is_heavy_armor: bool,
    is_natural_armor: bool,
    locations: ArmorLocations,
    min_str: &'static str,
    notes: String,
    toughness: &'static str,
    equip_status: u8,
}

#[derive(Debug, Serialize)]
struct ArmorLocations {
    head: bool,
    torso: bool,
    arms: bool,
    legs: bool,
}

/// Leading die of a damage formula: `d8` in `d8 + @mod`.
fn leading_die(formula: &str) -> Option<&str> {
    let digits = formula.strip_prefix('d')?;
    let len = digits.bytes().take_while(u8::is_ascii_digit).count();
    (len > 0).then(|| &formula[..=len])
}

impl Converter {
    /// Convert an item: map its type and replace its `system` block.
    ///
    /// Fails when `type` is missing or unmapped, or `system` is not an object.
    pub fn convert_item(&self, item: Value) -> Result<Value, ConversionError> {
        let mut doc = into_document(item, "Item", "type")?;

        let Some(source_type) = doc.get("type").and_then(Value::as_str).map(str::to_string) else {
            return Err(ConversionError::missing_field("Item", "type", Value::Object(doc)));
        };
        if !doc.get("system").is_some_and(Value::is_object) {
            return Err(ConversionError::missing_field("Item", "system", Value::Object(doc)));
        }

        let system = doc.remove("system").unwrap_or_default();
        let target_type = match self
            .rules
            .map_item_type(&source_type, str_at(&system, "/armor/type"))
        {
            Ok(target) => target.to_string(),
            Err(_) => {
                doc.insert("system".to_string(), system);
                return Err(ConversionError::unknown_item_type(
                    source_type,
                    Value::Object(doc),
                ));
            }
        };

        let name = doc.get("name").and_then(Value::as_str).unwrap_or_default();
        let converted = self.item_system(&target_type, name, &system)?;

        self.modules.rewrite_path_field(&mut doc, "img");
        doc.insert("type".to_string(), Value::String(target_type));
        self.modules.migrate_flags(&mut doc);
        self.convert_effects(&mut doc);
        doc.insert("system".to_string(), converted);

        Ok(Value::Object(doc))
    }

    fn item_system(
        &self,
        target_type: &str,
        name: &str,
        system: &Value,
    ) -> Result<Value, ConversionError> {
        let mut description = str_at(system, "/description/unidentified")
            .map(|text| self.text.secret(text))
            .unwrap_or_default();
        description.push_str(
            &self
                .text
                .apply(str_at(system, "/description/value").unwrap_or_default()),
        );

        let category = format!(
            "{} {}",
            str_at(system, "/rarity").unwrap_or_default(),
            str_at(system, "/baseItem").unwrap_or_default()
        )
        .trim()
        .to_string();

        let block = ItemSystem {
            description,
            is_arcane_background: target_type == "edge"
                && name.eq_ignore_ascii_case("spellcasting"),
            weight: system.get("weight").cloned(),
            price: system.get("price").cloned(),
            quantity: system.get("quantity").cloned(),
            source: system.get("source").cloned(),
            category,
            is_ammo: has_property(system, "amm"),
            equippable: str_at(system, "/armor/type").is_some(),
            weapon: (target_type == "weapon").then(|| self.weapon_stats(system)),
            armor: (target_type == "armor").then(|| self.armor_stats(system)),
        };

        Ok(serde_json::to_value(block)?)
    }

    fn weapon_stats(&self, system: &Value) -> WeaponStats {
        let action_type = str_at(system, "/actionType");
        let formula = str_at(system, "/damage/parts/0/0").unwrap_or_default();

        let mut additional = BTreeMap::new();
        if action_type == Some("mwak") && has_property(system, "thr") {
            additional.insert(
                self.ids.generate_id(),
                AdditionalAction {
                    name: "Throw",
                    rof: None,
                    shots_used: None,
                    skill_mod: "",
                    skill_override: ATHLETICS,
                    kind: "skill",
                },
            );
        }

        let mut notes: Vec<String> = NOTED_PROPERTIES
            .iter()
            .filter(|(code, _)| has_property(system, code))
            .map(|(_, note)| note.to_string())
            .collect();
        notes.extend(self.save_note(system));

        WeaponStats {
            actions: WeaponActions {
                skill: match action_type {
                    Some("mwak") => FIGHTING,
                    Some("rwak") => SHOOTING,
                    _ => ATHLETICS,
                },
                additional,
            },
            ap: if has_property(system, "mgc") { "1" } else { "0" },
            current_shots: "0",
            shots: "0",
            damage: formula.replace("@mod", "@str"),
            equip_status: 4,
            min_str: leading_die(formula).unwrap_or("d4").to_string(),
            notes: notes.join(", "),
            parry: 0,
            range: number_at(system, "/range/value")
                .filter(|feet| *feet > 0.0)
                .map(weapon_range)
                .unwrap_or_default(),
            rof: "0",
            is_heavy_weapon: has_property(system, "hvy"),
            auto_reload: !has_property(system, "lod") && !has_property(system, "rel"),
        }
    }

    fn armor_stats(&self, system: &Value) -> ArmorStats {
        let (armor, min_str) = match str_at(system, "/armor/type") {
            Some("light") => (2, "d6"),
            Some("medium") => (3, "d8"),
            Some("heavy") => (4, "d10"),
            _ => (0, "d4"),
        };

        ArmorStats {
            armor,
            is_heavy_armor: false,
            is_natural_armor: false,
            locations: ArmorLocations {
                head: false,
                torso: true,
                arms: true,
                legs: false,
            },
            min_str,
            notes: self.save_note(system).unwrap_or_default(),
            toughness: "",
            equip_status: 3,
        }
    }

    /// `Vigor roll -2 (DC 20)` for items that force a save.
    fn save_note(&self, system: &Value) -> Option<String> {
        let dc = number_at(system, "/save/dc").filter(|dc| *dc > 0.0)?.round() as i32;
        let modifier = modifier_label(difficulty_to_modifier(dc));
        let attribute = str_at(system, "/save/ability")
            .and_then(|ability| self.attribute_for_ability(ability))
            .map(capitalize);

        Some(match attribute {
            Some(attribute) => format!("{attribute} roll {modifier} (DC {dc})"),
            None => format!("roll {modifier} (DC {dc})"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::test_support::{converter, TARGET};
    use serde_json::json;

    #[test]
    fn leading_die_of_formula() {
        assert_eq!(leading_die("d8 + @mod"), Some("d8"));
        assert_eq!(leading_die("d12"), Some("d12"));
        assert_eq!(leading_die("2d6 + @mod"), None);
        assert_eq!(leading_die("d"), None);
        assert_eq!(leading_die(""), None);
    }

    #[test]
    fn spell_becomes_power() {
        let item = json!({
            "_id": "spell1",
            "name": "Fire Bolt",
            "type": "spell",
            "img": "modules/lost-mine/icons/fire.webp",
            "system": {
                "description": { "value": "<p>Make a DC 13 Dexterity saving throw.</p>" },
                "source": "PHB"
            },
            "effects": []
        });
        let converted = converter().convert_item(item).expect("converts");
        assert_eq!(converted["type"], "power");
        assert_eq!(converted["img"], "modules/lost-mine-swade/icons/fire.webp");
        assert_eq!(
            converted["system"]["description"],
            r#"<p>Make a <span title="DC 13">🎲</span> Agility roll.</p>"#
        );
        assert_eq!(converted["system"]["source"], "PHB");
        assert!(converted["system"].get("actions").is_none());
        assert!(converted["system"].get("armor").is_none());
    }

    #[test]
    fn melee_thrown_weapon() {
        let item = json!({
            "_id": "w1",
            "name": "Handaxe",
            "type": "weapon",
            "system": {
                "actionType": "mwak",
                "damage": { "parts": [["d6 + @mod", "slashing"]] },
                "properties": { "thr": true, "lgt": true, "mgc": true },
                "range": { "value": 20, "long": 60 },
                "rarity": "common",
                "baseItem": "handaxe",
                "weight": 2,
                "quantity": 1
            },
            "effects": [{ "disabled": false }],
            "flags": { "lost-mine": { "ref": 1 } }
        });
        let converted = converter().convert_item(item).expect("converts");
        let system = &converted["system"];

        assert_eq!(converted["type"], "weapon");
        assert_eq!(converted["effects"][0]["disabled"], true);
        assert_eq!(converted["flags"], json!({ TARGET: { "ref": 1 } }));
        assert_eq!(system["actions"]["skill"], "Fighting");
        assert_eq!(
            system["actions"]["additional"],
            json!({
                "id00000000000000": {
                    "name": "Throw",
                    "rof": null,
                    "shotsUsed": null,
                    "skillMod": "",
                    "skillOverride": "Athletics",
                    "type": "skill"
                }
            })
        );
        assert_eq!(system["damage"], "d6 + @str");
        assert_eq!(system["minStr"], "d6");
        assert_eq!(system["ap"], "1");
        assert_eq!(system["notes"], "magic");
        assert_eq!(system["range"], "4/8/16");
        assert_eq!(system["equipStatus"], 4);
        assert_eq!(system["autoReload"], true);
        assert_eq!(system["isHeavyWeapon"], false);
        assert_eq!(system["category"], "common handaxe");
        assert_eq!(system["weight"], 2);
        assert_eq!(system["equippable"], false);
    }

    #[test]
    fn ranged_weapon_with_array_properties() {
        let item = json!({
            "name": "Heavy Crossbow",
            "type": "weapon",
            "system": {
                "actionType": "rwak",
                "damage": { "parts": [["1d10 + @mod", "piercing"]] },
                "properties": ["amm", "hvy", "lod", "two"],
                "range": { "value": 100 }
            }
        });
        let converted = converter().convert_item(item).expect("converts");
        let system = &converted["system"];

        assert_eq!(system["actions"]["skill"], "Shooting");
        assert_eq!(system["actions"]["additional"], json!({}));
        assert_eq!(system["minStr"], "d4");
        assert_eq!(system["isAmmo"], true);
        assert_eq!(system["isHeavyWeapon"], true);
        assert_eq!(system["autoReload"], false);
        assert_eq!(system["notes"], "two hands");
        assert_eq!(system["range"], "20/40/80");
    }

    #[test]
    fn weapon_save_note() {
        let item = json!({
            "name": "Net of Binding",
            "type": "weapon",
            "system": {
                "actionType": "other",
                "save": { "ability": "str", "dc": 20 },
                "range": { "value": 5 }
            }
        });
        let system = converter().convert_item(item).expect("converts")["system"].clone();
        assert_eq!(system["actions"]["skill"], "Athletics");
        assert_eq!(system["notes"], "Strength roll -2 (DC 20)");
        assert_eq!(system["range"], "");
    }

    #[test]
    fn armor_block() {
        let item = json!({
            "name": "Chain Mail",
            "type": "equipment",
            "system": {
                "armor": { "type": "heavy", "value": 16 },
                "rarity": "",
                "price": { "value": 75, "denomination": "gp" }
            }
        });
        let converted = converter().convert_item(item).expect("converts");
        let system = &converted["system"];

        assert_eq!(converted["type"], "armor");
        assert_eq!(system["armor"], 4);
        assert_eq!(system["minStr"], "d10");
        assert_eq!(system["equipStatus"], 3);
        assert_eq!(system["equippable"], true);
        assert_eq!(
            system["locations"],
            json!({ "head": false, "torso": true, "arms": true, "legs": false })
        );
        assert_eq!(system["notes"], "");
        assert_eq!(system["toughness"], "");
        assert_eq!(system["category"], "");
        assert_eq!(system["price"]["value"], 75);
        assert!(system.get("actions").is_none());
    }

    #[test]
    fn trinket_equipment_is_gear() {
        let item = json!({
            "name": "Ring of Warmth",
            "type": "equipment",
            "system": {
                "armor": { "type": "trinket" },
                "description": { "value": "Warm.", "unidentified": "A plain ring. DC 12" }
            }
        });
        let converted = converter().convert_item(item).expect("converts");
        assert_eq!(converted["type"], "gear");
        assert_eq!(converted["system"]["equippable"], true);
        assert!(converted["system"].get("armor").is_none());
        assert_eq!(
            converted["system"]["description"],
            r#"<section class="secret">A plain ring. <span title="DC 12">+2 🎲</span></section>Warm."#
        );
    }

    #[test]
    fn spellcasting_feature_is_arcane_background() {
        let item = json!({ "name": "Spellcasting", "type": "feat", "system": {} });
        let converted = converter().convert_item(item).expect("converts");
        assert_eq!(converted["type"], "edge");
        assert_eq!(converted["system"]["isArcaneBackground"], true);
        assert_eq!(converted["system"]["description"], "");
    }

    #[test]
    fn unknown_type_fails_with_payload() {
        let item = json!({ "_id": "r1", "name": "Elf", "type": "race", "system": { "x": 1 } });
        let err = converter().convert_item(item.clone()).expect_err("unknown type");
        match err {
            ConversionError::UnknownItemType { item_type, item: payload } => {
                assert_eq!(item_type, "race");
                assert_eq!(*payload, item);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_fields_fail() {
        let err = converter()
            .convert_item(json!({ "name": "x", "system": {} }))
            .expect_err("no type");
        assert!(matches!(err, ConversionError::MissingField { field: "type", .. }));

        let err = converter()
            .convert_item(json!({ "name": "x", "type": "loot", "system": "bad" }))
            .expect_err("bad system");
        assert!(matches!(err, ConversionError::MissingField { field: "system", .. }));

        let err = converter().convert_item(json!(null)).expect_err("not an object");
        assert!(matches!(err, ConversionError::MissingField { entity: "Item", .. }));
    }

    #[test]
    fn type_mapping_is_total_over_source_vocabulary() {
        let converter = converter();
        for source_type in converter.rules().item_types.keys() {
            let item = json!({ "name": "x", "type": source_type, "system": {} });
            let converted = converter.convert_item(item).expect("mapped type converts");
            let target = converted["type"].as_str().expect("type");
            assert!(converter.rules().target_item_types.iter().any(|t| t == target));
        }
    }
}
