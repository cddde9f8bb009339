//! Actor conversion.
//!
//! The target `system` block is computed from the source stat block alone.
//! Skills the target system models as items are derived from the source
//! skills and from the actor's proficient weapons, before those weapons are
//! themselves converted.

use std::collections::BTreeMap;

use rulecast_domain::game_systems::swade::{
    DEFAULT_WALK_FEET, FAITH, FIGHTING, SHOOTING, SPELLCASTING, UNSKILLED_ATTEMPT,
};
use rulecast_domain::{
    ability_score_to_die, die_for_rating, pace_from_feet, running_die, Die, Dnd5eStatBlock,
    SizeCategory,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::capitalize;
use super::Converter;
use crate::conversion::document::{
    has_property, into_document, is_truthy, map_array, number_value, str_at,
};
use crate::conversion::ConversionError;

/// Abilities that make a caster's spellcasting an arcane skill.
const ARCANE_ABILITIES: [&str; 2] = ["int", "cha"];

/// Abilities that make it a miracle skill.
const DIVINE_ABILITIES: [&str; 1] = ["wis"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActorSystem {
    additional_stats: BTreeMap<&'static str, AdditionalStat>,
    details: ActorDetails,
    attributes: BTreeMap<String, TraitDie>,
    stats: ActorStats,
    wildcard: bool,
}

/// A free-form labelled value shown on the target sheet.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdditionalStat {
    label: &'static str,
    value: Value,
    dtype: &'static str,
    has_max_value: bool,
    is_checkbox: bool,
}

impl AdditionalStat {
    fn text(label: &'static str, value: Value) -> Self {
        Self {
            label,
            value,
            dtype: "String",
            has_max_value: false,
            is_checkbox: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct ActorDetails {
    notes: String,
    appearance: String,
    biography: Biography,
    archetype: String,
    species: Species,
}

#[derive(Debug, Serialize)]
struct Biography {
    value: String,
}

#[derive(Debug, Serialize)]
struct Species {
    name: String,
}

#[derive(Debug, Serialize)]
struct TraitDie {
    die: Die,
}

#[derive(Debug, Serialize)]
struct ActorStats {
    #[serde(flatten)]
    size: SizeCategory,
    speed: Speed,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Speed {
    running_die: i32,
    running_mod: i32,
    value: i32,
    adjusted: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SkillSystem {
    attribute: String,
    die: Die,
    is_core_skill: bool,
}

#[derive(Debug, Serialize)]
struct AbilitySystem {
    subtype: &'static str,
}

/// First proficient weapon with the given attack type.
fn proficient_weapon<'a>(items: &'a [Value], action_type: &str) -> Option<&'a Value> {
    items.iter().find(|item| {
        str_at(item, "/type") == Some("weapon")
            && str_at(item, "/system/actionType") == Some(action_type)
            && is_truthy(item.pointer("/system/proficient"))
    })
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

impl Converter {
    /// Convert an actor, its prototype token and every item it owns.
    ///
    /// Fails when `system` is not an object or when an owned item fails.
    pub fn convert_actor(&self, actor: Value) -> Result<Value, ConversionError> {
        let mut doc = into_document(actor, "Actor", "system")?;
        if !doc.get("system").is_some_and(Value::is_object) {
            return Err(ConversionError::missing_field(
                "Actor",
                "system",
                Value::Object(doc),
            ));
        }

        let stats = Dnd5eStatBlock::deserialize(&doc["system"])?;
        let source_items: &[Value] = match doc.get("items") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        };

        let mut derived = self.derived_skills(&stats, source_items)?;
        derived.extend(self.derived_abilities(&stats)?);

        let system = self.actor_system(&stats);
        doc.insert("system".to_string(), serde_json::to_value(system)?);

        self.modules.rewrite_path_field(&mut doc, "img");
        if let Some(token) = doc.get_mut("prototypeToken") {
            *token = self.convert_token(std::mem::take(token));
        }
        self.modules.migrate_flags(&mut doc);
        self.convert_effects(&mut doc);
        map_array(&mut doc, "items", |item| self.convert_item(item))?;

        match doc.get_mut("items") {
            Some(Value::Array(items)) => items.extend(derived),
            _ => {
                doc.insert("items".to_string(), Value::Array(derived));
            }
        }

        Ok(Value::Object(doc))
    }

    fn actor_system(&self, stats: &Dnd5eStatBlock) -> ActorSystem {
        let details = &stats.details;

        let biography = [
            details.biography.value.as_deref(),
            details.background.as_deref(),
            details.personality_trait.as_deref(),
            details.ideal.as_deref(),
            details.bond.as_deref(),
            details.flaw.as_deref(),
        ]
        .into_iter()
        .filter_map(non_empty)
        .collect::<Vec<_>>()
        .join("\n");

        let attributes = self
            .rules
            .attribute_sources
            .iter()
            .map(|source| {
                let score = stats.best_ability_score(&source.abilities);
                (
                    source.attribute.clone(),
                    TraitDie {
                        die: ability_score_to_die(score),
                    },
                )
            })
            .collect();

        let walk = stats
            .attributes
            .movement
            .walk
            .filter(|feet| *feet > 0.0)
            .unwrap_or(DEFAULT_WALK_FEET);
        let pace = pace_from_feet(walk);

        ActorSystem {
            additional_stats: self.additional_stats(stats),
            details: ActorDetails {
                notes: self
                    .text
                    .apply(stats.description.value.as_deref().unwrap_or_default()),
                appearance: self
                    .text
                    .apply(details.appearance.as_deref().unwrap_or_default()),
                biography: Biography {
                    value: self.text.apply(&biography),
                },
                archetype: String::new(),
                species: Species {
                    name: details.race.clone().unwrap_or_default(),
                },
            },
            attributes,
            stats: ActorStats {
                size: self.rules.size_category(stats.traits.size.as_deref()),
                speed: Speed {
                    running_die: running_die(pace),
                    running_mod: 0,
                    value: pace,
                    adjusted: pace,
                },
            },
            wildcard: false,
        }
    }

    /// Languages, alignment, creature type and CR; empty values are left out.
    fn additional_stats(&self, stats: &Dnd5eStatBlock) -> BTreeMap<&'static str, AdditionalStat> {
        let mut additional = BTreeMap::new();

        let languages = stats.languages().join(", ");
        if !languages.is_empty() {
            additional.insert(
                "languages",
                AdditionalStat::text("Languages", Value::String(languages)),
            );
        }

        if let Some(alignment) = non_empty(stats.details.alignment.as_deref()) {
            additional.insert(
                "align",
                AdditionalStat::text("Alignment", Value::String(alignment.to_string())),
            );
        }

        if let Some(creature_type) = self.creature_type(stats) {
            additional.insert(
                "type",
                AdditionalStat::text("Creature Type", Value::String(creature_type)),
            );
        }

        if let Some(cr) = stats.details.cr.filter(|cr| *cr != 0.0) {
            additional.insert("cr", AdditionalStat::text("CR", number_value(cr)));
        }

        additional
    }

    /// `Swarm of Tiny Beast`, `Humanoid (goblinoid)`, ...
    fn creature_type(&self, stats: &Dnd5eStatBlock) -> Option<String> {
        let kind = &stats.details.creature_type;
        let base = non_empty(kind.custom.as_deref()).or(non_empty(kind.value.as_deref()))?;

        let mut label = String::new();
        if let Some(swarm) = kind.swarm.as_deref().and_then(|s| self.rules.size_label(s)) {
            label.push_str(&format!("Swarm of {swarm} "));
        }
        label.push_str(&capitalize(base));
        if let Some(subtype) = non_empty(kind.subtype.as_deref()) {
            label.push_str(&format!(" ({subtype})"));
        }
        Some(label)
    }

    fn skill_item(&self, name: &str, die: Die) -> Result<Value, ConversionError> {
        let system = SkillSystem {
            attribute: self.rules.skill_attribute(name).to_string(),
            die,
            is_core_skill: self.rules.is_core_skill(name),
        };
        Ok(serde_json::to_value(self.derived_item(name, "skill", system))?)
    }

    /// Skill items computed from the stat block and the unconverted items.
    fn derived_skills(
        &self,
        stats: &Dnd5eStatBlock,
        items: &[Value],
    ) -> Result<Vec<Value>, ConversionError> {
        let mut skills = Vec::new();

        for alias in &self.rules.skill_aliases {
            let value = stats.consolidated_skill_value(&alias.sources);
            if value > 0 {
                skills.push(self.skill_item(&alias.target, die_for_rating(value, 0))?);
            }
        }

        let melee = proficient_weapon(items, "mwak").and_then(|w| w.get("system"));
        let melee_ability = melee
            .and_then(|system| str_at(system, "/ability"))
            .unwrap_or_else(|| match melee {
                Some(system) if has_property(system, "fin") => "dex",
                _ => "str",
            });
        let ranged_ability = proficient_weapon(items, "rwak")
            .and_then(|w| str_at(w, "/system/ability"))
            .unwrap_or("dex");

        for (skill, ability) in [(FIGHTING, melee_ability), (SHOOTING, ranged_ability)] {
            let die = die_for_rating(stats.ability_rating(ability), 0);
            skills.push(self.skill_item(skill, die)?);
        }

        if stats.is_spellcaster() {
            if let Some(ability) = stats.attributes.spellcasting.as_deref() {
                let skill = if ARCANE_ABILITIES.contains(&ability) {
                    Some(SPELLCASTING)
                } else if DIVINE_ABILITIES.contains(&ability) {
                    Some(FAITH)
                } else {
                    None
                };
                if let Some(skill) = skill {
                    let die = die_for_rating(stats.ability_rating(ability), 0);
                    skills.push(self.skill_item(skill, die)?);
                }
            }
        }

        skills.push(self.skill_item(UNSKILLED_ATTEMPT, die_for_rating(0, -2))?);

        Ok(skills)
    }

    /// Special abilities for senses and movement modes the actor has.
    fn derived_abilities(&self, stats: &Dnd5eStatBlock) -> Result<Vec<Value>, ConversionError> {
        let senses = &stats.attributes.senses;
        let movement = &stats.attributes.movement;
        let present = |distance: Option<f64>| distance.is_some_and(|d| d > 0.0);

        [
            ("Darkvision", senses.darkvision),
            ("Blindsense", senses.blindsight),
            ("Flight", movement.fly),
            ("Burrow", movement.burrow),
        ]
        .into_iter()
        .filter(|(_, distance)| present(*distance))
        .map(|(name, _)| {
            let item = self.derived_item(name, "ability", AbilitySystem { subtype: "special" });
            Ok(serde_json::to_value(item)?)
        })
        .collect()
    }
}
