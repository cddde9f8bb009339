//! Rule tables driving a dnd5e -> swade migration.
//!
//! Every lookup the converters perform goes through a [`RuleTables`] value
//! handed to the engine at construction. [`RuleTables::default`] carries the
//! built-in mapping; alternate tables can be deserialized from JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::game_systems::swade::{SizeCategory, DERIVED_SKILLS};

/// A target skill fed by one or more source skill codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillAlias {
    pub target: String,
    pub sources: Vec<String>,
}

/// A target attribute fed by one or more source ability codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSource {
    pub attribute: String,
    pub abilities: Vec<String>,
}

/// One row of the size table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeEntry {
    pub code: String,
    pub size: i32,
    pub scale: i32,
    pub label: String,
}

/// A vocabulary rename used by the text rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameMapping {
    pub source: String,
    pub target: String,
}

impl NameMapping {
    fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    /// True when the mapping changes more than letter case.
    pub fn renames(&self) -> bool {
        !self.source.eq_ignore_ascii_case(&self.target)
    }
}

/// Immutable lookup tables for one source/target ruleset pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleTables {
    /// Source item `type` -> target item `type`.
    pub item_types: BTreeMap<String, String>,
    /// `equipment` items whose `armor.type` matches a key take this target type instead.
    pub armor_type_overrides: BTreeMap<String, String>,
    /// Closed target item vocabulary; every mapped type must be in it.
    pub target_item_types: Vec<String>,
    /// Target skills in creation order, with the source skills they consolidate.
    pub skill_aliases: Vec<SkillAlias>,
    /// Target skill name -> linked target attribute.
    pub skill_attributes: BTreeMap<String, String>,
    pub core_skills: Vec<String>,
    /// Target attributes and the source abilities they are derived from.
    pub attribute_sources: Vec<AttributeSource>,
    pub sizes: Vec<SizeEntry>,
    /// Source skill display names and their target names, for prose.
    pub skill_names: Vec<NameMapping>,
    /// Source ability display names and their target names, for prose.
    pub ability_names: Vec<NameMapping>,
}

impl Default for RuleTables {
    fn default() -> Self {
        Self::dnd5e_to_swade()
    }
}

impl RuleTables {
    /// The built-in dnd5e -> swade tables.
    pub fn dnd5e_to_swade() -> Self {
        let item_types = [
            ("background", "ability"),
            ("backpack", "gear"),
            ("class", "edge"),
            ("consumable", "gear"),
            ("equipment", "armor"),
            ("feat", "edge"),
            ("loot", "gear"),
            ("spell", "power"),
            ("subclass", "edge"),
            ("tool", "gear"),
            ("weapon", "weapon"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let armor_type_overrides = [("trinket", "gear")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let target_item_types = [
            "ability", "armor", "edge", "gear", "hindrance", "power", "shield", "skill", "weapon",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let alias = |target: &str, sources: &[&str]| SkillAlias {
            target: target.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        };
        let skill_aliases = vec![
            alias("Athletics", &["acr", "ath"]),
            alias("Survival", &["ani", "sur"]),
            alias("Occult", &["arc"]),
            alias("Persuasion", &["dec", "per"]),
            alias("Academics", &["his", "rel"]),
            alias("Notice", &["ins", "prc", "inv"]),
            alias("Intimidation", &["itm"]),
            alias("Healing", &["med"]),
            alias("Science", &["nat"]),
            alias("Performance", &["prf"]),
            alias("Thievery", &["slt"]),
            alias("Stealth", &["ste"]),
            alias("Common Knowledge", &["arc", "rel", "nat"]),
            alias("Taunt", &["itm", "per"]),
        ];

        let skill_attributes = [
            ("Academics", "smarts"),
            ("Athletics", "agility"),
            ("Common Knowledge", "smarts"),
            ("Faith", "spirit"),
            ("Fighting", "agility"),
            ("Healing", "smarts"),
            ("Intimidation", "spirit"),
            ("Notice", "smarts"),
            ("Occult", "smarts"),
            ("Performance", "spirit"),
            ("Persuasion", "spirit"),
            ("Science", "smarts"),
            ("Shooting", "agility"),
            ("Spellcasting", "smarts"),
            ("Stealth", "agility"),
            ("Survival", "smarts"),
            ("Taunt", "smarts"),
            ("Thievery", "agility"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let core_skills = [
            "Athletics",
            "Notice",
            "Persuasion",
            "Stealth",
            "Common Knowledge",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let source = |attribute: &str, abilities: &[&str]| AttributeSource {
            attribute: attribute.to_string(),
            abilities: abilities.iter().map(|s| s.to_string()).collect(),
        };
        let attribute_sources = vec![
            source("agility", &["dex"]),
            source("smarts", &["int"]),
            source("spirit", &["wis", "cha"]),
            source("strength", &["str"]),
            source("vigor", &["con"]),
        ];

        let size = |code: &str, size: i32, scale: i32, label: &str| SizeEntry {
            code: code.to_string(),
            size,
            scale,
            label: label.to_string(),
        };
        let sizes = vec![
            size("tiny", -4, -6, "Tiny"),
            size("sm", -2, -2, "Small"),
            size("med", 0, 0, "Medium"),
            size("lg", 4, 2, "Large"),
            size("huge", 8, 4, "Huge"),
            size("grg", 12, 6, "Gargantuan"),
        ];

        let skill_names = vec![
            NameMapping::new("Acrobatics", "Athletics"),
            NameMapping::new("Animal Handling", "Survival"),
            NameMapping::new("Arcana", "Occult"),
            NameMapping::new("Athletics", "Athletics"),
            NameMapping::new("Deception", "Persuasion"),
            NameMapping::new("History", "Academics"),
            NameMapping::new("Insight", "Notice"),
            NameMapping::new("Intimidation", "Intimidation"),
            NameMapping::new("Investigation", "Notice"),
            NameMapping::new("Medicine", "Healing"),
            NameMapping::new("Nature", "Science"),
            NameMapping::new("Perception", "Notice"),
            NameMapping::new("Performance", "Performance"),
            NameMapping::new("Persuasion", "Persuasion"),
            NameMapping::new("Religion", "Academics"),
            NameMapping::new("Sleight of Hand", "Thievery"),
            NameMapping::new("Stealth", "Stealth"),
            NameMapping::new("Survival", "Survival"),
        ];

        let ability_names = vec![
            NameMapping::new("Strength", "Strength"),
            NameMapping::new("Dexterity", "Agility"),
            NameMapping::new("Constitution", "Vigor"),
            NameMapping::new("Intelligence", "Smarts"),
            NameMapping::new("Wisdom", "Spirit"),
            NameMapping::new("Charisma", "Spirit (Charisma)"),
        ];

        Self {
            item_types,
            armor_type_overrides,
            target_item_types,
            skill_aliases,
            skill_attributes,
            core_skills,
            attribute_sources,
            sizes,
            skill_names,
            ability_names,
        }
    }

    /// Check that the tables can drive a full conversion.
    ///
    /// Catches the mistakes that would otherwise surface as silently wrong
    /// output: a mapped item type outside the target vocabulary, a skill
    /// alias without sources, or a created skill with no linked attribute.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.item_types.is_empty() {
            return Err(DomainError::invalid_table("itemTypes", "table is empty"));
        }

        for (source, target) in self.item_types.iter().chain(&self.armor_type_overrides) {
            if !self.target_item_types.iter().any(|t| t == target) {
                return Err(DomainError::invalid_table(
                    "itemTypes",
                    format!("`{source}` maps to `{target}`, which is not a target item type"),
                ));
            }
        }

        for alias in &self.skill_aliases {
            if alias.sources.is_empty() {
                return Err(DomainError::invalid_table(
                    "skillAliases",
                    format!("`{}` has no source skills", alias.target),
                ));
            }
            if !self.skill_attributes.contains_key(&alias.target) {
                return Err(DomainError::invalid_table(
                    "skillAttributes",
                    format!("no attribute for skill `{}`", alias.target),
                ));
            }
        }

        for skill in DERIVED_SKILLS {
            if !self.skill_attributes.contains_key(skill) {
                return Err(DomainError::invalid_table(
                    "skillAttributes",
                    format!("no attribute for skill `{skill}`"),
                ));
            }
        }

        for source in &self.attribute_sources {
            if source.abilities.is_empty() {
                return Err(DomainError::invalid_table(
                    "attributeSources",
                    format!("`{}` has no source abilities", source.attribute),
                ));
            }
        }

        Ok(())
    }

    /// Map a source item type to the target vocabulary.
    ///
    /// `armor_type` is the item's `system.armor.type`, which reroutes some
    /// `equipment` (trinkets) away from `armor`.
    pub fn map_item_type(
        &self,
        source_type: &str,
        armor_type: Option<&str>,
    ) -> Result<&str, DomainError> {
        if source_type == "equipment" {
            if let Some(target) = armor_type.and_then(|t| self.armor_type_overrides.get(t)) {
                return Ok(target.as_str());
            }
        }

        self.item_types
            .get(source_type)
            .map(String::as_str)
            .ok_or_else(|| DomainError::unmapped("itemTypes", source_type))
    }

    /// Look up a size code; unmapped codes get the neutral default.
    pub fn size_category(&self, code: Option<&str>) -> SizeCategory {
        code.and_then(|code| self.sizes.iter().find(|entry| entry.code == code))
            .map(|entry| SizeCategory {
                size: entry.size,
                scale: entry.scale,
                label: Some(entry.label.clone()),
            })
            .unwrap_or_default()
    }

    /// Label for a size code, if the code is mapped.
    pub fn size_label(&self, code: &str) -> Option<&str> {
        self.sizes
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| entry.label.as_str())
    }

    /// Attribute linked to a target skill; empty for unlinked skills.
    pub fn skill_attribute(&self, skill: &str) -> &str {
        self.skill_attributes
            .get(skill)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn is_core_skill(&self, skill: &str) -> bool {
        self.core_skills.iter().any(|s| s == skill)
    }
}
