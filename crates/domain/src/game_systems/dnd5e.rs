//! D&D 5th Edition (source ruleset) stat block view.
//!
//! Reads the parts of a `dnd5e` actor's `system` block that the migration
//! needs and implements the 5e math used to rate skills and abilities.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::lenient;

/// Score assumed for an ability the stat block does not list.
const DEFAULT_ABILITY_SCORE: f64 = 10.0;

/// Offset turning a 5e ability score into a die rating (10 -> 1, 14 -> 5).
const ABILITY_RATING_OFFSET: i32 = 9;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AbilityScore {
    #[serde(deserialize_with = "lenient::number")]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SkillEntry {
    /// Proficiency multiplier: 0, 0.5, 1 or 2.
    #[serde(deserialize_with = "lenient::number")]
    pub value: Option<f64>,
    /// Flat proficiency bonus, when the sheet stores one.
    #[serde(deserialize_with = "lenient::number")]
    pub prof: Option<f64>,
    #[serde(deserialize_with = "lenient::string")]
    pub ability: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Movement {
    #[serde(deserialize_with = "lenient::number")]
    pub walk: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub fly: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub burrow: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub swim: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub climb: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Senses {
    #[serde(deserialize_with = "lenient::number")]
    pub darkvision: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub blindsight: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub tremorsense: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub truesight: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Attributes {
    #[serde(deserialize_with = "lenient::number")]
    pub prof: Option<f64>,
    /// Spellcasting ability code (`int`, `wis`, `cha`).
    #[serde(deserialize_with = "lenient::string")]
    pub spellcasting: Option<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub movement: Movement,
    #[serde(deserialize_with = "lenient::or_default")]
    pub senses: Senses,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RichText {
    #[serde(deserialize_with = "lenient::string")]
    pub value: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub unidentified: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CreatureType {
    #[serde(deserialize_with = "lenient::string")]
    pub value: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub subtype: Option<String>,
    /// Size code of the swarm's members, when the creature is a swarm.
    #[serde(deserialize_with = "lenient::string")]
    pub swarm: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub custom: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Details {
    #[serde(deserialize_with = "lenient::number")]
    pub cr: Option<f64>,
    #[serde(rename = "spellLevel", deserialize_with = "lenient::number")]
    pub spell_level: Option<f64>,
    #[serde(deserialize_with = "lenient::string")]
    pub alignment: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub race: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub appearance: Option<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub biography: RichText,
    #[serde(deserialize_with = "lenient::string")]
    pub background: Option<String>,
    #[serde(rename = "trait", deserialize_with = "lenient::string")]
    pub personality_trait: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub ideal: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub bond: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub flaw: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient::or_default")]
    pub creature_type: CreatureType,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Languages {
    #[serde(deserialize_with = "lenient::or_default")]
    pub value: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub custom: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Traits {
    #[serde(deserialize_with = "lenient::string")]
    pub size: Option<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub languages: Languages,
}

/// Read-only view of a dnd5e actor `system` block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Dnd5eStatBlock {
    #[serde(deserialize_with = "lenient::or_default")]
    pub abilities: BTreeMap<String, AbilityScore>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub skills: BTreeMap<String, SkillEntry>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub attributes: Attributes,
    #[serde(deserialize_with = "lenient::or_default")]
    pub details: Details,
    #[serde(deserialize_with = "lenient::or_default")]
    pub traits: Traits,
    #[serde(deserialize_with = "lenient::or_default")]
    pub description: RichText,
}

impl Dnd5eStatBlock {
    /// Score for an ability code, defaulting to 10.
    pub fn ability_score(&self, ability: &str) -> f64 {
        self.abilities
            .get(ability)
            .and_then(|a| a.value)
            .unwrap_or(DEFAULT_ABILITY_SCORE)
    }

    /// 5e ability modifier: floor((score - 10) / 2). Unknown abilities give 0.
    pub fn ability_modifier(&self, ability: &str) -> i32 {
        match self.abilities.get(ability).and_then(|a| a.value) {
            Some(score) => ((score - 10.0) / 2.0).floor() as i32,
            None => 0,
        }
    }

    /// Die rating of an ability (score - 9).
    pub fn ability_rating(&self, ability: &str) -> i32 {
        ability_rating(self.ability_score(ability).round() as i32)
    }

    /// Best rounded score among several abilities feeding one target attribute.
    pub fn best_ability_score(&self, abilities: &[String]) -> i32 {
        abilities
            .iter()
            .map(|ability| self.ability_score(ability).round() as i32)
            .max()
            .unwrap_or(DEFAULT_ABILITY_SCORE as i32)
    }

    /// Proficiency contribution to a skill, rounded down.
    ///
    /// A stored flat bonus wins; otherwise the multiplier scales the actor's
    /// proficiency bonus, or one derived from CR for monsters that do not
    /// store it.
    fn proficiency_bonus(&self, skill: &SkillEntry) -> i32 {
        if let Some(prof) = skill.prof.filter(|p| *p != 0.0) {
            return prof.floor() as i32;
        }

        let multiplier = skill.value.unwrap_or(0.0);

        if let Some(prof) = self.attributes.prof.filter(|p| *p != 0.0) {
            return (prof * multiplier).floor() as i32;
        }

        if let Some(cr) = self.details.cr.filter(|c| *c != 0.0) {
            let prof = (cr.max(1.0) / 4.0).ceil() + 1.0;
            return (prof * multiplier).floor() as i32;
        }

        0
    }

    /// Rating for one source skill code: ability modifier plus proficiency.
    ///
    /// Skills missing from the stat block rate 0.
    pub fn skill_value(&self, code: &str) -> i32 {
        let Some(skill) = self.skills.get(code) else {
            return 0;
        };

        let ability = skill
            .ability
            .as_deref()
            .or_else(|| skill_ability(code))
            .unwrap_or_default();

        self.ability_modifier(ability) + self.proficiency_bonus(skill)
    }

    /// Rating for a target skill fed by several source skills.
    ///
    /// Takes the best-supported alias, never the sum or average.
    pub fn consolidated_skill_value(&self, codes: &[String]) -> i32 {
        codes
            .iter()
            .map(|code| self.skill_value(code))
            .max()
            .unwrap_or(0)
    }

    pub fn is_spellcaster(&self) -> bool {
        self.details.spell_level.is_some_and(|level| level > 0.0)
    }

    /// Known languages plus the `;`-separated custom list.
    pub fn languages(&self) -> Vec<String> {
        let mut languages = self.traits.languages.value.clone();
        if let Some(custom) = &self.traits.languages.custom {
            languages.extend(
                custom
                    .split(';')
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from),
            );
        }
        languages
    }
}

/// Die rating of a raw ability score (score - 9).
pub fn ability_rating(score: i32) -> i32 {
    score - ABILITY_RATING_OFFSET
}

/// Default ability for a dnd5e skill code.
pub fn skill_ability(code: &str) -> Option<&'static str> {
    match code {
        "ath" => Some("str"),
        "acr" | "slt" | "ste" => Some("dex"),
        "arc" | "his" | "inv" | "nat" | "rel" => Some("int"),
        "ani" | "ins" | "med" | "prc" | "sur" => Some("wis"),
        "dec" | "itm" | "prf" | "per" => Some("cha"),
        _ => None,
    }
}
