//! rulecast domain crate.
//!
//! Rule tables and the pure value converters of the dnd5e -> swade
//! migration. Nothing here touches documents or storage.

pub mod error;
pub mod game_systems;
pub mod rules;

pub use error::DomainError;

pub use game_systems::{
    ability_rating, ability_score_to_die, die_for_rating, difficulty_display,
    difficulty_to_modifier, dnd5e_skill_ability, feet_to_inches, modifier_label, pace_from_feet,
    running_die, weapon_range, Die, Dnd5eStatBlock, SizeCategory, SOURCE_SYSTEM_ID,
    TARGET_SYSTEM_ID,
};

pub use rules::{AttributeSource, NameMapping, RuleTables, SizeEntry, SkillAlias};
