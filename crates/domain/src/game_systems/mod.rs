//! Ruleset-specific rules for the two sides of a migration.
//!
//! # Supported Systems
//!
//! - D&D 5th Edition (`dnd5e`), read as the source
//! - Savage Worlds Adventure Edition (`swade`), written as the target

pub mod dnd5e;
mod lenient;
pub mod swade;

pub use dnd5e::{ability_rating, skill_ability as dnd5e_skill_ability, Dnd5eStatBlock};
pub use swade::{
    ability_score_to_die, die_for_rating, difficulty_display, difficulty_to_modifier,
    feet_to_inches, modifier_label, pace_from_feet, running_die, weapon_range, Die, SizeCategory,
};

/// Identifier of the source ruleset.
pub const SOURCE_SYSTEM_ID: &str = "dnd5e";

/// Identifier of the target ruleset.
pub const TARGET_SYSTEM_ID: &str = "swade";
