//! Savage Worlds Adventure Edition (target ruleset) value rules.
//!
//! SWADE rates traits as a die type plus an optional modifier instead of a
//! linear score, gets one roll modifier per difficulty band, and measures
//! distance in tabletop inches.

use serde::{Deserialize, Serialize};

use super::dnd5e::ability_rating;

/// Feet per tabletop inch.
pub const DISTANCE_RATIO: f64 = 5.0;

/// Speed assumed when the source has no walking speed, in feet.
pub const DEFAULT_WALK_FEET: f64 = 30.0;

pub const FIGHTING: &str = "Fighting";
pub const SHOOTING: &str = "Shooting";
pub const SPELLCASTING: &str = "Spellcasting";
pub const FAITH: &str = "Faith";
pub const ATHLETICS: &str = "Athletics";
pub const UNSKILLED_ATTEMPT: &str = "Unskilled Attempt";

/// Skills created from stat block features rather than from skill aliases.
pub const DERIVED_SKILLS: [&str; 4] = [FIGHTING, SHOOTING, SPELLCASTING, FAITH];

/// A trait die such as d8 or d12+1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Die {
    pub sides: u8,
    pub modifier: i32,
}

impl Die {
    pub fn new(sides: u8, modifier: i32) -> Self {
        Self { sides, modifier }
    }
}

/// Map a die rating onto a trait die.
///
/// Breakpoints:
///
/// | rating | die |
/// |--------|-----|
/// | <= 2   | d4  |
/// | 3-4    | d6  |
/// | 5-6    | d8  |
/// | 7-8    | d10 |
/// | >= 9   | d12 + ceil((rating - 11) / 3) |
///
/// `modifier` is added on top of whatever the rating yields.
pub fn die_for_rating(rating: i32, modifier: i32) -> Die {
    match rating {
        i32::MIN..=2 => Die::new(4, modifier),
        3..=4 => Die::new(6, modifier),
        5..=6 => Die::new(8, modifier),
        7..=8 => Die::new(10, modifier),
        _ => Die::new(12, ceil_div(rating - 11, 3) + modifier),
    }
}

/// Trait die for a raw 5e ability score: `14` rates 5, a d8.
pub fn ability_score_to_die(score: i32) -> Die {
    die_for_rating(ability_rating(score), 0)
}

fn ceil_div(numerator: i32, denominator: i32) -> i32 {
    -((-numerator).div_euclid(denominator))
}

/// Roll modifier for a 5e difficulty class.
///
/// | DC    | modifier |
/// |-------|----------|
/// | <= 7  | +4 |
/// | 8-12  | +2 |
/// | 13-17 | 0  |
/// | 18-22 | -2 |
/// | 23-27 | -4 |
/// | >= 28 | -8 |
pub fn difficulty_to_modifier(dc: i32) -> i32 {
    match dc {
        i32::MIN..=7 => 4,
        8..=12 => 2,
        13..=17 => 0,
        18..=22 => -2,
        23..=27 => -4,
        _ => -8,
    }
}

/// Inline markup replacing a `DC n` call-out, keeping the DC as a tooltip.
pub fn difficulty_display(dc: i32) -> String {
    let label = match difficulty_to_modifier(dc) {
        0 => "🎲".to_string(),
        -8 => "-8".to_string(),
        m if m > 0 => format!("+{m} 🎲"),
        m => format!("{m} 🎲"),
    };
    format!(r#"<span title="DC {dc}">{label}</span>"#)
}

/// Short modifier text for notes, e.g. `+2`, `-4`, `±0`.
pub fn modifier_label(modifier: i32) -> String {
    match modifier {
        0 => "±0".to_string(),
        m if m > 0 => format!("+{m}"),
        m => m.to_string(),
    }
}

/// Size and scale of a creature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeCategory {
    pub size: i32,
    pub scale: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Convert a distance in feet into tabletop inches.
pub fn feet_to_inches(feet: f64) -> f64 {
    feet / DISTANCE_RATIO
}

/// Pace in inches for a walking speed in feet.
pub fn pace_from_feet(walk_feet: f64) -> i32 {
    feet_to_inches(walk_feet).round() as i32
}

/// Running die for a pace: d6 at pace 6, one step per 2 inches.
pub fn running_die(pace: i32) -> i32 {
    6 + (pace - 6).div_euclid(2)
}

/// Weapon range `short/medium/long` in inches for a 5e range in feet.
///
/// Reach-only weapons (5 ft) have no range.
pub fn weapon_range(feet: f64) -> String {
    let base = (feet / DISTANCE_RATIO).floor() as i64;
    if base == 1 {
        return String::new();
    }
    format!("{}/{}/{}", base, base * 2, base * 4)
}
