//! Prose rewriting for converted descriptions.
//!
//! Descriptions are HTML fragments written against 5e vocabulary. The
//! pipeline renames abilities and skills, turns DCs into roll modifiers and
//! keeps the original wording in `title` tooltips. Rules never touch text
//! inside a tag's attributes, which is also what makes the whole pipeline
//! idempotent: everything a rule writes into a tooltip is out of reach of
//! the next pass.

use std::collections::HashMap;
use std::fmt;

use regex_lite::{Captures, Regex};
use rulecast_domain::{difficulty_display, NameMapping, RuleTables};

use super::error::ConversionError;

/// One rewrite step.
pub trait TextRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, text: &str) -> String;
}

/// True when the text after a match reaches `>` before `<`, meaning the
/// match sits inside a tag.
fn inside_tag(rest: &str) -> bool {
    rest.find(['<', '>'])
        .is_some_and(|i| rest.as_bytes()[i] == b'>')
}

fn match_bounds(caps: &Captures<'_>) -> (usize, usize) {
    caps.get(0).map_or((0, 0), |m| (m.start(), m.end()))
}

fn escape_attribute(text: &str) -> String {
    text.replace('"', "&quot;")
}

/// Collapse runs of spaces and tabs to one space.
fn collapse_blanks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c == ' ' || c == '\t' {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

fn compile(rule: &'static str, pattern: &str) -> Result<Regex, ConversionError> {
    Regex::new(pattern).map_err(|e| ConversionError::invalid_rule(rule, e))
}

/// Case-insensitive, word-bounded alternation of names, longest first.
/// Words inside a name match across any run of spaces and tabs.
fn names_pattern<'a>(names: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut names: Vec<&str> = names.filter(|n| !n.is_empty()).collect();
    if names.is_empty() {
        return None;
    }
    names.sort_by_key(|n| std::cmp::Reverse(n.len()));
    let alternation = names
        .iter()
        .map(|n| regex_lite::escape(n).replace(' ', BLANKS))
        .collect::<Vec<_>>()
        .join("|");
    Some(format!(r"(?i)\b(?:{alternation})\b"))
}

/// Lookup from a source name (any case) to its target name.
struct Vocabulary {
    pattern: Regex,
    targets: HashMap<String, String>,
}

impl Vocabulary {
    fn new<'a>(
        rule: &'static str,
        mappings: impl Iterator<Item = &'a NameMapping> + Clone,
    ) -> Result<Option<Self>, ConversionError> {
        let Some(pattern) = names_pattern(mappings.clone().map(|m| m.source.as_str())) else {
            return Ok(None);
        };
        let targets = mappings
            .map(|m| (Self::key(&m.source), m.target.clone()))
            .collect();
        Ok(Some(Self {
            pattern: compile(rule, &pattern)?,
            targets,
        }))
    }

    fn key(name: &str) -> String {
        collapse_blanks(name).to_ascii_lowercase()
    }

    fn target(&self, name: &str) -> Option<&str> {
        self.targets.get(&Self::key(name)).map(String::as_str)
    }
}

/// One or more spaces or tabs.
const BLANKS: &str = r"[ \t]+";

// =============================================================================
// Rules
// =============================================================================

/// "saving throw" -> "roll".
struct SavingThrows {
    pattern: Regex,
}

impl TextRule for SavingThrows {
    fn name(&self) -> &'static str {
        "saving-throws"
    }

    fn apply(&self, text: &str) -> String {
        self.pattern.replace_all(text, "roll").into_owned()
    }
}

/// `Wisdom (Perception)` -> `<span title="Wisdom (Perception)">Notice</span>`.
struct AbilityChecks {
    pattern: Regex,
    skills: Vocabulary,
}

impl AbilityChecks {
    /// Rename every skill in a check's parenthesis; `None` when it names none.
    fn rename_skills(&self, inner: &str) -> Option<String> {
        let inner = collapse_blanks(inner);
        let mut found = false;
        let renamed = self.skills.pattern.replace_all(&inner, |caps: &Captures<'_>| {
            match self.skills.target(&caps[0]) {
                Some(target) => {
                    found = true;
                    target.to_string()
                }
                None => caps[0].to_string(),
            }
        });
        if !found {
            return None;
        }

        // "Insight or Perception" both become Notice
        let mut parts: Vec<&str> = Vec::new();
        for part in renamed.split(" or ") {
            if !parts.iter().any(|p| p.eq_ignore_ascii_case(part)) {
                parts.push(part);
            }
        }
        Some(parts.join(" or "))
    }
}

impl TextRule for AbilityChecks {
    fn name(&self) -> &'static str {
        "ability-checks"
    }

    fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures<'_>| {
                let phrase = &caps[0];
                let (_, end) = match_bounds(caps);
                if inside_tag(&text[end..]) {
                    return phrase.to_string();
                }
                match self.rename_skills(&caps[1]) {
                    Some(renamed) => format!(
                        r#"<span title="{}">{}</span>"#,
                        escape_attribute(phrase),
                        renamed
                    ),
                    None => phrase.to_string(),
                }
            })
            .into_owned()
    }
}

/// Bare skill names that change -> `<span title="name">Target</span>`.
struct SkillMentions {
    skills: Vocabulary,
}

impl TextRule for SkillMentions {
    fn name(&self) -> &'static str {
        "skill-mentions"
    }

    fn apply(&self, text: &str) -> String {
        self.skills
            .pattern
            .replace_all(text, |caps: &Captures<'_>| {
                let name = &caps[0];
                let (_, end) = match_bounds(caps);
                match self.skills.target(name) {
                    Some(target) if !inside_tag(&text[end..]) => {
                        format!(r#"<span title="{name}">{target}</span>"#)
                    }
                    _ => name.to_string(),
                }
            })
            .into_owned()
    }
}

/// Ability names -> target attribute names.
struct AbilityNames {
    abilities: Vocabulary,
}

impl AbilityNames {
    /// True when the match is already the inner part of its own target,
    /// like the `Charisma` in `Spirit (Charisma)`.
    fn already_expanded(before: &str, after: &str, name: &str, target: &str) -> bool {
        let Some(pos) = target
            .to_ascii_lowercase()
            .find(&name.to_ascii_lowercase())
        else {
            return false;
        };
        let prefix = &target[..pos];
        let suffix = &target[pos + name.len()..];
        before.ends_with(prefix) && after.starts_with(suffix)
    }
}

impl TextRule for AbilityNames {
    fn name(&self) -> &'static str {
        "ability-names"
    }

    fn apply(&self, text: &str) -> String {
        self.abilities
            .pattern
            .replace_all(text, |caps: &Captures<'_>| {
                let name = &caps[0];
                let (start, end) = match_bounds(caps);
                let (before, after) = (&text[..start], &text[end..]);
                match self.abilities.target(name) {
                    Some(target)
                        if !inside_tag(after)
                            && !Self::already_expanded(before, after, name, target) =>
                    {
                        target.to_string()
                    }
                    _ => name.to_string(),
                }
            })
            .into_owned()
    }
}

/// `<span title="a">X</span> or <span title="b">X</span>` -> `<span title="a or b">X</span>`.
struct DuplicateSpans {
    span: Regex,
}

impl DuplicateSpans {
    fn is_or_gap(gap: &str) -> bool {
        gap.len() > 2
            && gap.starts_with(char::is_whitespace)
            && gap.ends_with(char::is_whitespace)
            && gap.trim().eq_ignore_ascii_case("or")
    }

    fn render(title: &str, label: &str) -> String {
        format!(r#"<span title="{title}">{label}</span>"#)
    }
}

impl TextRule for DuplicateSpans {
    fn name(&self) -> &'static str {
        "duplicate-spans"
    }

    fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut pending: Option<(String, String)> = None;
        let mut last = 0;

        for caps in self.span.captures_iter(text) {
            let (start, end) = match_bounds(&caps);
            let gap = &text[last..start];
            let (title, label) = (&caps[1], &caps[2]);

            let merges = matches!(
                &pending,
                Some((_, pending_label))
                    if Self::is_or_gap(gap) && pending_label.eq_ignore_ascii_case(label)
            );

            if merges {
                if let Some((pending_title, _)) = pending.as_mut() {
                    pending_title.push_str(" or ");
                    pending_title.push_str(title);
                }
            } else {
                if let Some((t, l)) = pending.take() {
                    out.push_str(&Self::render(&t, &l));
                }
                out.push_str(gap);
                pending = Some((title.to_string(), label.to_string()));
            }
            last = end;
        }

        if let Some((t, l)) = pending {
            out.push_str(&Self::render(&t, &l));
        }
        out.push_str(&text[last..]);
        out
    }
}

/// `DC 15` -> difficulty display.
struct Difficulties {
    pattern: Regex,
}

impl TextRule for Difficulties {
    fn name(&self) -> &'static str {
        "difficulties"
    }

    fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures<'_>| {
                let (_, end) = match_bounds(caps);
                match caps[1].parse::<i32>() {
                    Ok(dc) if !inside_tag(&text[end..]) => difficulty_display(dc),
                    _ => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Collapse runs of spaces and tabs; drop trailing ones before a newline.
struct Whitespace {
    runs: Regex,
    trailing: Regex,
}

impl TextRule for Whitespace {
    fn name(&self) -> &'static str {
        "whitespace"
    }

    fn apply(&self, text: &str) -> String {
        let collapsed = self.runs.replace_all(text, " ");
        self.trailing.replace_all(&collapsed, "\n").into_owned()
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Ordered chain of [`TextRule`]s.
pub struct TextPipeline {
    rules: Vec<Box<dyn TextRule>>,
}

impl TextPipeline {
    /// Build the standard rule chain from the name tables.
    pub fn new(tables: &RuleTables) -> Result<Self, ConversionError> {
        let renamed_sources: Vec<String> = tables
            .skill_names
            .iter()
            .filter(|m| m.renames())
            .map(|m| m.source.to_ascii_lowercase())
            .collect();
        if let Some(clash) = tables
            .skill_names
            .iter()
            .find(|m| m.renames() && renamed_sources.contains(&m.target.to_ascii_lowercase()))
        {
            return Err(ConversionError::invalid_rule(
                "skill-mentions",
                format!(
                    "`{}` renames to `{}`, which is itself renamed",
                    clash.source, clash.target
                ),
            ));
        }

        let mut rules: Vec<Box<dyn TextRule>> = vec![Box::new(SavingThrows {
            pattern: compile("saving-throws", &format!(r"(?i)saving{BLANKS}throw"))?,
        })];

        let ability_names = tables.ability_names.iter().map(|m| m.source.as_str());
        if let (Some(abilities), Some(skills)) = (
            names_pattern(ability_names),
            Vocabulary::new("ability-checks", tables.skill_names.iter())?,
        ) {
            // Captures the parenthesised text; the ability alternation is non-capturing
            rules.push(Box::new(AbilityChecks {
                pattern: compile("ability-checks", &format!(r"{abilities}{BLANKS}\(([^)<>]+)\)"))?,
                skills,
            }));
        }

        if let Some(skills) = Vocabulary::new(
            "skill-mentions",
            tables.skill_names.iter().filter(|m| m.renames()),
        )? {
            rules.push(Box::new(SkillMentions { skills }));
        }

        if let Some(abilities) = Vocabulary::new("ability-names", tables.ability_names.iter())? {
            rules.push(Box::new(AbilityNames { abilities }));
        }

        rules.push(Box::new(DuplicateSpans {
            span: compile(
                "duplicate-spans",
                r#"<span title="([^"<>]*)">([A-Za-z][A-Za-z ]*)</span>"#,
            )?,
        }));
        rules.push(Box::new(Difficulties {
            pattern: compile("difficulties", &format!(r"(?i)\bDC{BLANKS}(\d+)"))?,
        }));
        rules.push(Box::new(Whitespace {
            runs: compile("whitespace", r"[ \t]{2,}")?,
            trailing: compile("whitespace", r"[ \t]+\n")?,
        }));

        Ok(Self { rules })
    }

    /// A pipeline running exactly `rules`, in order.
    pub fn with_rules(rules: Vec<Box<dyn TextRule>>) -> Self {
        Self { rules }
    }

    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |text, rule| rule.apply(&text))
    }

    /// Converted text wrapped as GM-only content.
    pub fn secret(&self, text: &str) -> String {
        format!(r#"<section class="secret">{}</section>"#, self.apply(text))
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }
}

impl fmt::Debug for TextPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextPipeline")
            .field("rules", &self.rule_names())
            .finish()
    }
}
