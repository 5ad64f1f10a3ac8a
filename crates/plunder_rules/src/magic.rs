//! # Magic Property Table
//!
//! Static registry mapping every recognized magic-property name to the kind
//! of value it carries. Property strings are parsed against it in two steps:
//!
//! 1. The first word of the line selects a small bucket of candidate names
//!    (longest name first, so "Hit Point Regeneration" never loses to a shorter
//!    sibling).
//! 2. Only the winning candidate runs its value pattern.
//!
//! The table is built once per process and never mutated.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How a property's value is written in its property string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagicKind {
    /// `Name 25%`, stored as the integer percent.
    Percent,
    /// `Name 5` or `Name -29 Skill`, stored as a signed integer.
    Int,
    /// `Name`, present means `true`.
    Bool,
    /// `Name <text>`, stored verbatim.
    String,
}

/// A parsed, typed magic-property value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MagicValue {
    /// Presence flag.
    Bool(bool),
    /// Integer or integer percent.
    Int(i32),
    /// Free text (slayer kinds).
    Text(String),
}

impl MagicValue {
    /// Integer view of the value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view of the value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MagicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One entry of the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MagicPropertyDescriptor {
    /// Display name, exactly as the property string starts.
    pub name: &'static str,
    /// Value kind.
    pub kind: MagicKind,
    /// Optional short key used in compact UIs ("LRC", "FCR", ...).
    pub key: Option<&'static str>,
}

const fn prop(name: &'static str, kind: MagicKind, key: Option<&'static str>) -> MagicPropertyDescriptor {
    MagicPropertyDescriptor { name, kind, key }
}

/// Display name of the slayer property.
pub const SLAYER: &str = "Slayer";

use MagicKind::{Bool, Int, Percent};

/// The embedded registry.
static REGISTRY: &[MagicPropertyDescriptor] = &[
    // Offense
    prop("Damage Increase", Percent, Some("DI")),
    prop("Hit Chance Increase", Percent, Some("HCI")),
    prop("Swing Speed Increase", Percent, Some("SSI")),
    prop("Spell Damage Increase", Percent, Some("SDI")),
    prop("Damage Modifier", Percent, None),
    prop("Velocity", Percent, None),
    prop("Splintering Weapon", Percent, None),
    prop("Hit Life Leech", Percent, Some("HLL")),
    prop("Hit Mana Leech", Percent, Some("HML")),
    prop("Hit Stamina Leech", Percent, Some("HSL")),
    prop("Hit Lower Attack", Percent, Some("HLA")),
    prop("Hit Lower Defense", Percent, Some("HLD")),
    prop("Hit Fireball", Percent, None),
    prop("Hit Lightning", Percent, None),
    prop("Hit Magic Arrow", Percent, None),
    prop("Hit Harm", Percent, None),
    prop("Hit Dispel", Percent, None),
    prop("Hit Curse", Percent, None),
    prop("Hit Fatigue", Percent, None),
    prop("Hit Mana Drain", Percent, None),
    prop("Hit Cold Area", Percent, None),
    prop("Hit Fire Area", Percent, None),
    prop("Hit Poison Area", Percent, None),
    prop("Hit Energy Area", Percent, None),
    prop("Hit Physical Area", Percent, None),
    // Defense
    prop("Defense Chance Increase", Percent, Some("DCI")),
    prop("Reflect Physical Damage", Percent, Some("RPD")),
    prop("Physical Resist", Percent, None),
    prop("Fire Resist", Percent, None),
    prop("Cold Resist", Percent, None),
    prop("Poison Resist", Percent, None),
    prop("Energy Resist", Percent, None),
    prop("Damage Eater", Percent, None),
    prop("Kinetic Eater", Percent, None),
    prop("Fire Eater", Percent, None),
    prop("Cold Eater", Percent, None),
    prop("Poison Eater", Percent, None),
    prop("Energy Eater", Percent, None),
    prop("Soul Charge", Percent, None),
    // Casting
    prop("Lower Mana Cost", Percent, Some("LMC")),
    prop("Lower Reagent Cost", Percent, Some("LRC")),
    prop("Faster Casting", Int, Some("FC")),
    prop("Faster Cast Recovery", Int, Some("FCR")),
    prop("Casting Focus", Percent, None),
    prop("Mage Weapon", Int, None),
    prop("Mage Armor", Bool, None),
    prop("Spell Channeling", Bool, None),
    // Stats
    prop("Strength Bonus", Int, Some("STR")),
    prop("Dexterity Bonus", Int, Some("DEX")),
    prop("Intelligence Bonus", Int, Some("INT")),
    prop("Hit Point Increase", Int, Some("HPI")),
    prop("Stamina Increase", Int, Some("SI")),
    prop("Mana Increase", Int, Some("MI")),
    prop("Hit Point Regeneration", Int, Some("HPR")),
    prop("Stamina Regeneration", Int, Some("SR")),
    prop("Mana Regeneration", Int, Some("MR")),
    prop("Luck", Int, None),
    // Misc
    prop("Enhance Potions", Percent, Some("EP")),
    prop("Lower Requirements", Percent, None),
    prop("Lower Ammo Cost", Percent, None),
    prop("Weight Reduction", Percent, None),
    prop("Durability", Percent, None),
    prop("Self Repair", Int, None),
    prop("Night Sight", Bool, None),
    prop("Balanced", Bool, None),
    prop("Use Best Weapon Skill", Bool, Some("UBWS")),
    prop("Reactive Paralyze", Bool, None),
    prop("Cannot Be Repaired", Bool, None),
    prop("Brittle", Bool, None),
    prop("Antique", Bool, None),
    prop("Blessed", Bool, None),
    prop(SLAYER, MagicKind::String, None),
];

static PERCENT_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?\d+)\s*%").expect("percent value pattern compiles")
});

static INT_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?\d+)").expect("int value pattern compiles")
});

static TABLE: Lazy<MagicPropertyTable> = Lazy::new(|| MagicPropertyTable::new(REGISTRY));

/// Registry of recognized magic properties.
#[derive(Debug)]
pub struct MagicPropertyTable {
    /// Descriptors in registry order.
    entries: &'static [MagicPropertyDescriptor],
    /// Lowercase name -> entry index.
    by_name: HashMap<String, usize>,
    /// Lowercase first word -> entry indices, longest name first.
    by_first_word: HashMap<String, Vec<usize>>,
}

impl MagicPropertyTable {
    fn new(entries: &'static [MagicPropertyDescriptor]) -> Self {
        let mut by_name = HashMap::with_capacity(entries.len());
        let mut by_first_word: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, entry) in entries.iter().enumerate() {
            let lower = entry.name.to_ascii_lowercase();
            let first = lower.split_whitespace().next().unwrap_or_default().to_string();
            by_first_word.entry(first).or_default().push(idx);
            by_name.insert(lower, idx);
        }

        for bucket in by_first_word.values_mut() {
            bucket.sort_by_key(|&idx| std::cmp::Reverse(entries[idx].name.len()));
        }

        Self {
            entries,
            by_name,
            by_first_word,
        }
    }

    /// The process-wide table.
    #[must_use]
    pub fn global() -> &'static Self {
        &TABLE
    }

    /// Looks up a descriptor by display name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MagicPropertyDescriptor> {
        self.by_name
            .get(&name.trim().to_ascii_lowercase())
            .map(|&idx| &self.entries[idx])
    }

    /// Looks up a descriptor by short key (case-insensitive).
    #[must_use]
    pub fn by_key(&self, key: &str) -> Option<&MagicPropertyDescriptor> {
        self.entries
            .iter()
            .find(|e| e.key.is_some_and(|k| k.eq_ignore_ascii_case(key)))
    }

    /// All descriptors in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &MagicPropertyDescriptor> {
        self.entries.iter()
    }

    /// Number of registered properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; the registry is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses one property string against the registry.
    ///
    /// Returns the display name and typed value of the first registered
    /// property the line starts with, or `None` when nothing applies.
    #[must_use]
    pub fn parse(&self, line: &str) -> Option<(&'static str, MagicValue)> {
        let line = line.trim();
        let lower = line.to_ascii_lowercase();
        let first = lower.split_whitespace().next()?;
        let bucket = self.by_first_word.get(first)?;

        for &idx in bucket {
            let entry = &self.entries[idx];
            let name_len = entry.name.len();
            if !lower.starts_with(&entry.name.to_ascii_lowercase()) {
                continue;
            }
            let rest = &line[name_len..];
            // Word boundary: "Luck" must not claim "Luckless".
            if !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
                continue;
            }
            if let Some(value) = parse_value(entry.kind, rest) {
                return Some((entry.name, value));
            }
        }
        None
    }
}

fn parse_value(kind: MagicKind, rest: &str) -> Option<MagicValue> {
    match kind {
        MagicKind::Percent => capture_int(&PERCENT_VALUE, rest).map(MagicValue::Int),
        MagicKind::Int => capture_int(&INT_VALUE, rest).map(MagicValue::Int),
        MagicKind::Bool => rest.trim().is_empty().then_some(MagicValue::Bool(true)),
        MagicKind::String => {
            let text = rest.trim();
            (!text.is_empty()).then(|| MagicValue::Text(text.to_string()))
        }
    }
}

fn capture_int(pattern: &Regex, text: &str) -> Option<i32> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
