//! # Item Summaries
//!
//! A typed, comparable projection of one world item, built once per serial.
//!
//! ## The Parsing Pass
//!
//! ```text
//! for each property string (single pass, first rule that applies wins):
//!   1. "Contents: A/B items, C/D stones"  -> container stats
//!   2. "Weapon Damage X - Y"              -> weapon damage
//!   3. "Weapon Speed Zs"                  -> weapon speed
//!   4. rarity phrase                      -> rarity tier 0..=8
//!   5. "<X> Slayer" / "Silver"            -> Slayer = X / Undead
//!   6. registered magic property          -> typed value
//! ```
//!
//! Summaries never touch the world after construction. A stale summary is
//! good enough for classification.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use plunder_shared::constants::PROPS_TIMEOUT;
use plunder_shared::{Hue, ItemId, Serial, WorldBridge, WorldItem};
use regex::Regex;

use crate::magic::{MagicPropertyTable, MagicValue, SLAYER};

/// Rarity of an item without a rarity phrase.
pub const RARITY_UNKNOWN: i8 = -1;

/// Rarity phrases, indexed by tier.
pub const RARITY_TIERS: [&str; 9] = [
    "Minor Magic Item",
    "Lesser Magic Item",
    "Greater Magic Item",
    "Major Magic Item",
    "Minor Artifact",
    "Lesser Artifact",
    "Greater Artifact",
    "Major Artifact",
    "Legendary Artifact",
];

static RARITY_INDEX: Lazy<HashMap<String, i8>> = Lazy::new(|| {
    RARITY_TIERS
        .iter()
        .zip(0i8..)
        .map(|(phrase, tier)| (phrase.to_ascii_lowercase(), tier))
        .collect()
});

static CONTENTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^contents:\s*(\d+)\s*/\s*(\d+)\s+items?\s*,\s*(\d+)\s*/\s*(\d+)\s+stones?")
        .expect("contents pattern compiles")
});

static WEAPON_DAMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^weapon damage\s+(\d+)\s*-\s*(\d+)").expect("weapon damage pattern compiles")
});

static WEAPON_SPEED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^weapon speed\s+(\d+(?:\.\d+)?)\s*s\b").expect("weapon speed pattern compiles")
});

static SLAYER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?)\s+slayer$").expect("slayer pattern compiles")
});

/// Slayer kind implied by the bare "Silver" property.
const SILVER_SLAYER_KIND: &str = "Undead";

/// Container capacity as reported by the "Contents:" property.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// Items inside.
    pub count: u32,
    /// Item capacity.
    pub max_count: u32,
    /// Weight inside (stones).
    pub weight: u32,
    /// Weight capacity (stones).
    pub max_weight: u32,
}

/// Weapon damage and speed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WeaponStats {
    /// Minimum damage.
    pub dmg_min: u32,
    /// Maximum damage.
    pub dmg_max: u32,
    /// Swing speed in seconds.
    pub speed: f32,
}

/// Parsed, cached projection of one world item.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemSummary {
    /// Item serial.
    pub serial: Serial,
    /// Item type.
    pub itemid: ItemId,
    /// Item hue.
    pub color: Hue,
    /// Stack amount.
    pub amount: u16,
    /// Display name.
    pub name: String,
    /// Weight in stones.
    pub weight: i32,
    /// Rarity tier 0..=8, or [`RARITY_UNKNOWN`].
    pub rarity: i8,
    /// Typed magic properties by display name. Missing means absent, not zero.
    pub magic_props: BTreeMap<String, MagicValue>,
    /// Raw property strings, in display order.
    pub props: Vec<String>,
    /// Container stats (zero for non-containers).
    pub contents: ContainerStats,
    /// Weapon stats (zero for non-weapons).
    pub weapon: WeaponStats,
}

impl ItemSummary {
    /// Builds a summary from an item snapshot and its property strings.
    ///
    /// Pure and deterministic: the same input always yields an equal summary.
    #[must_use]
    pub fn from_parts(item: &WorldItem, props: Vec<String>) -> Self {
        let mut summary = Self {
            serial: item.serial,
            itemid: item.itemid,
            color: item.color,
            amount: item.amount,
            name: item.name.clone(),
            weight: item.weight,
            rarity: RARITY_UNKNOWN,
            magic_props: BTreeMap::new(),
            props: Vec::new(),
            contents: ContainerStats::default(),
            weapon: WeaponStats::default(),
        };

        let table = MagicPropertyTable::global();
        for line in &props {
            summary.absorb(table, line.trim());
        }
        summary.props = props;
        summary
    }

    /// Builds a summary, waiting (bounded) for the bridge to deliver properties.
    ///
    /// When the properties do not arrive in time the summary keeps its
    /// defaults and is still usable.
    #[must_use]
    pub fn from_world(world: &dyn WorldBridge, item: &WorldItem) -> Self {
        let props = if world.wait_for_props(item.serial, PROPS_TIMEOUT) {
            world.prop_strings(item.serial)
        } else {
            tracing::debug!("Properties of {:#010x} did not arrive in time", item.serial);
            Vec::new()
        };
        Self::from_parts(item, props)
    }

    /// Applies one property string.
    fn absorb(&mut self, table: &MagicPropertyTable, line: &str) {
        if let Some(caps) = CONTENTS.captures(line) {
            self.contents = ContainerStats {
                count: parse_group(&caps, 1),
                max_count: parse_group(&caps, 2),
                weight: parse_group(&caps, 3),
                max_weight: parse_group(&caps, 4),
            };
        } else if let Some(caps) = WEAPON_DAMAGE.captures(line) {
            self.weapon.dmg_min = parse_group(&caps, 1);
            self.weapon.dmg_max = parse_group(&caps, 2);
        } else if let Some(caps) = WEAPON_SPEED.captures(line) {
            self.weapon.speed = parse_group(&caps, 1);
        } else if let Some(tier) = rarity_tier(line) {
            self.rarity = tier;
        } else if line.eq_ignore_ascii_case("silver") {
            self.set_slayer(SILVER_SLAYER_KIND);
        } else if let Some(caps) = SLAYER_LINE.captures(line) {
            let kind = caps.get(1).map_or("", |m| m.as_str().trim());
            self.set_slayer(kind);
        } else if let Some((name, value)) = table.parse(line) {
            self.magic_props.insert(name.to_string(), value);
        }
    }

    fn set_slayer(&mut self, kind: &str) {
        self.magic_props
            .insert(SLAYER.to_string(), MagicValue::Text(kind.to_string()));
    }

    /// Typed value of a magic property, if present.
    #[must_use]
    pub fn magic(&self, name: &str) -> Option<&MagicValue> {
        self.magic_props.get(name)
    }

    /// Slayer kind, if the item carries one.
    #[must_use]
    pub fn slayer(&self) -> Option<&str> {
        self.magic(SLAYER).and_then(MagicValue::as_text)
    }

    /// True when the item carries any rarity tier.
    #[must_use]
    pub const fn is_magic(&self) -> bool {
        self.rarity >= 0
    }

    /// Rarity phrase of the item, if known.
    #[must_use]
    pub fn rarity_name(&self) -> Option<&'static str> {
        usize::try_from(self.rarity)
            .ok()
            .and_then(|idx| RARITY_TIERS.get(idx).copied())
    }
}

/// Rarity tier of a phrase ("Lesser Artifact" -> 5), whitespace and case insensitive.
#[must_use]
pub fn rarity_tier(phrase: &str) -> Option<i8> {
    let normalized = phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();
    RARITY_INDEX.get(&normalized).copied()
}

fn parse_group<T>(caps: &regex::Captures<'_>, idx: usize) -> T
where
    T: std::str::FromStr + Default,
{
    caps.get(idx)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(serial: Serial, itemid: ItemId, name: &str) -> WorldItem {
        WorldItem {
            serial,
            itemid,
            amount: 1,
            name: name.to_string(),
            weight: 1,
            ..WorldItem::default()
        }
    }

    fn summarize(props: &[&str]) -> ItemSummary {
        ItemSummary::from_parts(
            &item(0x4000_0001, 0x13B9, "viking sword"),
            props.iter().map(|s| (*s).to_string()).collect(),
        )
    }

    #[test]
    fn test_container_stats_use_all_four_groups() {
        let s = summarize(&["Contents: 12/125 items, 37/400 stones"]);
        assert_eq!(
            s.contents,
            ContainerStats {
                count: 12,
                max_count: 125,
                weight: 37,
                max_weight: 400,
            }
        );
    }

    #[test]
    fn test_weapon_stats() {
        let s = summarize(&["Weapon Damage 15 - 17", "Weapon Speed 3.75s"]);
        assert_eq!(s.weapon.dmg_min, 15);
        assert_eq!(s.weapon.dmg_max, 17);
        assert!((s.weapon.speed - 3.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rarity_phrase() {
        let s = summarize(&["Lesser Artifact"]);
        assert_eq!(s.rarity, 5);
        assert_eq!(s.rarity_name(), Some("Lesser Artifact"));
        assert!(s.is_magic());

        let mundane = summarize(&["Durability 40 / 40"]);
        assert_eq!(mundane.rarity, RARITY_UNKNOWN);
        assert!(!mundane.is_magic());
    }

    #[test]
    fn test_rarity_normalization() {
        assert_eq!(rarity_tier("  legendary   ARTIFACT "), Some(8));
        assert_eq!(rarity_tier("Minor Magic Item"), Some(0));
        assert_eq!(rarity_tier("Artifact"), None);
    }

    #[test]
    fn test_slayer_and_silver() {
        assert_eq!(summarize(&["Repond Slayer"]).slayer(), Some("Repond"));
        assert_eq!(summarize(&["Silver"]).slayer(), Some("Undead"));
    }

    #[test]
    fn test_magic_properties_are_typed() {
        let s = summarize(&["Lower Reagent Cost 20%", "Spell Channeling", "Luck 80"]);
        assert_eq!(s.magic("Lower Reagent Cost"), Some(&MagicValue::Int(20)));
        assert_eq!(s.magic("Spell Channeling"), Some(&MagicValue::Bool(true)));
        assert_eq!(s.magic("Luck"), Some(&MagicValue::Int(80)));
        assert_eq!(s.magic("Lower Mana Cost"), None);
    }

    #[test]
    fn test_raw_props_are_kept_in_order() {
        let s = summarize(&["Insured", "Lower Reagent Cost 20%"]);
        assert_eq!(s.props, vec!["Insured".to_string(), "Lower Reagent Cost 20%".to_string()]);
    }

    #[test]
    fn test_construction_is_idempotent() {
        let props = ["Greater Artifact", "Hit Chance Increase 15%", "Undead Slayer"];
        assert_eq!(summarize(&props), summarize(&props));
    }

    #[test]
    fn test_no_props_keeps_defaults() {
        let s = summarize(&[]);
        assert_eq!(s.rarity, RARITY_UNKNOWN);
        assert!(s.magic_props.is_empty());
        assert_eq!(s.contents, ContainerStats::default());
        assert_eq!(s.name, "viking sword");
    }
}
