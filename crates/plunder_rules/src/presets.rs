//! # Presets
//!
//! Ready-made matches that rules reference by name
//! (`{ "type": "preset", "name": "gold" }`).
//!
//! The catalog is immutable and shared by reference. Presets never contain
//! preset references themselves.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use plunder_shared::ItemId;

use crate::matching::Match;

/// Gold coins.
pub const GOLD: ItemId = 0x0EED;
/// Arrows.
pub const ARROW: ItemId = 0x0F3F;
/// Crossbow bolts.
pub const BOLT: ItemId = 0x1BFB;

const MAPS: &[ItemId] = &[0x14EB, 0x14EC];

const REAGENTS: &[ItemId] = &[
    // Mage
    0x0F7A, 0x0F7B, 0x0F84, 0x0F85, 0x0F86, 0x0F88, 0x0F8C, 0x0F8D,
    // Necromancer
    0x0F78, 0x0F8F, 0x0F7D, 0x0F8E, 0x0F8A,
];

const GEMS: &[ItemId] = &[
    0x0F0F, 0x0F10, 0x0F11, 0x0F13, 0x0F15, 0x0F16, 0x0F18, 0x0F25, 0x0F26,
];

static CATALOG: Lazy<BTreeMap<&'static str, Match>> = Lazy::new(|| {
    BTreeMap::from([
        ("gold", Match::type_single(GOLD)),
        ("arrow", Match::type_single(ARROW)),
        ("bolt", Match::type_single(BOLT)),
        ("map", Match::type_group(MAPS.iter().copied())),
        ("reagent", Match::type_group(REAGENTS.iter().copied())),
        ("gem", Match::type_group(GEMS.iter().copied())),
        (
            "scroll",
            Match::type_group((0x1F2D..=0x1F72).chain([0x0EF3])),
        ),
        ("wand", Match::type_group(0x0DF2..=0x0DF5)),
        ("jewelry", Match::type_group(0x1085..=0x108A)),
        (
            "shield",
            Match::type_group((0x1B72..=0x1B7B).chain(0x1BC3..=0x1BC5)),
        ),
        ("daily-rare", Match::property("Daily Rare")),
        ("any-magic-item", Match::rarity_range(0, 8)),
        ("any-artifact", Match::rarity_range(4, 8)),
        ("legendary-artifact", Match::rarity_range(8, 8)),
        ("unwieldy-magic-item", Match::weight_range(50, 255)),
        ("armor-refinement", Match::type_group(0x142A..=0x142D)),
    ])
});

/// Looks up a preset by name.
#[must_use]
pub fn get(name: &str) -> Option<&'static Match> {
    CATALOG.get(name)
}

/// Looks up a preset, returning the catalog's own name with it.
#[must_use]
pub fn lookup(name: &str) -> Option<(&'static str, &'static Match)> {
    CATALOG.get_key_value(name).map(|(k, v)| (*k, v))
}

/// Preset names in sorted order.
pub fn names() -> impl Iterator<Item = &'static str> {
    CATALOG.keys().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::ItemSummary;
    use plunder_shared::WorldItem;

    fn summary(itemid: ItemId, props: &[&str]) -> ItemSummary {
        let item = WorldItem {
            itemid,
            weight: 1,
            ..WorldItem::default()
        };
        ItemSummary::from_parts(&item, props.iter().map(|s| (*s).to_string()).collect())
    }

    #[test]
    fn test_catalog_names() {
        let names: Vec<_> = names().collect();
        for expected in [
            "gold",
            "arrow",
            "bolt",
            "map",
            "reagent",
            "gem",
            "scroll",
            "wand",
            "jewelry",
            "shield",
            "daily-rare",
            "any-magic-item",
            "any-artifact",
            "legendary-artifact",
            "unwieldy-magic-item",
            "armor-refinement",
        ] {
            assert!(names.contains(&expected), "missing preset {expected}");
        }
    }

    #[test]
    fn test_presets_contain_no_references() {
        for name in names() {
            let value = get(name).and_then(|m| m.to_value().ok()).expect("encodes");
            assert!(!value.to_string().contains("\"preset\""), "{name} nests a preset");
        }
    }

    #[test]
    fn test_type_presets() {
        let gold = get("gold").expect("gold");
        assert!(gold.test(&summary(GOLD, &[])));
        let reagent = get("reagent").expect("reagent");
        assert!(reagent.test(&summary(0x0F7A, &[])));
        assert!(reagent.test(&summary(0x0F8A, &[])));
        assert!(!reagent.test(&summary(GOLD, &[])));
        let scroll = get("scroll").expect("scroll");
        assert!(scroll.test(&summary(0x1F4C, &[])));
        assert!(scroll.test(&summary(0x0EF3, &[])));
    }

    #[test]
    fn test_rarity_presets() {
        let artifact = summary(0x13B9, &["Greater Artifact"]);
        let magic = summary(0x13B9, &["Lesser Magic Item"]);
        assert!(get("any-artifact").expect("preset").test(&artifact));
        assert!(!get("any-artifact").expect("preset").test(&magic));
        assert!(get("any-magic-item").expect("preset").test(&magic));
        assert!(!get("legendary-artifact").expect("preset").test(&artifact));
    }

    #[test]
    fn test_lookup_returns_catalog_name() {
        let (name, _) = lookup("wand").expect("wand");
        assert_eq!(name, "wand");
        assert!(lookup("Wand").is_none());
    }
}
