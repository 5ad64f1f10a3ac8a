//! # Loot Rules
//!
//! One rule of a profile. An item satisfies an enabled rule when
//!
//! ```text
//! (match_base is empty OR any base matches)
//!     AND every props match holds
//!     AND no except match holds
//! ```

use plunder_shared::Hue;
use serde::{Deserialize, Serialize};

use crate::matching::Match;
use crate::summary::ItemSummary;

/// Hue used to highlight matched items when the rule does not pick one.
pub const DEFAULT_HIGHLIGHT_COLOR: Hue = 1161;

const fn default_enabled() -> bool {
    true
}

const fn default_highlight_color() -> Hue {
    DEFAULT_HIGHLIGHT_COLOR
}

/// A named, prioritized loot rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "LootRules")]
pub struct LootRules {
    /// Rule name, shown in notifications.
    pub name: String,
    /// Disabled rules never match.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Tint matched items before moving them.
    #[serde(default)]
    pub highlight: bool,
    /// Hue used when `highlight` is set.
    #[serde(default = "default_highlight_color")]
    pub highlight_color: Hue,
    /// Tell the user about every match.
    #[serde(default)]
    pub notify: bool,
    /// Destination container, matched against the backpack's top-level items.
    #[serde(default)]
    pub lootbag: Option<Match>,
    /// At least one must match (ignored when empty).
    #[serde(default)]
    pub match_base: Vec<Match>,
    /// All must match.
    #[serde(default)]
    pub match_props: Vec<Match>,
    /// None may match.
    #[serde(default)]
    pub match_except: Vec<Match>,
}

impl LootRules {
    /// An enabled rule with no matches (it accepts everything).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            highlight: false,
            highlight_color: DEFAULT_HIGHLIGHT_COLOR,
            notify: false,
            lootbag: None,
            match_base: Vec::new(),
            match_props: Vec::new(),
            match_except: Vec::new(),
        }
    }

    /// Adds a base alternative.
    #[must_use]
    pub fn with_base(mut self, m: Match) -> Self {
        self.match_base.push(m);
        self
    }

    /// Adds a required property.
    #[must_use]
    pub fn with_prop(mut self, m: Match) -> Self {
        self.match_props.push(m);
        self
    }

    /// Adds an exclusion.
    #[must_use]
    pub fn with_except(mut self, m: Match) -> Self {
        self.match_except.push(m);
        self
    }

    /// Routes matches into the first backpack container satisfying `m`.
    #[must_use]
    pub fn with_lootbag(mut self, m: Match) -> Self {
        self.lootbag = Some(m);
        self
    }

    /// Highlights matches with `color`.
    #[must_use]
    pub const fn with_highlight(mut self, color: Hue) -> Self {
        self.highlight = true;
        self.highlight_color = color;
        self
    }

    /// Turns match notifications on or off.
    #[must_use]
    pub const fn with_notify(mut self, notify: bool) -> Self {
        self.notify = notify;
        self
    }

    /// Enables or disables the rule.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Tests an item against the rule.
    #[must_use]
    pub fn test(&self, item: &ItemSummary) -> bool {
        self.enabled
            && (self.match_base.is_empty() || self.match_base.iter().any(|m| m.test(item)))
            && self.match_props.iter().all(|m| m.test(item))
            && !self.match_except.iter().any(|m| m.test(item))
    }
}
