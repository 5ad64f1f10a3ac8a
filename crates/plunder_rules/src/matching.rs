//! # Match Tree
//!
//! Composable predicates over [`ItemSummary`].
//!
//! The tree is a closed tagged union. Its persisted form is a JSON object
//! whose `type` field names the variant:
//!
//! ```json
//! { "type": "all", "children": [
//!     { "type": "type_single", "itemid": 3821 },
//!     { "type": "magic_property", "prop": "Lower Reagent Cost", "min_value": 25 }
//! ] }
//! ```
//!
//! Unknown tags, invalid regexes and unknown preset names fail the load.
//! Ranges are inclusive on both ends. Percent values compare as integer
//! percents (`25`, never `0.25`).

use std::collections::BTreeSet;
use std::fmt;

use plunder_shared::{Hue, ItemId, Serial};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{LootError, LootResult};
use crate::magic::{MagicPropertyTable, MagicValue, SLAYER};
use crate::presets;
use crate::summary::ItemSummary;

// =============================================================================
// TEXT PATTERNS
// =============================================================================

/// Persisted shape of a [`TextPattern`].
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawPattern {
    pattern: String,
    #[serde(default)]
    regex: bool,
}

/// A case-insensitive substring or regular-expression pattern.
///
/// Regexes are compiled once, when the pattern is built or loaded.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawPattern", into = "RawPattern")]
pub struct TextPattern {
    pattern: String,
    folded: String,
    compiled: Option<Regex>,
}

impl TextPattern {
    /// Case-insensitive substring pattern.
    #[must_use]
    pub fn literal(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        Self {
            folded: pattern.to_lowercase(),
            pattern,
            compiled: None,
        }
    }

    /// Case-insensitive regular expression.
    ///
    /// # Errors
    ///
    /// [`LootError::InvalidPattern`] when the expression does not compile.
    pub fn regex(pattern: impl Into<String>) -> LootResult<Self> {
        let pattern = pattern.into();
        let compiled = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| LootError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            folded: pattern.to_lowercase(),
            pattern,
            compiled: Some(compiled),
        })
    }

    /// The pattern as written.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// True for regular expressions.
    #[inline]
    #[must_use]
    pub const fn is_regex(&self) -> bool {
        self.compiled.is_some()
    }

    /// Tests the pattern against a string.
    #[must_use]
    pub fn is_match(&self, haystack: &str) -> bool {
        match &self.compiled {
            Some(re) => re.is_match(haystack),
            None => haystack.to_lowercase().contains(&self.folded),
        }
    }
}

impl PartialEq for TextPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.is_regex() == other.is_regex()
    }
}

impl TryFrom<RawPattern> for TextPattern {
    type Error = LootError;

    fn try_from(raw: RawPattern) -> LootResult<Self> {
        if raw.regex {
            Self::regex(raw.pattern)
        } else {
            Ok(Self::literal(raw.pattern))
        }
    }
}

impl From<TextPattern> for RawPattern {
    fn from(p: TextPattern) -> Self {
        Self {
            regex: p.is_regex(),
            pattern: p.pattern,
        }
    }
}

impl fmt::Display for TextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_regex() {
            write!(f, "~ /{}/", self.pattern)
        } else {
            write!(f, "contains {:?}", self.pattern)
        }
    }
}

// =============================================================================
// PRESET REFERENCES
// =============================================================================

/// A reference to a catalog preset, resolved when built or loaded.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(into = "String")]
pub struct PresetRef {
    name: &'static str,
    target: &'static Match,
}

impl PresetRef {
    /// Resolves a preset by name.
    ///
    /// # Errors
    ///
    /// [`LootError::UnknownPreset`] when the catalog has no such entry.
    pub fn new(name: &str) -> LootResult<Self> {
        presets::lookup(name)
            .map(|(name, target)| Self { name, target })
            .ok_or_else(|| LootError::UnknownPreset(name.to_string()))
    }

    /// Catalog name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The referenced match.
    #[inline]
    #[must_use]
    pub const fn target(&self) -> &'static Match {
        self.target
    }
}

impl PartialEq for PresetRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl TryFrom<String> for PresetRef {
    type Error = LootError;

    fn try_from(name: String) -> LootResult<Self> {
        Self::new(&name)
    }
}

impl<'de> Deserialize<'de> for PresetRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::try_from(name).map_err(serde::de::Error::custom)
    }
}

impl From<PresetRef> for String {
    fn from(p: PresetRef) -> Self {
        p.name.to_string()
    }
}

// =============================================================================
// MATCH
// =============================================================================

const fn default_rarity_min() -> i8 {
    0
}

const fn default_rarity_max() -> i8 {
    8
}

/// A predicate over an [`ItemSummary`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Match {
    /// One item type, optionally of one color.
    TypeSingle {
        /// Item type.
        itemid: ItemId,
        /// Required hue; any hue when unset.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<Hue>,
    },

    /// Any of a set of item types.
    TypeGroup {
        /// Accepted item types.
        ids: BTreeSet<ItemId>,
    },

    /// Specific items.
    Serial {
        /// Accepted serials.
        serials: BTreeSet<Serial>,
    },

    /// Item name matches the pattern.
    Name(TextPattern),

    /// Weight within `min..=max`.
    WeightRange {
        /// Minimum weight (inclusive).
        min: i32,
        /// Maximum weight (inclusive).
        max: i32,
    },

    /// Rarity tier within `min..=max`. Unknown rarity (-1) fails the default range.
    RarityRange {
        /// Minimum tier (inclusive).
        #[serde(default = "default_rarity_min")]
        min: i8,
        /// Maximum tier (inclusive).
        #[serde(default = "default_rarity_max")]
        max: i8,
    },

    /// Any raw property string matches the pattern.
    PropertyString(TextPattern),

    /// Typed magic property at or above a threshold, or a slayer kind.
    MagicProperty {
        /// Property display name. `"<Kind> Slayer"` selects a slayer kind.
        prop: String,
        /// Minimum value for int and percent properties.
        #[serde(default)]
        min_value: i32,
    },

    /// Every child matches.
    All {
        /// Children.
        children: Vec<Match>,
    },

    /// At least one child matches.
    Any {
        /// Children.
        children: Vec<Match>,
    },

    /// No child matches.
    Except {
        /// Children.
        children: Vec<Match>,
    },

    /// A named catalog preset.
    Preset {
        /// The referenced preset.
        name: PresetRef,
    },
}

impl Match {
    /// One item type, any hue.
    #[must_use]
    pub const fn type_single(itemid: ItemId) -> Self {
        Self::TypeSingle { itemid, color: None }
    }

    /// One item type of one hue.
    #[must_use]
    pub const fn type_colored(itemid: ItemId, color: Hue) -> Self {
        Self::TypeSingle {
            itemid,
            color: Some(color),
        }
    }

    /// Any of the given item types.
    #[must_use]
    pub fn type_group(ids: impl IntoIterator<Item = ItemId>) -> Self {
        Self::TypeGroup {
            ids: ids.into_iter().collect(),
        }
    }

    /// Any of the given serials.
    #[must_use]
    pub fn serials(serials: impl IntoIterator<Item = Serial>) -> Self {
        Self::Serial {
            serials: serials.into_iter().collect(),
        }
    }

    /// Name contains `pattern` (case-insensitive).
    #[must_use]
    pub fn name(pattern: impl Into<String>) -> Self {
        Self::Name(TextPattern::literal(pattern))
    }

    /// Name matches the regular expression.
    ///
    /// # Errors
    ///
    /// [`LootError::InvalidPattern`] when the expression does not compile.
    pub fn name_regex(pattern: impl Into<String>) -> LootResult<Self> {
        TextPattern::regex(pattern).map(Self::Name)
    }

    /// Weight in `min..=max`.
    #[must_use]
    pub const fn weight_range(min: i32, max: i32) -> Self {
        Self::WeightRange { min, max }
    }

    /// Rarity tier in `min..=max`.
    #[must_use]
    pub const fn rarity_range(min: i8, max: i8) -> Self {
        Self::RarityRange { min, max }
    }

    /// Some property string contains `pattern` (case-insensitive).
    #[must_use]
    pub fn property(pattern: impl Into<String>) -> Self {
        Self::PropertyString(TextPattern::literal(pattern))
    }

    /// Some property string matches the regular expression.
    ///
    /// # Errors
    ///
    /// [`LootError::InvalidPattern`] when the expression does not compile.
    pub fn property_regex(pattern: impl Into<String>) -> LootResult<Self> {
        TextPattern::regex(pattern).map(Self::PropertyString)
    }

    /// Magic property at or above `min_value` (or a `"<Kind> Slayer"`).
    #[must_use]
    pub fn magic(prop: impl Into<String>, min_value: i32) -> Self {
        Self::MagicProperty {
            prop: prop.into(),
            min_value,
        }
    }

    /// Conjunction.
    #[must_use]
    pub fn all(children: Vec<Match>) -> Self {
        Self::All { children }
    }

    /// Disjunction.
    #[must_use]
    pub fn any(children: Vec<Match>) -> Self {
        Self::Any { children }
    }

    /// None of the children.
    #[must_use]
    pub fn except(children: Vec<Match>) -> Self {
        Self::Except { children }
    }

    /// Reference to a catalog preset.
    ///
    /// # Errors
    ///
    /// [`LootError::UnknownPreset`] when the catalog has no such entry.
    pub fn preset(name: &str) -> LootResult<Self> {
        PresetRef::new(name).map(|name| Self::Preset { name })
    }

    /// Evaluates the predicate.
    #[must_use]
    pub fn test(&self, item: &ItemSummary) -> bool {
        match self {
            Self::TypeSingle { itemid, color } => {
                item.itemid == *itemid && color.map_or(true, |c| item.color == c)
            }
            Self::TypeGroup { ids } => ids.contains(&item.itemid),
            Self::Serial { serials } => serials.contains(&item.serial),
            Self::Name(pattern) => pattern.is_match(&item.name),
            Self::WeightRange { min, max } => (*min..=*max).contains(&item.weight),
            Self::RarityRange { min, max } => (*min..=*max).contains(&item.rarity),
            Self::PropertyString(pattern) => item.props.iter().any(|p| pattern.is_match(p)),
            Self::MagicProperty { prop, min_value } => test_magic(item, prop, *min_value),
            Self::All { children } => children.iter().all(|m| m.test(item)),
            Self::Any { children } => children.iter().any(|m| m.test(item)),
            Self::Except { children } => !children.iter().any(|m| m.test(item)),
            Self::Preset { name } => name.target().test(item),
        }
    }

    /// Persisted form.
    ///
    /// # Errors
    ///
    /// [`LootError::Serialization`] if the tree cannot be encoded.
    pub fn to_value(&self) -> LootResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuilds a tree from its persisted form.
    ///
    /// # Errors
    ///
    /// [`LootError::Serialization`] for unknown tags or malformed fields.
    pub fn from_value(value: serde_json::Value) -> LootResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Kind named by a `"<Kind> Slayer"` property name, any case. Empty for a bare `Slayer`.
fn slayer_kind(prop: &str) -> Option<&str> {
    let prop = prop.trim();
    let split = prop.len().checked_sub(SLAYER.len())?;
    let suffix = prop.get(split..)?;
    if !suffix.eq_ignore_ascii_case(SLAYER) {
        return None;
    }
    prop.get(..split).map(str::trim)
}

fn test_magic(item: &ItemSummary, prop: &str, min_value: i32) -> bool {
    if let Some(kind) = slayer_kind(prop) {
        return item
            .slayer()
            .map_or(false, |s| kind.is_empty() || s.eq_ignore_ascii_case(kind));
    }

    let key = MagicPropertyTable::global()
        .get(prop)
        .map_or(prop, |desc| desc.name);
    match item.magic(key) {
        Some(MagicValue::Bool(present)) => *present,
        Some(MagicValue::Int(value)) => *value >= min_value,
        _ => false,
    }
}

fn write_children(f: &mut fmt::Formatter<'_>, children: &[Match], sep: &str) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{child}")?;
    }
    Ok(())
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeSingle { itemid, color: None } => write!(f, "type {itemid:#06X}"),
            Self::TypeSingle {
                itemid,
                color: Some(c),
            } => write!(f, "type {itemid:#06X} hue {c}"),
            Self::TypeGroup { ids } => write!(f, "one of {} types", ids.len()),
            Self::Serial { serials } => write!(f, "one of {} items", serials.len()),
            Self::Name(p) => write!(f, "name {p}"),
            Self::WeightRange { min, max } => write!(f, "weight {min}..={max}"),
            Self::RarityRange { min, max } => write!(f, "rarity {min}..={max}"),
            Self::PropertyString(p) => write!(f, "property {p}"),
            Self::MagicProperty { prop, min_value } => {
                if slayer_kind(prop).is_some() {
                    f.write_str(prop)
                } else {
                    write!(f, "{prop} >= {min_value}")
                }
            }
            Self::All { children } => {
                f.write_str("(")?;
                write_children(f, children, " and ")?;
                f.write_str(")")
            }
            Self::Any { children } => {
                f.write_str("(")?;
                write_children(f, children, " or ")?;
                f.write_str(")")
            }
            Self::Except { children } => {
                f.write_str("not (")?;
                write_children(f, children, " or ")?;
                f.write_str(")")
            }
            Self::Preset { name } => write!(f, "preset {}", name.name()),
        }
    }
}
