//! # Loot Profiles
//!
//! An ordered list of [`LootRules`]. Order is priority: the first enabled
//! rule that matches an item owns it.
//!
//! Profiles are values. Editing produces a new profile which the looter
//! picks up between ticks.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LootError, LootResult};
use crate::matching::Match;
use crate::rules::LootRules;
use crate::summary::ItemSummary;

/// A named, ordered rule list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "LootProfile")]
pub struct LootProfile {
    /// Profile name.
    pub name: String,
    #[serde(default)]
    rules: Vec<LootRules>,
}

impl LootProfile {
    /// An empty profile.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// The fallback profile: gold, gems, reagents and any artifact.
    #[must_use]
    pub fn template() -> Self {
        let rules = [
            ("Gold", "gold"),
            ("Gems", "gem"),
            ("Reagents", "reagent"),
            ("Artifacts", "any-artifact"),
        ]
        .into_iter()
        .filter_map(|(rule, preset)| {
            Match::preset(preset)
                .ok()
                .map(|m| LootRules::new(rule).with_base(m))
        })
        .collect();
        Self {
            name: "Default".to_string(),
            rules,
        }
    }

    /// True when any enabled rule matches.
    #[must_use]
    pub fn test(&self, item: &ItemSummary) -> bool {
        self.rules.iter().any(|r| r.test(item))
    }

    /// The first enabled rule matching `item`.
    #[must_use]
    pub fn matching_rule(&self, item: &ItemSummary) -> Option<&LootRules> {
        self.rules.iter().find(|r| r.test(item))
    }

    /// Rules in priority order.
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[LootRules] {
        &self.rules
    }

    /// Rule at `index`.
    #[must_use]
    pub fn rule(&self, index: usize) -> Option<&LootRules> {
        self.rules.get(index)
    }

    /// Mutable rule at `index`.
    #[must_use]
    pub fn rule_mut(&mut self, index: usize) -> Option<&mut LootRules> {
        self.rules.get_mut(index)
    }

    /// Number of rules.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True without rules.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Appends a rule at the lowest priority.
    pub fn add(&mut self, rule: LootRules) {
        self.rules.push(rule);
    }

    /// Builder form of [`add`](Self::add).
    #[must_use]
    pub fn with_rule(mut self, rule: LootRules) -> Self {
        self.rules.push(rule);
        self
    }

    /// Inserts a rule at `index` (clamped to the end).
    pub fn insert(&mut self, index: usize, rule: LootRules) {
        let index = index.min(self.rules.len());
        self.rules.insert(index, rule);
    }

    /// Removes and returns the rule at `index`.
    pub fn remove(&mut self, index: usize) -> Option<LootRules> {
        (index < self.rules.len()).then(|| self.rules.remove(index))
    }

    /// Raises the rule at `index` one step. Returns false at the top or out of range.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.rules.len() {
            return false;
        }
        self.rules.swap(index - 1, index);
        true
    }

    /// Lowers the rule at `index` one step. Returns false at the bottom or out of range.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.rules.len() {
            return false;
        }
        self.rules.swap(index, index + 1);
        true
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Persisted form.
    ///
    /// # Errors
    ///
    /// [`LootError::Serialization`] if the profile cannot be encoded.
    pub fn to_value(&self) -> LootResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuilds a profile from its persisted form.
    ///
    /// # Errors
    ///
    /// [`LootError::Serialization`] for unknown match tags or malformed fields.
    pub fn from_value(value: serde_json::Value) -> LootResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// [`LootError::Serialization`] for malformed documents.
    pub fn from_json(text: &str) -> LootResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Pretty JSON document.
    ///
    /// # Errors
    ///
    /// [`LootError::Serialization`] if the profile cannot be encoded.
    pub fn to_json(&self) -> LootResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a profile file.
    ///
    /// # Errors
    ///
    /// [`LootError::Io`] when the file cannot be read, otherwise as [`from_json`](Self::from_json).
    pub fn load(path: impl AsRef<Path>) -> LootResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LootError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Writes the profile as pretty JSON.
    ///
    /// # Errors
    ///
    /// [`LootError::Io`] when the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> LootResult<()> {
        let path = path.as_ref();
        let text = self.to_json()?;
        fs::write(path, text).map_err(|source| LootError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads a profile file, falling back to [`template`](Self::template) on any error.
    #[must_use]
    pub fn load_or_template(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Profile {} rejected ({}), using template", path.display(), e);
                Self::template()
            }
        }
    }
}
