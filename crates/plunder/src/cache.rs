//! # Summary Cache
//!
//! One [`ItemSummary`] per serial, built on first sight. When the cache is
//! full it is dropped wholesale before the next insert, so its size never
//! exceeds the bound.

use std::collections::HashMap;

use plunder_rules::ItemSummary;
use plunder_shared::{Serial, WorldBridge, WorldItem, SUMMARY_CACHE_BOUND};

/// Bounded serial -> summary map.
#[derive(Debug)]
pub struct SummaryCache {
    entries: HashMap<Serial, ItemSummary>,
    bound: usize,
}

impl SummaryCache {
    /// Cache with the default bound.
    #[must_use]
    pub fn new() -> Self {
        Self::with_bound(SUMMARY_CACHE_BOUND)
    }

    /// Cache with a custom bound (at least 1).
    #[must_use]
    pub fn with_bound(bound: usize) -> Self {
        Self {
            entries: HashMap::new(),
            bound: bound.max(1),
        }
    }

    /// Summary of `item`, fetching its properties on first sight.
    pub fn summarize(&mut self, world: &dyn WorldBridge, item: &WorldItem) -> &ItemSummary {
        self.get_or_insert_with(item.serial, || ItemSummary::from_world(world, item))
    }

    /// Cached summary of `serial`, or the one `build` makes.
    pub fn get_or_insert_with<F>(&mut self, serial: Serial, build: F) -> &ItemSummary
    where
        F: FnOnce() -> ItemSummary,
    {
        if self.entries.len() >= self.bound && !self.entries.contains_key(&serial) {
            tracing::debug!("Summary cache reached {} entries, dropping it", self.entries.len());
            self.entries.clear();
        }
        self.entries.entry(serial).or_insert_with(build)
    }

    /// Cached summary of `serial`.
    #[must_use]
    pub fn get(&self, serial: Serial) -> Option<&ItemSummary> {
        self.entries.get(&serial)
    }

    /// Number of cached summaries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum size.
    #[must_use]
    pub const fn bound(&self) -> usize {
        self.bound
    }

    /// Drops every summary.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for SummaryCache {
    fn default() -> Self {
        Self::new()
    }
}
