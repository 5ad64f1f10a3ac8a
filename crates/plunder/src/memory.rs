//! # Target Memory
//!
//! Per-container bookkeeping for one run.
//!
//! ```text
//!            open ok                 nothing left
//! fresh ───────────────> opened ─────────────────> finished (never reopened)
//!   │
//!   │ wait failed × max-open-attempts
//!   └──────────────────> not lootable (never reopened)
//! ```

use std::collections::HashMap;

use plunder_shared::Serial;

/// What the looter knows about one container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LootingMemory {
    /// False once the container was abandoned.
    pub lootable: bool,
    /// Failed opens so far.
    pub open_attempts: u32,
    /// Contents were delivered at least once.
    pub opened: bool,
    /// Nothing left that the profile wants.
    pub finished: bool,
    /// The finished container was tinted.
    pub marked: bool,
}

impl Default for LootingMemory {
    fn default() -> Self {
        Self {
            lootable: true,
            open_attempts: 0,
            opened: false,
            finished: false,
            marked: false,
        }
    }
}

/// Memories keyed by container serial.
#[derive(Clone, Debug, Default)]
pub struct TargetCache {
    entries: HashMap<Serial, LootingMemory>,
}

impl TargetCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory of `serial`, fresh when unseen.
    #[must_use]
    pub fn memory(&self, serial: Serial) -> LootingMemory {
        self.entries.get(&serial).copied().unwrap_or_default()
    }

    /// Memory of `serial`, if seen.
    #[must_use]
    pub fn get(&self, serial: Serial) -> Option<&LootingMemory> {
        self.entries.get(&serial)
    }

    /// Stores the memory of `serial`.
    pub fn insert(&mut self, serial: Serial, memory: LootingMemory) {
        self.entries.insert(serial, memory);
    }

    /// Forgets `serial` so the next scan treats it as fresh (manual re-loot).
    pub fn remove(&mut self, serial: Serial) -> Option<LootingMemory> {
        self.entries.remove(&serial)
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of remembered containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
