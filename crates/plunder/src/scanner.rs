//! # Scanners
//!
//! A scanner produces the candidate containers of a tick, in the order the
//! looter should process them.

use plunder_shared::constants::CORPSE_ITEMID;
use plunder_shared::{BridgeResult, ItemId, Serial, WorldBridge};

/// Source of candidate containers.
pub trait Scanner: Send {
    /// Candidate containers for this tick.
    ///
    /// # Errors
    ///
    /// Bridge failures are fatal for the run.
    fn scan(&mut self, world: &dyn WorldBridge) -> BridgeResult<Vec<Serial>>;
}

impl<F> Scanner for F
where
    F: FnMut(&dyn WorldBridge) -> BridgeResult<Vec<Serial>> + Send,
{
    fn scan(&mut self, world: &dyn WorldBridge) -> BridgeResult<Vec<Serial>> {
        self(world)
    }
}

/// A manually picked target list. Targets that no longer exist are dropped.
#[derive(Clone, Debug, Default)]
pub struct FixedTargets {
    targets: Vec<Serial>,
}

impl FixedTargets {
    /// Scanner over `targets`, in that order.
    #[must_use]
    pub fn new(targets: impl IntoIterator<Item = Serial>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
        }
    }

    /// Remaining targets.
    #[must_use]
    pub fn targets(&self) -> &[Serial] {
        &self.targets
    }
}

impl Scanner for FixedTargets {
    fn scan(&mut self, world: &dyn WorldBridge) -> BridgeResult<Vec<Serial>> {
        self.targets.retain(|&serial| world.find_item(serial).is_some());
        Ok(self.targets.clone())
    }
}

/// Ground scan around the player for containers of the given types.
#[derive(Clone, Debug)]
pub struct NearbyContainers {
    ids: Vec<ItemId>,
    range: u32,
}

impl NearbyContainers {
    /// Corpses within `range` tiles.
    #[must_use]
    pub fn corpses(range: u32) -> Self {
        Self::new([CORPSE_ITEMID], range)
    }

    /// Containers of `ids` within `range` tiles.
    #[must_use]
    pub fn new(ids: impl IntoIterator<Item = ItemId>, range: u32) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            range,
        }
    }
}

impl Scanner for NearbyContainers {
    fn scan(&mut self, world: &dyn WorldBridge) -> BridgeResult<Vec<Serial>> {
        let origin = world.player()?.position;
        let found = world.find_all_by_id(&self.ids, None, None, self.range)?;
        // Hosts may report containers beyond `range`.
        Ok(found
            .into_iter()
            .filter(|item| origin.range_to(&item.position) <= self.range)
            .map(|item| item.serial)
            .collect())
    }
}
