//! # Looter Constants
//!
//! Defaults and fixed bounds for the looting core.
//!
//! **NOTE:** The delay defaults are tuned for the host's action throttle.
//! Going below them gets moves rejected by the server.

use std::time::Duration;

use crate::world::{Hue, ItemId};

// =============================================================================
// THROTTLING
// =============================================================================

/// Failed opens before a container is demoted to non-lootable for the run.
pub const DEFAULT_MAX_OPEN_ATTEMPTS: u32 = 3;

/// Pause after every successful item move (ms).
pub const DEFAULT_ACTION_DELAY_MS: u64 = 900;

/// Idle pause when a tick had nothing to move (ms).
pub const DEFAULT_REFRESH_RATE_MS: u64 = 500;

/// Hue used to tint a drained container.
pub const DEFAULT_MARK_COLOR: Hue = 1014;

/// Upper bound for a single wait on container contents.
pub const CONTENTS_TIMEOUT: Duration = Duration::from_millis(1000);

/// Upper bound for a single wait on property strings.
pub const PROPS_TIMEOUT: Duration = Duration::from_millis(1000);

// =============================================================================
// CACHES
// =============================================================================

/// Maximum number of item summaries kept before the cache is dropped wholesale.
pub const SUMMARY_CACHE_BOUND: usize = 10_000;

// =============================================================================
// WORLD CONVENTIONS
// =============================================================================

/// Amount argument for `move_item` meaning "the whole stack".
pub const MOVE_ALL: i32 = -1;

/// Message hue for fatal errors (red).
pub const HUE_ERROR: Hue = 33;

/// Message hue for rule notifications (green).
pub const HUE_NOTICE: Hue = 68;

/// Message hue for recoverable problems (yellow).
pub const HUE_WARNING: Hue = 53;

/// Item type of a corpse.
pub const CORPSE_ITEMID: ItemId = 0x2006;
