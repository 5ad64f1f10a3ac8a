//! World-bridge contract between the looting core and the host client.
//!
//! The host exposes a scripted automation surface. Every call here may
//! suspend the calling thread for hundreds of milliseconds, so the core
//! only calls the bridge from its worker, never from the UI thread.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque, stable 32-bit identifier of an item or mobile.
pub type Serial = u32;

/// Item type (graphic) identifier.
pub type ItemId = u16;

/// Color (hue) identifier.
pub type Hue = u16;

/// World position of an item or mobile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
    /// Z coordinate
    pub z: i32,
}

impl Position {
    /// Creates a position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chebyshev distance on the ground plane (the host's notion of range).
    #[inline]
    #[must_use]
    pub fn range_to(&self, other: &Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// Snapshot of one world item as reported by the bridge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldItem {
    /// Item serial
    pub serial: Serial,
    /// Item type
    pub itemid: ItemId,
    /// Item hue
    pub color: Hue,
    /// Stack amount
    pub amount: u16,
    /// Display name
    pub name: String,
    /// Weight in stones
    pub weight: i32,
    /// Serial of the container holding the item, `None` on the ground
    pub container: Option<Serial>,
    /// Position (container-relative when contained)
    pub position: Position,
}

/// Snapshot of one mobile as reported by the bridge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldMobile {
    /// Mobile serial
    pub serial: Serial,
    /// Display name
    pub name: String,
    /// Body hue
    pub color: Hue,
    /// World position
    pub position: Position,
}

/// The local player, as far as the looter cares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerInfo {
    /// Player mobile serial
    pub serial: Serial,
    /// Serial of the player's backpack
    pub backpack: Serial,
    /// Whether the client is logged in
    pub connected: bool,
    /// Player position
    pub position: Position,
}

/// Errors reported by the world bridge.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The client is not logged in.
    #[error("player is not connected")]
    Disconnected,

    /// The server refused a move (full container, out of reach, ...).
    ///
    /// Recoverable: the item stays where it is and is retried next tick.
    #[error("move of {serial:#010x} rejected: {reason}")]
    MoveRejected {
        /// Item that failed to move.
        serial: Serial,
        /// Reason reported by the host.
        reason: String,
    },

    /// Any other host-side failure.
    #[error("world bridge failure: {0}")]
    Failure(String),
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// The host's automation surface, as consumed by the looting core.
///
/// Implementations must be shareable with the worker thread.
pub trait WorldBridge: Send + Sync {
    /// Looks up an item by serial. `None` when it no longer exists.
    fn find_item(&self, serial: Serial) -> Option<WorldItem>;

    /// Looks up a mobile by serial. `None` when it no longer exists.
    fn find_mobile(&self, serial: Serial) -> Option<WorldMobile>;

    /// Issues "open/use" against an item.
    ///
    /// # Errors
    ///
    /// Returns an error when the host cannot issue the request.
    fn use_item(&self, serial: Serial) -> BridgeResult<()>;

    /// Waits until the contents of `serial` are known. Returns `false` on timeout.
    fn wait_for_contents(&self, serial: Serial, timeout: Duration) -> bool;

    /// Waits until the property strings of `serial` are known. Returns `false` on timeout.
    fn wait_for_props(&self, serial: Serial, timeout: Duration) -> bool;

    /// Property strings of an item, in display order.
    fn prop_strings(&self, serial: Serial) -> Vec<String>;

    /// Top-level items directly inside `container`.
    ///
    /// # Errors
    ///
    /// Returns an error when the host cannot enumerate the container.
    fn contents(&self, container: Serial) -> BridgeResult<Vec<WorldItem>>;

    /// Recursive scan for items of the given types.
    ///
    /// `container = None` scans the ground, and `depth` is then the range
    /// around the player.
    ///
    /// # Errors
    ///
    /// Returns an error when the host cannot perform the scan.
    fn find_all_by_id(
        &self,
        ids: &[ItemId],
        color: Option<Hue>,
        container: Option<Serial>,
        depth: u32,
    ) -> BridgeResult<Vec<WorldItem>>;

    /// Moves `amount` of an item into `destination` (`MOVE_ALL` for the whole stack).
    ///
    /// # Errors
    ///
    /// [`BridgeError::MoveRejected`] when the server refused the move.
    fn move_item(&self, serial: Serial, destination: Serial, amount: i32) -> BridgeResult<()>;

    /// Tints an item client-side.
    ///
    /// # Errors
    ///
    /// Returns an error when the host cannot apply the hue.
    fn set_color(&self, serial: Serial, color: Hue) -> BridgeResult<()>;

    /// Shows a message to the user.
    fn send_message(&self, text: &str, hue: Hue);

    /// The local player.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Disconnected`] when not logged in.
    fn player(&self) -> BridgeResult<PlayerInfo>;
}
