//! # PLUNDER Shared
//!
//! Common types used by both the rules engine and the looting controller.
//!
//! ## CRITICAL RULE
//!
//! This crate never touches the world. It only describes the contract
//! ([`WorldBridge`]) that the host scripting runtime implements:
//! - item and mobile lookup by serial
//! - container open and content waits
//! - property fetch, item moves, tinting and user messages
//!
//! If you need matching logic, put it in `plunder_rules`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod world;

pub use constants::{
    DEFAULT_ACTION_DELAY_MS, DEFAULT_MARK_COLOR, DEFAULT_MAX_OPEN_ATTEMPTS,
    DEFAULT_REFRESH_RATE_MS, HUE_ERROR, HUE_NOTICE, MOVE_ALL, SUMMARY_CACHE_BOUND,
};
pub use world::{
    BridgeError, BridgeResult, Hue, ItemId, PlayerInfo, Position, Serial, WorldBridge,
    WorldItem, WorldMobile,
};
