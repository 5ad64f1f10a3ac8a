//! # PLUNDER Rules
//!
//! The rule language of the looter: what an item is, and whether we want it.
//!
//! ## Layers
//!
//! ```text
//! property strings --parse--> ItemSummary --test--> Match --+--> LootRules --> LootProfile
//!                               ^                           |
//!                    MagicPropertyTable              presets (by name)
//! ```
//!
//! Everything here is pure. The only world access is
//! [`ItemSummary::from_world`], which waits for property strings once.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod magic;
pub mod matching;
pub mod presets;
pub mod profile;
pub mod rules;
pub mod settings;
pub mod summary;

pub use error::{LootError, LootResult};
pub use magic::{MagicKind, MagicPropertyDescriptor, MagicPropertyTable, MagicValue};
pub use matching::{Match, PresetRef, TextPattern};
pub use profile::LootProfile;
pub use rules::LootRules;
pub use settings::LooterSettings;
pub use summary::{ContainerStats, ItemSummary, WeaponStats, RARITY_UNKNOWN};
