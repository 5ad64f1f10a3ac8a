//! # PLUNDER
//!
//! Rule-driven looting controller.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐ commands ┌────────────────────── worker ─────────────────────┐
//! │  Looter  │─────────>│ LootingSession                                    │
//! │ (UI side)│<─────────│  scanner → attempt_open → SummaryCache → profile  │
//! └──────────┘  events  │          (TargetCache)                → loot_single│
//!                       └──────────────────────┬────────────────────────────┘
//!                                              │
//!                                         WorldBridge
//! ```
//!
//! The session is owned by whoever runs it: the [`Looter`] while stopped,
//! the worker thread while running. Nothing is shared but the cancellation
//! token, the status snapshot and the two channels.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut looter = Looter::new(world, LootProfile::template(), LooterSettings::default());
//! looter.set_scanner(NearbyContainers::corpses(2))?;
//! looter.set_on_stop(|status| println!("looted {} items", status.moves));
//! looter.start(LooterMode::Loop)?;
//! // ...
//! looter.stop()?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod cache;
pub mod cancel;
pub mod error;
pub mod events;
pub mod looter;
pub mod memory;
pub mod scanner;
pub mod session;

pub use cache::SummaryCache;
pub use cancel::CancelToken;
pub use error::{LooterError, LooterResult};
pub use events::{EventReceiver, LooterCommand, LooterEvent};
pub use looter::{Looter, LooterMode, LooterStatus, StopCallback};
pub use memory::{LootingMemory, TargetCache};
pub use scanner::{FixedTargets, NearbyContainers, Scanner};
pub use session::{LootingSession, TickOutcome};
