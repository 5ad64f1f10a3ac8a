//! # Looter Events and Commands
//!
//! ```text
//! ┌──────────┐  LooterCommand   ┌──────────┐  LooterEvent   ┌──────────┐
//! │    UI    │─────────────────>│  Worker  │───────────────>│    UI    │
//! └──────────┘  (unbounded)     └──────────┘  (bounded)     └──────────┘
//! ```
//!
//! Commands are applied between ticks, never mid-tick. Events are advisory:
//! when nobody drains them the bus keeps the newest `capacity` events, so a
//! late subscriber still sees how the last run ended.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use plunder_rules::LootProfile;
use plunder_shared::Serial;

use crate::looter::LooterMode;

/// Default event capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Intents the UI sends to a running worker.
#[derive(Clone, Debug)]
pub enum LooterCommand {
    /// Forget a container so it is opened again (manual re-loot).
    ClearTarget(Serial),
    /// Swap the profile.
    SetProfile(LootProfile),
}

/// Things the worker reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LooterEvent {
    /// A run began.
    Started {
        /// Run mode.
        mode: LooterMode,
    },

    /// A container delivered its contents.
    TargetOpened {
        /// Container serial.
        container: Serial,
    },

    /// A container has nothing left that the profile wants.
    TargetFinished {
        /// Container serial.
        container: Serial,
    },

    /// A container could not be opened and is skipped for the run.
    TargetAbandoned {
        /// Container serial.
        container: Serial,
        /// Failed opens.
        attempts: u32,
    },

    /// An item was moved.
    ItemMoved {
        /// Item serial.
        item: Serial,
        /// Destination container.
        destination: Serial,
        /// Rule that selected it.
        rule: String,
    },

    /// The server refused a move; retried next tick.
    MoveRejected {
        /// Item serial.
        item: Serial,
        /// Reason reported by the host.
        reason: String,
    },

    /// The run ended.
    Stopped {
        /// Fatal error, if the run did not end cleanly.
        error: Option<String>,
    },
}

/// Bounded event channel.
pub struct EventBus {
    sender: Sender<LooterEvent>,
    receiver: Receiver<LooterEvent>,
}

impl EventBus {
    /// Creates a bus holding at most `capacity` (at least one) undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Producer handle.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
            overflow: self.receiver.clone(),
        }
    }

    /// Consumer handle. Consumers compete for events.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<LooterEvent>,
    overflow: Receiver<LooterEvent>,
}

impl EventSender {
    /// Sends an event without blocking, evicting the oldest pending event
    /// when the bus is full.
    ///
    /// Returns `false` when an event was lost.
    pub fn send(&self, event: LooterEvent) -> bool {
        let mut event = event;
        let mut evicted = false;
        loop {
            match self.sender.try_send(event) {
                Ok(()) => return !evicted,
                Err(TrySendError::Full(back)) => {
                    evicted |= self.overflow.try_recv().is_ok();
                    event = back;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<LooterEvent>,
}

impl EventReceiver {
    /// All pending events.
    #[must_use]
    pub fn drain(&self) -> Vec<LooterEvent> {
        self.receiver.try_iter().collect()
    }

    /// One pending event.
    #[inline]
    #[must_use]
    pub fn try_recv(&self) -> Option<LooterEvent> {
        self.receiver.try_recv().ok()
    }

    /// Number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}
