//! # Looter Error Types

use plunder_rules::LootError;
use plunder_shared::BridgeError;
use thiserror::Error;

/// Errors that can occur while driving the looter.
#[derive(Error, Debug)]
pub enum LooterError {
    /// The worker is already running.
    #[error("looter is already running")]
    AlreadyRunning,

    /// `start` was called without a scanner.
    #[error("no scanner configured")]
    NoScanner,

    /// `start` was called with [`LooterMode::Stopped`](crate::LooterMode::Stopped).
    #[error("cannot start in stopped mode")]
    InvalidMode,

    /// Profile or settings problem.
    #[error(transparent)]
    Rules(#[from] LootError),

    /// The world bridge failed. Fatal for the worker.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// The worker thread panicked and its state was lost.
    #[error("looter worker panicked")]
    WorkerPanicked,
}

/// Result type for looter operations.
pub type LooterResult<T> = Result<T, LooterError>;
