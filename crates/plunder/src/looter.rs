//! # Looter
//!
//! The UI-facing controller. It owns one [`LootingSession`] and, while
//! running, one worker thread that owns the session instead.
//!
//! ```text
//!            start(Loop | Single)
//! STOPPED ─────────────────────────> LOOP / SINGLE
//!    ^                                    │
//!    └────────────────────────────────────┘
//!     stop() · single run drained · fatal bridge error
//! ```
//!
//! The stop callback fires exactly once per transition to `STOPPED`, from
//! the worker's exit path. `stop()` returns after it has run.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use plunder_rules::{LootProfile, LooterSettings};
use plunder_shared::{Serial, WorldBridge, HUE_ERROR};

use crate::cancel::CancelToken;
use crate::error::{LooterError, LooterResult};
use crate::events::{EventBus, EventReceiver, LooterCommand, LooterEvent};
use crate::scanner::Scanner;
use crate::session::LootingSession;

/// Run mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LooterMode {
    /// Not running.
    #[default]
    Stopped,
    /// Keep looting until stopped.
    Loop,
    /// Loot until the candidates are drained, then stop.
    Single,
}

impl fmt::Display for LooterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stopped => "stopped",
            Self::Loop => "loop",
            Self::Single => "single",
        })
    }
}

/// Snapshot of the looter's progress.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LooterStatus {
    /// Current mode.
    pub mode: LooterMode,
    /// Ticks completed in the current (or last) run.
    pub ticks: u64,
    /// Items moved in the current (or last) run.
    pub moves: u64,
    /// Fatal error that ended the last run.
    pub last_error: Option<String>,
}

/// Called once every time the looter stops.
pub type StopCallback = Arc<dyn Fn(&LooterStatus) + Send + Sync>;

/// Rule-driven looting controller.
pub struct Looter {
    session: Option<LootingSession>,
    worker: Option<JoinHandle<LootingSession>>,
    cancel: CancelToken,
    commands: Sender<LooterCommand>,
    events: EventBus,
    status: Arc<Mutex<LooterStatus>>,
    on_stop: Option<StopCallback>,
}

impl Looter {
    /// A stopped looter.
    #[must_use]
    pub fn new(world: Arc<dyn WorldBridge>, profile: LootProfile, settings: LooterSettings) -> Self {
        let cancel = CancelToken::new();
        let events = EventBus::default();
        let status = Arc::new(Mutex::new(LooterStatus::default()));
        let (commands, command_rx) = unbounded();

        let mut session = LootingSession::new(world, profile, settings);
        session.attach(cancel.clone(), events.sender(), command_rx, Arc::clone(&status));

        Self {
            session: Some(session),
            worker: None,
            cancel,
            commands,
            events,
            status,
            on_stop: None,
        }
    }

    /// Sets the callback run on every stop.
    pub fn set_on_stop(&mut self, callback: impl Fn(&LooterStatus) + Send + Sync + 'static) {
        self.on_stop = Some(Arc::new(callback));
    }

    /// Replaces the scanner. Requires the looter to be stopped.
    ///
    /// # Errors
    ///
    /// [`LooterError::AlreadyRunning`] while running.
    pub fn set_scanner(&mut self, scanner: impl Scanner + 'static) -> LooterResult<()> {
        self.stopped_session()?.set_scanner(scanner);
        Ok(())
    }

    /// Replaces the settings. Requires the looter to be stopped.
    ///
    /// # Errors
    ///
    /// [`LooterError::AlreadyRunning`] while running, [`LooterError::Rules`]
    /// for invalid settings.
    pub fn set_settings(&mut self, settings: LooterSettings) -> LooterResult<()> {
        self.stopped_session()?.set_settings(settings)
    }

    /// Swaps the profile, immediately when stopped, between ticks otherwise.
    pub fn set_profile(&mut self, profile: LootProfile) {
        if let Ok(session) = self.stopped_session() {
            session.set_profile(profile);
        } else {
            self.send(LooterCommand::SetProfile(profile));
        }
    }

    /// Forgets a container so it is looted again.
    pub fn clear_target(&mut self, serial: Serial) {
        if let Ok(session) = self.stopped_session() {
            session.clear_target(serial);
        } else {
            self.send(LooterCommand::ClearTarget(serial));
        }
    }

    fn send(&self, command: LooterCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Looter command channel closed");
        }
    }

    /// The session, when stopped. Advisory reads only.
    #[must_use]
    pub fn session(&self) -> Option<&LootingSession> {
        self.session.as_ref()
    }

    /// A new receiver for looter events.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        self.events.receiver()
    }

    /// Progress snapshot.
    #[must_use]
    pub fn status(&self) -> LooterStatus {
        self.status.lock().clone()
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> LooterMode {
        self.status.lock().mode
    }

    /// True while the worker is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Starts the worker.
    ///
    /// # Errors
    ///
    /// [`LooterError::InvalidMode`] for `Stopped`, [`LooterError::AlreadyRunning`],
    /// [`LooterError::NoScanner`], or [`LooterError::Rules`] for invalid settings.
    pub fn start(&mut self, mode: LooterMode) -> LooterResult<()> {
        if mode == LooterMode::Stopped {
            return Err(LooterError::InvalidMode);
        }
        let session = self.stopped_session()?;
        if !session.has_scanner() {
            return Err(LooterError::NoScanner);
        }
        session.settings().validate()?;

        let Some(session) = self.session.take() else {
            return Err(LooterError::WorkerPanicked);
        };
        self.cancel.reset();
        *self.status.lock() = LooterStatus {
            mode,
            ..LooterStatus::default()
        };
        session.emit(LooterEvent::Started { mode });
        tracing::info!("Looter starting in {} mode", mode);

        let status = Arc::clone(&self.status);
        let on_stop = self.on_stop.clone();
        self.worker = Some(thread::spawn(move || worker_main(session, mode, &status, on_stop)));
        Ok(())
    }

    /// Signals the worker and waits for it. A no-op when already stopped.
    ///
    /// # Errors
    ///
    /// [`LooterError::WorkerPanicked`] when the worker's state was lost.
    pub fn stop(&mut self) -> LooterResult<()> {
        if self.worker.is_none() {
            return Ok(());
        }
        self.cancel.cancel();
        let joined = self.join();
        self.cancel.reset();
        joined
    }

    /// Waits for the worker to end on its own (single mode, fatal errors).
    ///
    /// # Errors
    ///
    /// [`LooterError::WorkerPanicked`] when the worker's state was lost.
    pub fn wait(&mut self) -> LooterResult<()> {
        self.join()
    }

    fn join(&mut self) -> LooterResult<()> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };
        let mut session = handle.join().map_err(|_| LooterError::WorkerPanicked)?;
        session.apply_commands();
        self.session = Some(session);
        Ok(())
    }

    /// Reclaims the session from a finished worker, or fails while one runs.
    fn stopped_session(&mut self) -> LooterResult<&mut LootingSession> {
        if self.worker.as_ref().is_some_and(JoinHandle::is_finished) {
            self.join()?;
        }
        if self.worker.is_some() {
            return Err(LooterError::AlreadyRunning);
        }
        self.session.as_mut().ok_or(LooterError::WorkerPanicked)
    }
}

impl Drop for Looter {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!("Looter did not shut down cleanly: {}", e);
        }
    }
}

impl fmt::Debug for Looter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Looter")
            .field("status", &self.status())
            .field("running", &self.is_running())
            .finish()
    }
}

/// Worker body: run, report, call back, hand the session back.
fn worker_main(
    mut session: LootingSession,
    mode: LooterMode,
    status: &Mutex<LooterStatus>,
    on_stop: Option<StopCallback>,
) -> LootingSession {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| session.run(mode)));
    let error = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(_) => Some(LooterError::WorkerPanicked.to_string()),
    };

    if let Some(message) = &error {
        tracing::error!("Looter stopped: {}", message);
        session
            .world()
            .send_message(&format!("Looter stopped: {message}"), HUE_ERROR);
    }

    let snapshot = {
        let mut status = status.lock();
        status.mode = LooterMode::Stopped;
        status.last_error.clone_from(&error);
        status.clone()
    };
    tracing::info!(
        "Looter stopped after {} ticks, {} moves",
        snapshot.ticks,
        snapshot.moves
    );
    session.emit(LooterEvent::Stopped { error });

    if let Some(callback) = on_stop {
        if panic::catch_unwind(AssertUnwindSafe(|| callback(&snapshot))).is_err() {
            tracing::error!("Looter stop callback panicked");
        }
    }
    session
}
