//! # Looting Session
//!
//! Everything the worker owns, and the tick that drives it.
//!
//! ## One Tick
//!
//! ```text
//! 1. apply pending commands (profile swap, manual re-loot)
//! 2. scan                      -> candidate containers, in scanner order
//! 3. greedy?  first match in an already-open container -> step 5
//! 4. open every candidate (retrying failed opens until each one is opened,
//!    finished or abandoned), union the filtered contents in scanner order
//! 5. loot_single: for each rule in priority order, take the LAST matching
//!    candidate, route it, move it, stop
//! ```
//!
//! A tick performs at most one move. The session is owned by exactly one
//! thread at a time, so the caches need no locking.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use plunder_rules::{ItemSummary, LootProfile, LooterSettings, Match};
use plunder_shared::constants::{CONTENTS_TIMEOUT, HUE_WARNING};
use plunder_shared::{
    BridgeError, PlayerInfo, Serial, WorldBridge, HUE_NOTICE, MOVE_ALL,
};

use crate::cache::SummaryCache;
use crate::cancel::CancelToken;
use crate::error::{LooterError, LooterResult};
use crate::events::{EventBus, EventSender, LooterCommand, LooterEvent};
use crate::looter::{LooterMode, LooterStatus};
use crate::memory::{LootingMemory, TargetCache};
use crate::scanner::Scanner;

/// What one tick saw and did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Candidates returned by the scanner.
    pub scanned: usize,
    /// Candidate items that passed the profile.
    pub lootables: usize,
    /// Whether an item was moved.
    pub moved: bool,
}

impl TickOutcome {
    /// Nothing left to do: no candidates or nothing wanted.
    #[inline]
    #[must_use]
    pub const fn is_drained(&self) -> bool {
        self.scanned == 0 || self.lootables == 0
    }
}

/// State owned by the looter's worker.
pub struct LootingSession {
    world: Arc<dyn WorldBridge>,
    profile: LootProfile,
    settings: LooterSettings,
    scanner: Option<Box<dyn Scanner>>,
    summaries: SummaryCache,
    targets: TargetCache,
    cancel: CancelToken,
    events: EventSender,
    commands: Option<Receiver<LooterCommand>>,
    status: Arc<Mutex<LooterStatus>>,
}

impl LootingSession {
    /// A stand-alone session without a scanner.
    #[must_use]
    pub fn new(world: Arc<dyn WorldBridge>, profile: LootProfile, settings: LooterSettings) -> Self {
        Self {
            world,
            profile,
            settings,
            scanner: None,
            summaries: SummaryCache::new(),
            targets: TargetCache::new(),
            cancel: CancelToken::new(),
            events: EventBus::default().sender(),
            commands: None,
            status: Arc::new(Mutex::new(LooterStatus::default())),
        }
    }

    /// Connects the session to its looter.
    pub(crate) fn attach(
        &mut self,
        cancel: CancelToken,
        events: EventSender,
        commands: Receiver<LooterCommand>,
        status: Arc<Mutex<LooterStatus>>,
    ) {
        self.cancel = cancel;
        self.events = events;
        self.commands = Some(commands);
        self.status = status;
    }

    /// Builder form of [`set_scanner`](Self::set_scanner).
    #[must_use]
    pub fn with_scanner(mut self, scanner: impl Scanner + 'static) -> Self {
        self.set_scanner(scanner);
        self
    }

    /// Replaces the scanner.
    pub fn set_scanner(&mut self, scanner: impl Scanner + 'static) {
        self.scanner = Some(Box::new(scanner));
    }

    /// True when a scanner is configured.
    #[must_use]
    pub fn has_scanner(&self) -> bool {
        self.scanner.is_some()
    }

    /// Active profile.
    #[must_use]
    pub fn profile(&self) -> &LootProfile {
        &self.profile
    }

    /// Swaps the profile. Takes effect on the next tick.
    pub fn set_profile(&mut self, profile: LootProfile) {
        tracing::info!("Looter profile set to {:?} ({} rules)", profile.name, profile.len());
        self.profile = profile;
    }

    /// Active settings.
    #[must_use]
    pub fn settings(&self) -> &LooterSettings {
        &self.settings
    }

    /// Replaces the settings.
    ///
    /// # Errors
    ///
    /// [`LooterError::Rules`] when the settings do not validate.
    pub fn set_settings(&mut self, settings: LooterSettings) -> LooterResult<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Container memories.
    #[must_use]
    pub fn targets(&self) -> &TargetCache {
        &self.targets
    }

    /// Item summaries.
    #[must_use]
    pub fn summaries(&self) -> &SummaryCache {
        &self.summaries
    }

    /// Forgets a container so it is opened again.
    pub fn clear_target(&mut self, serial: Serial) -> Option<LootingMemory> {
        tracing::debug!("Forgetting container {:#010x}", serial);
        self.targets.remove(serial)
    }

    /// The world bridge.
    #[must_use]
    pub fn world(&self) -> &dyn WorldBridge {
        self.world.as_ref()
    }

    pub(crate) fn emit(&self, event: LooterEvent) {
        if !self.events.send(event) {
            tracing::trace!("Looter event dropped");
        }
    }

    /// Applies every queued command.
    pub(crate) fn apply_commands(&mut self) {
        let Some(commands) = self.commands.clone() else {
            return;
        };
        for command in commands.try_iter() {
            match command {
                LooterCommand::ClearTarget(serial) => {
                    self.clear_target(serial);
                }
                LooterCommand::SetProfile(profile) => self.set_profile(profile),
            }
        }
    }

    // =========================================================================
    // RUN LOOP
    // =========================================================================

    /// Ticks until cancelled, drained (single mode) or a fatal error.
    ///
    /// # Errors
    ///
    /// Bridge failures other than rejected moves end the run.
    pub fn run(&mut self, mode: LooterMode) -> LooterResult<()> {
        tracing::info!("Looter running in {} mode", mode);
        while !self.cancel.is_cancelled() {
            let outcome = self.tick()?;
            {
                let mut status = self.status.lock();
                status.ticks += 1;
                status.moves += u64::from(outcome.moved);
            }

            if mode == LooterMode::Single && outcome.is_drained() {
                tracing::info!("Single run drained");
                break;
            }

            let pause = if outcome.moved {
                self.settings.action_delay()
            } else {
                self.settings.refresh_rate()
            };
            if self.cancel.sleep(pause) {
                break;
            }
        }
        Ok(())
    }

    /// One scan-open-evaluate-move cycle.
    ///
    /// # Errors
    ///
    /// [`LooterError::NoScanner`] without a scanner, [`LooterError::Bridge`]
    /// for fatal bridge failures.
    pub fn tick(&mut self) -> LooterResult<TickOutcome> {
        self.apply_commands();

        let player = self.world.player()?;
        if !player.connected {
            return Err(BridgeError::Disconnected.into());
        }

        let candidates = self
            .scanner
            .as_mut()
            .ok_or(LooterError::NoScanner)?
            .scan(self.world.as_ref())?;

        let greedy = if self.settings.greedy_looting {
            self.greedy_lootables(&candidates)?
        } else {
            None
        };
        let lootables = match greedy {
            Some(first) => first,
            None => self.collect_lootables(&candidates)?,
        };

        let moved = !lootables.is_empty() && self.loot_single(&player, &lootables)?;
        Ok(TickOutcome {
            scanned: candidates.len(),
            lootables: lootables.len(),
            moved,
        })
    }

    /// First wanted item in an already-open container, in scanner order.
    fn greedy_lootables(&mut self, candidates: &[Serial]) -> LooterResult<Option<Vec<ItemSummary>>> {
        for &container in candidates {
            let memory = self.targets.memory(container);
            if !memory.opened || memory.finished || !memory.lootable {
                continue;
            }
            for item in self.world.contents(container)? {
                if self.cancel.is_cancelled() {
                    return Ok(None);
                }
                let summary = self.summaries.summarize(self.world.as_ref(), &item);
                if self.profile.test(summary) {
                    return Ok(Some(vec![summary.clone()]));
                }
            }
        }
        Ok(None)
    }

    /// Opens every candidate and unions what the profile wants.
    fn collect_lootables(&mut self, candidates: &[Serial]) -> LooterResult<Vec<ItemSummary>> {
        let mut found: Vec<Option<Vec<ItemSummary>>> = vec![None; candidates.len()];

        while found.iter().any(Option::is_none) {
            if self.cancel.is_cancelled() {
                return Ok(Vec::new());
            }
            for (slot, &container) in found.iter_mut().zip(candidates) {
                if slot.is_some() {
                    continue;
                }
                if self.cancel.is_cancelled() {
                    return Ok(Vec::new());
                }
                let (opened, items) = self.attempt_open(container)?;
                if opened {
                    *slot = Some(items);
                }
            }
        }

        Ok(found.into_iter().flatten().flatten().collect())
    }

    /// Opens a container at most once per run and returns its wanted contents.
    ///
    /// The boolean is false when the open should be retried, or when the
    /// run was cancelled part way through.
    ///
    /// # Errors
    ///
    /// Fatal bridge failures.
    pub fn attempt_open(&mut self, container: Serial) -> LooterResult<(bool, Vec<ItemSummary>)> {
        let before = self.targets.memory(container);
        let mut memory = before;
        let result = self.open_with(&mut memory, container);
        if memory != before || self.targets.get(container).is_some() {
            self.targets.insert(container, memory);
        }
        result
    }

    fn open_with(
        &mut self,
        memory: &mut LootingMemory,
        container: Serial,
    ) -> LooterResult<(bool, Vec<ItemSummary>)> {
        if memory.finished {
            self.mark(memory, container)?;
            return Ok((true, Vec::new()));
        }
        if !memory.lootable {
            return Ok((true, Vec::new()));
        }
        if self.world.find_item(container).is_none() {
            tracing::debug!("Container {:#010x} is gone", container);
            return Ok((true, Vec::new()));
        }

        if !memory.opened {
            self.world.use_item(container)?;
            if !self.world.wait_for_contents(container, CONTENTS_TIMEOUT) {
                memory.open_attempts += 1;
                if memory.open_attempts >= self.settings.max_open_attempts {
                    tracing::debug!(
                        "Giving up on {:#010x} after {} attempts",
                        container,
                        memory.open_attempts
                    );
                    memory.lootable = false;
                    self.emit(LooterEvent::TargetAbandoned {
                        container,
                        attempts: memory.open_attempts,
                    });
                    return Ok((true, Vec::new()));
                }
                return Ok((false, Vec::new()));
            }
            memory.opened = true;
            tracing::debug!("Opened {:#010x}", container);
            self.emit(LooterEvent::TargetOpened { container });
            if self.cancel.sleep(self.settings.action_delay()) {
                return Ok((false, Vec::new()));
            }
        }

        let mut wanted = Vec::new();
        for item in self.world.contents(container)? {
            if self.cancel.is_cancelled() {
                return Ok((false, Vec::new()));
            }
            let summary = self.summaries.summarize(self.world.as_ref(), &item);
            if self.profile.test(summary) {
                wanted.push(summary.clone());
            }
        }

        if wanted.is_empty() {
            memory.finished = true;
            tracing::debug!("Finished {:#010x}", container);
            self.emit(LooterEvent::TargetFinished { container });
            self.mark(memory, container)?;
        }
        Ok((true, wanted))
    }

    /// Tints a finished container once, if configured and still present.
    fn mark(&self, memory: &mut LootingMemory, container: Serial) -> LooterResult<()> {
        if !self.settings.mark_after_finished || memory.marked {
            return Ok(());
        }
        if self.world.find_item(container).is_some() {
            self.world.set_color(container, self.settings.mark_color)?;
            memory.marked = true;
        }
        Ok(())
    }

    /// Moves at most one item: the last candidate of the first rule that has one.
    ///
    /// # Errors
    ///
    /// Fatal bridge failures. A rejected move is reported to the user and
    /// returns `Ok(false)`.
    pub fn loot_single(&mut self, player: &PlayerInfo, lootables: &[ItemSummary]) -> LooterResult<bool> {
        let world = self.world.as_ref();

        for rule in self.profile.rules() {
            let Some(item) = lootables.iter().rev().find(|item| rule.test(item)) else {
                continue;
            };

            let destination = match &rule.lootbag {
                Some(bag) => {
                    let found = find_lootbag(world, &mut self.summaries, &self.cancel, player.backpack, bag)?;
                    if self.cancel.is_cancelled() {
                        return Ok(false);
                    }
                    found.unwrap_or(player.backpack)
                }
                None => player.backpack,
            };

            if rule.highlight {
                world.set_color(item.serial, rule.highlight_color)?;
            }

            match world.move_item(item.serial, destination, MOVE_ALL) {
                Ok(()) => {}
                Err(BridgeError::MoveRejected { serial, reason }) => {
                    tracing::warn!("Move of {:#010x} rejected: {}", serial, reason);
                    world.send_message(&format!("Could not loot {}: {}", item.name, reason), HUE_WARNING);
                    if !self.events.send(LooterEvent::MoveRejected { item: serial, reason }) {
                        tracing::trace!("Looter event dropped");
                    }
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }

            tracing::info!(
                "Moved {:#010x} ({}) to {:#010x} by rule {:?}",
                item.serial,
                item.name,
                destination,
                rule.name
            );
            if rule.notify {
                world.send_message(&format!("{} matched: {}", rule.name, item.name), HUE_NOTICE);
            }
            if !self.events.send(LooterEvent::ItemMoved {
                item: item.serial,
                destination,
                rule: rule.name.clone(),
            }) {
                tracing::trace!("Looter event dropped");
            }
            return Ok(true);
        }
        Ok(false)
    }
}

/// First top-level backpack item whose summary satisfies `bag`.
/// Gives up early once `cancel` fires.
fn find_lootbag(
    world: &dyn WorldBridge,
    summaries: &mut SummaryCache,
    cancel: &CancelToken,
    backpack: Serial,
    bag: &Match,
) -> LooterResult<Option<Serial>> {
    for item in world.contents(backpack)? {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        if bag.test(summaries.summarize(world, &item)) {
            return Ok(Some(item.serial));
        }
    }
    Ok(None)
}

impl std::fmt::Debug for LootingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LootingSession")
            .field("profile", &self.profile.name)
            .field("settings", &self.settings)
            .field("has_scanner", &self.scanner.is_some())
            .field("summaries", &self.summaries.len())
            .field("targets", &self.targets.len())
            .finish()
    }
}
