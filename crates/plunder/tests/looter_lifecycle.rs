//! Integration test for the looter's worker lifecycle.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::{FakeWorld, BACKPACK};
use plunder::events::DEFAULT_EVENT_CAPACITY;
use plunder::{FixedTargets, Looter, LooterError, LooterEvent, LooterMode, NearbyContainers};
use plunder_rules::{LootProfile, LootRules, LooterSettings, Match};
use plunder_shared::{
    BridgeResult, Hue, ItemId, PlayerInfo, Serial, WorldBridge, WorldItem, WorldMobile, HUE_ERROR,
};

const CORPSE: Serial = 0x4000_0C01;

fn fast_settings() -> LooterSettings {
    LooterSettings {
        action_delay: 1,
        refresh_rate: 5,
        ..LooterSettings::default()
    }
}

fn gold_profile() -> LootProfile {
    LootProfile::new("gold").with_rule(LootRules::new("Gold").with_base(Match::type_single(0x0EED)))
}

fn gold_world(coins: u32) -> Arc<FakeWorld> {
    let world = Arc::new(FakeWorld::new());
    world.add_corpse(CORPSE);
    for i in 0..coins {
        world.add_item(0xA0 + i, 0x0EED, CORPSE, "gold coins", &[]);
    }
    world
}

fn counting_looter(world: &Arc<FakeWorld>) -> (Looter, Arc<AtomicUsize>) {
    let mut looter = Looter::new(world.clone(), gold_profile(), fast_settings());
    let stops = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&stops);
    looter.set_on_stop(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (looter, stops)
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out");
        thread::sleep(Duration::from_millis(2));
    }
}

/// A world whose content and property waits each take `delay`.
struct SlowWorld {
    inner: Arc<FakeWorld>,
    delay: Duration,
}

impl WorldBridge for SlowWorld {
    fn find_item(&self, serial: Serial) -> Option<WorldItem> {
        self.inner.find_item(serial)
    }

    fn find_mobile(&self, serial: Serial) -> Option<WorldMobile> {
        self.inner.find_mobile(serial)
    }

    fn use_item(&self, serial: Serial) -> BridgeResult<()> {
        self.inner.use_item(serial)
    }

    fn wait_for_contents(&self, serial: Serial, timeout: Duration) -> bool {
        thread::sleep(self.delay);
        self.inner.wait_for_contents(serial, timeout)
    }

    fn wait_for_props(&self, serial: Serial, timeout: Duration) -> bool {
        thread::sleep(self.delay);
        self.inner.wait_for_props(serial, timeout)
    }

    fn prop_strings(&self, serial: Serial) -> Vec<String> {
        self.inner.prop_strings(serial)
    }

    fn contents(&self, container: Serial) -> BridgeResult<Vec<WorldItem>> {
        self.inner.contents(container)
    }

    fn find_all_by_id(
        &self,
        ids: &[ItemId],
        color: Option<Hue>,
        container: Option<Serial>,
        depth: u32,
    ) -> BridgeResult<Vec<WorldItem>> {
        self.inner.find_all_by_id(ids, color, container, depth)
    }

    fn move_item(&self, serial: Serial, destination: Serial, amount: i32) -> BridgeResult<()> {
        self.inner.move_item(serial, destination, amount)
    }

    fn set_color(&self, serial: Serial, color: Hue) -> BridgeResult<()> {
        self.inner.set_color(serial, color)
    }

    fn send_message(&self, text: &str, hue: Hue) {
        self.inner.send_message(text, hue);
    }

    fn player(&self) -> BridgeResult<PlayerInfo> {
        self.inner.player()
    }
}

#[test]
fn test_start_requires_scanner() {
    let world = gold_world(1);
    let (mut looter, stops) = counting_looter(&world);

    assert!(matches!(looter.start(LooterMode::Loop), Err(LooterError::NoScanner)));
    assert_eq!(looter.mode(), LooterMode::Stopped);
    assert_eq!(stops.load(Ordering::SeqCst), 0);
}

#[test]
fn test_start_rejects_stopped_mode() {
    let world = gold_world(1);
    let (mut looter, _) = counting_looter(&world);
    looter.set_scanner(FixedTargets::new([CORPSE])).unwrap();

    assert!(matches!(looter.start(LooterMode::Stopped), Err(LooterError::InvalidMode)));
}

#[test]
fn test_single_run_drains_and_stops() {
    let world = gold_world(3);
    let (mut looter, stops) = counting_looter(&world);
    looter.set_scanner(FixedTargets::new([CORPSE])).unwrap();

    looter.start(LooterMode::Single).unwrap();
    looter.wait().unwrap();

    assert_eq!(world.moves().len(), 3);
    assert!(world.moves().iter().all(|&(_, dst, amount)| dst == BACKPACK && amount == -1));
    assert_eq!(stops.load(Ordering::SeqCst), 1);

    let status = looter.status();
    assert_eq!(status.mode, LooterMode::Stopped);
    assert_eq!(status.moves, 3);
    assert!(status.last_error.is_none());
    assert!(!looter.is_running());
}

#[test]
fn test_single_run_with_empty_scan_stops() {
    let world = Arc::new(FakeWorld::new());
    let (mut looter, stops) = counting_looter(&world);
    looter.set_scanner(NearbyContainers::corpses(2)).unwrap();

    looter.start(LooterMode::Single).unwrap();
    looter.wait().unwrap();

    assert_eq!(looter.status().ticks, 1);
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_loop_runs_until_stopped() {
    let world = gold_world(1);
    let (mut looter, stops) = counting_looter(&world);
    looter.set_scanner(FixedTargets::new([CORPSE])).unwrap();

    looter.start(LooterMode::Loop).unwrap();
    assert!(matches!(looter.start(LooterMode::Loop), Err(LooterError::AlreadyRunning)));
    assert!(matches!(
        looter.set_settings(LooterSettings::default()),
        Err(LooterError::AlreadyRunning)
    ));

    wait_until(|| looter.status().ticks >= 3);
    assert_eq!(looter.mode(), LooterMode::Loop);
    assert!(looter.is_running());

    looter.stop().unwrap();
    assert_eq!(stops.load(Ordering::SeqCst), 1);
    assert_eq!(looter.mode(), LooterMode::Stopped);
    assert_eq!(world.moves().len(), 1);

    // Already stopped: no second callback.
    looter.stop().unwrap();
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_caches_survive_restart() {
    let world = gold_world(1);
    let (mut looter, stops) = counting_looter(&world);
    looter.set_scanner(FixedTargets::new([CORPSE])).unwrap();

    looter.start(LooterMode::Single).unwrap();
    looter.wait().unwrap();
    assert!(looter
        .session()
        .and_then(|s| s.targets().get(CORPSE).copied())
        .is_some_and(|m| m.finished));

    looter.start(LooterMode::Single).unwrap();
    looter.wait().unwrap();
    assert_eq!(world.uses().len(), 1);
    assert_eq!(stops.load(Ordering::SeqCst), 2);

    looter.clear_target(CORPSE);
    assert!(looter.session().unwrap().targets().get(CORPSE).is_none());
}

#[test]
fn test_commands_apply_between_ticks() {
    let world = gold_world(0);
    world.add_item(0xE1, 0x0F10, CORPSE, "emerald", &[]);
    let (mut looter, _) = counting_looter(&world);
    looter.set_scanner(FixedTargets::new([CORPSE])).unwrap();

    looter.start(LooterMode::Loop).unwrap();
    wait_until(|| looter.status().ticks >= 2);
    assert!(world.moves().is_empty());

    let gems = LootProfile::new("gems")
        .with_rule(LootRules::new("Gems").with_base(Match::preset("gem").unwrap()));
    looter.set_profile(gems);
    looter.clear_target(CORPSE);

    wait_until(|| !world.moves().is_empty());
    looter.stop().unwrap();
    assert_eq!(world.moves(), vec![(0xE1, BACKPACK, -1)]);
    assert_eq!(looter.session().unwrap().profile().name, "gems");
}

#[test]
fn test_fatal_error_stops_with_one_message() {
    let world = gold_world(1);
    world.disconnect();
    let (mut looter, stops) = counting_looter(&world);
    looter.set_scanner(FixedTargets::new([CORPSE])).unwrap();

    looter.start(LooterMode::Loop).unwrap();
    looter.wait().unwrap();

    assert_eq!(stops.load(Ordering::SeqCst), 1);
    let errors: Vec<_> = world.messages().into_iter().filter(|(_, hue)| *hue == HUE_ERROR).collect();
    assert_eq!(errors.len(), 1);

    let status = looter.status();
    assert_eq!(status.mode, LooterMode::Stopped);
    assert!(status.last_error.is_some());
}

#[test]
fn test_events_describe_the_run() {
    let world = gold_world(1);
    let (mut looter, _) = counting_looter(&world);
    looter.set_scanner(FixedTargets::new([CORPSE])).unwrap();
    let events = looter.subscribe();

    looter.start(LooterMode::Single).unwrap();
    looter.wait().unwrap();

    let seen = events.drain();
    assert_eq!(seen.first(), Some(&LooterEvent::Started { mode: LooterMode::Single }));
    assert!(seen.contains(&LooterEvent::TargetOpened { container: CORPSE }));
    assert!(seen.contains(&LooterEvent::ItemMoved {
        item: 0xA0,
        destination: BACKPACK,
        rule: "Gold".to_string(),
    }));
    assert!(seen.contains(&LooterEvent::TargetFinished { container: CORPSE }));
    assert_eq!(seen.last(), Some(&LooterEvent::Stopped { error: None }));
}

#[test]
fn test_invalid_settings_rejected() {
    let world = gold_world(1);
    let (mut looter, _) = counting_looter(&world);
    let settings = LooterSettings {
        max_open_attempts: 0,
        ..LooterSettings::default()
    };
    assert!(matches!(looter.set_settings(settings), Err(LooterError::Rules(_))));
}

#[test]
fn test_stop_interrupts_a_slow_tick() {
    let world = Arc::new(FakeWorld::new());
    let corpses: Vec<Serial> = (0..6).map(|i| CORPSE + i).collect();
    for (i, &corpse) in corpses.iter().enumerate() {
        world.add_corpse(corpse);
        for j in 0..4 {
            let serial = 0xB000 + u32::try_from(i * 4 + j).unwrap();
            world.add_item(serial, 0x0F64, corpse, "torch", &[]);
        }
    }
    let delay = Duration::from_millis(200);
    let slow = Arc::new(SlowWorld {
        inner: Arc::clone(&world),
        delay,
    });

    let mut looter = Looter::new(slow, gold_profile(), fast_settings());
    looter.set_scanner(FixedTargets::new(corpses)).unwrap();
    looter.start(LooterMode::Loop).unwrap();
    thread::sleep(Duration::from_millis(100));

    let asked = Instant::now();
    looter.stop().unwrap();
    let latency = asked.elapsed();

    // One in-flight bridge call plus scheduling slack.
    assert!(latency < delay * 3, "stop took {latency:?}");
    assert_eq!(looter.mode(), LooterMode::Stopped);
    assert!(world.uses().len() < 6);
}

#[test]
fn test_panicking_stop_callback_keeps_looter_usable() {
    let world = gold_world(2);
    let mut looter = Looter::new(world.clone(), gold_profile(), fast_settings());
    looter.set_scanner(FixedTargets::new([CORPSE])).unwrap();
    looter.set_on_stop(|_| panic!("callback failure"));

    looter.start(LooterMode::Single).unwrap();
    looter.wait().unwrap();
    assert_eq!(world.moves().len(), 2);
    assert!(looter
        .session()
        .and_then(|s| s.targets().get(CORPSE).copied())
        .is_some_and(|m| m.finished));

    looter.set_scanner(FixedTargets::new([CORPSE])).unwrap();
    looter.start(LooterMode::Single).unwrap();
    looter.wait().unwrap();
    assert_eq!(world.uses().len(), 1);
    assert_eq!(looter.mode(), LooterMode::Stopped);
}

#[test]
fn test_late_subscriber_sees_the_end_of_a_long_run() {
    let coins = u32::try_from(DEFAULT_EVENT_CAPACITY).unwrap() + 20;
    let world = gold_world(coins);
    let (mut looter, _) = counting_looter(&world);
    looter.set_scanner(FixedTargets::new([CORPSE])).unwrap();

    looter.start(LooterMode::Single).unwrap();
    looter.wait().unwrap();
    assert_eq!(world.moves().len(), coins as usize);

    let seen = looter.subscribe().drain();
    assert_eq!(seen.len(), DEFAULT_EVENT_CAPACITY);
    assert_eq!(seen.last(), Some(&LooterEvent::Stopped { error: None }));
    assert!(!seen.contains(&LooterEvent::Started { mode: LooterMode::Single }));
}
