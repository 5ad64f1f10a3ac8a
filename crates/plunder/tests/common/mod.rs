//! Scripted in-memory world bridge shared by the controller tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use parking_lot::Mutex;
use plunder_shared::{
    BridgeError, BridgeResult, Hue, ItemId, PlayerInfo, Position, Serial, WorldBridge,
    WorldItem, WorldMobile,
};

/// Serial of the player's backpack.
pub const BACKPACK: Serial = 0x4000_0BAC;

/// Serial of the player.
pub const PLAYER: Serial = 0x0000_1234;

/// Item type of a corpse.
pub const CORPSE: ItemId = 0x2006;

#[derive(Default)]
struct State {
    items: BTreeMap<Serial, WorldItem>,
    props: HashMap<Serial, Vec<String>>,
    open_failures: HashMap<Serial, u32>,
    rejected: HashSet<Serial>,
    disconnected: bool,
    uses: Vec<Serial>,
    move_attempts: Vec<(Serial, Serial, i32)>,
    moves: Vec<(Serial, Serial, i32)>,
    colors: Vec<(Serial, Hue)>,
    messages: Vec<(String, Hue)>,
}

/// A world that answers instantly and records every call.
#[derive(Default)]
pub struct FakeWorld {
    state: Mutex<State>,
}

impl FakeWorld {
    /// An empty world with a connected player and a backpack.
    pub fn new() -> Self {
        let world = Self::default();
        world.state.lock().items.insert(
            BACKPACK,
            WorldItem {
                serial: BACKPACK,
                itemid: 0x0E75,
                name: "backpack".to_string(),
                ..WorldItem::default()
            },
        );
        world
    }

    /// A corpse on the ground, at the player's feet.
    pub fn add_corpse(&self, serial: Serial) {
        self.add_corpse_at(serial, Position::default());
    }

    /// A corpse on the ground at `position`. The player stands at the origin.
    pub fn add_corpse_at(&self, serial: Serial, position: Position) {
        self.state.lock().items.insert(
            serial,
            WorldItem {
                serial,
                itemid: CORPSE,
                name: "a corpse".to_string(),
                position,
                ..WorldItem::default()
            },
        );
    }

    /// An item inside `container`.
    pub fn add_item(&self, serial: Serial, itemid: ItemId, container: Serial, name: &str, props: &[&str]) {
        self.add_colored_item(serial, itemid, 0, container, name, props);
    }

    /// A hued item inside `container`.
    pub fn add_colored_item(
        &self,
        serial: Serial,
        itemid: ItemId,
        color: Hue,
        container: Serial,
        name: &str,
        props: &[&str],
    ) {
        let mut state = self.state.lock();
        state.items.insert(
            serial,
            WorldItem {
                serial,
                itemid,
                color,
                amount: 1,
                name: name.to_string(),
                weight: 1,
                container: Some(container),
                ..WorldItem::default()
            },
        );
        state
            .props
            .insert(serial, props.iter().map(|s| (*s).to_string()).collect());
    }

    /// The next `count` content waits on `container` time out.
    pub fn fail_opens(&self, container: Serial, count: u32) {
        self.state.lock().open_failures.insert(container, count);
    }

    /// Moves of `serial` are refused by the server.
    pub fn reject_moves_of(&self, serial: Serial) {
        self.state.lock().rejected.insert(serial);
    }

    /// Moves of `serial` are accepted again.
    pub fn accept_moves_of(&self, serial: Serial) {
        self.state.lock().rejected.remove(&serial);
    }

    /// Logs the player out.
    pub fn disconnect(&self) {
        self.state.lock().disconnected = true;
    }

    /// `use_item` calls so far.
    pub fn uses(&self) -> Vec<Serial> {
        self.state.lock().uses.clone()
    }

    /// Successful moves so far.
    pub fn moves(&self) -> Vec<(Serial, Serial, i32)> {
        self.state.lock().moves.clone()
    }

    /// Every move request so far, rejected ones included.
    pub fn move_attempts(&self) -> Vec<(Serial, Serial, i32)> {
        self.state.lock().move_attempts.clone()
    }

    /// `set_color` calls so far.
    pub fn colors(&self) -> Vec<(Serial, Hue)> {
        self.state.lock().colors.clone()
    }

    /// User messages so far.
    pub fn messages(&self) -> Vec<(String, Hue)> {
        self.state.lock().messages.clone()
    }

    /// Container currently holding `serial`.
    pub fn container_of(&self, serial: Serial) -> Option<Serial> {
        self.state.lock().items.get(&serial).and_then(|i| i.container)
    }
}

impl WorldBridge for FakeWorld {
    fn find_item(&self, serial: Serial) -> Option<WorldItem> {
        self.state.lock().items.get(&serial).cloned()
    }

    fn find_mobile(&self, serial: Serial) -> Option<WorldMobile> {
        (serial == PLAYER).then(|| WorldMobile {
            serial,
            name: "player".to_string(),
            ..WorldMobile::default()
        })
    }

    fn use_item(&self, serial: Serial) -> BridgeResult<()> {
        self.state.lock().uses.push(serial);
        Ok(())
    }

    fn wait_for_contents(&self, serial: Serial, _timeout: Duration) -> bool {
        let mut state = self.state.lock();
        match state.open_failures.get_mut(&serial) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                false
            }
            _ => true,
        }
    }

    fn wait_for_props(&self, _serial: Serial, _timeout: Duration) -> bool {
        true
    }

    fn prop_strings(&self, serial: Serial) -> Vec<String> {
        self.state.lock().props.get(&serial).cloned().unwrap_or_default()
    }

    fn contents(&self, container: Serial) -> BridgeResult<Vec<WorldItem>> {
        Ok(self
            .state
            .lock()
            .items
            .values()
            .filter(|item| item.container == Some(container))
            .cloned()
            .collect())
    }

    fn find_all_by_id(
        &self,
        ids: &[ItemId],
        color: Option<Hue>,
        container: Option<Serial>,
        _depth: u32,
    ) -> BridgeResult<Vec<WorldItem>> {
        Ok(self
            .state
            .lock()
            .items
            .values()
            .filter(|item| ids.contains(&item.itemid))
            .filter(|item| color.map_or(true, |c| item.color == c))
            .filter(|item| item.container == container)
            .cloned()
            .collect())
    }

    fn move_item(&self, serial: Serial, destination: Serial, amount: i32) -> BridgeResult<()> {
        let mut state = self.state.lock();
        state.move_attempts.push((serial, destination, amount));
        if state.rejected.contains(&serial) {
            return Err(BridgeError::MoveRejected {
                serial,
                reason: "container full".to_string(),
            });
        }
        let item = state
            .items
            .get_mut(&serial)
            .ok_or_else(|| BridgeError::Failure(format!("no item {serial:#x}")))?;
        item.container = Some(destination);
        state.moves.push((serial, destination, amount));
        Ok(())
    }

    fn set_color(&self, serial: Serial, color: Hue) -> BridgeResult<()> {
        let mut state = self.state.lock();
        if let Some(item) = state.items.get_mut(&serial) {
            item.color = color;
        }
        state.colors.push((serial, color));
        Ok(())
    }

    fn send_message(&self, text: &str, hue: Hue) {
        self.state.lock().messages.push((text.to_string(), hue));
    }

    fn player(&self) -> BridgeResult<PlayerInfo> {
        if self.state.lock().disconnected {
            return Err(BridgeError::Disconnected);
        }
        Ok(PlayerInfo {
            serial: PLAYER,
            backpack: BACKPACK,
            connected: true,
            ..PlayerInfo::default()
        })
    }
}
