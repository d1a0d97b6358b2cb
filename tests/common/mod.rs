//! Shared mock hooks for integration tests.

#![allow(dead_code)]

use plotgrid::{
    Actor, AreaConfig, Capability, CapabilityCheck, Direction, EconomyAdapter, EventSink,
    MergeHooks, Notification, NotificationSink, OwnerId, PlotGridResult, PlotId, PreMergeResult,
    PresenceLookup, TerrainMutator,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Terrain mutator recording every call.
#[derive(Clone, Default)]
pub struct RecordingTerrain {
    pub removed: Arc<Mutex<Vec<(PlotId, PlotId, Direction)>>>,
    pub restored: Arc<Mutex<Vec<(PlotId, PlotId, Direction)>>>,
    pub signs_removed: Arc<Mutex<Vec<PlotId>>>,
    pub signs_placed: Arc<Mutex<Vec<(PlotId, String)>>>,
}

impl TerrainMutator for RecordingTerrain {
    fn remove_boundary(
        &mut self,
        a: PlotId,
        b: PlotId,
        direction: Direction,
    ) -> PlotGridResult<()> {
        self.removed.lock().unwrap().push((a, b, direction));
        Ok(())
    }

    fn restore_boundary(
        &mut self,
        a: PlotId,
        b: PlotId,
        direction: Direction,
    ) -> PlotGridResult<()> {
        self.restored.lock().unwrap().push((a, b, direction));
        Ok(())
    }

    fn remove_sign(&mut self, plot: PlotId) -> PlotGridResult<()> {
        self.signs_removed.lock().unwrap().push(plot);
        Ok(())
    }

    fn place_sign(&mut self, plot: PlotId, label: &str) -> PlotGridResult<()> {
        self.signs_placed
            .lock()
            .unwrap()
            .push((plot, label.to_string()));
        Ok(())
    }
}

/// Economy with per-owner balances; enabled wherever the area says so.
#[derive(Clone, Default)]
pub struct LedgerEconomy {
    pub balances: Arc<Mutex<HashMap<OwnerId, f64>>>,
}

impl LedgerEconomy {
    pub fn set_balance(&self, owner: OwnerId, amount: f64) -> &Self {
        self.balances.lock().unwrap().insert(owner, amount);
        self
    }

    pub fn balance_of(&self, owner: &OwnerId) -> f64 {
        self.balances
            .lock()
            .unwrap()
            .get(owner)
            .copied()
            .unwrap_or(0.0)
    }
}

impl EconomyAdapter for LedgerEconomy {
    fn is_enabled(&self, area: &AreaConfig) -> bool {
        area.economy_enabled
    }

    fn balance(&self, owner: &OwnerId) -> f64 {
        self.balance_of(owner)
    }

    fn withdraw(&mut self, owner: &OwnerId, amount: f64) -> PlotGridResult<()> {
        *self.balances.lock().unwrap().entry(*owner).or_insert(0.0) -= amount;
        Ok(())
    }
}

/// Event sink returning a scripted result and counting post-merge calls.
#[derive(Clone, Default)]
pub struct ScriptedEvents {
    pub result: Arc<Mutex<Option<PreMergeResult>>>,
    pub post_merges: Arc<Mutex<Vec<PlotId>>>,
}

impl ScriptedEvents {
    pub fn force(&self) -> &Self {
        *self.result.lock().unwrap() = Some(PreMergeResult::Force);
        self
    }

    pub fn deny(&self) -> &Self {
        *self.result.lock().unwrap() = Some(PreMergeResult::Deny);
        self
    }

    pub fn allow_adjusted(&self, direction: Direction, max: u32) -> &Self {
        *self.result.lock().unwrap() = Some(PreMergeResult::Allow { direction, max });
        self
    }
}

impl EventSink for ScriptedEvents {
    fn pre_merge(
        &mut self,
        _plot: PlotId,
        direction: Direction,
        max: u32,
        _actor: &Actor,
    ) -> PreMergeResult {
        (*self.result.lock().unwrap()).unwrap_or(PreMergeResult::Allow { direction, max })
    }

    fn post_merge(&mut self, _actor: &Actor, plot: PlotId) {
        self.post_merges.lock().unwrap().push(plot);
    }
}

/// Presence lookup over an explicit online set.
#[derive(Clone, Default)]
pub struct OnlineSet {
    pub online: Arc<Mutex<HashSet<OwnerId>>>,
}

impl OnlineSet {
    pub fn set_online(&self, owner: OwnerId) -> &Self {
        self.online.lock().unwrap().insert(owner);
        self
    }
}

impl PresenceLookup for OnlineSet {
    fn is_online(&self, owner: &OwnerId) -> bool {
        self.online.lock().unwrap().contains(owner)
    }
}

/// Capability table keyed by owner id.
#[derive(Clone, Default)]
pub struct CapabilityTable {
    pub granted: Arc<Mutex<HashMap<OwnerId, HashSet<Capability>>>>,
    pub tiers: Arc<Mutex<HashMap<OwnerId, u32>>>,
}

impl CapabilityTable {
    pub fn grant(&self, owner: OwnerId, capability: Capability) -> &Self {
        self.granted
            .lock()
            .unwrap()
            .entry(owner)
            .or_default()
            .insert(capability);
        self
    }

    pub fn tier(&self, owner: OwnerId, tier: u32) -> &Self {
        self.tiers.lock().unwrap().insert(owner, tier);
        self
    }
}

impl CapabilityCheck for CapabilityTable {
    fn has(&self, actor: &Actor, capability: Capability) -> bool {
        self.granted
            .lock()
            .unwrap()
            .get(&actor.id)
            .map(|set| set.contains(&capability))
            .unwrap_or(false)
    }

    fn scaled(&self, actor: &Actor, _prefix: &str) -> u32 {
        self.tiers
            .lock()
            .unwrap()
            .get(&actor.id)
            .copied()
            .unwrap_or(0)
    }
}

/// Notification sink recording everything delivered.
#[derive(Clone, Default)]
pub struct Inbox {
    pub delivered: Arc<Mutex<Vec<(OwnerId, Notification)>>>,
}

impl Inbox {
    pub fn for_recipient(&self, owner: &OwnerId) -> Vec<Notification> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == owner)
            .map(|(_, n)| n.clone())
            .collect()
    }
}

impl NotificationSink for Inbox {
    fn notify(&mut self, recipient: &OwnerId, notification: &Notification) {
        self.delivered
            .lock()
            .unwrap()
            .push((*recipient, notification.clone()));
    }
}

/// Bundle of mock hooks plus the handles to observe and script them.
#[derive(Clone, Default)]
pub struct TestHost {
    pub terrain: RecordingTerrain,
    pub economy: LedgerEconomy,
    pub events: ScriptedEvents,
    pub presence: OnlineSet,
    pub capabilities: CapabilityTable,
    pub inbox: Inbox,
}

impl TestHost {
    /// Also wires up `env_logger` so `RUST_LOG` controls engine log output
    /// when running the suites.
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self::default()
    }

    /// Builds a `MergeHooks` sharing state with this host's handles.
    pub fn hooks(&self) -> MergeHooks {
        MergeHooks {
            terrain: Box::new(self.terrain.clone()),
            economy: Box::new(self.economy.clone()),
            events: Box::new(self.events.clone()),
            presence: Box::new(self.presence.clone()),
            capabilities: Box::new(self.capabilities.clone()),
            notifications: Box::new(self.inbox.clone()),
        }
    }
}
