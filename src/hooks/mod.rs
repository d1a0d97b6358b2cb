//! # Host Hooks
//!
//! Trait seams through which the engine consumes host services: terrain
//! mutation, the economy ledger, pre/post merge events, presence lookup,
//! capability checks, and player notification.
//!
//! Each trait ships a conservative default implementation (no-op terrain,
//! disabled economy, allow-all events, everyone-offline presence, deny-all
//! capabilities, discarded notifications) so the engine can be embedded or
//! tested piecemeal.

use crate::grid::{AreaConfig, Direction, OwnerId, PlotId};
use crate::merge::Actor;
use crate::PlotGridResult;
use serde::{Deserialize, Serialize};

/// Named capabilities gating merge operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Merge in every direction at once (`all` / `auto`)
    MergeAll,
    /// Merge into land owned by someone else
    MergeOther,
    /// Merge while keeping the road between plots
    MergeKeepRoad,
    /// Merge plots on behalf of their owner
    AdminMerge,
    /// Complete a cross-owner merge while every target owner is offline
    AdminMergeOtherOffline,
    /// Exempt from merge fees
    AdminBypassEcon,
}

impl Capability {
    /// The permission node string a host checks for this capability.
    pub fn node(self) -> &'static str {
        match self {
            Capability::MergeAll => "merge.all",
            Capability::MergeOther => "merge.other",
            Capability::MergeKeepRoad => "merge.keeproad",
            Capability::AdminMerge => "admin.merge",
            Capability::AdminMergeOtherOffline => "admin.merge.other.offline",
            Capability::AdminBypassEcon => "admin.bypass.econ",
        }
    }
}

/// Outcome of the cancellable pre-merge event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreMergeResult {
    /// Proceed, possibly with an adjusted direction and size cap.
    ///
    /// An adjusted direction outside the candidate set is an event-contract
    /// violation and aborts the merge fatally.
    Allow { direction: Direction, max: u32 },
    /// Veto the merge before any mutation
    Deny,
    /// Proceed and bypass all remaining eligibility, ownership, capability,
    /// and payment checks
    Force,
}

/// Typed notifications delivered to players through the host.
///
/// Exact user-facing strings are a front-end concern; the engine only
/// reports what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    /// A merge request from another player awaits confirmation
    MergeRequested { from: String, plot: PlotId },
    /// The recipient's accept was processed
    MergeAccepted,
    /// An accepted request could no longer be completed
    MergeInvalid,
    /// The merge fee was withdrawn
    BalanceWithdrawn { amount: f64, balance: f64 },
    /// A merge involving the recipient completed
    MergeCompleted { plot: PlotId },
    /// The recipient's request was forwarded and awaits a response
    RequestSent { plot: PlotId },
}

/// In-world terrain mutation, executed after connectivity changes.
///
/// Failures here are logged by the engine and never propagate as merge
/// failures.
pub trait TerrainMutator {
    /// Removes the road/wall section between two newly merged plots.
    fn remove_boundary(&mut self, a: PlotId, b: PlotId, direction: Direction)
        -> PlotGridResult<()>;

    /// Recreates the boundary between two plots that were unlinked.
    fn restore_boundary(
        &mut self,
        a: PlotId,
        b: PlotId,
        direction: Direction,
    ) -> PlotGridResult<()>;

    /// Removes the plot sign, if one is placed.
    fn remove_sign(&mut self, plot: PlotId) -> PlotGridResult<()>;

    /// Places or replaces the plot sign with the given label.
    fn place_sign(&mut self, plot: PlotId, label: &str) -> PlotGridResult<()>;
}

/// External economy ledger.
pub trait EconomyAdapter {
    /// Whether the economy applies to the given area.
    fn is_enabled(&self, area: &AreaConfig) -> bool;

    /// Current balance of an account.
    fn balance(&self, owner: &OwnerId) -> f64;

    /// Withdraws an amount from an account.
    ///
    /// Invoked at most once per successful merge, and only once the
    /// preconditions guarantee success; there is no compensating refund.
    fn withdraw(&mut self, owner: &OwnerId, amount: f64) -> PlotGridResult<()>;
}

/// Pre-merge veto hook and post-merge notification hook.
pub trait EventSink {
    /// Fired before any mutation; may deny, force, or adjust the merge.
    fn pre_merge(
        &mut self,
        plot: PlotId,
        direction: Direction,
        max: u32,
        actor: &Actor,
    ) -> PreMergeResult;

    /// Fired after a merge completed and settled.
    fn post_merge(&mut self, actor: &Actor, plot: PlotId);
}

/// Presence lookup deciding immediate-vs-pending cross-owner handling.
pub trait PresenceLookup {
    /// Whether the owner is currently reachable.
    fn is_online(&self, owner: &OwnerId) -> bool;
}

/// Opaque capability checks against the host permission system.
pub trait CapabilityCheck {
    /// Whether the actor holds the named capability.
    fn has(&self, actor: &Actor, capability: Capability) -> bool;

    /// Highest numeric tier granted under a scaled capability prefix
    /// (e.g. `merge.4` grants tier 4). Zero when none is granted.
    fn scaled(&self, actor: &Actor, prefix: &str) -> u32;
}

/// Notification delivery to players.
pub trait NotificationSink {
    /// Delivers a notification to a player; undeliverable messages are
    /// silently dropped by the host.
    fn notify(&mut self, recipient: &OwnerId, notification: &Notification);
}

/// Terrain mutator that does nothing. Useful for headless embedding.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTerrain;

impl TerrainMutator for NoopTerrain {
    fn remove_boundary(
        &mut self,
        _a: PlotId,
        _b: PlotId,
        _direction: Direction,
    ) -> PlotGridResult<()> {
        Ok(())
    }

    fn restore_boundary(
        &mut self,
        _a: PlotId,
        _b: PlotId,
        _direction: Direction,
    ) -> PlotGridResult<()> {
        Ok(())
    }

    fn remove_sign(&mut self, _plot: PlotId) -> PlotGridResult<()> {
        Ok(())
    }

    fn place_sign(&mut self, _plot: PlotId, _label: &str) -> PlotGridResult<()> {
        Ok(())
    }
}

/// Economy adapter with the economy switched off everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEconomy;

impl EconomyAdapter for DisabledEconomy {
    fn is_enabled(&self, _area: &AreaConfig) -> bool {
        false
    }

    fn balance(&self, _owner: &OwnerId) -> f64 {
        0.0
    }

    fn withdraw(&mut self, _owner: &OwnerId, _amount: f64) -> PlotGridResult<()> {
        Ok(())
    }
}

/// Event sink that allows every merge unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllEvents;

impl EventSink for AllowAllEvents {
    fn pre_merge(
        &mut self,
        _plot: PlotId,
        direction: Direction,
        max: u32,
        _actor: &Actor,
    ) -> PreMergeResult {
        PreMergeResult::Allow { direction, max }
    }

    fn post_merge(&mut self, _actor: &Actor, _plot: PlotId) {}
}

/// Presence lookup reporting everyone offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct NobodyOnline;

impl PresenceLookup for NobodyOnline {
    fn is_online(&self, _owner: &OwnerId) -> bool {
        false
    }
}

/// Capability check denying everything and granting no scaled tiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllCapabilities;

impl CapabilityCheck for DenyAllCapabilities {
    fn has(&self, _actor: &Actor, _capability: Capability) -> bool {
        false
    }

    fn scaled(&self, _actor: &Actor, _prefix: &str) -> u32 {
        0
    }
}

/// Notification sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardNotifications;

impl NotificationSink for DiscardNotifications {
    fn notify(&mut self, _recipient: &OwnerId, _notification: &Notification) {}
}
