//! # Merge Engine
//!
//! Direction resolution, eligibility validation, connectivity mutation, and
//! settlement for plot merges.
//!
//! A merge invocation flows through validation, direction resolution, the
//! cancellable pre-merge event, eligibility checks, and then either executes
//! immediately (same-owner and forced merges), registers a pending
//! cross-owner request, or reports why nothing happened. Connectivity
//! mutation always happens before settlement; a settlement failure never
//! reverts connectivity.

use crate::grid::{Direction, OwnerId, PlotGrid, PlotId};
use crate::hooks::{
    AllowAllEvents, Capability, CapabilityCheck, DenyAllCapabilities, DisabledEconomy,
    DiscardNotifications, EconomyAdapter, EventSink, NobodyOnline, NoopTerrain, Notification,
    NotificationSink, PreMergeResult, PresenceLookup, TerrainMutator,
};
use crate::merge::{Actor, ConfirmationCoordinator, DenialReason, MergeOutcome, MergeResumption};
use crate::{config, PlotGridError, PlotGridResult};
use log::{debug, error, warn};
use std::collections::HashSet;

/// The bundle of host services the engine consumes.
pub struct MergeHooks {
    pub terrain: Box<dyn TerrainMutator>,
    pub economy: Box<dyn EconomyAdapter>,
    pub events: Box<dyn EventSink>,
    pub presence: Box<dyn PresenceLookup>,
    pub capabilities: Box<dyn CapabilityCheck>,
    pub notifications: Box<dyn NotificationSink>,
}

impl Default for MergeHooks {
    fn default() -> Self {
        Self {
            terrain: Box::new(NoopTerrain),
            economy: Box::new(DisabledEconomy),
            events: Box::new(AllowAllEvents),
            presence: Box::new(NobodyOnline),
            capabilities: Box::new(DenyAllCapabilities),
            notifications: Box::new(DiscardNotifications),
        }
    }
}

/// The merge engine.
///
/// Owns the host hooks and the confirmation coordinator; plot state is
/// always passed in as `&mut PlotGrid`, so the exclusive borrow covers each
/// invocation from validation through mutation.
pub struct MergeEngine {
    hooks: MergeHooks,
    confirmations: ConfirmationCoordinator,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(MergeHooks::default())
    }
}

impl MergeEngine {
    /// Creates an engine over the given host hooks.
    pub fn new(hooks: MergeHooks) -> Self {
        Self {
            hooks,
            confirmations: ConfirmationCoordinator::new(),
        }
    }

    /// Read access to the confirmation coordinator.
    pub fn confirmations(&self) -> &ConfirmationCoordinator {
        &self.confirmations
    }

    /// Drops any pending request held for a responder. Hosts call this when
    /// the responder disconnects.
    pub fn clear_pending(&mut self, responder: &OwnerId) {
        self.confirmations.clear(responder);
    }

    /// Attempts to merge `plot` with its neighbors.
    ///
    /// `direction_token` is the raw user token (`"forward"`/`"f"`,
    /// `"auto"`/`"a"`, a direction name or alias); absent means forward.
    /// `second_token` controls road removal: absent or `"true"`/`"t"` keeps
    /// the default of removing roads, anything else keeps them.
    ///
    /// Returns a structured [`MergeOutcome`]; `Err` is reserved for internal
    /// contract violations.
    pub fn merge(
        &mut self,
        grid: &mut PlotGrid,
        plot: PlotId,
        direction_token: Option<&str>,
        second_token: Option<&str>,
        actor: &Actor,
    ) -> PlotGridResult<MergeOutcome> {
        let (has_owner, volume, actor_is_owner, owner_abs) = match grid.get(plot) {
            Some(record) => (
                record.has_owner(),
                record.volume,
                record.is_owner(&actor.id),
                record.owner_abs(),
            ),
            None => {
                return Ok(MergeOutcome::Denied {
                    reason: DenialReason::UnknownPlot,
                })
            }
        };
        if !has_owner {
            return Ok(MergeOutcome::Denied {
                reason: DenialReason::Unowned,
            });
        }
        if volume > config::MAX_PLOT_VOLUME {
            return Ok(MergeOutcome::Denied {
                reason: DenialReason::Oversized,
            });
        }

        let can_merge_all = self.hooks.capabilities.has(actor, Capability::MergeAll);
        let mut candidates = Vec::with_capacity(9);
        if can_merge_all {
            candidates.push(Direction::All);
        }
        candidates.extend(grid.relative_directions(plot));

        let token = direction_token.unwrap_or("forward").trim().to_ascii_lowercase();
        let resolved = if token == "forward" || token == "f" {
            Direction::resolve_facing(&candidates, actor.facing)
        } else if token == "auto" || token == "a" {
            Some(Direction::All)
        } else {
            Direction::parse(&token)
        };

        if resolved == Some(Direction::All) && !can_merge_all {
            return Ok(MergeOutcome::Denied {
                reason: DenialReason::MissingCapability {
                    node: Capability::MergeAll.node().to_string(),
                },
            });
        }

        let mut direction = match resolved {
            Some(d) if candidates.contains(&d) => d,
            _ => {
                let mut options: Vec<String> = candidates
                    .iter()
                    .map(|d| match d {
                        Direction::All => d.name().to_string(),
                        _ => d.alias().to_string(),
                    })
                    .collect();
                options.push("forward".to_string());
                let forward = Direction::resolve_facing(&candidates, actor.facing);
                return Ok(MergeOutcome::InvalidDirection { options, forward });
            }
        };

        let current_size = grid.connected_group(plot).len();
        let mut max_allowed = self
            .hooks
            .capabilities
            .scaled(actor, config::MERGE_LIMIT_PREFIX);

        let mut forced = false;
        match self
            .hooks
            .events
            .pre_merge(plot, direction, max_allowed, actor)
        {
            PreMergeResult::Deny => {
                return Ok(MergeOutcome::Denied {
                    reason: DenialReason::EventDenied,
                })
            }
            PreMergeResult::Force => forced = true,
            PreMergeResult::Allow {
                direction: adjusted,
                max,
            } => {
                if !candidates.contains(&adjusted) {
                    error!(
                        "pre-merge handler adjusted direction to {adjusted}, \
                         which is not an eligible candidate for {plot}"
                    );
                    return Err(PlotGridError::EventContract(format!(
                        "adjusted direction {adjusted} is not an eligible candidate"
                    )));
                }
                direction = adjusted;
                max_allowed = max;
            }
        }

        if !forced && current_size - 1 > max_allowed as usize {
            return Ok(MergeOutcome::LimitExceeded {
                required_node: format!("{}.{}", config::MERGE_LIMIT_PREFIX, current_size + 1),
            });
        }

        let price = grid
            .area
            .pricing
            .evaluate(config::MERGE_PRICE_KEY, current_size);

        // A non-owner needs the admin capability and then acts on behalf of
        // the plot's first owner; the fee stays billed to the invoking actor.
        let mut merge_owner = actor.id;
        if !forced && !actor_is_owner {
            if !self.hooks.capabilities.has(actor, Capability::AdminMerge) {
                return Ok(MergeOutcome::Denied {
                    reason: DenialReason::NotPlotOwner,
                });
            }
            merge_owner = owner_abs.unwrap_or(actor.id);
        }

        let remove_roads = second_token
            .map_or(true, |t| t.eq_ignore_ascii_case("true") || t.eq_ignore_ascii_case("t"));
        if !forced && !remove_roads && !self.hooks.capabilities.has(actor, Capability::MergeKeepRoad)
        {
            return Ok(MergeOutcome::Denied {
                reason: DenialReason::MissingCapability {
                    node: Capability::MergeKeepRoad.node().to_string(),
                },
            });
        }

        debug!(
            "merge: plot={plot} direction={direction} size={current_size} \
             max={max_allowed} price={price} forced={forced}"
        );

        if direction == Direction::All {
            let mut remaining = max_allowed as usize;
            let merged =
                self.auto_merge_all(grid, plot, &merge_owner, &mut remaining, remove_roads)?;
            if merged > 0 {
                return self.settle(grid, plot, actor, price, forced, merged);
            }
            return Ok(MergeOutcome::NoMergeAvailable);
        }

        // Same-owner merges complete immediately.
        let mut remaining = if forced {
            usize::MAX
        } else {
            (max_allowed as usize).saturating_sub(current_size)
        };
        if self.try_edge(grid, plot, direction, &merge_owner, &mut remaining, remove_roads)? {
            return self.settle(grid, plot, actor, price, forced, 1);
        }

        // Distinguish "nothing to merge with" from a cross-owner request.
        let adjacent_owners: Vec<OwnerId> = {
            let Some(adjacent) = grid.relative(plot, direction) else {
                return Ok(MergeOutcome::NoMergeAvailable);
            };
            if !adjacent.has_owner()
                || adjacent.is_merged(direction.opposite())
                || (!forced && adjacent.is_owner(&merge_owner))
            {
                return Ok(MergeOutcome::NoMergeAvailable);
            }
            adjacent.owners.iter().copied().collect()
        };

        if !forced && !self.hooks.capabilities.has(actor, Capability::MergeOther) {
            return Ok(MergeOutcome::Denied {
                reason: DenialReason::MissingCapability {
                    node: Capability::MergeOther.node().to_string(),
                },
            });
        }

        let online: Vec<OwnerId> = adjacent_owners
            .iter()
            .copied()
            .filter(|o| self.hooks.presence.is_online(o))
            .collect();

        let immediate_responder = if forced {
            online.first().or(adjacent_owners.first()).copied()
        } else if actor.auto_confirm {
            online.first().copied()
        } else if online.is_empty()
            && self
                .hooks
                .capabilities
                .has(actor, Capability::AdminMergeOtherOffline)
        {
            adjacent_owners.first().copied()
        } else {
            None
        };

        if let Some(responder) = immediate_responder {
            let resumption = MergeResumption {
                plot,
                direction,
                responder,
                initiator: actor.id,
                initiator_name: actor.name.clone(),
                price,
                remove_roads,
                budget: remaining,
                forced,
            };
            return self.run_resumption(grid, &resumption);
        }

        // One pending entry per current owner of the adjacent plot, offline
        // owners included; a newer request replaces an older one.
        for owner in &adjacent_owners {
            let resumption = MergeResumption {
                plot,
                direction,
                responder: *owner,
                initiator: actor.id,
                initiator_name: actor.name.clone(),
                price,
                remove_roads,
                budget: remaining,
                forced: false,
            };
            let message = format!(
                "{} requests to merge plot {} in {} toward {}",
                actor.name, plot, grid.area.name, direction
            );
            self.confirmations.add_pending(*owner, message, resumption);
            if self.hooks.presence.is_online(owner) {
                self.hooks.notifications.notify(
                    owner,
                    &Notification::MergeRequested {
                        from: actor.name.clone(),
                        plot,
                    },
                );
            }
        }
        self.hooks
            .notifications
            .notify(&actor.id, &Notification::RequestSent { plot });
        Ok(MergeOutcome::RequestSent {
            responders: adjacent_owners,
        })
    }

    /// Resolves a responder's accept of a pending cross-owner request.
    ///
    /// Returns `Ok(None)` when nothing was pending, so stale and duplicate
    /// accepts are no-ops. Eligibility is re-checked before mutating, so a
    /// request invalidated in the meantime yields `NoMergeAvailable`.
    pub fn accept(
        &mut self,
        grid: &mut PlotGrid,
        responder: &OwnerId,
    ) -> PlotGridResult<Option<MergeOutcome>> {
        let Some(pending) = self.confirmations.take(responder) else {
            return Ok(None);
        };
        self.hooks
            .notifications
            .notify(responder, &Notification::MergeAccepted);
        if !self
            .hooks
            .presence
            .is_online(&pending.resumption.initiator)
        {
            self.hooks
                .notifications
                .notify(responder, &Notification::MergeInvalid);
            return Ok(Some(MergeOutcome::NoMergeAvailable));
        }
        let outcome = self.run_resumption(grid, &pending.resumption)?;
        Ok(Some(outcome))
    }

    /// Unlinks the group containing `plot`, restoring boundaries and signs
    /// through the terrain mutator.
    ///
    /// Returns `false` when the plot is not part of a merged group.
    pub fn unlink(
        &mut self,
        grid: &mut PlotGrid,
        plot: PlotId,
        create_road: bool,
        create_sign: bool,
    ) -> PlotGridResult<bool> {
        let group = grid.connected_group(plot);
        if group.len() <= 1 {
            return Ok(false);
        }

        // Collect each removed edge once before clearing anything.
        let mut edges = Vec::new();
        let mut seen: HashSet<(PlotId, PlotId)> = HashSet::new();
        for member in &group {
            let Some(record) = grid.get(*member) else {
                continue;
            };
            for direction in record.connections.iter().copied() {
                let Some(delta) = direction.offset() else {
                    continue;
                };
                let other = *member + delta;
                if seen.contains(&(other, *member)) {
                    continue;
                }
                seen.insert((*member, other));
                edges.push((*member, other, direction));
            }
        }

        grid.unlink_group(plot);

        if create_road {
            for (a, b, direction) in &edges {
                if let Err(e) = self.hooks.terrain.restore_boundary(*a, *b, *direction) {
                    warn!("boundary restore between {a} and {b} failed: {e}");
                }
            }
        }
        if create_sign {
            for member in &group {
                let label = member.to_string();
                if let Err(e) = self.hooks.terrain.place_sign(*member, &label) {
                    warn!("sign placement at {member} failed: {e}");
                }
            }
        }
        debug!("unlinked group of {} plots at {plot}", group.len());
        Ok(true)
    }

    /// Executes a merge resumption: the directional merge followed by
    /// settlement. Used for forced/immediate cross-owner merges and for
    /// accepted pending requests.
    fn run_resumption(
        &mut self,
        grid: &mut PlotGrid,
        resumption: &MergeResumption,
    ) -> PlotGridResult<MergeOutcome> {
        let mut remaining = if resumption.forced {
            usize::MAX
        } else {
            resumption.budget
        };
        if !self.try_edge(
            grid,
            resumption.plot,
            resumption.direction,
            &resumption.responder,
            &mut remaining,
            resumption.remove_roads,
        )? {
            return Ok(MergeOutcome::NoMergeAvailable);
        }
        let initiator = Actor::new(resumption.initiator, resumption.initiator_name.clone());
        let outcome = self.settle(
            grid,
            resumption.plot,
            &initiator,
            resumption.price,
            resumption.forced,
            1,
        )?;
        if resumption.responder != resumption.initiator {
            self.hooks.notifications.notify(
                &resumption.responder,
                &Notification::MergeCompleted {
                    plot: resumption.plot,
                },
            );
        }
        Ok(outcome)
    }

    /// Sweeps every compass direction from the whole connected group,
    /// repeatedly, until a full pass merges nothing. Returns the number of
    /// boundaries removed.
    fn auto_merge_all(
        &mut self,
        grid: &mut PlotGrid,
        plot: PlotId,
        owner: &OwnerId,
        remaining: &mut usize,
        remove_roads: bool,
    ) -> PlotGridResult<usize> {
        let mut total = 0;
        loop {
            let mut pass = 0;
            for direction in Direction::COMPASS {
                let members = grid.connected_group(plot);
                for member in members {
                    if self.try_edge(grid, member, direction, owner, remaining, remove_roads)? {
                        pass += 1;
                    }
                }
            }
            if pass == 0 {
                break;
            }
            total += pass;
        }
        Ok(total)
    }

    /// Attempts one directional merge from `from`.
    ///
    /// Eligible iff the adjacent plot exists, is owned by `owner`, and the
    /// boundary is still in place, and the joining group fits the remaining
    /// plot budget. On success the reciprocal connection is set and terrain
    /// mutation is triggered; terrain failures are logged, never propagated.
    fn try_edge(
        &mut self,
        grid: &mut PlotGrid,
        from: PlotId,
        direction: Direction,
        owner: &OwnerId,
        remaining: &mut usize,
        remove_roads: bool,
    ) -> PlotGridResult<bool> {
        let Some(delta) = direction.offset() else {
            return Ok(false);
        };
        let target_id = from + delta;
        let eligible = {
            let Some(target) = grid.get(target_id) else {
                return Ok(false);
            };
            target.has_owner()
                && target.is_owner(owner)
                && !target.is_merged(direction.opposite())
                && !grid.is_merged(from, direction)
        };
        if !eligible {
            return Ok(false);
        }

        let joining = if grid.connected_group(from).contains(&target_id) {
            // Already one group; this edge only closes a cycle.
            0
        } else {
            grid.connected_group(target_id).len()
        };
        if joining > *remaining {
            return Ok(false);
        }

        grid.set_connection(from, target_id, direction)?;
        *remaining -= joining;

        if remove_roads {
            if let Err(e) = self.hooks.terrain.remove_boundary(from, target_id, direction) {
                warn!("boundary removal between {from} and {target_id} failed: {e}");
            }
        }
        if let Err(e) = self.hooks.terrain.remove_sign(target_id) {
            warn!("sign removal at {target_id} failed: {e}");
        }
        debug!("merged {from} -> {target_id} ({direction})");
        Ok(true)
    }

    /// Settles a merge that already mutated connectivity: fee withdrawal,
    /// then the post-merge event. A failed affordability check aborts the
    /// settlement but never reverts connectivity; land state and payment
    /// are not transactionally linked.
    fn settle(
        &mut self,
        grid: &PlotGrid,
        plot: PlotId,
        actor: &Actor,
        price: f64,
        forced: bool,
        merged: usize,
    ) -> PlotGridResult<MergeOutcome> {
        if self.hooks.economy.is_enabled(&grid.area)
            && !self.hooks.capabilities.has(actor, Capability::AdminBypassEcon)
            && price > 0.0
        {
            if !forced && self.hooks.economy.balance(&actor.id) < price {
                return Ok(MergeOutcome::InsufficientFunds { price });
            }
            self.hooks.economy.withdraw(&actor.id, price)?;
            let balance = self.hooks.economy.balance(&actor.id);
            self.hooks.notifications.notify(
                &actor.id,
                &Notification::BalanceWithdrawn {
                    amount: price,
                    balance,
                },
            );
        }
        self.hooks.events.post_merge(actor, plot);
        self.hooks
            .notifications
            .notify(&actor.id, &Notification::MergeCompleted { plot });
        Ok(MergeOutcome::Success { merged })
    }
}
