//! # Plot Grid Repository
//!
//! Per-area storage of plot records and their connection state.
//!
//! The repository is the single owner of all `Plot` records; the merge
//! engine reads and mutates through this interface only. Connection
//! mutations update both participating records inside one `&mut self`
//! call, so the exclusive borrow is the pairwise atomicity guard: no
//! traversal can observe a half-updated reciprocal edge.

use crate::grid::{AreaConfig, Direction, OwnerId, Plot, PlotId};
use crate::{PlotGridError, PlotGridResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// The plot repository for a single area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotGrid {
    /// Configuration of the area this grid belongs to
    pub area: AreaConfig,
    plots: HashMap<PlotId, Plot>,
}

impl PlotGrid {
    /// Creates an empty grid for the given area.
    pub fn new(area: AreaConfig) -> Self {
        Self {
            area,
            plots: HashMap::new(),
        }
    }

    /// Returns the plot at the given coordinate, if any.
    pub fn get(&self, id: PlotId) -> Option<&Plot> {
        self.plots.get(&id)
    }

    /// Returns true if a plot record exists at the given coordinate.
    pub fn contains(&self, id: PlotId) -> bool {
        self.plots.contains_key(&id)
    }

    /// Number of plot records in this area.
    pub fn len(&self) -> usize {
        self.plots.len()
    }

    /// Returns true if the area holds no plots.
    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }

    /// Registers an owned plot at a free coordinate.
    pub fn claim(&mut self, id: PlotId, owner: OwnerId, volume: i64) -> PlotGridResult<()> {
        self.insert(Plot::new(id, owner, volume))
    }

    /// Registers an unowned plot record (claimable land).
    pub fn register_unowned(&mut self, id: PlotId, volume: i64) -> PlotGridResult<()> {
        self.insert(Plot::unowned(id, volume))
    }

    fn insert(&mut self, plot: Plot) -> PlotGridResult<()> {
        if self.plots.contains_key(&plot.id) {
            return Err(PlotGridError::InvalidState(format!(
                "plot {} already exists in area {}",
                plot.id, self.area.name
            )));
        }
        self.plots.insert(plot.id, plot);
        Ok(())
    }

    /// Returns the plot adjacent to `id` in the given compass direction.
    ///
    /// `All` has no single neighbor and yields `None`.
    pub fn relative(&self, id: PlotId, direction: Direction) -> Option<&Plot> {
        let delta = direction.offset()?;
        self.get(id + delta)
    }

    /// Compass directions in which `id` has any adjacent plot record,
    /// regardless of ownership, in canonical order.
    pub fn relative_directions(&self, id: PlotId) -> Vec<Direction> {
        Direction::COMPASS
            .iter()
            .copied()
            .filter(|d| self.relative(id, *d).is_some())
            .collect()
    }

    /// Returns true if the boundary from `id` toward `direction` has been
    /// removed.
    pub fn is_merged(&self, id: PlotId, direction: Direction) -> bool {
        self.get(id).map(|p| p.is_merged(direction)).unwrap_or(false)
    }

    /// The set of plots transitively reachable from `id` via removed
    /// boundaries. Contains at least `id` itself (when the plot exists).
    ///
    /// Recomputed on demand by breadth-first traversal; never cached.
    pub fn connected_group(&self, id: PlotId) -> Vec<PlotId> {
        let Some(start) = self.get(id) else {
            return Vec::new();
        };
        let mut seen: HashSet<PlotId> = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        seen.insert(start.id);
        order.push(start.id);
        queue.push_back(start.id);
        while let Some(current) = queue.pop_front() {
            let Some(plot) = self.get(current) else {
                continue;
            };
            for direction in plot.connections.iter() {
                let Some(delta) = direction.offset() else {
                    continue;
                };
                let next = current + delta;
                if self.contains(next) && seen.insert(next) {
                    order.push(next);
                    queue.push_back(next);
                }
            }
        }
        order
    }

    /// Removes the boundary between two adjacent plots.
    ///
    /// Both records are updated reciprocally (direction on `a`, opposite on
    /// `b`) in one step. Fails without any mutation when the plots are not
    /// adjacent along `direction`, either record is missing, or `b` is
    /// unowned.
    pub fn set_connection(
        &mut self,
        a: PlotId,
        b: PlotId,
        direction: Direction,
    ) -> PlotGridResult<()> {
        self.check_edge(a, b, direction)?;
        let target = self
            .plots
            .get(&b)
            .ok_or_else(|| PlotGridError::InvalidState(format!("no plot at {b}")))?;
        if !target.has_owner() {
            return Err(PlotGridError::InvalidState(format!(
                "cannot connect {a} to unowned plot {b}"
            )));
        }
        if !self.plots.contains_key(&a) {
            return Err(PlotGridError::InvalidState(format!("no plot at {a}")));
        }
        if let Some(plot) = self.plots.get_mut(&a) {
            plot.connections.insert(direction);
        }
        if let Some(plot) = self.plots.get_mut(&b) {
            plot.connections.insert(direction.opposite());
        }
        Ok(())
    }

    /// Restores the boundary between two adjacent plots, clearing both
    /// reciprocal flags in one step.
    pub fn clear_connection(
        &mut self,
        a: PlotId,
        b: PlotId,
        direction: Direction,
    ) -> PlotGridResult<()> {
        self.check_edge(a, b, direction)?;
        if !self.plots.contains_key(&a) || !self.plots.contains_key(&b) {
            return Err(PlotGridError::InvalidState(format!(
                "cannot clear connection between missing plots {a} and {b}"
            )));
        }
        if let Some(plot) = self.plots.get_mut(&a) {
            plot.connections.remove(&direction);
        }
        if let Some(plot) = self.plots.get_mut(&b) {
            plot.connections.remove(&direction.opposite());
        }
        Ok(())
    }

    /// Clears every connection of every plot in the group containing `id`.
    ///
    /// Returns the former group membership (at least `id` when it exists).
    pub fn unlink_group(&mut self, id: PlotId) -> Vec<PlotId> {
        let group = self.connected_group(id);
        for member in &group {
            if let Some(plot) = self.plots.get_mut(member) {
                plot.connections.clear();
            }
        }
        group
    }

    /// Adds an owner to an existing plot. Used when merged groups make
    /// members owner-equivalent.
    pub fn add_owner(&mut self, id: PlotId, owner: OwnerId) -> PlotGridResult<()> {
        let plot = self
            .plots
            .get_mut(&id)
            .ok_or_else(|| PlotGridError::InvalidState(format!("no plot at {id}")))?;
        plot.owners.insert(owner);
        Ok(())
    }

    fn check_edge(&self, a: PlotId, b: PlotId, direction: Direction) -> PlotGridResult<()> {
        let Some(delta) = direction.offset() else {
            return Err(PlotGridError::InvalidState(
                "connections must use a compass direction, not all".to_string(),
            ));
        };
        if a + delta != b {
            return Err(PlotGridError::InvalidState(format!(
                "plots {a} and {b} are not adjacent along {direction}"
            )));
        }
        Ok(())
    }
}
