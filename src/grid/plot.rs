//! # Plot Records
//!
//! Plot and area records: ownership, connection state, and merge pricing.

use crate::grid::{Direction, PlotId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use uuid::Uuid;

/// Unique identifier for plot owners.
pub type OwnerId = Uuid;

/// Creates a new unique owner ID.
pub fn new_owner_id() -> OwnerId {
    Uuid::new_v4()
}

/// A single grid cell of land.
///
/// The `connections` set is the merge state: a direction is present exactly
/// when the boundary toward that neighbor has been removed. Connections are
/// always reciprocal; if this plot connects east, the eastern neighbor
/// connects west.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plot {
    /// Grid coordinate of this plot
    pub id: PlotId,
    /// Current owners. Plots absorbed into a merged group can carry every
    /// member as owner-equivalent for permission purposes.
    pub owners: BTreeSet<OwnerId>,
    /// Compass directions whose boundary has been removed. Never contains
    /// `Direction::All`.
    pub connections: HashSet<Direction>,
    /// Bounding volume of the plot, used to reject oversized merges
    pub volume: i64,
}

impl Plot {
    /// Creates an owned plot with no connections.
    pub fn new(id: PlotId, owner: OwnerId, volume: i64) -> Self {
        let mut owners = BTreeSet::new();
        owners.insert(owner);
        Self {
            id,
            owners,
            connections: HashSet::new(),
            volume,
        }
    }

    /// Creates an unowned plot record.
    pub fn unowned(id: PlotId, volume: i64) -> Self {
        Self {
            id,
            owners: BTreeSet::new(),
            connections: HashSet::new(),
            volume,
        }
    }

    /// Returns true if the plot has at least one owner.
    pub fn has_owner(&self) -> bool {
        !self.owners.is_empty()
    }

    /// Returns true if the given id is listed as an owner of this plot.
    pub fn is_owner(&self, id: &OwnerId) -> bool {
        self.owners.contains(id)
    }

    /// Returns an arbitrary-but-stable owner, if any.
    ///
    /// Used when a single accountable owner is needed for a multi-owner
    /// plot (admin merges, offline cross-owner merges).
    pub fn owner_abs(&self) -> Option<OwnerId> {
        self.owners.iter().next().copied()
    }

    /// Returns true if the boundary toward `direction` has been removed.
    pub fn is_merged(&self, direction: Direction) -> bool {
        self.connections.contains(&direction)
    }
}

/// Configuration for one named area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaConfig {
    /// Area name, unique among areas
    pub name: String,
    /// Whether the economy applies to operations in this area
    pub economy_enabled: bool,
    /// Per-operation pricing
    pub pricing: AreaPricing,
}

impl AreaConfig {
    /// Creates an area with no pricing and the economy disabled.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            economy_enabled: false,
            pricing: AreaPricing::default(),
        }
    }
}

/// Mapping from operation name (e.g. `"merge"`) to a price expression.
///
/// Absent entries imply zero cost.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaPricing {
    prices: HashMap<String, PriceExpression>,
}

impl AreaPricing {
    /// Sets the price expression for an operation.
    pub fn set(&mut self, operation: impl Into<String>, expr: PriceExpression) {
        self.prices.insert(operation.into(), expr);
    }

    /// Returns the price expression for an operation, if configured.
    pub fn get(&self, operation: &str) -> Option<&PriceExpression> {
        self.prices.get(operation)
    }

    /// Evaluates the price of an operation for a given group size.
    ///
    /// Unconfigured operations cost nothing.
    pub fn evaluate(&self, operation: &str, group_size: usize) -> f64 {
        self.prices
            .get(operation)
            .map(|expr| expr.evaluate(group_size))
            .unwrap_or(0.0)
    }
}

/// A price as a function of current group size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceExpression {
    /// Flat price regardless of group size
    Constant { amount: f64 },
    /// Price scaling with the size of the group being extended
    Linear { base: f64, per_plot: f64 },
}

impl PriceExpression {
    /// Evaluates the expression against the current group size.
    pub fn evaluate(&self, group_size: usize) -> f64 {
        match *self {
            PriceExpression::Constant { amount } => amount,
            PriceExpression::Linear { base, per_plot } => base + per_plot * group_size as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_ownership() {
        let owner = new_owner_id();
        let plot = Plot::new(PlotId::new(0, 0), owner, 64);
        assert!(plot.has_owner());
        assert!(plot.is_owner(&owner));
        assert_eq!(plot.owner_abs(), Some(owner));
        assert!(!plot.is_owner(&new_owner_id()));

        let empty = Plot::unowned(PlotId::new(1, 0), 64);
        assert!(!empty.has_owner());
        assert_eq!(empty.owner_abs(), None);
    }

    #[test]
    fn test_pricing_defaults_to_zero() {
        let pricing = AreaPricing::default();
        assert_eq!(pricing.evaluate("merge", 4), 0.0);
    }

    #[test]
    fn test_price_expressions() {
        let mut pricing = AreaPricing::default();
        pricing.set("merge", PriceExpression::Constant { amount: 10.0 });
        assert_eq!(pricing.evaluate("merge", 1), 10.0);
        assert_eq!(pricing.evaluate("merge", 9), 10.0);

        pricing.set(
            "merge",
            PriceExpression::Linear {
                base: 5.0,
                per_plot: 2.5,
            },
        );
        assert_eq!(pricing.evaluate("merge", 4), 15.0);
    }

    #[test]
    fn test_price_expression_serde_roundtrip() {
        let expr = PriceExpression::Linear {
            base: 1.0,
            per_plot: 0.5,
        };
        let json = serde_json::to_string(&expr).unwrap();
        let back: PriceExpression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
    }
}
