//! # Plotgrid
//!
//! Ownership, adjacency, and merging of rectangular land plots arranged on an
//! integer grid within named areas.
//!
//! ## Architecture Overview
//!
//! Plotgrid is built around a small number of cooperating pieces:
//!
//! - **Direction Model**: the nine symbolic directions (eight compass
//!   directions plus `All`), with opposite mapping, vector projection for
//!   "facing" resolution, and token parsing
//! - **Plot Grid**: the per-area repository owning every plot record and its
//!   connection state, with adjacency lookup and group traversal
//! - **Merge Engine**: direction resolution, eligibility validation, size
//!   limits, connectivity mutation, and settlement against the economy
//! - **Confirmation Coordinator**: pending cross-owner merge requests, one
//!   per responding owner, resolved by an explicit accept
//!
//! ## Host Integration
//!
//! Terrain mutation, economy, events, presence, capabilities, and player
//! notification are consumed through the traits in [`hooks`]. The engine
//! never touches blocks, ledgers, or chat directly; hosts plug in their own
//! implementations (no-op defaults are provided for embedding and tests).

pub mod grid;
pub mod hooks;
pub mod merge;

// Explicit re-exports for the types embedders touch on every call.
pub use grid::{
    AreaConfig, AreaPricing, Direction, OwnerId, Plot, PlotGrid, PlotId, PriceExpression, Vec3,
};
pub use hooks::{
    Capability, CapabilityCheck, EconomyAdapter, EventSink, Notification, NotificationSink,
    PreMergeResult, PresenceLookup, TerrainMutator,
};
pub use merge::{
    Actor, ConfirmationCoordinator, DenialReason, MergeEngine, MergeHooks, MergeOutcome,
    MergeResumption, PendingMerge,
};

/// Core error type for the plotgrid engine.
///
/// User-correctable merge failures are *not* errors; they are reported as
/// [`MergeOutcome`] variants. This enum covers internal contract violations
/// and repository misuse only.
#[derive(thiserror::Error, Debug)]
pub enum PlotGridError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Repository state is invalid or an operation would corrupt it
    #[error("Invalid grid state: {0}")]
    InvalidState(String),

    /// An event handler broke the pre-merge event contract
    #[error("Event contract violation: {0}")]
    EventContract(String),

    /// A host hook failed
    #[error("Hook failure: {0}")]
    HookFailed(String),
}

/// Result type used throughout the plotgrid codebase.
pub type PlotGridResult<T> = Result<T, PlotGridError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine configuration constants.
pub mod config {
    /// Largest plot volume a merge will consider.
    ///
    /// Group sizes are tracked as `i32`-sized counts downstream, so plots
    /// whose bounding volume cannot fit are rejected outright.
    pub const MAX_PLOT_VOLUME: i64 = i32::MAX as i64;

    /// Operation name used to look up merge pricing in an area's price table.
    pub const MERGE_PRICE_KEY: &str = "merge";

    /// Scaled capability prefix for the merged-group size limit.
    pub const MERGE_LIMIT_PREFIX: &str = "merge";
}
