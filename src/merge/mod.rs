//! # Merge Module
//!
//! The merge engine and its confirmation workflow.
//!
//! This module contains the core of plotgrid:
//! - Direction resolution and eligibility validation for merge requests
//! - Connectivity mutation and settlement against the economy
//! - The confirmation coordinator holding pending cross-owner requests

pub mod confirm;
pub mod engine;

pub use confirm::*;
pub use engine::*;

use crate::grid::{OwnerId, Vec3};
use serde::{Deserialize, Serialize};

/// The identity and orientation of whoever invoked a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    /// Owner identity of the actor
    pub id: OwnerId,
    /// Display name, used when rendering requests to other players
    pub name: String,
    /// Current facing vector, used to resolve `"forward"` requests
    pub facing: Vec3,
    /// Whether this caller's cross-owner merges skip the confirmation
    /// hand-off and execute immediately (e.g. a console actor)
    pub auto_confirm: bool,
}

impl Actor {
    /// Creates an actor facing nowhere in particular, requiring
    /// confirmation for cross-owner merges.
    pub fn new(id: OwnerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            facing: Vec3::ZERO,
            auto_confirm: false,
        }
    }

    /// Sets the facing vector.
    pub fn with_facing(mut self, facing: Vec3) -> Self {
        self.facing = facing;
        self
    }

    /// Marks this actor as exempt from the confirmation hand-off.
    pub fn with_auto_confirm(mut self) -> Self {
        self.auto_confirm = true;
        self
    }
}

/// Why a merge was denied before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialReason {
    /// No plot record exists at the requested coordinate
    UnknownPlot,
    /// The plot has no owner
    Unowned,
    /// The plot's volume exceeds the representable group size
    Oversized,
    /// The actor lacks a required capability; the node names it
    MissingCapability { node: String },
    /// The actor is neither the plot owner nor an admin merger
    NotPlotOwner,
    /// The pre-merge event vetoed the operation
    EventDenied,
}

/// Structured outcome of a merge invocation.
///
/// Everything a caller can act on is reported here; `Err` is reserved for
/// internal contract violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MergeOutcome {
    /// At least one boundary was removed and settlement completed
    Success {
        /// Number of boundaries removed by this invocation
        merged: usize,
    },
    /// The request failed validation or permissions; nothing changed
    Denied { reason: DenialReason },
    /// The direction token did not resolve to an eligible direction
    InvalidDirection {
        /// Tokens that would have been accepted
        options: Vec<String>,
        /// What `"forward"` would have resolved to, for user guidance
        forward: Option<crate::grid::Direction>,
    },
    /// The merged group would exceed the actor's size limit; the node names
    /// the next tier needed
    LimitExceeded { required_node: String },
    /// Settlement failed after connectivity was already mutated; the merge
    /// stands, no funds moved
    InsufficientFunds { price: f64 },
    /// A cross-owner request was registered and awaits confirmation
    RequestSent { responders: Vec<OwnerId> },
    /// No adjacent plot was eligible for merging; nothing changed
    NoMergeAvailable,
}
