//! # Confirmation Coordinator
//!
//! Pending cross-owner merge requests, one per responding owner.
//!
//! The coordinator is the hand-off point between a merge invocation that
//! needs another owner's consent and that owner's later accept. Entries are
//! process-local: they live until accepted, replaced by a newer request, or
//! cleared when the responder disconnects. There is no expiry timer.

use crate::grid::{Direction, OwnerId, PlotId};
use std::collections::HashMap;

/// Immutable context needed to resume a merge once the responder accepts.
///
/// Captured at request time; eligibility is re-checked when the resumption
/// actually runs, so a stale context degrades to "no merge available"
/// rather than corrupting the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeResumption {
    /// Plot the initiator is merging from
    pub plot: PlotId,
    /// Resolved merge direction
    pub direction: Direction,
    /// Owner whose consent (and land) this resumption concerns
    pub responder: OwnerId,
    /// Actor who initiated the merge and pays for it
    pub initiator: OwnerId,
    /// Initiator's display name, for notifications
    pub initiator_name: String,
    /// Price evaluated at request time
    pub price: f64,
    /// Whether road removal was requested
    pub remove_roads: bool,
    /// Additional plots the initiator's limit still allows
    pub budget: usize,
    /// Whether an authoritative override bypasses remaining checks
    pub forced: bool,
}

/// A pending merge request awaiting one owner's accept.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMerge {
    /// Pre-rendered confirmation message for display to the responder
    pub message: String,
    /// Context to resume the merge with on accept
    pub resumption: MergeResumption,
}

/// Holds at most one pending merge request per responding owner.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationCoordinator {
    pending: HashMap<OwnerId, PendingMerge>,
}

impl ConfirmationCoordinator {
    /// Creates an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pending request for a responder, replacing any existing
    /// one. Requests are never queued.
    pub fn add_pending(&mut self, responder: OwnerId, message: String, resumption: MergeResumption) {
        if self.pending.contains_key(&responder) {
            log::debug!("replacing pending merge request for responder {responder}");
        }
        self.pending.insert(
            responder,
            PendingMerge {
                message,
                resumption,
            },
        );
    }

    /// Removes and returns the pending request for a responder.
    ///
    /// Returns `None` when nothing is pending, making stale or duplicate
    /// accepts no-ops by construction.
    pub fn take(&mut self, responder: &OwnerId) -> Option<PendingMerge> {
        self.pending.remove(responder)
    }

    /// Drops the pending request for a responder, if any. Called when the
    /// responder disconnects.
    pub fn clear(&mut self, responder: &OwnerId) {
        self.pending.remove(responder);
    }

    /// Returns true if a request is pending for the responder.
    pub fn has_pending(&self, responder: &OwnerId) -> bool {
        self.pending.contains_key(responder)
    }

    /// The rendered confirmation message awaiting the responder, if any.
    pub fn pending_message(&self, responder: &OwnerId) -> Option<&str> {
        self.pending.get(responder).map(|p| p.message.as_str())
    }

    /// Number of owners with a request pending.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if no requests are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::new_owner_id;

    fn resumption(responder: OwnerId, plot: PlotId) -> MergeResumption {
        MergeResumption {
            plot,
            direction: Direction::East,
            responder,
            initiator: new_owner_id(),
            initiator_name: "initiator".to_string(),
            price: 0.0,
            remove_roads: true,
            budget: 4,
            forced: false,
        }
    }

    #[test]
    fn test_single_entry_per_responder() {
        let mut coordinator = ConfirmationCoordinator::new();
        let responder = new_owner_id();

        coordinator.add_pending(
            responder,
            "first".to_string(),
            resumption(responder, PlotId::new(0, 0)),
        );
        coordinator.add_pending(
            responder,
            "second".to_string(),
            resumption(responder, PlotId::new(5, 5)),
        );

        assert_eq!(coordinator.len(), 1);
        assert_eq!(coordinator.pending_message(&responder), Some("second"));

        let pending = coordinator.take(&responder).unwrap();
        assert_eq!(pending.resumption.plot, PlotId::new(5, 5));
    }

    #[test]
    fn test_take_is_idempotent() {
        let mut coordinator = ConfirmationCoordinator::new();
        let responder = new_owner_id();
        coordinator.add_pending(
            responder,
            "msg".to_string(),
            resumption(responder, PlotId::new(0, 0)),
        );

        assert!(coordinator.take(&responder).is_some());
        assert!(coordinator.take(&responder).is_none());
        assert!(coordinator.take(&new_owner_id()).is_none());
    }

    #[test]
    fn test_clear_on_disconnect() {
        let mut coordinator = ConfirmationCoordinator::new();
        let responder = new_owner_id();
        coordinator.add_pending(
            responder,
            "msg".to_string(),
            resumption(responder, PlotId::new(0, 0)),
        );

        coordinator.clear(&responder);
        assert!(!coordinator.has_pending(&responder));
        assert!(coordinator.is_empty());

        // clearing again is harmless
        coordinator.clear(&responder);
    }
}
