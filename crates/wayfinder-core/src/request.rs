//! Supersedable request handles.
//!
//! Every asynchronous request is identified by a ticket. Issuing a new
//! ticket from a slot invalidates the previous one, so a completion that
//! arrives late can be recognised and dropped.

use crate::waypoints::WaypointSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Route requested by the user
    Fetch,
    /// Route rebuilt from the live position during navigation
    Recompute,
    /// One-shot current position for the start
    Locate,
}

/// Identity of one issued request plus the waypoints it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTicket {
    pub kind: RequestKind,
    pub id: u64,
    pub snapshot: WaypointSnapshot,
}

/// Holds at most one live request of a kind.
#[derive(Debug, Clone)]
pub struct RequestSlot {
    kind: RequestKind,
    current: Option<u64>,
}

impl RequestSlot {
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            current: None,
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Issue a new ticket, superseding any in-flight one.
    pub fn issue(&mut self, snapshot: WaypointSnapshot) -> RequestTicket {
        let id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        if let Some(previous) = self.current.replace(id) {
            tracing::debug!("{:?} request {} superseded by {}", self.kind, previous, id);
        }
        RequestTicket {
            kind: self.kind,
            id,
            snapshot,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        ticket.kind == self.kind && self.current == Some(ticket.id)
    }

    /// Accept a completion. Returns false (and changes nothing) for stale tickets.
    pub fn resolve(&mut self, ticket: &RequestTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.current = None;
        true
    }

    /// Invalidate whatever is in flight.
    pub fn cancel(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older() {
        let mut slot = RequestSlot::new(RequestKind::Fetch);
        let first = slot.issue(WaypointSnapshot::default());
        let second = slot.issue(WaypointSnapshot::default());

        assert!(!slot.is_current(&first));
        assert!(!slot.resolve(&first));
        assert!(slot.in_flight());
        assert!(slot.resolve(&second));
        assert!(!slot.in_flight());
    }

    #[test]
    fn cancelled_ticket_never_resolves() {
        let mut slot = RequestSlot::new(RequestKind::Recompute);
        let ticket = slot.issue(WaypointSnapshot::default());
        slot.cancel();
        assert!(!slot.resolve(&ticket));
    }

    #[test]
    fn ticket_from_a_replaced_slot_is_stale() {
        let mut old_slot = RequestSlot::new(RequestKind::Recompute);
        let old_ticket = old_slot.issue(WaypointSnapshot::default());

        let mut new_slot = RequestSlot::new(RequestKind::Recompute);
        let _ = new_slot.issue(WaypointSnapshot::default());
        assert!(!new_slot.resolve(&old_ticket));
    }

    #[test]
    fn kinds_do_not_cross() {
        let mut fetch = RequestSlot::new(RequestKind::Fetch);
        let mut recompute = RequestSlot::new(RequestKind::Recompute);
        let ticket = recompute.issue(WaypointSnapshot::default());
        assert!(!fetch.resolve(&ticket));
        assert!(recompute.resolve(&ticket));
    }
}
