//! Live position tracking against the active path.

use crate::models::PathPoint;
use crate::request::{RequestKind, RequestSlot, RequestTicket};
use crate::spatial::deviation_m;
use crate::waypoints::WaypointSnapshot;

/// What a single position sample means for the route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackOutcome {
    /// Within the deviation threshold
    OnRoute { deviation_m: f64 },
    /// Off route (or no usable path) and nothing in flight: recompute now
    OffRoute { deviation_m: Option<f64> },
    /// Off route, but a recompute is already pending; the sample is dropped
    Coalesced { deviation_m: Option<f64> },
}

impl TrackOutcome {
    pub fn should_recompute(&self) -> bool {
        matches!(self, TrackOutcome::OffRoute { .. })
    }
}

/// State of one navigation run, from StartNav until StopNav or Clear.
#[derive(Debug, Clone)]
pub struct NavigationSession {
    active: bool,
    deviation_threshold_m: f64,
    last_known_position: Option<PathPoint>,
    recompute: RequestSlot,
    position_error_notified: bool,
}

impl NavigationSession {
    pub fn new(deviation_threshold_m: f64) -> Self {
        Self {
            active: true,
            deviation_threshold_m,
            last_known_position: None,
            recompute: RequestSlot::new(RequestKind::Recompute),
            position_error_notified: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn deviation_threshold_m(&self) -> f64 {
        self.deviation_threshold_m
    }

    pub fn last_known_position(&self) -> Option<PathPoint> {
        self.last_known_position
    }

    pub fn recompute_in_flight(&self) -> bool {
        self.recompute.in_flight()
    }

    /// Measure a new sample against `path`.
    pub fn observe(&mut self, position: PathPoint, path: &[PathPoint]) -> TrackOutcome {
        self.last_known_position = Some(position);

        let deviation = deviation_m(&position, path);
        let off_route = match deviation {
            Some(d) => d > self.deviation_threshold_m,
            None => true,
        };

        if !off_route {
            return TrackOutcome::OnRoute {
                deviation_m: deviation.unwrap_or_default(),
            };
        }
        if self.recompute.in_flight() {
            return TrackOutcome::Coalesced {
                deviation_m: deviation,
            };
        }
        TrackOutcome::OffRoute {
            deviation_m: deviation,
        }
    }

    /// Issue a recompute ticket, superseding any pending one.
    pub fn issue_recompute(&mut self, snapshot: WaypointSnapshot) -> RequestTicket {
        self.recompute.issue(snapshot)
    }

    pub fn resolve_recompute(&mut self, ticket: &RequestTicket) -> bool {
        self.recompute.resolve(ticket)
    }

    /// Returns true the first time a position error is seen in this session.
    pub fn note_position_error(&mut self) -> bool {
        !std::mem::replace(&mut self.position_error_notified, true)
    }

    pub fn close(&mut self) {
        self.active = false;
        self.recompute.cancel();
    }
}
