//! Start, ordered stops and destination of the route being planned.

use crate::error::UserInputError;
use crate::models::{PathPoint, Place};
use crate::request::RequestKind;

/// Waypoint store with an edit lock on the endpoints.
///
/// While a fetch is pending or a route is shown the store is locked and
/// `set_start`/`set_end` are rejected; only `clear_all` unlocks it.
#[derive(Debug, Clone, Default)]
pub struct WaypointStore {
    start: Option<Place>,
    stops: Vec<Place>,
    destination: Option<Place>,
    locked: bool,
}

impl WaypointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<&Place> {
        self.start.as_ref()
    }

    pub fn stops(&self) -> &[Place] {
        &self.stops
    }

    pub fn destination(&self) -> Option<&Place> {
        self.destination.as_ref()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn set_start(&mut self, place: Place) -> Result<(), UserInputError> {
        if self.locked {
            return Err(UserInputError::RouteLocked);
        }
        self.start = Some(place);
        Ok(())
    }

    pub fn set_end(&mut self, place: Place) -> Result<(), UserInputError> {
        if self.locked {
            return Err(UserInputError::RouteLocked);
        }
        self.destination = Some(place);
        Ok(())
    }

    /// Replace the start without checking the lock. Used for live position updates.
    pub fn track_start(&mut self, place: Place) {
        self.start = Some(place);
    }

    pub fn add_stop(&mut self, place: Place) -> Result<(), UserInputError> {
        if self.destination.is_none() {
            return Err(UserInputError::MissingDestination);
        }
        self.stops.push(place);
        Ok(())
    }

    pub fn remove_stop(&mut self, index: usize) -> Result<Place, UserInputError> {
        if index >= self.stops.len() {
            return Err(UserInputError::NoSuchStop(index));
        }
        Ok(self.stops.remove(index))
    }

    /// Restore every field from a saved route. The lock is left as is.
    pub fn restore(&mut self, start: Place, stops: Vec<Place>, destination: Place) {
        self.start = Some(start);
        self.stops = stops;
        self.destination = Some(destination);
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    /// Full chain in visiting order, if both endpoints are set.
    pub fn chain(&self) -> Option<(PathPoint, Vec<PathPoint>, PathPoint)> {
        let start = self.start.as_ref()?.point();
        let destination = self.destination.as_ref()?.point();
        let stops = self.stops.iter().map(Place::point).collect();
        Some((start, stops, destination))
    }

    pub fn snapshot(&self) -> WaypointSnapshot {
        WaypointSnapshot {
            start: self.start.as_ref().map(Place::point),
            stops: self.stops.iter().map(Place::point).collect(),
            destination: self.destination.as_ref().map(Place::point),
        }
    }
}

/// Coordinates of the waypoints at the moment a request was issued.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaypointSnapshot {
    pub start: Option<PathPoint>,
    pub stops: Vec<PathPoint>,
    pub destination: Option<PathPoint>,
}

impl WaypointSnapshot {
    /// Whether a completion built from this snapshot still applies.
    ///
    /// Recomputes ignore the start since it follows the live position.
    pub fn still_matches(&self, current: &WaypointSnapshot, kind: RequestKind) -> bool {
        let same_tail = self.stops == current.stops && self.destination == current.destination;
        match kind {
            RequestKind::Fetch | RequestKind::Locate => same_tail && self.start == current.start,
            RequestKind::Recompute => same_tail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(lat: f64, lng: f64) -> Place {
        Place::dropped_pin(lat, lng)
    }

    #[test]
    fn add_stop_requires_destination() {
        let mut store = WaypointStore::new();
        assert_eq!(
            store.add_stop(place(1.0, 1.0)),
            Err(UserInputError::MissingDestination)
        );
        store.set_end(place(2.0, 2.0)).unwrap();
        store.add_stop(place(1.0, 1.0)).unwrap();
        store.add_stop(place(1.5, 1.5)).unwrap();
        assert_eq!(store.stops().len(), 2);
        assert_eq!(store.stops()[1].lat, 1.5);
    }

    #[test]
    fn lock_rejects_endpoint_edits_until_cleared() {
        let mut store = WaypointStore::new();
        store.set_start(place(0.0, 0.0)).unwrap();
        store.set_end(place(1.0, 1.0)).unwrap();
        store.lock();

        assert_eq!(store.set_start(place(5.0, 5.0)), Err(UserInputError::RouteLocked));
        assert_eq!(store.set_end(place(5.0, 5.0)), Err(UserInputError::RouteLocked));
        assert_eq!(store.start().map(|p| p.lat), Some(0.0));

        store.track_start(place(0.5, 0.5));
        assert_eq!(store.start().map(|p| p.lat), Some(0.5));

        store.clear_all();
        assert!(!store.is_locked());
        assert!(store.start().is_none());
        assert!(store.destination().is_none());
        store.set_start(place(5.0, 5.0)).unwrap();
    }

    #[test]
    fn remove_stop_checks_bounds() {
        let mut store = WaypointStore::new();
        store.set_end(place(2.0, 2.0)).unwrap();
        store.add_stop(place(1.0, 1.0)).unwrap();
        assert_eq!(store.remove_stop(3), Err(UserInputError::NoSuchStop(3)));
        assert_eq!(store.remove_stop(0).map(|p| p.lat), Ok(1.0));
        assert!(store.stops().is_empty());
    }

    #[test]
    fn chain_preserves_stop_order() {
        let mut store = WaypointStore::new();
        store.set_start(place(0.0, 0.0)).unwrap();
        store.set_end(place(3.0, 3.0)).unwrap();
        store.add_stop(place(1.0, 1.0)).unwrap();
        store.add_stop(place(2.0, 2.0)).unwrap();

        let (start, stops, destination) = store.chain().unwrap();
        assert_eq!(start, PathPoint::new(0.0, 0.0));
        assert_eq!(stops, vec![PathPoint::new(1.0, 1.0), PathPoint::new(2.0, 2.0)]);
        assert_eq!(destination, PathPoint::new(3.0, 3.0));
    }

    #[test]
    fn recompute_snapshot_ignores_start() {
        let mut store = WaypointStore::new();
        store.set_start(place(0.0, 0.0)).unwrap();
        store.set_end(place(3.0, 3.0)).unwrap();
        let issued = store.snapshot();

        store.track_start(place(0.1, 0.1));
        let now = store.snapshot();
        assert!(issued.still_matches(&now, RequestKind::Recompute));
        assert!(!issued.still_matches(&now, RequestKind::Fetch));

        store.add_stop(place(1.0, 1.0)).unwrap();
        assert!(!issued.still_matches(&store.snapshot(), RequestKind::Recompute));
    }
}
