//! Core data models for route planning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named geographic point chosen by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
}

impl Place {
    pub fn new(lat: f64, lng: f64, name: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            name: name.into(),
        }
    }

    /// Place for an unnamed map selection.
    pub fn dropped_pin(lat: f64, lng: f64) -> Self {
        Self::new(lat, lng, "Dropped Pin")
    }

    /// Place for a geolocation fix.
    pub fn my_location(point: PathPoint) -> Self {
        Self::new(point.lat, point.lng, "My Location")
    }

    pub fn point(&self) -> PathPoint {
        PathPoint::from(self)
    }
}

/// A bare coordinate on a path, also the path service wire format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub lat: f64,
    pub lng: f64,
}

impl PathPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<&Place> for PathPoint {
    fn from(place: &Place) -> Self {
        Self {
            lat: place.lat,
            lng: place.lng,
        }
    }
}

/// Where a composed route's total distance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceSource {
    /// Sum of per-segment distances reported by the path service
    Service,
    /// Great-circle sum over the merged path
    Haversine,
}

/// Result of stitching every segment of a waypoint chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedRoute {
    pub path: Vec<PathPoint>,
    pub distance_m: f64,
    pub distance_source: DistanceSource,
    /// Segments replaced by the straight-line fallback
    pub fallback_segments: usize,
}

/// A saved route. Only the first stop is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub start: Place,
    #[serde(default)]
    pub stop: Option<Place>,
    pub destination: Place,
    #[serde(default)]
    pub path: Vec<PathPoint>,
    pub distance_m: f64,
    pub timestamp: DateTime<Utc>,
}

impl RouteRecord {
    pub fn new(
        start: Place,
        stops: &[Place],
        destination: Place,
        path: Vec<PathPoint>,
        distance_m: f64,
    ) -> Self {
        Self {
            start,
            stop: stops.first().cloned(),
            destination,
            path,
            distance_m,
            timestamp: Utc::now(),
        }
    }

    /// Short label for history listings.
    pub fn title(&self) -> String {
        format!(
            "{} → {}",
            display_name(&self.start, "Start"),
            display_name(&self.destination, "Destination")
        )
    }
}

fn display_name<'a>(place: &'a Place, fallback: &'a str) -> &'a str {
    if place.name.trim().is_empty() {
        fallback
    } else {
        &place.name
    }
}
