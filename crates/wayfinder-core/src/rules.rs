//! Tunable thresholds for routing and navigation.

use serde::{Deserialize, Serialize};

/// Configuration for route composition, tracking and history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationRules {
    /// Off-route distance that triggers a recompute (meters)
    pub deviation_threshold_m: f64,
    /// Intervals in a straight-line fallback segment
    pub fallback_steps: usize,
    /// Maximum number of saved routes
    pub history_limit: usize,
    /// Driving profile speed (km/h)
    pub driving_speed_kmh: f64,
    /// Walking profile speed (km/h)
    pub walking_speed_kmh: f64,
}

impl Default for NavigationRules {
    fn default() -> Self {
        Self {
            deviation_threshold_m: 50.0,
            fallback_steps: 10,
            history_limit: 100,
            driving_speed_kmh: 50.0,
            walking_speed_kmh: 5.0,
        }
    }
}
