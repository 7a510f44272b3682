//! Distance and travel time estimates for a composed path.

use crate::models::PathPoint;
use crate::rules::NavigationRules;
use crate::spatial::path_distance;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-speed travel profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelProfile {
    Driving,
    Walking,
}

impl TravelProfile {
    pub fn speed_kmh(self, rules: &NavigationRules) -> f64 {
        match self {
            TravelProfile::Driving => rules.driving_speed_kmh,
            TravelProfile::Walking => rules.walking_speed_kmh,
        }
    }
}

/// Travel time in hours. Displays as "M min" or "H h M min".
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TravelTime {
    pub hours: f64,
}

impl TravelTime {
    pub fn total_minutes(&self) -> u64 {
        if !self.hours.is_finite() || self.hours <= 0.0 {
            return 0;
        }
        (self.hours * 60.0).round() as u64
    }
}

impl fmt::Display for TravelTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.total_minutes();
        if minutes < 60 {
            write!(f, "{} min", minutes)
        } else {
            write!(f, "{} h {} min", minutes / 60, minutes % 60)
        }
    }
}

/// Distance plus both profile ETAs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    pub distance_m: f64,
    pub driving: TravelTime,
    pub walking: TravelTime,
}

impl RouteEstimate {
    pub fn from_distance(distance_m: f64, rules: &NavigationRules) -> Self {
        Self {
            distance_m,
            driving: eta(distance_m, TravelProfile::Driving.speed_kmh(rules)),
            walking: eta(distance_m, TravelProfile::Walking.speed_kmh(rules)),
        }
    }
}

/// Great-circle length of `path` in meters.
pub fn distance(path: &[PathPoint]) -> f64 {
    path_distance(path)
}

/// Travel time for `distance_m` at a constant `speed_kmh`.
pub fn eta(distance_m: f64, speed_kmh: f64) -> TravelTime {
    if speed_kmh <= 0.0 || !speed_kmh.is_finite() {
        return TravelTime { hours: f64::INFINITY };
    }
    TravelTime {
        hours: distance_m.max(0.0) / 1000.0 / speed_kmh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_under_an_hour() {
        // 20 km at 50 km/h = 24 min
        assert_eq!(eta(20_000.0, 50.0).to_string(), "24 min");
    }

    #[test]
    fn formats_hours_and_minutes() {
        // 12.5 km at 5 km/h = 2.5 h
        assert_eq!(eta(12_500.0, 5.0).to_string(), "2 h 30 min");
    }

    #[test]
    fn rounding_up_to_an_hour_switches_format() {
        // 59.7 min rounds to 60
        let time = TravelTime { hours: 59.7 / 60.0 };
        assert_eq!(time.to_string(), "1 h 0 min");
    }

    #[test]
    fn driving_beats_walking() {
        for d in [1.0, 350.0, 12_000.0, 1_000_000.0] {
            assert!(eta(d, 50.0) < eta(d, 5.0), "distance {d}");
        }
    }

    #[test]
    fn estimate_uses_rule_speeds() {
        let rules = NavigationRules::default();
        let estimate = RouteEstimate::from_distance(5_000.0, &rules);
        assert_eq!(estimate.driving.to_string(), "6 min");
        assert_eq!(estimate.walking.to_string(), "1 h 0 min");
    }

    #[test]
    fn zero_distance_is_zero_minutes() {
        assert_eq!(eta(0.0, 50.0).to_string(), "0 min");
        assert_eq!(distance(&[]), 0.0);
    }
}
