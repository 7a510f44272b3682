//! Spatial math for path measurement and off-route detection.

use crate::models::PathPoint;

/// Mean Earth radius used by every distance calculation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate distance between two points in meters using Haversine formula.
///
/// This is the standard formula for calculating great-circle distance
/// between two points on a sphere given their latitudes and longitudes.
///
/// # Arguments
/// * `lat1`, `lng1` - First point coordinates in decimal degrees
/// * `lat2`, `lng2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Distance in meters
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lng2 - lng1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

pub fn point_distance(a: &PathPoint, b: &PathPoint) -> f64 {
    haversine_distance(a.lat, a.lng, b.lat, b.lng)
}

/// Total great-circle length of a path. Zero for fewer than two points.
pub fn path_distance(path: &[PathPoint]) -> f64 {
    path.windows(2)
        .map(|pair| point_distance(&pair[0], &pair[1]))
        .sum()
}

/// Straight-line interpolation from `start` to `end` in `steps` equal intervals.
///
/// Always yields `steps + 1` points with both endpoints exact.
pub fn interpolate_line(start: PathPoint, end: PathPoint, steps: usize) -> Vec<PathPoint> {
    let steps = steps.max(1);
    (0..=steps)
        .map(|i| {
            if i == steps {
                return end;
            }
            let t = i as f64 / steps as f64;
            PathPoint {
                lat: start.lat + t * (end.lat - start.lat),
                lng: start.lng + t * (end.lng - start.lng),
            }
        })
        .collect()
}

/// Calculate minimum distance from a point to a line segment (in meters).
///
/// Uses a local flat-earth projection: longitudes are scaled by the cosine of
/// `ref_lat_deg`, the plane is treated as Cartesian in degrees, and the planar
/// offset is converted back to meters along the Earth's radius. The parametric
/// projection is clamped to [0, 1], so this measures the finite segment.
pub fn distance_to_segment_m(
    point: &PathPoint,
    seg_start: &PathPoint,
    seg_end: &PathPoint,
    ref_lat_deg: f64,
) -> f64 {
    let lng_scale = ref_lat_deg.to_radians().cos();

    // Local coords with the segment start as origin
    let px = (point.lng - seg_start.lng) * lng_scale;
    let py = point.lat - seg_start.lat;
    let sx = (seg_end.lng - seg_start.lng) * lng_scale;
    let sy = seg_end.lat - seg_start.lat;

    let seg_len_sq = sx * sx + sy * sy;
    let t = if seg_len_sq <= f64::EPSILON * f64::EPSILON {
        0.0
    } else {
        ((px * sx + py * sy) / seg_len_sq).clamp(0.0, 1.0)
    };

    let dx = px - t * sx;
    let dy = py - t * sy;

    (dx * dx + dy * dy).sqrt().to_radians() * EARTH_RADIUS_M
}

/// Minimum distance from `position` to any segment of `path`.
///
/// Returns `None` when the path has fewer than two points.
pub fn deviation_m(position: &PathPoint, path: &[PathPoint]) -> Option<f64> {
    path.windows(2)
        .map(|pair| distance_to_segment_m(position, &pair[0], &pair[1], position.lat))
        .min_by(f64::total_cmp)
}

/// Offset a position by distance and bearing.
///
/// # Arguments
/// * `lat`, `lng` - Starting position in degrees
/// * `distance_m` - Distance in meters
/// * `bearing_rad` - Bearing in radians (0 = north, π/2 = east)
///
/// # Returns
/// The offset point
pub fn offset_by_bearing(lat: f64, lng: f64, distance_m: f64, bearing_rad: f64) -> PathPoint {
    if distance_m.abs() <= f64::EPSILON {
        return PathPoint::new(lat, lng);
    }

    let lat1 = lat.to_radians();
    let lng1 = lng.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lng2 = lng1 + y.atan2(x);
    lng2 =
        (lng2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    PathPoint::new(lat2.to_degrees(), lng2.to_degrees())
}
