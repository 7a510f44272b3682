//! Multi-waypoint route composition.
//!
//! A chain `start, stop1..stopN, destination` is resolved one segment at a
//! time against the path service, in order. Any segment the service cannot
//! provide is replaced with a straight-line interpolation, so composition
//! always yields a usable path.

use crate::error::ServiceError;
use crate::models::{ComposedRoute, DistanceSource, PathPoint};
use crate::spatial::{interpolate_line, path_distance};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Intervals in a fallback segment (11 points).
pub const DEFAULT_FALLBACK_STEPS: usize = 10;

/// Segment request sent to the path service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentRequest {
    pub start: PathPoint,
    pub end: PathPoint,
}

/// Segment reply from the path service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentResponse {
    #[serde(default)]
    pub path: Vec<PathPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
}

/// External backend computing a path between two points.
pub trait PathService {
    fn fetch_segment(
        &self,
        request: SegmentRequest,
    ) -> impl Future<Output = Result<SegmentResponse, ServiceError>>;
}

#[derive(Debug, Clone)]
struct Segment {
    points: Vec<PathPoint>,
    reported_distance_m: Option<f64>,
    fallback: bool,
}

/// Compose a route with the default fallback resolution.
pub async fn compose_route<S: PathService>(
    service: &S,
    start: PathPoint,
    stops: &[PathPoint],
    destination: PathPoint,
) -> ComposedRoute {
    compose_route_with_steps(service, start, stops, destination, DEFAULT_FALLBACK_STEPS).await
}

/// Compose a route, interpolating failed segments with `fallback_steps` intervals.
pub async fn compose_route_with_steps<S: PathService>(
    service: &S,
    start: PathPoint,
    stops: &[PathPoint],
    destination: PathPoint,
    fallback_steps: usize,
) -> ComposedRoute {
    let mut chain = Vec::with_capacity(stops.len() + 2);
    chain.push(start);
    chain.extend_from_slice(stops);
    chain.push(destination);

    // Sequential on purpose: stitching depends on order.
    let mut segments = Vec::with_capacity(chain.len() - 1);
    for (index, pair) in chain.windows(2).enumerate() {
        let request = SegmentRequest {
            start: pair[0],
            end: pair[1],
        };
        let segment = match service.fetch_segment(request).await {
            Ok(response) => match validate_segment(response) {
                Ok(segment) => segment,
                Err(err) => {
                    tracing::warn!(
                        "Segment {} rejected, using straight-line fallback: {}",
                        index,
                        err
                    );
                    fallback_segment(request, fallback_steps)
                }
            },
            Err(err) => {
                tracing::warn!(
                    "Path service failed for segment {}, using straight-line fallback: {}",
                    index,
                    err
                );
                fallback_segment(request, fallback_steps)
            }
        };
        segments.push(segment);
    }

    merge_segments(segments)
}

fn validate_segment(response: SegmentResponse) -> Result<Segment, ServiceError> {
    if response.path.is_empty() {
        return Err(ServiceError::Malformed("empty path".to_string()));
    }
    if let Some(bad) = response.path.iter().position(|point| !point.is_finite()) {
        return Err(ServiceError::Malformed(format!(
            "non-finite coordinate at index {}",
            bad
        )));
    }
    let reported_distance_m = response
        .distance_meters
        .filter(|d| d.is_finite() && *d >= 0.0);
    Ok(Segment {
        points: response.path,
        reported_distance_m,
        fallback: false,
    })
}

fn fallback_segment(request: SegmentRequest, steps: usize) -> Segment {
    Segment {
        points: interpolate_line(request.start, request.end, steps),
        reported_distance_m: None,
        fallback: true,
    }
}

fn merge_segments(segments: Vec<Segment>) -> ComposedRoute {
    let fallback_segments = segments.iter().filter(|s| s.fallback).count();
    let reported: Option<f64> = segments.iter().map(|s| s.reported_distance_m).sum();

    let mut path: Vec<PathPoint> = Vec::new();
    for (index, segment) in segments.into_iter().enumerate() {
        if index == 0 {
            path.extend(segment.points);
        } else {
            // First point duplicates the previous segment's last point.
            path.extend(segment.points.into_iter().skip(1));
        }
    }

    let (distance_m, distance_source) = match reported {
        Some(total) => (total, DistanceSource::Service),
        None => (path_distance(&path), DistanceSource::Haversine),
    };

    ComposedRoute {
        path,
        distance_m,
        distance_source,
        fallback_segments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned replies in order and records every request.
    struct ScriptedService {
        replies: RefCell<VecDeque<Result<SegmentResponse, ServiceError>>>,
        requests: RefCell<Vec<SegmentRequest>>,
    }

    impl ScriptedService {
        fn new(replies: Vec<Result<SegmentResponse, ServiceError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn down() -> Self {
            Self::new(Vec::new())
        }
    }

    impl PathService for ScriptedService {
        async fn fetch_segment(
            &self,
            request: SegmentRequest,
        ) -> Result<SegmentResponse, ServiceError> {
            self.requests.borrow_mut().push(request);
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ServiceError::Unreachable("connection refused".into())))
        }
    }

    fn line(from: PathPoint, to: PathPoint, points: usize) -> Vec<PathPoint> {
        interpolate_line(from, to, points - 1)
    }

    #[tokio::test]
    async fn unreachable_service_falls_back_to_eleven_points() {
        let start = PathPoint::new(24.86, 67.00);
        let end = PathPoint::new(24.87, 67.01);
        let route = compose_route(&ScriptedService::down(), start, &[], end).await;

        assert_eq!(route.path.len(), 11);
        assert_eq!(route.path[0], start);
        assert_eq!(route.path[10], end);
        for (i, point) in route.path.iter().enumerate() {
            let t = i as f64 / 10.0;
            assert!((point.lat - (start.lat + t * (end.lat - start.lat))).abs() < 1e-12);
            assert!((point.lng - (start.lng + t * (end.lng - start.lng))).abs() < 1e-12);
        }
        assert_eq!(route.distance_source, DistanceSource::Haversine);
        assert_eq!(route.fallback_segments, 1);
        assert!((route.distance_m - path_distance(&route.path)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn fallback_is_deterministic() {
        let start = PathPoint::new(24.86, 67.00);
        let end = PathPoint::new(24.87, 67.01);
        let first = compose_route(&ScriptedService::down(), start, &[], end).await;
        let second = compose_route(&ScriptedService::down(), start, &[], end).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn junction_point_is_not_duplicated() {
        let start = PathPoint::new(24.86, 67.00);
        let stop = PathPoint::new(24.865, 67.004);
        let end = PathPoint::new(24.87, 67.01);
        let service = ScriptedService::new(vec![
            Ok(SegmentResponse {
                path: line(start, stop, 6),
                distance_meters: Some(700.0),
            }),
            Ok(SegmentResponse {
                path: line(stop, end, 6),
                distance_meters: Some(800.0),
            }),
        ]);

        let route = compose_route(&service, start, &[stop], end).await;
        assert_eq!(route.path.len(), 11);
        assert_eq!(route.path[5], stop);
        assert_eq!(route.distance_source, DistanceSource::Service);
        assert!((route.distance_m - 1500.0).abs() < 1e-9);
        assert_eq!(route.fallback_segments, 0);
    }

    #[tokio::test]
    async fn segments_are_requested_in_visiting_order() {
        let chain = [
            PathPoint::new(0.0, 0.0),
            PathPoint::new(0.0, 0.01),
            PathPoint::new(0.0, 0.02),
            PathPoint::new(0.0, 0.03),
        ];
        let service = ScriptedService::down();
        let _ = compose_route(&service, chain[0], &chain[1..3], chain[3]).await;

        let requests = service.requests.borrow();
        assert_eq!(requests.len(), 3);
        for (i, request) in requests.iter().enumerate() {
            assert_eq!(request.start, chain[i]);
            assert_eq!(request.end, chain[i + 1]);
        }
    }

    #[tokio::test]
    async fn mixed_sources_recompute_distance_from_path() {
        let start = PathPoint::new(24.86, 67.00);
        let stop = PathPoint::new(24.865, 67.004);
        let end = PathPoint::new(24.87, 67.01);
        // Second segment is empty and falls back; the reported 1 m must be discarded.
        let service = ScriptedService::new(vec![
            Ok(SegmentResponse {
                path: line(start, stop, 6),
                distance_meters: Some(1.0),
            }),
            Ok(SegmentResponse {
                path: Vec::new(),
                distance_meters: Some(1.0),
            }),
        ]);

        let route = compose_route(&service, start, &[stop], end).await;
        assert_eq!(route.path.len(), 6 + 11 - 1);
        assert_eq!(route.distance_source, DistanceSource::Haversine);
        assert_eq!(route.fallback_segments, 1);
        assert!((route.distance_m - path_distance(&route.path)).abs() < 1e-9);
        assert!(route.distance_m > 100.0);
    }

    #[tokio::test]
    async fn missing_reported_distance_uses_haversine() {
        let start = PathPoint::new(24.86, 67.00);
        let end = PathPoint::new(24.87, 67.01);
        let service = ScriptedService::new(vec![Ok(SegmentResponse {
            path: line(start, end, 4),
            distance_meters: None,
        })]);

        let route = compose_route(&service, start, &[], end).await;
        assert_eq!(route.path.len(), 4);
        assert_eq!(route.distance_source, DistanceSource::Haversine);
        assert_eq!(route.fallback_segments, 0);
    }

    #[tokio::test]
    async fn non_finite_points_are_malformed() {
        let start = PathPoint::new(24.86, 67.00);
        let end = PathPoint::new(24.87, 67.01);
        let service = ScriptedService::new(vec![Ok(SegmentResponse {
            path: vec![start, PathPoint::new(f64::NAN, 67.0), end],
            distance_meters: Some(10.0),
        })]);

        let route = compose_route(&service, start, &[], end).await;
        assert_eq!(route.fallback_segments, 1);
        assert_eq!(route.path.len(), 11);
    }

    #[test]
    fn response_without_path_decodes_as_empty() {
        let response: SegmentResponse = serde_json::from_str(r#"{"error": "no route"}"#).unwrap();
        assert!(response.path.is_empty());
        assert!(validate_segment(response).is_err());
    }
}
