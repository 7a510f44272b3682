//! Simulated position source.

use rand::Rng;
use std::f64::consts::TAU;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wayfinder_core::error::GeolocationError;
use wayfinder_core::geolocation::{Geolocation, PositionWatch};
use wayfinder_core::models::{PathPoint, Place, RouteRecord};
use wayfinder_core::navigator::{Navigator, Notice};
use wayfinder_core::presenter::Presenter;
use wayfinder_core::spatial::{offset_by_bearing, point_distance};

/// Default simulated travel speed, roughly city driving.
pub const DEFAULT_SPEED_MPS: f64 = 14.0;

/// Default random scatter applied to every sample.
pub const DEFAULT_JITTER_M: f64 = 3.0;

const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Shared track the simulator walks when a watch is opened.
#[derive(Debug, Clone, Default)]
pub struct TrackHandle {
    points: Arc<Mutex<Vec<PathPoint>>>,
}

impl TrackHandle {
    pub fn set(&self, track: Vec<PathPoint>) {
        let mut points = self.points.lock().unwrap_or_else(|e| e.into_inner());
        *points = track;
    }

    pub fn snapshot(&self) -> Vec<PathPoint> {
        self.points.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Geolocation that reports a fixed origin and walks a track while watched.
pub struct SimulatedGeolocation {
    origin: PathPoint,
    track: TrackHandle,
    interval: Duration,
    speed_mps: f64,
    jitter_m: f64,
    available: bool,
}

impl SimulatedGeolocation {
    pub fn new(origin: PathPoint, track: TrackHandle, interval: Duration) -> Self {
        Self {
            origin,
            track,
            interval: interval.max(MIN_INTERVAL),
            speed_mps: DEFAULT_SPEED_MPS,
            jitter_m: DEFAULT_JITTER_M,
            available: true,
        }
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = speed_mps.max(0.0);
        self
    }

    pub fn with_jitter(mut self, jitter_m: f64) -> Self {
        self.jitter_m = jitter_m.max(0.0);
        self
    }

    /// Simulate a device where location access was refused.
    pub fn denied(mut self) -> Self {
        self.available = false;
        self
    }
}

impl Geolocation for SimulatedGeolocation {
    async fn current_position(&self) -> Result<PathPoint, GeolocationError> {
        if !self.available {
            return Err(GeolocationError::PermissionDenied);
        }
        Ok(jitter(self.origin, self.jitter_m))
    }

    fn watch_position(&self) -> Result<PositionWatch, GeolocationError> {
        if !self.available {
            return Err(GeolocationError::PermissionDenied);
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| GeolocationError::Unavailable(err.to_string()))?;

        let mut track = self.track.snapshot();
        if track.is_empty() {
            track.push(self.origin);
        }
        let (mut feed, watch) = PositionWatch::channel();
        let (interval, speed_mps, jitter_m) = (self.interval, self.speed_mps, self.jitter_m);
        tracing::debug!("Simulating {} track points at {:.1} m/s", track.len(), speed_mps);

        runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut travelled_m = 0.0;
            loop {
                tokio::select! {
                    _ = feed.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let Some(point) = point_along(&track, travelled_m) else {
                    break;
                };
                if !feed.send(Ok(jitter(point, jitter_m))).await {
                    break;
                }
                travelled_m += speed_mps * interval.as_secs_f64();
            }
            tracing::debug!("Simulated position feed stopped");
        });
        Ok(watch)
    }
}

/// Point `distance_m` along `track`, clamped to its ends.
pub fn point_along(track: &[PathPoint], distance_m: f64) -> Option<PathPoint> {
    let first = *track.first()?;
    let mut remaining = distance_m.max(0.0);
    for pair in track.windows(2) {
        let leg = point_distance(&pair[0], &pair[1]);
        if leg > 0.0 && remaining <= leg {
            let t = remaining / leg;
            return Some(PathPoint::new(
                pair[0].lat + t * (pair[1].lat - pair[0].lat),
                pair[0].lng + t * (pair[1].lng - pair[0].lng),
            ));
        }
        remaining -= leg;
    }
    Some(track.last().copied().unwrap_or(first))
}

fn jitter(point: PathPoint, max_m: f64) -> PathPoint {
    if max_m <= 0.0 {
        return point;
    }
    let mut rng = rand::rng();
    let distance = rng.random_range(0.0..max_m);
    let bearing = rng.random_range(0.0..TAU);
    offset_by_bearing(point.lat, point.lng, distance, bearing)
}

/// Presenter adapter that points the simulator at the displayed route.
pub struct FollowRoute<P> {
    inner: P,
    track: TrackHandle,
}

impl<P> FollowRoute<P> {
    pub fn new(inner: P, track: TrackHandle) -> Self {
        Self { inner, track }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: Presenter> Presenter for FollowRoute<P> {
    fn render(&mut self, navigator: &Navigator) {
        if let Some(route) = navigator.route() {
            self.track.set(route.path.clone());
        }
        self.inner.render(navigator);
    }

    fn fit_view(&mut self, path: &[PathPoint]) {
        self.inner.fit_view(path);
    }

    fn center_on(&mut self, place: &Place) {
        self.inner.center_on(place);
    }

    fn notice(&mut self, notice: &Notice) {
        self.inner.notice(notice);
    }

    fn history_changed(&mut self, records: &[RouteRecord]) {
        self.inner.history_changed(records);
    }
}
