pub mod composer;
pub mod driver;
pub mod error;
pub mod estimate;
pub mod geolocation;
pub mod history;
pub mod models;
pub mod navigator;
pub mod presenter;
pub mod request;
pub mod rules;
pub mod spatial;
pub mod tracker;
pub mod waypoints;

pub use composer::{
    compose_route, compose_route_with_steps, PathService, SegmentRequest, SegmentResponse,
    DEFAULT_FALLBACK_STEPS,
};
pub use driver::{Driver, UserAction};
pub use error::{GeolocationError, PersistenceError, ServiceError, UserInputError};
pub use estimate::{RouteEstimate, TravelProfile, TravelTime};
pub use geolocation::{Geolocation, PositionSample, PositionWatch, WatchFeed};
pub use history::{HistoryStore, KeyValueStore, MemoryStore, HISTORY_KEY};
pub use models::{ComposedRoute, DistanceSource, PathPoint, Place, RouteRecord};
pub use navigator::{
    ActiveRoute, Command, ComposeRequest, Effect, NavState, Navigator, Notice, RouteOrigin,
};
pub use presenter::{NullPresenter, Presenter};
pub use request::{RequestKind, RequestSlot, RequestTicket};
pub use rules::NavigationRules;
pub use spatial::haversine_distance;
pub use tracker::{NavigationSession, TrackOutcome};
pub use waypoints::{WaypointSnapshot, WaypointStore};
