//! Navigation state machine.
//!
//! `Navigator` is a plain reducer: user commands and asynchronous completions
//! go in, `Effect`s come out. It never performs I/O itself, which keeps every
//! transition testable without a map, a network or a position source.

use crate::error::{GeolocationError, UserInputError};
use crate::estimate::RouteEstimate;
use crate::models::{ComposedRoute, DistanceSource, PathPoint, Place, RouteRecord};
use crate::request::{RequestKind, RequestSlot, RequestTicket};
use crate::rules::NavigationRules;
use crate::tracker::{NavigationSession, TrackOutcome};
use crate::waypoints::WaypointStore;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavState {
    #[default]
    Idle,
    /// Destination known, waiting for a start location
    AwaitingStart,
    /// Next supplied location becomes a stop
    AwaitingStop,
    /// Route request in flight
    Fetching,
    /// Route composed and displayed
    RouteReady,
    /// Following the route with live position updates
    NavigatingActive,
}

/// User actions.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetStart(Place),
    SetEnd(Place),
    /// A location picked on the map; its role depends on the current state
    SelectLocation(Place),
    UseCurrentLocation,
    AddStop,
    RemoveStop(usize),
    FindRoute,
    StartNav,
    StopNav,
    Clear,
    SaveRoute,
    LoadRoute(RouteRecord),
}

/// Messages surfaced to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Input(UserInputError),
    Geolocation(GeolocationError),
    RouteSaved,
    HistoryCleared,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Input(err) => write!(f, "{}", err),
            Notice::Geolocation(err) => write!(f, "Unable to get current location: {}", err),
            Notice::RouteSaved => write!(f, "Route saved to history!"),
            Notice::HistoryCleared => write!(f, "Route history cleared."),
        }
    }
}

impl From<UserInputError> for Notice {
    fn from(err: UserInputError) -> Self {
        Notice::Input(err)
    }
}

/// Everything needed to run one composition.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeRequest {
    pub ticket: RequestTicket,
    pub start: PathPoint,
    pub stops: Vec<PathPoint>,
    pub destination: PathPoint,
    pub fallback_steps: usize,
}

/// Work for the surrounding runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Compose(ComposeRequest),
    /// One-shot geolocation request
    LocateOnce(RequestTicket),
    /// Open the continuous position subscription
    AcquireWatch,
    /// Close the continuous position subscription
    ReleaseWatch,
    SaveRecord(RouteRecord),
    /// Waypoints, route or state changed
    ViewChanged,
    FitView(Vec<PathPoint>),
    CenterOn(Place),
    Notice(Notice),
}

/// Provenance of the displayed route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteOrigin {
    Composed(DistanceSource),
    History,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRoute {
    pub path: Vec<PathPoint>,
    pub distance_m: f64,
    pub estimate: RouteEstimate,
    pub origin: RouteOrigin,
}

pub struct Navigator {
    rules: NavigationRules,
    state: NavState,
    /// State to return to after AwaitingStop
    resume_state: NavState,
    /// State to return to if the position watch cannot be opened
    pre_nav_state: NavState,
    waypoints: WaypointStore,
    route: Option<ActiveRoute>,
    fetch: RequestSlot,
    locate: RequestSlot,
    session: Option<NavigationSession>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(NavigationRules::default())
    }
}

impl Navigator {
    pub fn new(rules: NavigationRules) -> Self {
        Self {
            rules,
            state: NavState::Idle,
            resume_state: NavState::Idle,
            pre_nav_state: NavState::Idle,
            waypoints: WaypointStore::new(),
            route: None,
            fetch: RequestSlot::new(RequestKind::Fetch),
            locate: RequestSlot::new(RequestKind::Locate),
            session: None,
        }
    }

    pub fn rules(&self) -> &NavigationRules {
        &self.rules
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn waypoints(&self) -> &WaypointStore {
        &self.waypoints
    }

    pub fn route(&self) -> Option<&ActiveRoute> {
        self.route.as_ref()
    }

    pub fn session(&self) -> Option<&NavigationSession> {
        self.session.as_ref()
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.fetch.in_flight()
    }

    /// Apply one user command.
    pub fn handle(&mut self, command: Command) -> Vec<Effect> {
        tracing::debug!("Command {:?} in state {:?}", command, self.state);
        match command {
            Command::SetStart(place) => self.supply_start(place),
            Command::SetEnd(place) => self.set_end(place),
            Command::SelectLocation(place) => match self.state {
                NavState::AwaitingStart => self.supply_start(place),
                NavState::AwaitingStop => self.supply_stop(place),
                _ => self.set_end(place),
            },
            Command::UseCurrentLocation => {
                vec![Effect::LocateOnce(self.locate.issue(self.waypoints.snapshot()))]
            }
            Command::AddStop => self.add_stop(),
            Command::RemoveStop(index) => self.remove_stop(index),
            Command::FindRoute => self.find_route(),
            Command::StartNav => self.start_nav(),
            Command::StopNav => self.stop_nav(),
            Command::Clear => self.clear(),
            Command::SaveRoute => self.save_route(),
            Command::LoadRoute(record) => self.load_route(record),
        }
    }

    /// A composition finished. Stale completions are dropped.
    pub fn route_composed(&mut self, ticket: RequestTicket, route: ComposedRoute) -> Vec<Effect> {
        match ticket.kind {
            RequestKind::Fetch => self.fetch_composed(ticket, route),
            RequestKind::Recompute => self.recompute_composed(ticket, route),
            RequestKind::Locate => {
                tracing::warn!("Route completion carried locate ticket {}", ticket.id);
                Vec::new()
            }
        }
    }

    /// Result of a one-shot position request. Superseded or cancelled fixes
    /// are dropped.
    pub fn location_fix(
        &mut self,
        ticket: RequestTicket,
        fix: Result<PathPoint, GeolocationError>,
    ) -> Vec<Effect> {
        if !self.locate.resolve(&ticket) {
            tracing::debug!("Discarding stale location fix {}", ticket.id);
            return Vec::new();
        }
        match fix {
            Ok(point) => self.supply_start(Place::my_location(point)),
            Err(err) => {
                tracing::warn!("Current location unavailable: {}", err);
                vec![Effect::Notice(Notice::Geolocation(err))]
            }
        }
    }

    /// A sample from the continuous position subscription.
    pub fn position_update(&mut self, position: PathPoint) -> Vec<Effect> {
        let outcome = {
            let Some(session) = self.session.as_mut() else {
                tracing::debug!("Ignoring position update outside navigation");
                return Vec::new();
            };
            let path = self.route.as_ref().map(|r| r.path.as_slice()).unwrap_or(&[]);
            session.observe(position, path)
        };
        self.waypoints.track_start(Place::my_location(position));

        let mut effects = vec![Effect::ViewChanged];
        match outcome {
            TrackOutcome::OnRoute { .. } => {}
            TrackOutcome::OffRoute { deviation_m } => {
                match deviation_m {
                    Some(d) => tracing::info!("Off route by {:.1} m, recomputing", d),
                    None => tracing::info!("No usable path, recomputing from current position"),
                }
                effects.extend(self.issue_recompute());
            }
            TrackOutcome::Coalesced { .. } => {
                tracing::debug!("Off route but a recompute is already pending");
            }
        }
        effects
    }

    /// The continuous subscription reported an error; navigation continues.
    pub fn position_error(&mut self, err: GeolocationError) -> Vec<Effect> {
        match self.session.as_mut().map(|s| s.note_position_error()) {
            Some(true) => {
                tracing::warn!("Position updates interrupted: {}", err);
                vec![Effect::Notice(Notice::Geolocation(err))]
            }
            _ => Vec::new(),
        }
    }

    /// The subscription could not be opened; navigation does not start.
    pub fn watch_failed(&mut self, err: GeolocationError) -> Vec<Effect> {
        let Some(mut session) = self.session.take() else {
            return Vec::new();
        };
        session.close();
        tracing::warn!("Navigation not started: {}", err);
        self.state = self.pre_nav_state;
        vec![
            Effect::Notice(Notice::Geolocation(err)),
            Effect::ViewChanged,
        ]
    }

    fn supply_start(&mut self, place: Place) -> Vec<Effect> {
        // A start given by hand overrides any fix still on its way.
        self.locate.cancel();
        if let Err(err) = self.waypoints.set_start(place.clone()) {
            return vec![Effect::Notice(err.into())];
        }
        let mut effects = vec![Effect::CenterOn(place), Effect::ViewChanged];
        if self.state == NavState::AwaitingStart {
            self.state = NavState::Idle;
            effects.extend(self.begin_fetch());
        }
        effects
    }

    fn set_end(&mut self, place: Place) -> Vec<Effect> {
        if let Err(err) = self.waypoints.set_end(place.clone()) {
            return vec![Effect::Notice(err.into())];
        }
        if self.state == NavState::Idle && self.waypoints.start().is_none() {
            self.state = NavState::AwaitingStart;
        }
        vec![Effect::CenterOn(place), Effect::ViewChanged]
    }

    fn add_stop(&mut self) -> Vec<Effect> {
        if self.waypoints.destination().is_none() {
            return vec![Effect::Notice(UserInputError::MissingDestination.into())];
        }
        if self.state != NavState::AwaitingStop {
            self.resume_state = self.state;
            self.state = NavState::AwaitingStop;
        }
        vec![Effect::ViewChanged]
    }

    fn supply_stop(&mut self, place: Place) -> Vec<Effect> {
        self.state = self.resume_state;
        if let Err(err) = self.waypoints.add_stop(place) {
            return vec![Effect::Notice(err.into()), Effect::ViewChanged];
        }
        let mut effects = vec![Effect::ViewChanged];
        effects.extend(self.after_stop_edit());
        effects
    }

    fn remove_stop(&mut self, index: usize) -> Vec<Effect> {
        if let Err(err) = self.waypoints.remove_stop(index) {
            return vec![Effect::Notice(err.into())];
        }
        if self.state == NavState::AwaitingStop {
            self.state = self.resume_state;
        }
        let mut effects = vec![Effect::ViewChanged];
        effects.extend(self.after_stop_edit());
        effects
    }

    /// Stops changed: rebuild the whole chain if a route is pending or shown.
    fn after_stop_edit(&mut self) -> Vec<Effect> {
        match self.state {
            NavState::NavigatingActive => self.issue_recompute(),
            NavState::Fetching | NavState::RouteReady => self.begin_fetch(),
            _ => Vec::new(),
        }
    }

    fn find_route(&mut self) -> Vec<Effect> {
        if self.waypoints.destination().is_none() {
            return vec![Effect::Notice(UserInputError::MissingDestination.into())];
        }
        if self.state == NavState::AwaitingStop {
            self.state = self.resume_state;
        }
        if self.state == NavState::NavigatingActive {
            return self.issue_recompute();
        }
        if self.waypoints.start().is_none() {
            self.state = NavState::AwaitingStart;
            return vec![Effect::ViewChanged];
        }
        self.begin_fetch()
    }

    fn begin_fetch(&mut self) -> Vec<Effect> {
        let Some((start, stops, destination)) = self.waypoints.chain() else {
            return Vec::new();
        };
        let ticket = self.fetch.issue(self.waypoints.snapshot());
        self.waypoints.lock();
        self.state = NavState::Fetching;
        tracing::debug!("Fetch {} issued with {} stops", ticket.id, stops.len());
        vec![
            Effect::Compose(ComposeRequest {
                ticket,
                start,
                stops,
                destination,
                fallback_steps: self.rules.fallback_steps,
            }),
            Effect::ViewChanged,
        ]
    }

    fn issue_recompute(&mut self) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let Some(destination) = self.waypoints.destination().map(Place::point) else {
            return Vec::new();
        };
        let Some(start) = session
            .last_known_position()
            .or_else(|| self.waypoints.start().map(Place::point))
        else {
            tracing::debug!("No position yet, recompute deferred to first sample");
            return Vec::new();
        };
        let stops = self.waypoints.stops().iter().map(Place::point).collect();
        let ticket = session.issue_recompute(self.waypoints.snapshot());
        vec![Effect::Compose(ComposeRequest {
            ticket,
            start,
            stops,
            destination,
            fallback_steps: self.rules.fallback_steps,
        })]
    }

    fn fetch_composed(&mut self, ticket: RequestTicket, route: ComposedRoute) -> Vec<Effect> {
        if !self.fetch.is_current(&ticket) {
            tracing::debug!("Discarding stale route for fetch {}", ticket.id);
            return Vec::new();
        }
        self.fetch.resolve(&ticket);
        if !ticket
            .snapshot
            .still_matches(&self.waypoints.snapshot(), RequestKind::Fetch)
        {
            tracing::debug!("Waypoints changed under fetch {}, refetching", ticket.id);
            return self.begin_fetch();
        }

        self.apply_route(route, None);
        match self.state {
            NavState::Fetching => self.state = NavState::RouteReady,
            NavState::AwaitingStop if self.resume_state == NavState::Fetching => {
                self.resume_state = NavState::RouteReady;
            }
            _ => {}
        }
        self.fitted_view()
    }

    fn recompute_composed(&mut self, ticket: RequestTicket, route: ComposedRoute) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("Discarding recompute {} after navigation ended", ticket.id);
            return Vec::new();
        };
        if !session.resolve_recompute(&ticket) {
            tracing::debug!("Discarding superseded recompute {}", ticket.id);
            return Vec::new();
        }
        if !ticket
            .snapshot
            .still_matches(&self.waypoints.snapshot(), RequestKind::Recompute)
        {
            tracing::debug!("Stops changed under recompute {}, discarding", ticket.id);
            return Vec::new();
        }
        tracing::info!("Route recomputed: {:.0} m", route.distance_m);
        self.apply_route(route, None);
        vec![Effect::ViewChanged]
    }

    fn apply_route(&mut self, route: ComposedRoute, origin: Option<RouteOrigin>) {
        let estimate = RouteEstimate::from_distance(route.distance_m, &self.rules);
        self.route = Some(ActiveRoute {
            path: route.path,
            distance_m: route.distance_m,
            estimate,
            origin: origin.unwrap_or(RouteOrigin::Composed(route.distance_source)),
        });
        self.waypoints.lock();
    }

    fn fitted_view(&self) -> Vec<Effect> {
        let mut effects = vec![Effect::ViewChanged];
        if let Some(route) = &self.route {
            effects.push(Effect::FitView(route.path.clone()));
        }
        effects
    }

    fn start_nav(&mut self) -> Vec<Effect> {
        let ready = match self.state {
            NavState::RouteReady => true,
            NavState::Idle => self.waypoints.destination().is_some(),
            _ => false,
        };
        if !ready {
            return vec![Effect::Notice(UserInputError::CannotNavigate.into())];
        }
        self.pre_nav_state = self.state;
        self.session = Some(NavigationSession::new(self.rules.deviation_threshold_m));
        self.state = NavState::NavigatingActive;
        tracing::info!("Navigation started");
        vec![Effect::AcquireWatch, Effect::ViewChanged]
    }

    fn stop_nav(&mut self) -> Vec<Effect> {
        let Some(mut session) = self.session.take() else {
            return Vec::new();
        };
        session.close();
        self.state = NavState::Idle;
        tracing::info!("Navigation stopped");
        vec![Effect::ReleaseWatch, Effect::ViewChanged]
    }

    fn clear(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(mut session) = self.session.take() {
            session.close();
            effects.push(Effect::ReleaseWatch);
        }
        self.fetch.cancel();
        self.locate.cancel();
        self.waypoints.clear_all();
        self.route = None;
        self.state = NavState::Idle;
        self.resume_state = NavState::Idle;
        self.pre_nav_state = NavState::Idle;
        effects.push(Effect::ViewChanged);
        effects
    }

    fn save_route(&mut self) -> Vec<Effect> {
        let (Some(start), Some(destination), Some(route)) = (
            self.waypoints.start(),
            self.waypoints.destination(),
            self.route.as_ref().filter(|r| !r.path.is_empty()),
        ) else {
            return vec![Effect::Notice(UserInputError::NothingToSave.into())];
        };
        let record = RouteRecord::new(
            start.clone(),
            self.waypoints.stops(),
            destination.clone(),
            route.path.clone(),
            route.distance_m,
        );
        vec![Effect::SaveRecord(record)]
    }

    fn load_route(&mut self, record: RouteRecord) -> Vec<Effect> {
        let mut effects = self.clear();
        let stops = record.stop.into_iter().collect();
        self.waypoints.restore(record.start, stops, record.destination);

        if record.path.is_empty() {
            tracing::debug!("Loaded route has no path, waiting for FindRoute");
            return effects;
        }
        let route = ComposedRoute {
            path: record.path,
            distance_m: record.distance_m,
            distance_source: DistanceSource::Service,
            fallback_segments: 0,
        };
        self.apply_route(route, Some(RouteOrigin::History));
        self.state = NavState::RouteReady;
        effects.extend(self.fitted_view());
        effects
    }
}
