//! Event loop tying the navigator to its collaborators.
//!
//! Runs on a single task. User actions, route completions, one-shot location
//! fixes and position samples are processed one at a time, so the navigator is
//! never touched concurrently. Compositions run as futures polled by the same
//! loop; their results go back through the navigator, which drops stale ones.

use crate::composer::{compose_route_with_steps, PathService};
use crate::error::GeolocationError;
use crate::geolocation::{Geolocation, PositionSample, PositionWatch};
use crate::history::{HistoryStore, KeyValueStore};
use crate::models::{ComposedRoute, PathPoint};
use crate::navigator::{Command, ComposeRequest, Effect, Navigator, Notice};
use crate::presenter::Presenter;
use crate::request::RequestTicket;
use futures::future::LocalBoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::VecDeque;
use tokio::sync::mpsc;

/// Input accepted by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    Navigate(Command),
    /// Load the saved route at this index (0 = newest)
    LoadHistory(usize),
    ClearHistory,
    Shutdown,
}

impl From<Command> for UserAction {
    fn from(command: Command) -> Self {
        UserAction::Navigate(command)
    }
}

enum Completion {
    Route(RequestTicket, ComposedRoute),
    Location(RequestTicket, Result<PathPoint, GeolocationError>),
}

pub struct Driver<'a, S, G, K, P> {
    navigator: Navigator,
    history: HistoryStore<K>,
    presenter: P,
    service: &'a S,
    geolocation: &'a G,
}

impl<'a, S, G, K, P> Driver<'a, S, G, K, P>
where
    S: PathService,
    G: Geolocation,
    K: KeyValueStore,
    P: Presenter,
{
    pub fn new(
        navigator: Navigator,
        history: HistoryStore<K>,
        presenter: P,
        service: &'a S,
        geolocation: &'a G,
    ) -> Self {
        Self {
            navigator,
            history,
            presenter,
            service,
            geolocation,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn history(&self) -> &HistoryStore<K> {
        &self.history
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Process events until `Shutdown`, or until the action channel closes and
    /// all in-flight work has drained.
    ///
    /// The position watch lives only inside this call; it is released on every
    /// way out, including unwinding.
    pub async fn run(&mut self, mut actions: mpsc::Receiver<UserAction>) {
        let mut inflight: FuturesUnordered<LocalBoxFuture<'a, Completion>> =
            FuturesUnordered::new();
        let mut watch: Option<PositionWatch> = None;
        let mut actions_open = true;

        self.presenter.history_changed(self.history.records());
        self.presenter.render(&self.navigator);

        loop {
            if !actions_open && inflight.is_empty() {
                break;
            }

            tokio::select! {
                action = actions.recv(), if actions_open => {
                    let Some(action) = action else {
                        tracing::debug!("Action channel closed, draining in-flight work");
                        actions_open = false;
                        continue;
                    };
                    if action == UserAction::Shutdown {
                        tracing::info!("Driver shutting down");
                        break;
                    }
                    let effects = self.dispatch(action);
                    self.apply(effects, &mut inflight, &mut watch);
                }
                Some(done) = inflight.next(), if !inflight.is_empty() => {
                    let effects = match done {
                        Completion::Route(ticket, route) => self.navigator.route_composed(ticket, route),
                        Completion::Location(ticket, fix) => self.navigator.location_fix(ticket, fix),
                    };
                    self.apply(effects, &mut inflight, &mut watch);
                }
                sample = next_sample(&mut watch), if watch.is_some() => {
                    let effects = match sample {
                        Some(Ok(position)) => self.navigator.position_update(position),
                        Some(Err(err)) => self.navigator.position_error(err),
                        None => {
                            tracing::warn!("Position source ended; keeping last known position");
                            watch = None;
                            Vec::new()
                        }
                    };
                    self.apply(effects, &mut inflight, &mut watch);
                }
                else => break,
            }
        }

        if watch.take().is_some() {
            tracing::debug!("Released position watch on driver exit");
        }
    }

    fn dispatch(&mut self, action: UserAction) -> Vec<Effect> {
        match action {
            UserAction::Navigate(command) => self.navigator.handle(command),
            UserAction::LoadHistory(index) => match self.history.get(index).cloned() {
                Some(record) => self.navigator.handle(Command::LoadRoute(record)),
                None => {
                    tracing::debug!("No saved route at index {}", index);
                    Vec::new()
                }
            },
            UserAction::ClearHistory => {
                let mut effects = Vec::new();
                if self.history.clear() {
                    self.presenter.history_changed(self.history.records());
                    effects.push(Effect::Notice(Notice::HistoryCleared));
                }
                effects
            }
            UserAction::Shutdown => Vec::new(),
        }
    }

    fn apply(
        &mut self,
        effects: Vec<Effect>,
        inflight: &mut FuturesUnordered<LocalBoxFuture<'a, Completion>>,
        watch: &mut Option<PositionWatch>,
    ) {
        let mut queue: VecDeque<Effect> = effects.into();
        let mut rendered = false;

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Compose(request) => inflight.push(self.compose(request)),
                Effect::LocateOnce(ticket) => {
                    let geolocation = self.geolocation;
                    inflight.push(Box::pin(async move {
                        Completion::Location(ticket, geolocation.current_position().await)
                    }));
                }
                Effect::AcquireWatch => match self.geolocation.watch_position() {
                    Ok(opened) => {
                        tracing::debug!("Position watch acquired");
                        *watch = Some(opened);
                    }
                    Err(err) => queue.extend(self.navigator.watch_failed(err)),
                },
                Effect::ReleaseWatch => {
                    // Drop cancels the producer.
                    *watch = None;
                }
                Effect::SaveRecord(record) => {
                    if self.history.save(record) {
                        self.presenter.history_changed(self.history.records());
                        self.presenter.notice(&Notice::RouteSaved);
                    }
                }
                Effect::ViewChanged => rendered = true,
                Effect::FitView(path) => self.presenter.fit_view(&path),
                Effect::CenterOn(place) => self.presenter.center_on(&place),
                Effect::Notice(notice) => self.presenter.notice(&notice),
            }
        }

        if rendered {
            self.presenter.render(&self.navigator);
        }
    }

    fn compose(&self, request: ComposeRequest) -> LocalBoxFuture<'a, Completion> {
        let service = self.service;
        Box::pin(async move {
            let route = compose_route_with_steps(
                service,
                request.start,
                &request.stops,
                request.destination,
                request.fallback_steps,
            )
            .await;
            Completion::Route(request.ticket, route)
        })
    }
}

async fn next_sample(watch: &mut Option<PositionWatch>) -> Option<PositionSample> {
    match watch.as_mut() {
        Some(watch) => watch.next().await,
        None => std::future::pending().await,
    }
}
