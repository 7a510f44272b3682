//! Plain-text session output.

use chrono::Local;
use std::io::{self, Write};
use wayfinder_core::models::{DistanceSource, PathPoint, Place, RouteRecord};
use wayfinder_core::navigator::{NavState, Navigator, Notice, RouteOrigin};
use wayfinder_core::presenter::Presenter;

/// Prints state changes, notices and saved routes as lines of text.
///
/// Identical consecutive summaries are printed once.
pub struct TerminalPresenter<W> {
    out: W,
    last_summary: Option<String>,
}

impl TerminalPresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_summary: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{}", text) {
            tracing::warn!("Failed to write session output: {}", err);
        }
    }
}

pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.2} km", meters / 1000.0)
    } else {
        format!("{:.0} m", meters)
    }
}

fn format_place(place: &Place) -> String {
    format!("{} ({:.5}, {:.5})", place.name, place.lat, place.lng)
}

fn state_label(state: NavState) -> &'static str {
    match state {
        NavState::Idle => "idle",
        NavState::AwaitingStart => "pick a start",
        NavState::AwaitingStop => "pick a stop",
        NavState::Fetching => "finding route",
        NavState::RouteReady => "route ready",
        NavState::NavigatingActive => "navigating",
    }
}

fn origin_label(origin: RouteOrigin) -> &'static str {
    match origin {
        RouteOrigin::Composed(DistanceSource::Service) => "path service",
        RouteOrigin::Composed(DistanceSource::Haversine) => "haversine",
        RouteOrigin::History => "saved route",
    }
}

/// Multi-line description of the navigator's current state.
pub fn summarize(navigator: &Navigator) -> String {
    let waypoints = navigator.waypoints();
    let mut lines = vec![format!("[{}]", state_label(navigator.state()))];

    if let Some(start) = waypoints.start() {
        lines.push(format!("  Start: {}", format_place(start)));
    }
    for (index, stop) in waypoints.stops().iter().enumerate() {
        lines.push(format!("  Stop {}: {}", index + 1, format_place(stop)));
    }
    if let Some(destination) = waypoints.destination() {
        lines.push(format!("  Destination: {}", format_place(destination)));
    }
    if let Some(route) = navigator.route() {
        lines.push(format!(
            "  Route: {} ({}, {} points) | driving {} | walking {}",
            format_distance(route.distance_m),
            origin_label(route.origin),
            route.path.len(),
            route.estimate.driving,
            route.estimate.walking
        ));
    }
    if let Some(position) = navigator.session().and_then(|s| s.last_known_position()) {
        lines.push(format!("  Position: {:.5}, {:.5}", position.lat, position.lng));
    }
    lines.join("\n")
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render(&mut self, navigator: &Navigator) {
        let summary = summarize(navigator);
        if self.last_summary.as_deref() == Some(summary.as_str()) {
            return;
        }
        self.line(&summary);
        self.last_summary = Some(summary);
    }

    fn fit_view(&mut self, path: &[PathPoint]) {
        if let (Some(first), Some(last)) = (path.first(), path.last()) {
            self.line(&format!(
                "  View: {:.5}, {:.5} to {:.5}, {:.5}",
                first.lat, first.lng, last.lat, last.lng
            ));
        }
    }

    fn center_on(&mut self, place: &Place) {
        self.line(&format!("  Centered on {}", format_place(place)));
    }

    fn notice(&mut self, notice: &Notice) {
        self.line(&format!("! {}", notice));
    }

    fn history_changed(&mut self, records: &[RouteRecord]) {
        if records.is_empty() {
            self.line("Saved routes: none");
            return;
        }
        self.line(&format!("Saved routes ({}):", records.len()));
        for (index, record) in records.iter().enumerate() {
            self.line(&format!(
                "  {}. {} ({}, {})",
                index + 1,
                record.title(),
                format_distance(record.distance_m),
                local_time(record)
            ));
        }
    }
}

fn local_time(record: &RouteRecord) -> String {
    record
        .timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfinder_core::navigator::Command;

    fn output(presenter: TerminalPresenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    fn loaded_navigator() -> Navigator {
        let mut navigator = Navigator::default();
        navigator.handle(Command::LoadRoute(RouteRecord::new(
            Place::new(24.86, 67.0, "Home"),
            &[],
            Place::new(24.86, 67.02, "Office"),
            vec![PathPoint::new(24.86, 67.0), PathPoint::new(24.86, 67.02)],
            2017.0,
        )));
        navigator
    }

    #[test]
    fn distance_switches_units_at_one_km() {
        assert_eq!(format_distance(999.4), "999 m");
        assert_eq!(format_distance(2017.0), "2.02 km");
    }

    #[test]
    fn summary_lists_route_and_estimates() {
        let summary = summarize(&loaded_navigator());
        assert!(summary.starts_with("[route ready]"));
        assert!(summary.contains("Start: Home (24.86000, 67.00000)"));
        assert!(summary.contains("Route: 2.02 km (saved route, 2 points) | driving 2 min | walking 24 min"));
    }

    #[test]
    fn repeated_render_prints_once() {
        let navigator = loaded_navigator();
        let mut presenter = TerminalPresenter::new(Vec::new());
        presenter.render(&navigator);
        presenter.render(&navigator);
        assert_eq!(output(presenter).matches("[route ready]").count(), 1);
    }

    #[test]
    fn history_is_numbered_from_one() {
        let record = RouteRecord::new(
            Place::new(24.86, 67.0, "Home"),
            &[],
            Place::new(24.86, 67.02, "Office"),
            Vec::new(),
            500.0,
        );
        let mut presenter = TerminalPresenter::new(Vec::new());
        presenter.history_changed(&[record]);
        presenter.notice(&Notice::RouteSaved);
        let text = output(presenter);
        assert!(text.contains("  1. Home → Office (500 m,"));
        assert!(text.contains("! Route saved to history!"));
    }

    #[test]
    fn history_timestamps_use_local_time() {
        let record = RouteRecord::new(
            Place::new(24.86, 67.0, "Home"),
            &[],
            Place::new(24.86, 67.02, "Office"),
            Vec::new(),
            500.0,
        );
        let expected = record
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        let mut presenter = TerminalPresenter::new(Vec::new());
        presenter.history_changed(&[record]);
        assert!(output(presenter).contains(&format!("500 m, {})", expected)));
    }
}
