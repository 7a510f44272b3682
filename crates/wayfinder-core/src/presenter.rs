//! Presentation collaborator notified by the driver.

use crate::models::{PathPoint, Place, RouteRecord};
use crate::navigator::{Navigator, Notice};

/// Receives view updates. Every method defaults to doing nothing.
pub trait Presenter {
    /// Waypoints, route, estimates or state changed.
    fn render(&mut self, _navigator: &Navigator) {}

    fn fit_view(&mut self, _path: &[PathPoint]) {}

    fn center_on(&mut self, _place: &Place) {}

    fn notice(&mut self, _notice: &Notice) {}

    fn history_changed(&mut self, _records: &[RouteRecord]) {}
}

/// Presenter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}
