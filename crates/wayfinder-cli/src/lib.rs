//! Wayfinder CLI - terminal front end for the navigation core.
//!
//! This crate provides the binaries:
//! - wayfinder: interactive planning and simulated navigation session
//! - plan_route: one-shot route composition

pub mod commands;
pub mod config;
pub mod presenter;
pub mod sim;

pub use commands::{parse_line, parse_point, Input};
pub use config::Config;
pub use presenter::TerminalPresenter;
pub use sim::{FollowRoute, SimulatedGeolocation, TrackHandle};
