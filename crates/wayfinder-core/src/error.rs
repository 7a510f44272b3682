//! Error types for the navigation engine.
//!
//! None of these are fatal. Each one maps to a degraded but usable state.

use thiserror::Error;

/// An action was missing a required waypoint or targeted a locked route.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserInputError {
    #[error("Select destination (end) first.")]
    MissingDestination,

    #[error("Select destination, then pick a start to plan route.")]
    MissingStart,

    #[error("Clear the current route before changing its endpoints.")]
    RouteLocked,

    #[error("No stop at position {0}.")]
    NoSuchStop(usize),

    #[error("No route to save.")]
    NothingToSave,

    #[error("Navigation needs a destination and no pending route request.")]
    CannotNavigate,
}

/// The path service was unreachable or replied with something unusable.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Path service unreachable: {0}")]
    Unreachable(String),

    #[error("Path service returned HTTP {0}")]
    Status(u16),

    #[error("Malformed path service response: {0}")]
    Malformed(String),
}

/// A position request or subscription failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location request timed out")]
    Timeout,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

/// Reading or writing the persisted history failed.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored history is not valid JSON: {0}")]
    Encoding(#[from] serde_json::Error),
}
