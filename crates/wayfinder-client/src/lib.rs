//! Wayfinder client - concrete collaborators for the navigation core
//!
//! HTTP access to the shortest-path backend and file-backed persistence.

pub mod path_service;
pub mod store;

pub use path_service::PathServiceClient;
pub use store::JsonFileStore;
