// TrackID API HTTP handlers
//
// This module contains the HTTP handlers for the TrackID API.
// It provides the interface between HTTP requests and the two external-service clients.

pub mod cors;
pub mod form;
pub mod routes;

// Re-export handlers for easier access
pub use self::routes::{
    not_found, recognize, recognize_options, resolve_stream, resolve_stream_options,
};
// Re-export CORS middleware
pub use self::cors::Cors;
