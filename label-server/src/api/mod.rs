//! HTTP API
//!
//! # Structure
//!
//! - [`health`] - liveness
//! - [`printers`] - discovery and the printer connection
//! - [`layouts`] - geometry profiles
//! - [`print`] - job submission
//! - [`jobs`] - job lookup, cancel, delete, preview
//! - [`queue`] - counters and cleanup

pub mod health;
pub mod jobs;
pub mod layouts;
pub mod print;
pub mod printers;
pub mod queue;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

pub use crate::utils::{AppError, AppResult};

/// Largest accepted request body; raw command blobs are the big ones
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the routes (without state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(printers::router())
        .merge(layouts::router())
        .merge(print::router())
        .merge(jobs::router())
        .merge(queue::router())
}

/// Build the complete application with state and middleware
pub fn build_router(state: ServerState) -> Router {
    build_app()
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
