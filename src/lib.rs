// Library crate for hostplane
// Exports modules for use by the server binary and tests

pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pubsub;
pub mod repositories;
pub mod services;
pub mod state;
pub mod store;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{delete_environment, lookup, reset_cache};
use crate::state::AppState;

/// Build the application router with the given state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "hostplane" }))
        // Request routing
        .route("/hosting/lookup", get(lookup))
        // Configuration side effects
        .route("/api/cache/reset", post(reset_cache))
        .route("/api/environments/{id}", delete(delete_environment))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
