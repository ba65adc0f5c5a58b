//! Chipcheck server library - HTTP adapter over the stream reducer.
//!
//! Routes and shared state live here, separate from main.rs, so integration
//! tests can drive the router directly.

pub mod config;
pub mod logging;
pub mod routes;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use state::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/streams", get(routes::streams::list))
        .route(
            "/streams/{id}",
            get(routes::streams::get).delete(routes::streams::remove),
        )
        .route("/streams/{id}/chunks", post(routes::streams::ingest))
        .route("/streams/{id}/formatted", get(routes::streams::formatted))
        .route("/streams/{id}/reset", post(routes::streams::reset))
        .route("/streams/{id}/events", get(routes::streams::events))
        .route("/replay", post(routes::replay::replay))
        .route("/health", get(routes::health));

    Router::new()
        .nest("/api", api_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
