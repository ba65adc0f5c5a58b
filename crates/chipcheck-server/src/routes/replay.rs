//! Offline replay of complete logs.

use crate::state::AppState;
use axum::{extract::State, Json};
use chipcheck_core::{parse_complete_log_with, ReplayOutcome};
use std::sync::Arc;
use tracing::info;

/// Replay a complete log posted as the request body.
pub async fn replay(State(state): State<Arc<AppState>>, body: String) -> Json<ReplayOutcome> {
    let outcome = parse_complete_log_with(&body, state.config.reducer.clone());
    info!(
        target: "chipcheck::api",
        "Replayed {} bytes: {} events, complete={}",
        body.len(),
        outcome.state.stats.event_count,
        outcome.state.state.is_complete
    );
    Json(outcome)
}
