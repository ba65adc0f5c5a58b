//! Live stream routes.

use crate::state::{AppState, StreamLimitReached, StreamSummary};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chipcheck_types::{StreamSnapshot, StreamStats};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

impl From<StreamLimitReached> for (StatusCode, String) {
    fn from(e: StreamLimitReached) -> Self {
        (StatusCode::CONFLICT, e.to_string())
    }
}

fn not_found(id: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Stream not found: {}", id))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamListResponse {
    pub streams: Vec<StreamSummary>,
    pub max_streams: usize,
}

pub async fn list(State(state): State<Arc<AppState>>) -> Json<StreamListResponse> {
    Json(StreamListResponse {
        streams: state.list(),
        max_streams: state.config.max_streams,
    })
}

/// Append a raw log chunk to a stream, creating it on first use.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: String,
) -> Result<Json<StreamStats>, (StatusCode, String)> {
    let stats = state.ingest(&id, &body).map_err(|e| {
        warn!(target: "chipcheck::api", "Rejected chunk for {}: {}", id, e);
        <(StatusCode, String)>::from(e)
    })?;
    Ok(Json(stats))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StreamSnapshot>, (StatusCode, String)> {
    state.snapshot(&id).map(Json).ok_or_else(|| not_found(&id))
}

pub async fn formatted(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<String, (StatusCode, String)> {
    state.formatted_output(&id).ok_or_else(|| not_found(&id))
}

pub async fn reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.reset(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&id))
    }
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&id))
    }
}

/// Server-sent events of a stream's updates, named by update kind.
pub async fn events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let rx = state.subscribe(&id)?;
    debug!(target: "chipcheck::api", "SSE subscriber attached to {}", id);

    let stream = BroadcastStream::new(rx).filter_map(move |message| {
        let id = id.clone();
        async move {
            match message {
                Ok(update) => match Event::default().event(update.kind()).json_data(&update) {
                    Ok(event) => Some(Ok(event)),
                    Err(e) => {
                        warn!(target: "chipcheck::api", "Failed to encode update for {}: {}", id, e);
                        None
                    }
                },
                Err(e) => {
                    warn!(target: "chipcheck::api", "SSE subscriber on {} lagged: {}", id, e);
                    None
                }
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
