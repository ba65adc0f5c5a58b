//! Shared application state.

use crate::config::Config;
use chipcheck_core::StreamReducer;
use chipcheck_types::{StreamSnapshot, StreamStats, StreamUpdate};
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// One live stream: its reducer and the channel its updates fan out on.
pub struct StreamEntry {
    pub reducer: StreamReducer,
    pub updates: broadcast::Sender<StreamUpdate>,
}

impl StreamEntry {
    fn new(config: &Config) -> Self {
        let (updates, _) = broadcast::channel(config.event_channel_capacity.max(1));
        let reducer =
            StreamReducer::with_config(config.reducer.clone()).with_observer(updates.clone());
        Self { reducer, updates }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    pub id: String,
    pub is_complete: bool,
    pub event_count: usize,
}

/// Returned when a new stream would exceed `max_streams`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLimitReached {
    pub max_streams: usize,
}

impl fmt::Display for StreamLimitReached {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stream limit reached ({} streams)", self.max_streams)
    }
}

impl std::error::Error for StreamLimitReached {}

/// Shared application state.
pub struct AppState {
    pub config: Config,
    streams: DashMap<String, StreamEntry>,
    admit: Mutex<()>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            streams: DashMap::new(),
            admit: Mutex::new(()),
        }
    }

    /// Get a stream, creating it on first use.
    ///
    /// Streams are only inserted while holding `admit`, so concurrent first
    /// chunks for different ids cannot push the count past `max_streams`.
    fn open(&self, id: &str) -> Result<RefMut<'_, String, StreamEntry>, StreamLimitReached> {
        if let Some(entry) = self.streams.get_mut(id) {
            return Ok(entry);
        }

        // Guards no data, so a poisoned lock is still usable
        let _admit = self.admit.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = self.streams.get_mut(id) {
            return Ok(entry);
        }
        if self.streams.len() >= self.config.max_streams {
            return Err(StreamLimitReached {
                max_streams: self.config.max_streams,
            });
        }

        info!(target: "chipcheck::api", "Opening stream {}", id);
        Ok(self
            .streams
            .entry(id.to_string())
            .or_insert_with(|| StreamEntry::new(&self.config)))
    }

    /// Apply a chunk to a stream and return its updated stats.
    pub fn ingest(&self, id: &str, chunk: &str) -> Result<StreamStats, StreamLimitReached> {
        let mut entry = self.open(id)?;
        entry.reducer.process_chunk(chunk);
        debug!(target: "chipcheck::api", "Stream {} received {} bytes", id, chunk.len());
        Ok(StreamStats::of(entry.reducer.state()))
    }

    /// Subscribe to a stream's updates, creating the stream if needed.
    pub fn subscribe(
        &self,
        id: &str,
    ) -> Result<broadcast::Receiver<StreamUpdate>, StreamLimitReached> {
        Ok(self.open(id)?.updates.subscribe())
    }

    pub fn snapshot(&self, id: &str) -> Option<StreamSnapshot> {
        self.streams.get(id).map(|entry| entry.reducer.get_state())
    }

    pub fn formatted_output(&self, id: &str) -> Option<String> {
        self.streams
            .get(id)
            .map(|entry| entry.reducer.get_formatted_output())
    }

    /// Reset a stream's state. Subscribers stay connected.
    pub fn reset(&self, id: &str) -> bool {
        match self.streams.get_mut(id) {
            Some(mut entry) => {
                entry.reducer.reset();
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: &str) -> bool {
        let removed = self.streams.remove(id).is_some();
        if removed {
            info!(target: "chipcheck::api", "Closed stream {}", id);
        }
        removed
    }

    /// Summaries of all live streams, ordered by id.
    pub fn list(&self) -> Vec<StreamSummary> {
        let mut summaries: Vec<StreamSummary> = self
            .streams
            .iter()
            .map(|entry| {
                let state = entry.reducer.state();
                StreamSummary {
                    id: entry.key().clone(),
                    is_complete: state.is_complete,
                    event_count: state.chronological_events.len(),
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }
}
