//! Batch replay of complete logs.
//!
//! Replay goes through the same incremental path as live streaming, so a
//! replayed log yields exactly the state of the same bytes streamed in any
//! chunking.

use crate::config::ReducerConfig;
use crate::extractor::is_record_boundary;
use crate::reducer::StreamReducer;
use crate::Result;
use chipcheck_types::StreamSnapshot;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Final state of a replayed log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutcome {
    #[serde(flatten)]
    pub state: StreamSnapshot,
    pub formatted_output: String,
}

impl ReplayOutcome {
    fn of(reducer: &StreamReducer) -> Self {
        Self {
            state: reducer.get_state(),
            formatted_output: reducer.get_formatted_output(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Split a log into segments that each start at a record boundary line.
///
/// Text before the first boundary forms its own segment. Concatenating the
/// segments gives back the input.
pub fn split_log_segments(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if offset > start && is_record_boundary(line.trim()) {
            segments.push(&text[start..offset]);
            start = offset;
        }
        offset += line.len();
    }
    if start < text.len() {
        segments.push(&text[start..]);
    }

    segments
}

impl StreamReducer {
    /// Feed a complete log segment by segment.
    pub fn replay(&mut self, text: &str) {
        let segments = split_log_segments(text);
        debug!(
            target: "chipcheck::replay",
            "Replaying {} bytes in {} segments",
            text.len(),
            segments.len()
        );
        for segment in segments {
            self.process_chunk(segment);
        }
    }
}

/// Replay a complete log through a fresh reducer with default settings.
pub fn parse_complete_log(text: &str) -> ReplayOutcome {
    parse_complete_log_with(text, ReducerConfig::default())
}

pub fn parse_complete_log_with(text: &str, config: ReducerConfig) -> ReplayOutcome {
    let mut reducer = StreamReducer::with_config(config);
    reducer.replay(text);
    ReplayOutcome::of(&reducer)
}

/// Replay a log file from disk.
///
/// Unlike [`parse_complete_log`], the file is known to be complete, so a
/// final line without a trailing newline is still processed.
pub fn replay_file(path: impl AsRef<Path>, config: ReducerConfig) -> Result<ReplayOutcome> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;

    let mut reducer = StreamReducer::with_config(config);
    reducer.replay(&text);
    reducer.finish();

    let outcome = ReplayOutcome::of(&reducer);
    info!(
        target: "chipcheck::replay",
        "Replayed {}: {} events, {} tools, complete={}",
        path.display(),
        outcome.state.stats.event_count,
        outcome.state.stats.tool_count,
        outcome.state.state.is_complete
    );
    Ok(outcome)
}
