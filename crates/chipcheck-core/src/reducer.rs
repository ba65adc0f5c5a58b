//! The stream event reducer.
//!
//! Architecture:
//! - Raw chunks are split into complete lines by [`LineBuffer`]
//! - [`EventExtractor`] reassembles JSON records from those lines
//! - Each record is classified as an [`SdkEvent`] and applied to the
//!   [`StreamState`] view model
//! - Observers are notified synchronously as fields change
//!
//! One reducer owns one stream. Chunks must be applied in arrival order.

use crate::activity;
use crate::buffer::LineBuffer;
use crate::config::ReducerConfig;
use crate::escape::unescape;
use crate::extractor::{EventExtractor, ExtractedEvent};
use crate::observer::StreamObserver;
use crate::projection;
use crate::tables::TableDetector;
use crate::verdict::derive_verdict;
use chipcheck_types::{
    ChronologicalEvent, ContentBlock, Delta, EventKind, SdkEvent, SessionInfo, StreamSnapshot,
    StreamState, StreamUpdate, ToolInput, ToolUse, WireUsage,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, trace, warn};

/// Tool whose content block is currently open.
#[derive(Debug)]
struct ActiveTool {
    id: String,
    name: String,
    is_search: bool,
    /// Unescaped input JSON received so far
    input: String,
    /// Fields already narrated for this tool
    narrated: Vec<&'static str>,
}

/// Incremental reducer from raw log chunks to a [`StreamState`].
pub struct StreamReducer {
    config: ReducerConfig,
    state: StreamState,
    lines: LineBuffer,
    extractor: EventExtractor,
    tables: TableDetector,
    active_tool: Option<ActiveTool>,
    observer: Option<Box<dyn StreamObserver>>,
}

impl Default for StreamReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StreamReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReducer")
            .field("state", &self.state)
            .field("pending_line", &self.lines.pending())
            .field("pending_record", &self.extractor.pending())
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl StreamReducer {
    pub fn new() -> Self {
        Self::with_config(ReducerConfig::default())
    }

    pub fn with_config(config: ReducerConfig) -> Self {
        Self {
            config,
            state: StreamState::default(),
            lines: LineBuffer::new(),
            extractor: EventExtractor::new(),
            tables: TableDetector::new(),
            active_tool: None,
            observer: None,
        }
    }

    /// Attach an observer, replacing any previous one.
    pub fn with_observer(mut self, observer: impl StreamObserver + 'static) -> Self {
        self.set_observer(observer);
        self
    }

    pub fn set_observer(&mut self, observer: impl StreamObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Feed newly arrived log text. Chunk boundaries carry no meaning.
    pub fn process_chunk(&mut self, chunk: &str) {
        self.lines.append(chunk);
        let lines = self.lines.drain_complete_lines();
        if lines.is_empty() {
            return;
        }

        let events = self.extractor.extract(lines);
        trace!(
            target: "chipcheck::reducer",
            "Chunk of {} bytes produced {} records",
            chunk.len(),
            events.len()
        );
        for event in events {
            self.apply_event(event);
        }
    }

    /// Treat buffered partial input as final.
    ///
    /// Only for streams known to have ended; the partial line is processed
    /// as if its newline had arrived and any open record is flushed.
    pub fn finish(&mut self) {
        let mut events = Vec::new();
        if let Some(rest) = self.lines.take_remainder() {
            events.extend(self.extractor.extract([rest]));
        }
        events.extend(self.extractor.finish());
        for event in events {
            self.apply_event(event);
        }
    }

    /// Apply one extracted record to the state.
    pub fn apply_event(&mut self, event: ExtractedEvent) {
        let timestamp = event.logged_at.unwrap_or_else(Utc::now);
        let payload = event.payload;

        if self.state.metadata.start_time.is_none() {
            self.state.metadata.start_time = Some(timestamp);
        }
        if let Some(info) = SessionInfo::from_value(&payload) {
            self.apply_session(info);
        }

        let sdk_event = SdkEvent::classify(&payload);
        trace!(target: "chipcheck::reducer", "Applying {}", sdk_event.kind());

        match sdk_event {
            SdkEvent::MessageStart { message } => {
                let metadata = &mut self.state.metadata;
                if metadata.message_id.is_none() {
                    metadata.message_id = message.id;
                }
                if metadata.model.is_none() {
                    metadata.model = message.model;
                }
                if let Some(usage) = message.usage {
                    self.apply_usage(&usage);
                }
            }
            SdkEvent::ContentBlockStart {
                content_block: ContentBlock::ToolUse { id, name, .. },
                ..
            } => self.start_tool(id, name, timestamp),
            SdkEvent::ContentBlockStart { .. } => {}
            SdkEvent::ContentBlockDelta { delta, .. } => match delta {
                Delta::TextDelta { text } => self.append_text(&text, timestamp),
                Delta::ThinkingDelta { thinking } => self.append_thinking(&thinking, timestamp),
                Delta::InputJsonDelta { partial_json } => {
                    self.append_tool_input(&partial_json, timestamp)
                }
                Delta::Other => {}
            },
            SdkEvent::ContentBlockStop { .. } => self.finish_tool(timestamp),
            SdkEvent::MessageDelta { usage } => {
                if let Some(usage) = usage {
                    self.apply_usage(&usage);
                }
            }
            SdkEvent::MessageStop => self.complete(),
            SdkEvent::Unrecognized => {}
        }
    }

    /// Snapshot of the current state with derived stats.
    pub fn get_state(&self) -> StreamSnapshot {
        StreamSnapshot::of(&self.state)
    }

    /// Borrow the live state.
    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Text rendering of the state for display and debugging.
    pub fn get_formatted_output(&self) -> String {
        projection::format_output(&self.state, &self.config)
    }

    /// Clear all state and buffers. The observer stays attached.
    pub fn reset(&mut self) {
        self.state = StreamState::default();
        self.lines.clear();
        self.extractor.clear();
        self.tables.reset();
        self.active_tool = None;
        debug!(target: "chipcheck::reducer", "Reducer reset");
    }

    // ========================================================================
    // Event handlers
    // ========================================================================

    fn apply_session(&mut self, info: SessionInfo) {
        let metadata = &mut self.state.metadata;
        if metadata.session_id.is_none() {
            debug!(target: "chipcheck::reducer", "Session id {}", info.session_id);
            metadata.session_id = Some(info.session_id);
        }
        if metadata.model.is_none() {
            metadata.model = info.model;
        }
    }

    fn apply_usage(&mut self, usage: &WireUsage) {
        self.state.usage.apply(
            usage.input_tokens,
            usage.output_tokens,
            usage.cache_read_input_tokens,
        );
    }

    fn append_text(&mut self, raw: &str, timestamp: DateTime<Utc>) {
        let delta = unescape(raw);
        if delta.is_empty() {
            return;
        }

        self.state.assistant_text.push_str(&delta);
        self.push_event(EventKind::Text, timestamp, delta.clone(), None);

        let new_tables = self.tables.scan(&self.state.assistant_text, &delta);
        for table in new_tables {
            debug!(
                target: "chipcheck::tables",
                "Detected table with {} columns and {} rows",
                table.column_count,
                table.row_count
            );
            self.state.tables.push(table.clone());
            self.notify(|state| StreamUpdate::TableDetected {
                table,
                tables: state.tables.clone(),
            });
        }

        self.notify(|state| StreamUpdate::Text {
            delta,
            full: state.assistant_text.clone(),
        });
    }

    fn append_thinking(&mut self, raw: &str, timestamp: DateTime<Utc>) {
        let delta = unescape(raw);
        if delta.is_empty() {
            return;
        }

        self.state.thinking.push_str(&delta);
        self.push_event(EventKind::Thinking, timestamp, delta.clone(), None);
        self.notify(|state| StreamUpdate::Thinking {
            delta,
            full: state.thinking.clone(),
        });
    }

    fn append_tool_input(&mut self, raw: &str, timestamp: DateTime<Utc>) {
        let fragment = unescape(raw);
        if fragment.is_empty() {
            return;
        }

        self.state.tool_commands.push(fragment.clone());
        self.state.full_tool_command.push_str(&fragment);

        let mut tool_ref = None;
        if let Some(tool) = self.active_tool.as_mut() {
            tool.input.push_str(&fragment);
            for (key, value) in activity::sniff_fields(&tool.input) {
                if tool.narrated.contains(&key) {
                    continue;
                }
                tool.narrated.push(key);
                self.state.tool_activity.push(activity::field_line(
                    key,
                    &value,
                    tool.is_search,
                    self.config.narration_field_chars,
                ));
            }
            tool_ref = Some((tool.id.clone(), tool.name.clone()));
        }

        self.push_event(EventKind::ToolCommand, timestamp, fragment.clone(), tool_ref);
        self.notify(|state| StreamUpdate::ToolCommand {
            fragment,
            full: state.full_tool_command.clone(),
        });
    }

    fn start_tool(&mut self, id: String, name: String, timestamp: DateTime<Utc>) {
        if let Some(previous) = &self.active_tool {
            warn!(
                target: "chipcheck::reducer",
                "Tool {} started while {} was still open",
                name,
                previous.name
            );
        }

        let is_search = self.config.is_search_tool(&name);
        info!(target: "chipcheck::reducer", "Tool started: {} ({})", name, id);

        let tool = ToolUse::new(id.clone(), name.clone());
        self.state.tool_uses.push(tool.clone());
        self.state.tool_activity.push(activity::start_line(&name));
        self.active_tool = Some(ActiveTool {
            id: id.clone(),
            name: name.clone(),
            is_search,
            input: String::new(),
            narrated: Vec::new(),
        });

        self.push_event(EventKind::ToolUse, timestamp, name.clone(), Some((id, name)));
        self.notify(|_| StreamUpdate::ToolUseStart { tool });
    }

    fn finish_tool(&mut self, timestamp: DateTime<Utc>) {
        // A stop before any input arrives leaves the tool open
        match &self.active_tool {
            None => return,
            Some(active) if active.input.trim().is_empty() => {
                debug!(
                    target: "chipcheck::reducer",
                    "Block stop for {} with no input yet, tool stays active",
                    active.name
                );
                return;
            }
            Some(_) => {}
        }
        let Some(active) = self.active_tool.take() else {
            return;
        };

        let input = match serde_json::from_str::<Value>(&active.input) {
            Ok(value) => ToolInput::Parsed(value),
            Err(e) => {
                debug!(
                    target: "chipcheck::reducer",
                    "Tool {} input did not parse, keeping raw text: {}",
                    active.name,
                    e
                );
                ToolInput::Raw(active.input.clone())
            }
        };

        let Some(tool) = self.state.tool_uses.last_mut() else {
            return;
        };
        if tool.id != active.id || tool.input.is_some() {
            warn!(
                target: "chipcheck::reducer",
                "Tool {} closed but the last tool entry is {}",
                active.id,
                tool.id
            );
            return;
        }
        tool.input = Some(input);
        let completed = tool.clone();

        info!(target: "chipcheck::reducer", "Tool completed: {} ({})", active.name, active.id);
        self.state
            .tool_activity
            .push(activity::complete_line(&active.name));

        let content = match &completed.input {
            Some(ToolInput::Parsed(value)) => value.to_string(),
            Some(ToolInput::Raw(raw)) => raw.clone(),
            None => String::new(),
        };
        self.push_event(
            EventKind::ToolComplete,
            timestamp,
            content,
            Some((active.id, active.name)),
        );
        self.notify(|_| StreamUpdate::ToolComplete { tool: completed });
    }

    fn complete(&mut self) {
        if !self.state.is_complete {
            info!(
                target: "chipcheck::reducer",
                "Stream complete: {} chars, {} tools",
                self.state.assistant_text.len(),
                self.state.tool_uses.len()
            );
        }
        self.state.is_complete = true;
        self.state.verdict = derive_verdict(&self.state);

        self.notify(|state| StreamUpdate::StreamComplete {
            snapshot: Box::new(StreamSnapshot::of(state)),
        });
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn push_event(
        &mut self,
        kind: EventKind,
        timestamp: DateTime<Utc>,
        content: String,
        tool: Option<(String, String)>,
    ) {
        let (tool_id, tool_name) = match tool {
            Some((id, name)) => (Some(id), Some(name)),
            None => (None, None),
        };
        self.state.chronological_events.push(ChronologicalEvent {
            kind,
            timestamp,
            content,
            tool_id,
            tool_name,
        });
    }

    /// Build an update lazily and hand it to the observer, if any.
    fn notify<F>(&mut self, build: F)
    where
        F: FnOnce(&StreamState) -> StreamUpdate,
    {
        let Some(observer) = self.observer.as_mut() else {
            return;
        };

        let update = build(&self.state);
        if let Err(e) = observer.on_update(&update) {
            warn!(target: "chipcheck::reducer", "Observer failed: {}", e);
            observer.on_error(&e);
        }
    }
}
