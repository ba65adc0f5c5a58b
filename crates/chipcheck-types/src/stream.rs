//! View model types for a single agent stream.
//!
//! These types are what the reducer produces and what the UI consumes. They
//! serialize in camelCase to match the browser client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Accumulated state of one stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamState {
    pub metadata: StreamMetadata,
    /// Internal reasoning text (append-only)
    pub thinking: String,
    /// User-visible text (append-only)
    pub assistant_text: String,
    /// Tool invocations in the order they started
    pub tool_uses: Vec<ToolUse>,
    /// Raw `input_json_delta` fragments after unescaping
    pub tool_commands: Vec<String>,
    /// Concatenation of `tool_commands`
    pub full_tool_command: String,
    /// Markdown tables detected in `assistant_text`
    pub tables: Vec<ParsedTable>,
    /// Human-readable narration of tool activity
    pub tool_activity: Vec<String>,
    /// Audit trail of every semantic event
    pub chronological_events: Vec<ChronologicalEvent>,
    pub usage: TokenUsage,
    pub is_complete: bool,
    /// Verdict derived when the message stops
    #[serde(default)]
    pub verdict: Option<VerdictData>,
}

/// Identity of the stream, set once from early events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMetadata {
    pub session_id: Option<String>,
    /// Id of the first message in the stream; later turns do not replace it
    pub message_id: Option<String>,
    /// Model of the first message
    pub model: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
}

/// Token usage. Counts are overwritten, never summed, across updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub cache_read_tokens: u64,
}

impl TokenUsage {
    /// Overwrite the fields that are present and recompute the total.
    pub fn apply(&mut self, input: Option<u64>, output: Option<u64>, cache_read: Option<u64>) {
        self.input_tokens = input.unwrap_or(self.input_tokens);
        self.output_tokens = output.unwrap_or(self.output_tokens);
        self.cache_read_tokens = cache_read.unwrap_or(self.cache_read_tokens);
        self.total_tokens = self.input_tokens.saturating_add(self.output_tokens);
    }
}

/// A tool invocation made by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUse {
    /// Correlation id from the SDK
    pub id: String,
    /// Tool name (WebSearch, WebFetch, ...). Open set.
    pub name: String,
    /// None until the tool's content block closes
    pub input: Option<ToolInput>,
}

impl ToolUse {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            input: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.input.is_some()
    }

    /// String field of a parsed object input.
    pub fn input_field(&self, key: &str) -> Option<&str> {
        match &self.input {
            Some(ToolInput::Parsed(value)) => value.get(key).and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Final tool input: parsed JSON, or the raw text when it did not parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolInput {
    Raw(String),
    Parsed(Value),
}

impl ToolInput {
    pub fn as_raw(&self) -> Option<&str> {
        match self {
            ToolInput::Raw(raw) => Some(raw),
            ToolInput::Parsed(_) => None,
        }
    }

    pub fn as_parsed(&self) -> Option<&Value> {
        match self {
            ToolInput::Parsed(value) => Some(value),
            ToolInput::Raw(_) => None,
        }
    }
}

/// A markdown table found in the assistant text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub row_count: usize,
    pub column_count: usize,
    pub raw_text: String,
}

/// Authenticity label of a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictLabel {
    Authentic,
    Counterfeit,
    #[serde(rename = "Review Required")]
    ReviewRequired,
    Indeterminate,
}

impl VerdictLabel {
    /// Parse a label case-insensitively, ignoring surrounding punctuation.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        match normalized.as_str() {
            "authentic" | "genuine" => Some(VerdictLabel::Authentic),
            "counterfeit" | "fake" => Some(VerdictLabel::Counterfeit),
            "review required" | "needs review" => Some(VerdictLabel::ReviewRequired),
            "indeterminate" | "inconclusive" => Some(VerdictLabel::Indeterminate),
            _ => None,
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VerdictLabel::Authentic => "Authentic",
            VerdictLabel::Counterfeit => "Counterfeit",
            VerdictLabel::ReviewRequired => "Review Required",
            VerdictLabel::Indeterminate => "Indeterminate",
        };
        f.write_str(label)
    }
}

/// Structured conclusion extracted from the finished text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictData {
    /// None when the verdict line carries an unknown label
    pub is_authentic: Option<VerdictLabel>,
    pub reason: String,
    pub citations: Vec<String>,
}

/// Kind of a chronological event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Text,
    Thinking,
    ToolUse,
    ToolCommand,
    ToolComplete,
}

/// One entry of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChronologicalEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Log marker time when available, otherwise time of application
    pub timestamp: DateTime<Utc>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

/// Derived counters, computed on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStats {
    pub text_length: usize,
    pub thinking_length: usize,
    pub word_count: usize,
    pub tool_count: usize,
    pub command_count: usize,
    pub event_count: usize,
}

impl StreamStats {
    pub fn of(state: &StreamState) -> Self {
        Self {
            text_length: state.assistant_text.chars().count(),
            thinking_length: state.thinking.chars().count(),
            word_count: state.assistant_text.split_whitespace().count(),
            tool_count: state.tool_uses.len(),
            command_count: state.tool_commands.len(),
            event_count: state.chronological_events.len(),
        }
    }
}

/// Read-only view of a stream handed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSnapshot {
    #[serde(flatten)]
    pub state: StreamState,
    pub stats: StreamStats,
}

impl StreamSnapshot {
    pub fn of(state: &StreamState) -> Self {
        Self {
            stats: StreamStats::of(state),
            state: state.clone(),
        }
    }
}

/// Domain events pushed to observers while a chunk is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamUpdate {
    Text {
        delta: String,
        full: String,
    },
    Thinking {
        delta: String,
        full: String,
    },
    ToolUseStart {
        tool: ToolUse,
    },
    ToolCommand {
        fragment: String,
        full: String,
    },
    ToolComplete {
        tool: ToolUse,
    },
    TableDetected {
        table: ParsedTable,
        tables: Vec<ParsedTable>,
    },
    StreamComplete {
        snapshot: Box<StreamSnapshot>,
    },
    Error {
        message: String,
    },
}

impl StreamUpdate {
    /// Wire name of the update, as in the `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamUpdate::Text { .. } => "text",
            StreamUpdate::Thinking { .. } => "thinking",
            StreamUpdate::ToolUseStart { .. } => "tool_use_start",
            StreamUpdate::ToolCommand { .. } => "tool_command",
            StreamUpdate::ToolComplete { .. } => "tool_complete",
            StreamUpdate::TableDetected { .. } => "table_detected",
            StreamUpdate::StreamComplete { .. } => "stream_complete",
            StreamUpdate::Error { .. } => "error",
        }
    }
}
