//! Event extraction from the line-oriented SDK log.
//!
//! The log interleaves three kinds of records:
//!
//! ```text
//! [2025-01-15T10:30:00.000Z] stream_event:
//! {
//!   "type": "content_block_delta",
//!   "delta": { "type": "text_delta", "text": "Hello" }
//! }
//! ```
//!
//! Timestamp brackets and event labels are record boundaries. JSON payloads
//! are pretty-printed and may span many lines, so objects are reassembled
//! line by line and parsed once they look closed.
//!
//! Accumulator policy: the accumulator is kept only while it is a valid but
//! unfinished JSON prefix. It is dropped as soon as it can no longer become
//! valid JSON, and at every record boundary where it fails to parse.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, trace};

/// Labels that introduce a new record in the log.
pub const RECORD_LABELS: &[&str] = &[
    "session_init:",
    "stream_event:",
    "tool_use_from_stream:",
    "session_complete:",
    "input_json_delta:",
];

/// A JSON record pulled out of the log.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedEvent {
    pub payload: Value,
    /// Time of the most recent marker before the record started
    pub logged_at: Option<DateTime<Utc>>,
}

/// Structural meaning of one trimmed log line.
#[derive(Debug, PartialEq)]
enum LogLine<'a> {
    /// Timestamp bracket and/or record label, with any trailing payload text.
    Boundary {
        timestamp: Option<DateTime<Utc>>,
        rest: &'a str,
    },
    /// A fragment of a JSON payload.
    Json(&'a str),
}

/// Outcome of parsing the accumulator.
enum ParseAttempt {
    Complete(Value),
    /// Valid prefix, more input needed.
    Incomplete,
    Invalid,
}

/// Reassembles JSON records from complete log lines.
#[derive(Debug, Default)]
pub struct EventExtractor {
    accumulator: String,
    /// Timestamp of the latest marker line.
    current_timestamp: Option<DateTime<Utc>>,
    /// Timestamp captured when the accumulator received its first line.
    accumulator_timestamp: Option<DateTime<Utc>>,
}

impl EventExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract every record completed by these lines.
    pub fn extract<I, S>(&mut self, lines: I) -> Vec<ExtractedEvent>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut events = Vec::new();

        for line in lines {
            let trimmed = line.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }

            match classify_line(trimmed) {
                LogLine::Boundary { timestamp, rest } => {
                    self.flush(&mut events);
                    if timestamp.is_some() {
                        self.current_timestamp = timestamp;
                    }
                    if !rest.is_empty() {
                        self.push_json_line(rest, &mut events);
                    }
                }
                LogLine::Json(fragment) => self.push_json_line(fragment, &mut events),
            }
        }

        events
    }

    /// Force a flush of whatever is accumulated, as at a record boundary.
    pub fn finish(&mut self) -> Vec<ExtractedEvent> {
        let mut events = Vec::new();
        self.flush(&mut events);
        events
    }

    /// Text accumulated for the record in progress.
    pub fn pending(&self) -> &str {
        &self.accumulator
    }

    pub fn clear(&mut self) {
        self.accumulator.clear();
        self.current_timestamp = None;
        self.accumulator_timestamp = None;
    }

    fn push_json_line(&mut self, fragment: &str, events: &mut Vec<ExtractedEvent>) {
        if self.accumulator.is_empty() {
            // Free text between records can never start a JSON object
            if !fragment.starts_with('{') && !fragment.starts_with('[') {
                trace!(target: "chipcheck::extractor", "Skipping non-JSON line: {}", fragment);
                return;
            }
            self.accumulator_timestamp = self.current_timestamp;
        }

        self.accumulator.push_str(fragment);

        if !(fragment.ends_with('}') || fragment.ends_with("},")) {
            return;
        }

        match attempt_parse(&self.accumulator) {
            ParseAttempt::Complete(value) => self.emit(value, events),
            ParseAttempt::Incomplete => {}
            ParseAttempt::Invalid => {
                debug!(
                    target: "chipcheck::extractor",
                    "Dropping malformed record ({} bytes)",
                    self.accumulator.len()
                );
                self.accumulator.clear();
            }
        }
    }

    fn flush(&mut self, events: &mut Vec<ExtractedEvent>) {
        if self.accumulator.is_empty() {
            return;
        }

        match attempt_parse(&self.accumulator) {
            ParseAttempt::Complete(value) => self.emit(value, events),
            ParseAttempt::Incomplete | ParseAttempt::Invalid => {
                debug!(
                    target: "chipcheck::extractor",
                    "Dropping unterminated record at boundary ({} bytes)",
                    self.accumulator.len()
                );
                self.accumulator.clear();
            }
        }
    }

    fn emit(&mut self, value: Value, events: &mut Vec<ExtractedEvent>) {
        self.accumulator.clear();
        if value.is_object() {
            events.push(ExtractedEvent {
                payload: value,
                logged_at: self.accumulator_timestamp,
            });
        } else {
            trace!(target: "chipcheck::extractor", "Ignoring non-object record");
        }
    }
}

/// Whether a trimmed line starts a new record.
pub fn is_record_boundary(line: &str) -> bool {
    matches!(classify_line(line), LogLine::Boundary { .. })
}

fn classify_line(line: &str) -> LogLine<'_> {
    let mut timestamp = None;
    let mut rest = line;
    let mut is_boundary = false;

    if line.starts_with('[') {
        if let Some(close) = line.find(']') {
            timestamp = DateTime::parse_from_rfc3339(line[1..close].trim())
                .ok()
                .map(|ts| ts.with_timezone(&Utc));
            rest = line[close + 1..].trim_start();
            is_boundary = true;
        }
    }

    if let Some(label) = RECORD_LABELS.iter().find(|label| rest.starts_with(**label)) {
        rest = rest[label.len()..].trim_start();
        is_boundary = true;
    }

    if is_boundary {
        LogLine::Boundary { timestamp, rest }
    } else {
        LogLine::Json(line)
    }
}

fn attempt_parse(text: &str) -> ParseAttempt {
    let candidate = text.strip_suffix(',').unwrap_or(text);
    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => ParseAttempt::Complete(value),
        Err(e) if e.is_eof() => ParseAttempt::Incomplete,
        Err(_) => ParseAttempt::Invalid,
    }
}
