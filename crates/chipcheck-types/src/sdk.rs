//! Agent SDK streaming event types.
//!
//! The event vocabulary is owned by the upstream SDK and changes between
//! versions, so every enum here carries a catch-all variant and unknown
//! fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single streaming event from the agent SDK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SdkEvent {
    /// A new assistant message began.
    MessageStart { message: MessageStart },
    /// A content block (text, thinking, tool use) opened.
    ContentBlockStart {
        #[serde(default)]
        index: Option<u64>,
        content_block: ContentBlock,
    },
    /// Incremental content for the open block.
    ContentBlockDelta {
        #[serde(default)]
        index: Option<u64>,
        delta: Delta,
    },
    /// The open content block closed.
    ContentBlockStop {
        #[serde(default)]
        index: Option<u64>,
    },
    /// Message-level update, usually carrying usage.
    MessageDelta {
        #[serde(default)]
        usage: Option<WireUsage>,
    },
    /// The message finished.
    MessageStop,
    /// Any event type this crate does not know about.
    #[serde(other)]
    Unrecognized,
}

impl SdkEvent {
    /// Classify a raw JSON record.
    ///
    /// Agent SDK `stream_event` envelopes are unwrapped. Records that fail to
    /// match a known shape become [`SdkEvent::Unrecognized`].
    pub fn classify(value: &Value) -> Self {
        if value.get("type").and_then(Value::as_str) == Some("stream_event") {
            if let Some(inner) = value.get("event") {
                return Self::classify(inner);
            }
        }

        Self::deserialize(value).unwrap_or(SdkEvent::Unrecognized)
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SdkEvent::MessageStart { .. } => "message_start",
            SdkEvent::ContentBlockStart { .. } => "content_block_start",
            SdkEvent::ContentBlockDelta { .. } => "content_block_delta",
            SdkEvent::ContentBlockStop { .. } => "content_block_stop",
            SdkEvent::MessageDelta { .. } => "message_delta",
            SdkEvent::MessageStop => "message_stop",
            SdkEvent::Unrecognized => "unrecognized",
        }
    }
}

/// The `message` object of a `message_start` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageStart {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

/// Content block descriptor in `content_block_start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    #[serde(other)]
    Other,
}

/// Delta payload in `content_block_delta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Delta {
    TextDelta { text: String },
    ThinkingDelta { thinking: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

/// Token counts as sent on the wire. Absent fields mean "unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireUsage {
    #[serde(default)]
    pub input_tokens: Option<u64>,
    #[serde(default)]
    pub output_tokens: Option<u64>,
    #[serde(default)]
    pub cache_read_input_tokens: Option<u64>,
}

/// Session identity carried by any record with a `session_id` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: String,
    pub model: Option<String>,
}

impl SessionInfo {
    pub fn from_value(value: &Value) -> Option<Self> {
        let session_id = value.get("session_id").and_then(Value::as_str)?;
        Some(Self {
            session_id: session_id.to_string(),
            model: value
                .get("model")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_text_delta() {
        let value = json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "text_delta", "text": "Hello"}
        });

        match SdkEvent::classify(&value) {
            SdkEvent::ContentBlockDelta {
                delta: Delta::TextDelta { text },
                index,
            } => {
                assert_eq!(text, "Hello");
                assert_eq!(index, Some(0));
            }
            other => panic!("Expected text delta, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_tool_use_start() {
        let value = json!({
            "type": "content_block_start",
            "index": 1,
            "content_block": {"type": "tool_use", "id": "t1", "name": "WebSearch", "input": {}}
        });

        match SdkEvent::classify(&value) {
            SdkEvent::ContentBlockStart {
                content_block: ContentBlock::ToolUse { id, name, .. },
                ..
            } => {
                assert_eq!(id, "t1");
                assert_eq!(name, "WebSearch");
            }
            other => panic!("Expected tool_use start, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_unwraps_stream_event_envelope() {
        let value = json!({
            "type": "stream_event",
            "session_id": "abc",
            "event": {"type": "message_stop"}
        });
        assert_eq!(SdkEvent::classify(&value), SdkEvent::MessageStop);
    }

    #[test]
    fn test_classify_unknown_type() {
        let value = json!({"type": "ping"});
        assert_eq!(SdkEvent::classify(&value), SdkEvent::Unrecognized);
    }

    #[test]
    fn test_classify_known_type_with_bad_shape() {
        // content_block_delta without a delta object is not an error
        let value = json!({"type": "content_block_delta", "index": 0});
        assert_eq!(SdkEvent::classify(&value), SdkEvent::Unrecognized);
    }

    #[test]
    fn test_classify_unknown_delta_type() {
        let value = json!({
            "type": "content_block_delta",
            "delta": {"type": "signature_delta", "signature": "xyz"}
        });
        assert_eq!(
            SdkEvent::classify(&value),
            SdkEvent::ContentBlockDelta {
                index: None,
                delta: Delta::Other
            }
        );
    }

    #[test]
    fn test_message_start_usage() {
        let value = json!({
            "type": "message_start",
            "message": {
                "id": "msg_1",
                "model": "claude-sonnet",
                "usage": {"input_tokens": 10, "output_tokens": 0}
            }
        });

        match SdkEvent::classify(&value) {
            SdkEvent::MessageStart { message } => {
                assert_eq!(message.id.as_deref(), Some("msg_1"));
                let usage = message.usage.unwrap();
                assert_eq!(usage.input_tokens, Some(10));
                assert_eq!(usage.cache_read_input_tokens, None);
            }
            other => panic!("Expected message_start, got {:?}", other),
        }
    }

    #[test]
    fn test_session_info() {
        let value = json!({"type": "system", "session_id": "s-1", "model": "claude-opus"});
        let info = SessionInfo::from_value(&value).unwrap();
        assert_eq!(info.session_id, "s-1");
        assert_eq!(info.model.as_deref(), Some("claude-opus"));

        assert!(SessionInfo::from_value(&json!({"type": "message_stop"})).is_none());
    }
}
