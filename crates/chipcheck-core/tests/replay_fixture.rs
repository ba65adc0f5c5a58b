//! End-to-end replay of a recorded verification session.

#[path = "../../../tests/common/mod.rs"]
mod common;

use chipcheck_core::{parse_complete_log, replay_file, ReducerConfig, StreamReducer};
use chipcheck_types::{EventKind, ToolInput, VerdictLabel};
use common::{load_log_fixture, log_fixture_path};
use serde_json::json;
use std::io::Write;

#[test]
fn test_websearch_session_state() {
    let log = load_log_fixture("websearch_session");
    let outcome = parse_complete_log(&log);
    let state = &outcome.state.state;

    assert!(state.is_complete);
    assert_eq!(state.metadata.session_id.as_deref(), Some("sess-4n35-0115"));
    assert_eq!(state.metadata.message_id.as_deref(), Some("msg_01A"));
    assert_eq!(state.metadata.model.as_deref(), Some("claude-sonnet-4-5"));
    assert_eq!(
        state.metadata.start_time.unwrap().to_rfc3339(),
        "2025-01-15T10:30:00+00:00"
    );

    assert_eq!(
        state.thinking,
        "The marking reads 4N35 with a Vishay logo. \
         I should compare the date code format against the datasheet."
    );
    assert!(state.assistant_text.starts_with("## Marking Comparison\n\n| Feature |"));

    assert_eq!(state.usage.input_tokens, 1820);
    assert_eq!(state.usage.output_tokens, 412);
    assert_eq!(state.usage.total_tokens, 2232);
    assert_eq!(state.usage.cache_read_tokens, 1024);
}

#[test]
fn test_websearch_session_tools() {
    let outcome = parse_complete_log(&load_log_fixture("websearch_session"));
    let state = &outcome.state.state;

    assert_eq!(state.tool_uses.len(), 2);
    assert_eq!(state.tool_uses[0].name, "WebSearch");
    assert_eq!(
        state.tool_uses[0].input,
        Some(ToolInput::Parsed(json!({"query": "Vishay 4N35 top marking date code"})))
    );
    assert_eq!(state.tool_uses[1].name, "WebFetch");
    assert_eq!(
        state.tool_uses[1].input_field("url"),
        Some("https://www.vishay.com/docs/83725/4n25.pdf")
    );
    assert_eq!(state.tool_commands.len(), 4);

    assert_eq!(
        state.tool_activity,
        vec![
            "🔧 Starting WebSearch...",
            "  → Search: Vishay 4N35 top marking date code",
            "✅ WebSearch completed",
            "🔧 Starting WebFetch...",
            "  → URL: https://www.vishay.com/docs/83725/4n25.pdf",
            "  → Prompt: Describe the package marking format",
            "✅ WebFetch completed",
        ]
    );
}

#[test]
fn test_websearch_session_events_and_tables() {
    let outcome = parse_complete_log(&load_log_fixture("websearch_session"));
    let state = &outcome.state.state;

    let count = |kind: EventKind| {
        state
            .chronological_events
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    };
    assert_eq!(count(EventKind::Thinking), 2);
    assert_eq!(count(EventKind::ToolUse), 2);
    assert_eq!(count(EventKind::ToolCommand), 4);
    assert_eq!(count(EventKind::ToolComplete), 2);
    assert_eq!(count(EventKind::Text), 9);
    assert_eq!(outcome.state.stats.event_count, 19);

    let timestamps: Vec<_> = state.chronological_events.iter().map(|e| e.timestamp).collect();
    assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));

    assert_eq!(state.tables.len(), 1);
    let table = &state.tables[0];
    assert_eq!(table.headers, vec!["Feature", "Observed", "Reference"]);
    assert_eq!(
        table.rows,
        vec![
            vec!["Logo", "Vishay V", "Vishay V"],
            vec!["Date code", "2F3", "YWW"]
        ]
    );
}

#[test]
fn test_websearch_session_verdict() {
    let outcome = parse_complete_log(&load_log_fixture("websearch_session"));
    let verdict = outcome.state.state.verdict.as_ref().unwrap();

    assert_eq!(verdict.is_authentic, Some(VerdictLabel::Counterfeit));
    assert_eq!(
        verdict.reason,
        "The date code format does not match the manufacturer's YWW scheme."
    );
    assert_eq!(
        verdict.citations,
        vec!["https://www.vishay.com/docs/83725/4n25.pdf"]
    );
}

#[test]
fn test_formatted_output_sections() {
    let outcome = parse_complete_log(&load_log_fixture("websearch_session"));
    let output = &outcome.formatted_output;

    let text_at = output.find("## Marking Comparison").unwrap();
    let log_at = output.find("## Tool Activity Log").unwrap();
    let summary_at = output.find("## Tools Summary").unwrap();
    assert!(text_at < log_at && log_at < summary_at);
    assert!(output.contains("1. **WebSearch**\n   query: Vishay 4N35 top marking date code"));
    assert!(output.contains("2. **WebFetch**\n   url: https://www.vishay.com/docs/83725/4n25.pdf"));
}

#[test]
fn test_replay_file_matches_in_memory_replay() {
    let outcome = replay_file(log_fixture_path("websearch_session"), ReducerConfig::default())
        .unwrap();
    let expected = parse_complete_log(&load_log_fixture("websearch_session"));
    assert_eq!(outcome.state, expected.state);
    assert_eq!(outcome.formatted_output, expected.formatted_output);
}

#[test]
fn test_replay_file_processes_unterminated_last_line() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "[2025-01-15T10:30:00Z] stream_event:\n{{\"type\":\"message_stop\"}}"
    )
    .unwrap();

    let outcome = replay_file(file.path(), ReducerConfig::default()).unwrap();
    assert!(outcome.state.state.is_complete);

    // Streaming the same bytes leaves the last line pending
    let mut reducer = StreamReducer::new();
    reducer.replay("[2025-01-15T10:30:00Z] stream_event:\n{\"type\":\"message_stop\"}");
    assert!(!reducer.state().is_complete);
}

#[test]
fn test_replay_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let result = replay_file(dir.path().join("missing.log"), ReducerConfig::default());
    assert!(matches!(result, Err(chipcheck_core::StreamError::IoError(_))));
}

#[test]
fn test_custom_search_tools_change_narration() {
    let config = ReducerConfig {
        search_tools: vec!["WebFetch".to_string()],
        ..ReducerConfig::default()
    };
    let outcome = replay_file(log_fixture_path("websearch_session"), config).unwrap();
    assert!(outcome
        .state
        .state
        .tool_activity
        .contains(&"  → Query: Vishay 4N35 top marking date code".to_string()));
}
