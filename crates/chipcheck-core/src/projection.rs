//! Plain-text rendering of a stream for display and debugging.

use crate::activity::{truncate_chars, NARRATED_FIELDS};
use crate::config::ReducerConfig;
use chipcheck_types::{StreamState, ToolInput};
use std::fmt::Write;

/// Render assistant text, the activity log and a tools summary.
///
/// Sections with nothing to show are omitted.
pub fn format_output(state: &StreamState, config: &ReducerConfig) -> String {
    let mut out = String::new();

    if !state.assistant_text.is_empty() {
        out.push_str(&state.assistant_text);
    }

    if !state.tool_activity.is_empty() {
        push_section_break(&mut out);
        out.push_str("## Tool Activity Log\n\n");
        for line in &state.tool_activity {
            out.push_str(line);
            out.push('\n');
        }
    }

    if !state.tool_uses.is_empty() {
        push_section_break(&mut out);
        out.push_str("## Tools Summary\n\n");
        for (i, tool) in state.tool_uses.iter().enumerate() {
            let _ = writeln!(out, "{}. **{}**", i + 1, tool.name);
            match &tool.input {
                None => out.push_str("   (in progress)\n"),
                Some(ToolInput::Raw(raw)) => {
                    let _ = writeln!(
                        out,
                        "   Raw input: {}",
                        truncate_chars(raw, config.summary_field_chars)
                    );
                }
                Some(ToolInput::Parsed(_)) => {
                    for key in NARRATED_FIELDS {
                        if let Some(value) = tool.input_field(key) {
                            let _ = writeln!(
                                out,
                                "   {}: {}",
                                key,
                                truncate_chars(value, config.summary_field_chars)
                            );
                        }
                    }
                }
            }
        }
    }

    out
}

fn push_section_break(out: &mut String) {
    if out.is_empty() {
        return;
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
}
