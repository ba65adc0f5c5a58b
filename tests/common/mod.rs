//! Common test utilities for integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

/// Path of a log fixture in the workspace fixtures directory.
pub fn log_fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("tests")
        .join("fixtures")
        .join("logs")
        .join(format!("{}.log", name))
}

/// Load a log fixture as text.
pub fn load_log_fixture(name: &str) -> String {
    let fixture_path = log_fixture_path(name);
    std::fs::read_to_string(&fixture_path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", fixture_path.display(), e))
}

/// Split `text` into chunks at the given byte offsets, snapped to char boundaries.
pub fn split_at_offsets<'a>(text: &'a str, offsets: &[usize]) -> Vec<&'a str> {
    let mut cuts: Vec<usize> = offsets
        .iter()
        .map(|&offset| {
            let mut cut = offset.min(text.len());
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            cut
        })
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for cut in cuts {
        if cut > start {
            chunks.push(&text[start..cut]);
            start = cut;
        }
    }
    chunks.push(&text[start..]);
    chunks
}

/// Render SDK events in the logged format, one timestamped record each.
pub fn render_log(events: &[serde_json::Value]) -> String {
    events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            format!(
                "[2025-01-15T10:30:{:02}.000Z] stream_event:\n{}\n",
                i % 60,
                serde_json::to_string_pretty(event).unwrap()
            )
        })
        .collect()
}
