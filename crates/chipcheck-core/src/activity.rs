//! Human-readable narration of tool activity.
//!
//! Field sniffing runs regexes over tool input that is usually still
//! incomplete JSON. It is lossy and only feeds the narration log; the tool's
//! recorded input always comes from the parse on block close.

use once_cell::sync::Lazy;
use regex::Regex;

/// Input keys narrated while a tool's parameters stream in.
pub const NARRATED_FIELDS: &[&str] = &["query", "url", "prompt"];

static FIELD_REGEXES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    NARRATED_FIELDS
        .iter()
        .map(|key| {
            let pattern = format!(r#""{}"\s*:\s*"((?:[^"\\]|\\.)*)""#, key);
            (*key, Regex::new(&pattern).unwrap())
        })
        .collect()
});

/// Fields whose string value is already closed in `partial_input`.
pub fn sniff_fields(partial_input: &str) -> Vec<(&'static str, String)> {
    FIELD_REGEXES
        .iter()
        .filter_map(|(key, regex)| {
            regex
                .captures(partial_input)
                .and_then(|caps| caps.get(1))
                .map(|m| (*key, m.as_str().to_string()))
        })
        .collect()
}

pub fn start_line(name: &str) -> String {
    format!("🔧 Starting {}...", name)
}

pub fn field_line(key: &str, value: &str, is_search: bool, max_chars: usize) -> String {
    let label = match key {
        "query" if is_search => "Search",
        "query" => "Query",
        "url" => "URL",
        "prompt" => "Prompt",
        other => other,
    };
    format!("  → {}: {}", label, truncate_chars(value, max_chars))
}

pub fn complete_line(name: &str) -> String {
    format!("✅ {} completed", name)
}

/// Truncate to `max_chars` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_incomplete_value_ignored() {
        assert!(sniff_fields(r#"{"query":"4N35 data"#).is_empty());
    }

    #[test]
    fn test_sniff_closed_value() {
        let fields = sniff_fields(r#"{"query":"4N35 datasheet","#);
        assert_eq!(fields, vec![("query", "4N35 datasheet".to_string())]);
    }

    #[test]
    fn test_sniff_multiple_fields() {
        let fields = sniff_fields(r#"{"url": "https://example.com/ds.pdf", "prompt": "Find the pinout"}"#);
        assert_eq!(
            fields,
            vec![
                ("url", "https://example.com/ds.pdf".to_string()),
                ("prompt", "Find the pinout".to_string())
            ]
        );
    }

    #[test]
    fn test_field_line_wording() {
        assert_eq!(field_line("query", "4N35", true, 200), "  → Search: 4N35");
        assert_eq!(field_line("query", "4N35", false, 200), "  → Query: 4N35");
        assert_eq!(field_line("url", "https://x", false, 200), "  → URL: https://x");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghij", 8), "abcde...");
        // Multi-byte characters are never split
        assert_eq!(truncate_chars("ééééé", 4), "é...");
    }
}
