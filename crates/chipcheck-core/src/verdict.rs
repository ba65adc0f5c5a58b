//! Verdict extraction from the finished agent output.
//!
//! The agent is prompted to end with a block like:
//!
//! ```text
//! **Verdict:** Counterfeit
//! **Reason:** Top marking font does not match the manufacturer sample.
//! **Citations:**
//! - https://www.vishay.com/docs/83725/4n25.pdf
//! ```
//!
//! Anything that does not contain a verdict line yields `None`; callers fall
//! back to rendering the raw text.

use chipcheck_types::{StreamState, VerdictData, VerdictLabel};
use once_cell::sync::Lazy;
use regex::Regex;

static VERDICT_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t>#*_-]*verdict[ \t*_]*:[ \t*_]*(.*?)[ \t*_]*$").unwrap()
});

static CITATIONS_HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t>#*_-]*(?:citations?|sources|references)[ \t*_]*:[ \t*_]*").unwrap()
});

static REASON_LABEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[ \t>#*_-]*reason[ \t*_]*:[ \t*_]*").unwrap());

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s)\]>"'<]+"#).unwrap());

/// Prefix words accepted for each label, longest first.
const LABEL_PREFIXES: &[(&str, VerdictLabel)] = &[
    ("review required", VerdictLabel::ReviewRequired),
    ("counterfeit", VerdictLabel::Counterfeit),
    ("indeterminate", VerdictLabel::Indeterminate),
    ("authentic", VerdictLabel::Authentic),
];

/// Derive a verdict from the accumulated text, falling back to thinking.
pub fn derive_verdict(state: &StreamState) -> Option<VerdictData> {
    extract_verdict(&state.assistant_text).or_else(|| extract_verdict(&state.thinking))
}

/// Extract the last verdict block in `text`.
pub fn extract_verdict(text: &str) -> Option<VerdictData> {
    let caps = VERDICT_LINE_REGEX.captures_iter(text).last()?;
    let line = caps.get(0)?;
    let label_text = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let body = &text[line.end()..];

    let (reason_part, citations_part) = match CITATIONS_HEADER_REGEX.find(body) {
        Some(header) => (&body[..header.start()], Some(&body[header.end()..])),
        None => (body, None),
    };

    Some(VerdictData {
        is_authentic: match_label(label_text),
        reason: extract_reason(reason_part),
        citations: citations_part.map(extract_citations).unwrap_or_default(),
    })
}

fn match_label(text: &str) -> Option<VerdictLabel> {
    if let Some(label) = VerdictLabel::from_label(text) {
        return Some(label);
    }

    let lower = text
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    LABEL_PREFIXES
        .iter()
        .find(|(prefix, _)| lower.starts_with(prefix))
        .map(|(_, label)| *label)
}

fn extract_reason(section: &str) -> String {
    let mut lines = Vec::new();
    for line in section.lines() {
        let trimmed = line.trim();
        // A heading ends the verdict block
        if trimmed.starts_with('#') && !lines.is_empty() {
            break;
        }
        lines.push(trimmed);
    }

    let joined = lines.join("\n");
    REASON_LABEL_REGEX
        .replace(joined.trim(), "")
        .trim()
        .to_string()
}

fn extract_citations(section: &str) -> Vec<String> {
    let mut citations: Vec<String> = Vec::new();

    for line in section.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let is_bullet = trimmed.starts_with(['-', '*', '•'])
            || trimmed.chars().next().is_some_and(|c| c.is_ascii_digit());
        let urls: Vec<&str> = URL_REGEX.find_iter(trimmed).map(|m| m.as_str()).collect();
        if !is_bullet && urls.is_empty() {
            break;
        }

        for url in urls {
            let url = url.trim_end_matches(['.', ',', ';', ':']);
            if !citations.iter().any(|existing| existing == url) {
                citations.push(url.to_string());
            }
        }
    }

    citations
}
