//! Unescaping of text pulled out of delta events.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static SURROGATE_PAIR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\\u(d[89ab][0-9a-f]{2})\\u(d[c-f][0-9a-f]{2})").unwrap()
});

static UNICODE_ESCAPE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").unwrap());

/// Decode escape sequences left in delta text.
///
/// Replacements run in a fixed order: `\n`, `\"`, `\t`, `\r`, `\/`, `\\`,
/// then `\uXXXX` (surrogate pairs first, then single units). Each pass
/// covers the whole string, so the backslash pass never sees control
/// characters produced by the earlier passes.
pub fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let text = raw
        .replace("\\n", "\n")
        .replace("\\\"", "\"")
        .replace("\\t", "\t")
        .replace("\\r", "\r")
        .replace("\\/", "/")
        .replace("\\\\", "\\");

    let text = SURROGATE_PAIR_REGEX.replace_all(&text, |caps: &Captures| {
        let units = [&caps[1], &caps[2]].map(|hex| u16::from_str_radix(hex, 16).unwrap_or(0));
        char::decode_utf16(units)
            .collect::<Result<String, _>>()
            .unwrap_or_else(|_| caps[0].to_string())
    });

    UNICODE_ESCAPE_REGEX
        .replace_all(&text, |caps: &Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
