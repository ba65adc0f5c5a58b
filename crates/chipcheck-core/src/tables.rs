//! Markdown table detection in streamed assistant text.

use chipcheck_types::ParsedTable;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Header row, separator row, then one or more data rows.
static TABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?m)^\|[^\n]+\|[ \t]*\n",                // header
        r"\|(?:[ \t]*:?-+:?[ \t]*\|)+[ \t]*\n",    // separator
        r"(?:\|[^\n]+\|[ \t]*(?:\n|$))+",          // rows
    ))
    .unwrap()
});

/// Tracks which table matches have already been examined.
///
/// The full text is rescanned after every append; only matches beyond the
/// examined count are parsed, so a table is never emitted twice. A table
/// still streaming in may be captured before its last rows arrive.
#[derive(Debug, Default)]
pub struct TableDetector {
    examined: usize,
}

impl TableDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `text` after `delta` was appended to it and return new tables.
    pub fn scan(&mut self, text: &str, delta: &str) -> Vec<ParsedTable> {
        // Without a pipe or newline the append cannot complete a new match
        if !delta.contains('|') && !delta.contains('\n') {
            return Vec::new();
        }

        let matches: Vec<&str> = TABLE_REGEX.find_iter(text).map(|m| m.as_str()).collect();
        if matches.len() <= self.examined {
            return Vec::new();
        }

        let tables = matches[self.examined..]
            .iter()
            .filter_map(|raw| {
                let table = parse_markdown_table(raw);
                if table.is_none() {
                    debug!(target: "chipcheck::tables", "Discarding malformed table candidate");
                }
                table
            })
            .collect();
        self.examined = matches.len();
        tables
    }

    pub fn reset(&mut self) {
        self.examined = 0;
    }
}

/// Parse a markdown table block.
///
/// Returns None when fewer than three non-empty lines are present.
pub fn parse_markdown_table(raw: &str) -> Option<ParsedTable> {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() < 3 {
        return None;
    }

    let headers = split_cells(lines[0]);
    let rows: Vec<Vec<String>> = lines[2..].iter().map(|line| split_cells(line)).collect();

    Some(ParsedTable {
        row_count: rows.len(),
        column_count: headers.len(),
        headers,
        rows,
        raw_text: raw.to_string(),
    })
}

fn split_cells(line: &str) -> Vec<String> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_table() {
        let table = parse_markdown_table("| A | B |\n|---|---|\n| 1 | 2 |\n").unwrap();
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.rows, vec![vec!["1", "2"]]);
        assert_eq!(table.row_count, 1);
        assert_eq!(table.column_count, 2);
    }

    #[test]
    fn test_parse_keeps_inner_empty_cells() {
        let table = parse_markdown_table("| Part | Note |\n|---|---|\n| 4N35 |  |").unwrap();
        assert_eq!(table.rows, vec![vec!["4N35", ""]]);
    }

    #[test]
    fn test_parse_rejects_short_block() {
        assert!(parse_markdown_table("| A | B |\n|---|---|\n").is_none());
    }

    #[test]
    fn test_detect_table_in_text() {
        let mut detector = TableDetector::new();
        let text = "Results:\n\n| A | B |\n|---|---|\n| 1 | 2 |\n\nDone.";
        let tables = detector.scan(text, text);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].raw_text, "| A | B |\n|---|---|\n| 1 | 2 |\n");
    }

    #[test]
    fn test_rescan_does_not_duplicate() {
        let mut detector = TableDetector::new();
        let text = "| A | B |\n|---|---|\n| 1 | 2 |\n";
        assert_eq!(detector.scan(text, text).len(), 1);
        assert!(detector.scan(text, "\n").is_empty());
        assert!(detector.scan(text, "|").is_empty());
    }

    #[test]
    fn test_second_table_detected() {
        let mut detector = TableDetector::new();
        let first = "| A | B |\n|---|---|\n| 1 | 2 |\n";
        assert_eq!(detector.scan(first, first).len(), 1);

        let both = format!("{}\n| Pin | Function |\n|:---|---:|\n| 1 | Anode |\n| 2 | Cathode |\n", first);
        let tables = detector.scan(&both, "| 2 | Cathode |\n");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, vec!["Pin", "Function"]);
        assert_eq!(tables[0].row_count, 2);
    }

    #[test]
    fn test_streaming_table_captured_early() {
        let mut detector = TableDetector::new();
        let partial = "| A | B |\n|---|---|\n| 1 | 2 |";
        let tables = detector.scan(partial, "|");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].row_count, 1);

        // Later rows extend the same match and are not re-emitted
        let full = "| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n";
        assert!(detector.scan(full, "| 3 | 4 |\n").is_empty());
    }

    #[test]
    fn test_delta_without_structure_skips_scan() {
        let mut detector = TableDetector::new();
        let text = "| A | B |\n|---|---|\n| 1 | 2 |\nabc";
        assert!(detector.scan(text, "abc").is_empty());
        assert_eq!(detector.scan(text, "\n").len(), 1);
    }
}
