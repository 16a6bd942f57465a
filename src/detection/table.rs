//! Markdown pipe-table detection
//!
//! Recognizes GFM-style tables (header row, separator row, data rows) and
//! proposes them as `livellm:table` components.

use super::detector::{DetectionMatch, Detector};
use super::lines::{split_lines, Line};
use crate::error::DetectorError;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Separator cell: dashes with optional alignment colons.
static SEPARATOR_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:?-+:?$").expect("Invalid separator regex"));

const BASE_CONFIDENCE: f32 = 0.6;
const PER_ROW_BONUS: f32 = 0.05;
const MAX_ROW_BONUS: f32 = 0.3;
const CONSISTENT_BONUS: f32 = 0.1;
const RAGGED_PENALTY: f32 = 0.2;

/// Detects Markdown pipe tables
#[derive(Debug, Default, Clone, Copy)]
pub struct TableDetector;

impl TableDetector {
    /// Create a new table detector
    pub fn new() -> Self {
        Self
    }

    fn is_row(line: &Line<'_>) -> bool {
        !line.is_blank() && line.text.contains('|')
    }

    fn is_separator(line: &Line<'_>) -> bool {
        if !Self::is_row(line) {
            return false;
        }
        let cells = split_cells(line.text);
        !cells.is_empty() && cells.iter().all(|c| SEPARATOR_CELL.is_match(c))
    }

    fn table_at(lines: &[Line<'_>], i: usize) -> Option<(usize, DetectionMatch)> {
        let header = lines.get(i)?;
        let separator = lines.get(i + 1)?;
        if !Self::is_row(header) || !Self::is_separator(separator) {
            return None;
        }

        let columns = split_cells(header.text);
        if columns.len() != split_cells(separator.text).len() {
            return None;
        }

        let mut last = i + 1;
        let mut rows = Vec::new();
        let mut consistent = true;
        while let Some(line) = lines.get(last + 1) {
            if !Self::is_row(line) || Self::is_separator(line) {
                break;
            }
            let mut cells = split_cells(line.text);
            if cells.len() != columns.len() {
                consistent = false;
                cells.resize(columns.len(), String::new());
            }
            rows.push(cells);
            last += 1;
        }

        if rows.is_empty() {
            return None;
        }

        let row_bonus = (PER_ROW_BONUS * rows.len() as f32).min(MAX_ROW_BONUS);
        let shape = if consistent {
            CONSISTENT_BONUS
        } else {
            -RAGGED_PENALTY
        };
        let confidence = (BASE_CONFIDENCE + row_bonus + shape).clamp(0.0, 1.0);

        let data = json!({
            "columns": columns,
            "rows": rows,
        });

        Some((
            last,
            DetectionMatch::new(header.start, lines[last].end, confidence, data),
        ))
    }
}

impl Detector for TableDetector {
    fn name(&self) -> &str {
        "table"
    }

    fn detect(&self, text: &str) -> Result<Vec<DetectionMatch>, DetectorError> {
        let lines = split_lines(text);
        let mut matches = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if let Some((last, m)) = Self::table_at(&lines, i) {
                matches.push(m);
                i = last + 1;
            } else {
                i += 1;
            }
        }

        Ok(matches)
    }
}

/// Split a table row into trimmed cells, honoring `\|` escapes
fn split_cells(row: &str) -> Vec<String> {
    let mut body = row.trim();
    if let Some(rest) = body.strip_prefix('|') {
        body = rest;
    }
    if body.ends_with('|') && !body.ends_with("\\|") {
        body = &body[..body.len() - 1];
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn columns(data: &Value) -> Vec<&str> {
        data["columns"]
            .as_array()
            .map(|cols| cols.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_whole_table_single_match() {
        let text = "| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n| 5 | 6 |";
        let matches = TableDetector::new().detect(text).unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].start, 0);
        assert_eq!(matches[0].end, text.len());
        assert!(matches[0].confidence >= 0.7);
        assert_eq!(columns(&matches[0].data), vec!["A", "B"]);
        assert_eq!(matches[0].data["rows"][2], json!(["5", "6"]));
    }

    #[test]
    fn test_table_inside_prose() {
        let text = "Here:\n\n| Name | Age |\n| :--- | --: |\n| Ann | 31 |\n\nThanks";
        let matches = TableDetector::new().detect(text).unwrap();

        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(&text[m.start..m.end], "| Name | Age |\n| :--- | --: |\n| Ann | 31 |");
    }

    #[test]
    fn test_ragged_rows_lower_confidence() {
        let even = "| A | B |\n|---|---|\n| 1 | 2 |";
        let ragged = "| A | B |\n|---|---|\n| 1 |";
        let d = TableDetector::new();
        let even_conf = d.detect(even).unwrap()[0].confidence;
        let ragged_m = d.detect(ragged).unwrap().remove(0);

        assert!(ragged_m.confidence < even_conf);
        assert_eq!(ragged_m.data["rows"][0], json!(["1", ""]));
    }

    #[test]
    fn test_header_without_rows_is_ignored() {
        let text = "| A | B |\n|---|---|";
        assert!(TableDetector::new().detect(text).unwrap().is_empty());
    }

    #[test]
    fn test_no_separator_no_table() {
        let text = "a | b\nc | d";
        assert!(TableDetector::new().detect(text).unwrap().is_empty());
    }

    #[test]
    fn test_escaped_pipe_stays_in_cell() {
        assert_eq!(split_cells(r"| a \| b | c |"), vec!["a | b", "c"]);
    }
}
