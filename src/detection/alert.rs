//! Callout detection
//!
//! Two shapes are recognized:
//! - GitHub admonitions: `> [!WARNING]` followed by quoted lines
//! - Keyword paragraphs: `Note: ...`, `**Warning:** ...`, `> Tip: ...`

use super::detector::{DetectionMatch, Detector};
use super::keywords::KeywordSet;
use super::lines::{split_lines, Line};
use crate::error::DetectorError;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

static ADMONITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*>\s*\[!(note|tip|important|warning|caution)\]\s*$")
        .expect("Invalid admonition regex")
});

static KEYWORD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(>\s*)?(\*\*|__)?(note|tip|info|warning|caution|important|danger|error)(\*\*|__)?\s*:\s*(?:\*\*|__)?\s*(\S.*)$",
    )
    .expect("Invalid alert keyword regex")
});

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*>\s?(.*)$").expect("Invalid quote regex"));

const ADMONITION_CONFIDENCE: f32 = 0.95;
const BOLD_CONFIDENCE: f32 = 0.85;
const PLAIN_CONFIDENCE: f32 = 0.72;
const URGENCY_BONUS: f32 = 0.03;

/// Detects notes, tips and warnings
#[derive(Debug, Clone)]
pub struct AlertDetector {
    urgency: KeywordSet,
}

impl AlertDetector {
    /// Create a new alert detector
    pub fn new() -> Self {
        Self {
            urgency: KeywordSet::new(&[
                "must",
                "never",
                "do not",
                "don't",
                "careful",
                "immediately",
                "critical",
            ]),
        }
    }

    fn admonition_at(&self, lines: &[Line<'_>], i: usize) -> Option<(usize, DetectionMatch)> {
        let caps = ADMONITION.captures(lines[i].text)?;
        let keyword = caps.get(1)?.as_str().to_ascii_lowercase();

        let mut last = i;
        let mut body = Vec::new();
        while let Some(line) = lines.get(last + 1) {
            let Some(quoted) = QUOTED.captures(line.text) else {
                break;
            };
            body.push(quoted.get(1).map_or("", |m| m.as_str()).trim());
            last += 1;
        }

        let text = join_paragraph(&body);
        if text.is_empty() {
            return None;
        }

        let confidence = self.score(ADMONITION_CONFIDENCE, &text);
        Some((last, self.build(lines[i].start, lines[last].end, &keyword, text, confidence)))
    }

    fn keyword_at(&self, lines: &[Line<'_>], i: usize) -> Option<(usize, DetectionMatch)> {
        let caps = KEYWORD_LINE.captures(lines[i].text)?;
        let quoted = caps.get(1).is_some();
        let bold = caps.get(2).is_some() || caps.get(4).is_some();
        let keyword = caps.get(3)?.as_str().to_ascii_lowercase();

        let mut body = vec![caps.get(5)?.as_str().trim()];
        let mut last = i;
        while let Some(line) = lines.get(last + 1) {
            if line.is_blank() || starts_block(line.text) || KEYWORD_LINE.is_match(line.text) {
                break;
            }
            let text = if quoted {
                match QUOTED.captures(line.text).and_then(|c| c.get(1)) {
                    Some(m) => m.as_str().trim(),
                    None => break,
                }
            } else {
                line.text.trim()
            };
            body.push(text);
            last += 1;
        }

        let text = join_paragraph(&body);
        let base = if bold { BOLD_CONFIDENCE } else { PLAIN_CONFIDENCE };
        let confidence = self.score(base, &text);
        Some((last, self.build(lines[i].start, lines[last].end, &keyword, text, confidence)))
    }

    fn score(&self, base: f32, text: &str) -> f32 {
        if self.urgency.contains_any(text) {
            (base + URGENCY_BONUS).min(1.0)
        } else {
            base
        }
    }

    fn build(
        &self,
        start: usize,
        end: usize,
        keyword: &str,
        text: String,
        confidence: f32,
    ) -> DetectionMatch {
        let data = json!({
            "type": alert_type(keyword),
            "title": title_case(keyword),
            "text": text,
        });
        DetectionMatch::new(start, end, confidence, data)
    }
}

impl Default for AlertDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for AlertDetector {
    fn name(&self) -> &str {
        "alert"
    }

    fn detect(&self, text: &str) -> Result<Vec<DetectionMatch>, DetectorError> {
        let lines = split_lines(text);
        let mut matches = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let found = self
                .admonition_at(&lines, i)
                .or_else(|| self.keyword_at(&lines, i));
            match found {
                Some((last, m)) => {
                    matches.push(m);
                    i = last + 1;
                }
                None => i += 1,
            }
        }

        Ok(matches)
    }
}

/// Alert variant for a callout keyword
fn alert_type(keyword: &str) -> &'static str {
    match keyword {
        "tip" => "success",
        "warning" | "caution" | "important" => "warning",
        "danger" | "error" => "error",
        _ => "info",
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn join_paragraph(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lines that start a different Markdown block end a callout paragraph
fn starts_block(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#') || trimmed.starts_with('|') || trimmed.starts_with("```")
}
