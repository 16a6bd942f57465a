//! Multiple-choice question detection
//!
//! A line ending in `?` followed by a short list of options becomes a
//! `livellm:choice` component.

use super::detector::{DetectionMatch, Detector};
use super::keywords::KeywordSet;
use super::lines::{split_lines, Line};
use crate::error::DetectorError;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

static OPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:([A-Ha-h])[).:]|(\d{1,2})[).]|[-*+])\s+(\S.*)$")
        .expect("Invalid option regex")
});

const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 8;
const BASE_CONFIDENCE: f32 = 0.55;
const PER_OPTION_BONUS: f32 = 0.05;
const MAX_OPTION_SCORE: f32 = 0.8;
const KEYWORD_BONUS: f32 = 0.1;
const LETTERED_BONUS: f32 = 0.05;

/// Detects a question followed by answer options
#[derive(Debug, Clone)]
pub struct ChoiceDetector {
    cues: KeywordSet,
}

impl ChoiceDetector {
    /// Create a new choice detector
    pub fn new() -> Self {
        Self {
            cues: KeywordSet::new(&[
                "which",
                "choose",
                "select",
                "prefer",
                "pick",
                "would you like",
                "option",
            ]),
        }
    }

    fn question(line: &Line<'_>) -> Option<String> {
        let trimmed = line.text.trim();
        let unbolded = trimmed
            .strip_prefix("**")
            .and_then(|s| s.strip_suffix("**"))
            .unwrap_or(trimmed)
            .trim();
        if unbolded.len() < 5 || !unbolded.ends_with('?') || OPTION_LINE.is_match(trimmed) {
            return None;
        }
        Some(unbolded.to_string())
    }

    fn choice_at(&self, lines: &[Line<'_>], i: usize) -> Option<(usize, DetectionMatch)> {
        let question = Self::question(&lines[i])?;

        let mut next = i + 1;
        if lines.get(next).is_some_and(Line::is_blank) {
            next += 1;
        }

        let mut options = Vec::new();
        let mut lettered = true;
        let mut last = i;
        while let Some(line) = lines.get(next) {
            let Some(caps) = OPTION_LINE.captures(line.text) else {
                break;
            };
            lettered &= caps.get(1).is_some();
            options.push(caps.get(3)?.as_str().trim().to_string());
            last = next;
            next += 1;
        }

        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
            return None;
        }

        let mut confidence =
            (BASE_CONFIDENCE + PER_OPTION_BONUS * options.len() as f32).min(MAX_OPTION_SCORE);
        if self.cues.contains_any(&question) {
            confidence += KEYWORD_BONUS;
        }
        if lettered {
            confidence += LETTERED_BONUS;
        }

        let data = json!({
            "question": question,
            "options": options,
        });
        Some((
            last,
            DetectionMatch::new(lines[i].start, lines[last].end, confidence.min(1.0), data),
        ))
    }
}

impl Default for ChoiceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ChoiceDetector {
    fn name(&self) -> &str {
        "choice"
    }

    fn detect(&self, text: &str) -> Result<Vec<DetectionMatch>, DetectorError> {
        let lines = split_lines(text);
        let mut matches = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            match self.choice_at(&lines, i) {
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
