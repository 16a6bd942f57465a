//! Step-by-step instruction detection
//!
//! Two or more `Step N:` lines (blank lines allowed between them, detail
//! lines allowed under each) become a `livellm:steps` component.

use super::detector::{DetectionMatch, Detector};
use super::lines::{split_lines, Line};
use crate::error::DetectorError;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

static STEP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:#{1,6}\s+)?(?:\*\*)?step\s+(\d{1,3})(?:\*\*)?\s*[:.)-]\s*(?:\*\*)?\s*(.*?)\s*$")
        .expect("Invalid step regex")
});

const MIN_STEPS: usize = 2;
const BASE_CONFIDENCE: f32 = 0.75;
const PER_STEP_BONUS: f32 = 0.05;
const MAX_CONFIDENCE: f32 = 0.9;
const SEQUENCE_BONUS: f32 = 0.05;

#[derive(Debug)]
struct Step {
    number: u32,
    title: String,
    detail: Vec<String>,
}

impl Step {
    fn parse(line: &Line<'_>) -> Option<Self> {
        let caps = STEP_LINE.captures(line.text)?;
        let number = caps.get(1)?.as_str().parse().ok()?;
        let title = caps
            .get(2)
            .map(|m| m.as_str().trim_end_matches("**").trim())
            .filter(|t| !t.is_empty())
            .map_or_else(|| format!("Step {number}"), str::to_string);
        Some(Self {
            number,
            title,
            detail: Vec::new(),
        })
    }

    fn to_json(&self) -> Value {
        if self.detail.is_empty() {
            json!({"title": self.title})
        } else {
            json!({"title": self.title, "detail": self.detail.join(" ")})
        }
    }
}

/// Detects numbered "Step N" instructions
#[derive(Debug, Default, Clone, Copy)]
pub struct StepsDetector;

impl StepsDetector {
    /// Create a new steps detector
    pub fn new() -> Self {
        Self
    }

    fn steps_at(lines: &[Line<'_>], i: usize) -> Option<(usize, DetectionMatch)> {
        let mut steps = vec![Step::parse(&lines[i])?];
        let mut last = i;

        loop {
            let mut next = last + 1;
            while lines.get(next).is_some_and(Line::is_blank) {
                next += 1;
            }
            let Some(line) = lines.get(next) else {
                break;
            };

            if let Some(step) = Step::parse(line) {
                steps.push(step);
            } else if next == last + 1 && !starts_block(line.text) {
                if let Some(current) = steps.last_mut() {
                    current.detail.push(line.text.trim().to_string());
                }
            } else {
                break;
            }
            last = next;
        }

        if steps.len() < MIN_STEPS {
            return None;
        }

        let extra = (steps.len() - MIN_STEPS) as f32 * PER_STEP_BONUS;
        let mut confidence = (BASE_CONFIDENCE + extra).min(MAX_CONFIDENCE);
        let sequential = steps
            .iter()
            .enumerate()
            .all(|(idx, s)| s.number as usize == idx + 1);
        if sequential {
            confidence += SEQUENCE_BONUS;
        }

        let data = json!({
            "steps": steps.iter().map(Step::to_json).collect::<Vec<_>>(),
        });
        Some((
            last,
            DetectionMatch::new(lines[i].start, lines[last].end, confidence.min(1.0), data),
        ))
    }
}

impl Detector for StepsDetector {
    fn name(&self) -> &str {
        "steps"
    }

    fn detect(&self, text: &str) -> Result<Vec<DetectionMatch>, DetectorError> {
        let lines = split_lines(text);
        let mut matches = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            match Self::steps_at(&lines, i) {
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

fn starts_block(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#') || trimmed.starts_with('|') || trimmed.starts_with("```")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_steps() {
        let text = "Step 1: Install\nStep 2: Configure\n\nStep 3: Run it";
        let m = StepsDetector::new().detect(text).unwrap().remove(0);

        assert_eq!((m.start, m.end), (0, text.len()));
        assert_eq!(m.data["steps"][2]["title"], "Run it");
        // 0.75 + 0.05 (third step) + 0.05 (sequential)
        assert!((m.confidence - 0.85).abs() < 1e-4);
    }

    #[test]
    fn test_detail_lines_attach_to_step() {
        let text = "**Step 1:** Clone\nUse git clone.\n**Step 2:** Build";
        let m = StepsDetector::new().detect(text).unwrap().remove(0);

        assert_eq!(m.data["steps"][0]["title"], "Clone");
        assert_eq!(m.data["steps"][0]["detail"], "Use git clone.");
        assert!(m.data["steps"][1].get("detail").is_none());
    }

    #[test]
    fn test_trailing_prose_after_blank_is_excluded() {
        let text = "Step 1: a\nStep 2: b\n\nThat is all.";
        let m = StepsDetector::new().detect(text).unwrap().remove(0);
        assert_eq!(&text[m.start..m.end], "Step 1: a\nStep 2: b");
    }

    #[test]
    fn test_single_step_is_ignored() {
        assert!(StepsDetector::new().detect("Step 1: alone").unwrap().is_empty());
    }

    #[test]
    fn test_out_of_order_numbers_score_lower() {
        let text = "Step 3: c\nStep 1: a";
        let m = StepsDetector::new().detect(text).unwrap().remove(0);
        assert!((m.confidence - BASE_CONFIDENCE).abs() < 1e-4);
    }
}
