//! "Label: number" series detection
//!
//! Three or more consecutive lines of the form `Label: 1,234` (optionally
//! bulleted, with a currency sign or percent) read as a data series and are
//! proposed as a `livellm:chart` bar chart.

use super::detector::{DetectionMatch, Detector};
use super::lines::split_lines;
use crate::error::DetectorError;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;

static DATA_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:[-*+]\s+)?([A-Za-z][A-Za-z0-9 _&/()'.-]{0,40}?)\s*:\s*([-+]?)([$€£])?(\d{1,3}(?:,\d{3})+|\d+)(\.\d+)?\s*(%)?\s*$",
    )
    .expect("Invalid chart line regex")
});

const MIN_POINTS: usize = 3;
const BASE_CONFIDENCE: f32 = 0.7;
const PER_POINT_BONUS: f32 = 0.05;
const MAX_CONFIDENCE: f32 = 0.9;
const UNIT_BONUS: f32 = 0.05;

/// One parsed data line
#[derive(Debug, Clone, PartialEq)]
struct Point {
    label: String,
    value: Value,
    unit: &'static str,
}

/// Detects runs of labeled numeric lines
#[derive(Debug, Default, Clone, Copy)]
pub struct ChartDetector;

impl ChartDetector {
    /// Create a new chart detector
    pub fn new() -> Self {
        Self
    }

    fn parse_line(line: &str) -> Option<Point> {
        let caps = DATA_LINE.captures(line)?;
        let label = caps.get(1)?.as_str().trim().to_string();
        let negative = caps.get(2).is_some_and(|s| s.as_str() == "-");
        let integer = caps.get(4)?.as_str().replace(',', "");
        let fraction = caps.get(5).map(|f| f.as_str());

        let value = number_value(negative, &integer, fraction)?;
        let unit = match (caps.get(3).map(|c| c.as_str()), caps.get(6)) {
            (_, Some(_)) => "%",
            (Some("$"), None) => "$",
            (Some("€"), None) => "€",
            (Some("£"), None) => "£",
            _ => "",
        };

        Some(Point { label, value, unit })
    }

    fn build_match(start: usize, end: usize, points: &[Point]) -> DetectionMatch {
        let extra = (points.len() - MIN_POINTS) as f32 * PER_POINT_BONUS;
        let mut confidence = (BASE_CONFIDENCE + extra).min(MAX_CONFIDENCE);

        let unit = points[0].unit;
        let shared_unit = points.iter().all(|p| p.unit == unit);
        if shared_unit {
            confidence += UNIT_BONUS;
        }

        let data: Vec<Value> = points
            .iter()
            .map(|p| json!({"label": p.label, "value": p.value}))
            .collect();

        let mut props = Map::new();
        props.insert("type".to_string(), json!("bar"));
        props.insert("data".to_string(), Value::Array(data));
        if shared_unit && !unit.is_empty() {
            props.insert("unit".to_string(), json!(unit));
        }

        DetectionMatch::new(start, end, confidence.min(1.0), Value::Object(props))
    }
}

impl Detector for ChartDetector {
    fn name(&self) -> &str {
        "chart"
    }

    fn detect(&self, text: &str) -> Result<Vec<DetectionMatch>, DetectorError> {
        let mut matches = Vec::new();
        let mut run: Vec<Point> = Vec::new();
        let mut run_start = 0;
        let mut run_end = 0;

        for line in split_lines(text) {
            match Self::parse_line(line.text) {
                Some(point) => {
                    if run.is_empty() {
                        run_start = line.start;
                    }
                    run_end = line.end;
                    run.push(point);
                }
                None => {
                    if run.len() >= MIN_POINTS {
                        matches.push(Self::build_match(run_start, run_end, &run));
                    }
                    run.clear();
                }
            }
        }
        if run.len() >= MIN_POINTS {
            matches.push(Self::build_match(run_start, run_end, &run));
        }

        Ok(matches)
    }
}

/// Integer values stay integers so `1000` does not become `1000.0`
fn number_value(negative: bool, integer: &str, fraction: Option<&str>) -> Option<Value> {
    let sign = if negative { "-" } else { "" };
    match fraction {
        None => match format!("{sign}{integer}").parse::<i64>() {
            Ok(n) => Some(json!(n)),
            Err(_) => format!("{sign}{integer}").parse::<f64>().ok().map(|f| json!(f)),
        },
        Some(frac) => format!("{sign}{integer}{frac}")
            .parse::<f64>()
            .ok()
            .map(|f| json!(f)),
    }
}
