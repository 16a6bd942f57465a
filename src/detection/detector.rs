//! Detector contract
//!
//! A detector is a pure function pair: `detect` proposes regions of free text
//! that look like a component, `transform` turns one proposal into block-form
//! component text. Detectors own no state between calls.

use crate::component::grammar::format_block;
use crate::error::DetectorError;
use serde_json::Value;

/// A region of the source text a detector wants to replace
///
/// `start..end` is a half-open byte range into the original text; both ends
/// sit on char boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionMatch {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Detector-specific payload
    pub data: Value,
}

impl DetectionMatch {
    /// Create a new match
    pub fn new(start: usize, end: usize, confidence: f32, data: Value) -> Self {
        Self {
            start,
            end,
            confidence,
            data,
        }
    }

    /// Whether two half-open ranges share at least one byte
    pub fn overlaps(&self, other: &DetectionMatch) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Length of the range in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the range is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Proposes component replacements for free text
pub trait Detector: Send + Sync {
    /// Unique detector name (e.g. "table")
    fn name(&self) -> &str;

    /// Component the replacement block names. Defaults to the detector name.
    fn component(&self) -> &str {
        self.name()
    }

    /// Scan `text` for candidate regions. Must not keep state between calls.
    fn detect(&self, text: &str) -> Result<Vec<DetectionMatch>, DetectorError>;

    /// Produce block-form component text for one of this detector's matches.
    ///
    /// The default treats the payload as the component props.
    fn transform(&self, m: &DetectionMatch) -> Result<String, DetectorError> {
        match &m.data {
            Value::Object(_) => Ok(format_block(self.component(), &m.data)),
            other => Err(DetectorError::BadPayload {
                detector: self.name().to_string(),
                reason: format!("expected object payload, got {}", json_kind(other)),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A validated match tagged with the detector that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Registration index of the detector (lower registered earlier)
    pub detector: usize,
    /// Detector name
    pub kind: String,
    /// The match itself
    pub m: DetectionMatch,
}

/// Check a raw match against the text it claims to cover.
///
/// Rejects empty or inverted ranges, out-of-bounds ends, ends off a char
/// boundary and non-finite confidence. Confidence is clamped into [0, 1].
pub fn validate_match(text: &str, mut m: DetectionMatch) -> Result<DetectionMatch, &'static str> {
    if m.start >= m.end {
        return Err("empty or inverted span");
    }
    if m.end > text.len() {
        return Err("span ends past the text");
    }
    if !text.is_char_boundary(m.start) || !text.is_char_boundary(m.end) {
        return Err("span splits a character");
    }
    if !m.confidence.is_finite() {
        return Err("confidence is not finite");
    }
    m.confidence = m.confidence.clamp(0.0, 1.0);
    Ok(m)
}
