//! Lifecycle events
//!
//! The transformer and the streaming renderer report what they do through an
//! `EventSink` handed to them at construction. There is no global bus.

use crate::error::ComponentError;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::sync::Mutex;

/// One detection, as reported by the `detected` event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionSummary {
    /// Detector (and component) type
    #[serde(rename = "type")]
    pub kind: String,
    /// Half-open byte range in the source text
    pub span: (usize, usize),
    /// Confidence in [0, 1]
    pub confidence: f32,
}

/// Lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    /// First chunk of a stream arrived
    Start,
    /// Raw chunk as pushed by the caller
    Token { text: String },
    /// A component fence was recognized; its body is still arriving
    ComponentStart {
        #[serde(rename = "type")]
        component: String,
    },
    /// A component body completed and mounted
    ComponentComplete {
        #[serde(rename = "type")]
        component: String,
        props: Value,
    },
    /// Stream finished
    End {
        #[serde(rename = "fullText")]
        full_text: String,
    },
    /// A recoverable failure; the pipeline carried on
    Error {
        kind: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        component: Option<String>,
        message: String,
    },
    /// Static transform began
    TransformStart { text: String },
    /// Detectors ran (all validated matches, before thresholding)
    Detected { detections: Vec<DetectionSummary> },
    /// Static transform produced enriched text
    TransformEnriched { text: String },
}

impl Event {
    /// `error` event for a component that could not be mounted
    pub fn component_error(err: &ComponentError) -> Self {
        Event::Error {
            kind: err.kind().to_string(),
            component: Some(err.component().to_string()),
            message: err.to_string(),
        }
    }

    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::Token { .. } => "token",
            Event::ComponentStart { .. } => "component-start",
            Event::ComponentComplete { .. } => "component-complete",
            Event::End { .. } => "end",
            Event::Error { .. } => "error",
            Event::TransformStart { .. } => "transform-start",
            Event::Detected { .. } => "detected",
            Event::TransformEnriched { .. } => "transform-enriched",
        }
    }
}

/// Receiver for lifecycle events
pub trait EventSink: Send + Sync {
    /// Deliver one event. Must not panic back into the pipeline.
    fn emit(&self, event: &Event);
}

/// Writes every event to the log as a JSON line
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &Event) {
        match serde_json::to_string(event) {
            Ok(json) => match event {
                Event::Error { .. } => warn!("[LIVELLM] {}", json),
                Event::Token { .. } => debug!("[LIVELLM] {}", json),
                _ => info!("[LIVELLM] {}", json),
            },
            Err(e) => {
                warn!("Failed to serialize {} event: {}", event.name(), e);
            }
        }
    }
}

/// Drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &Event) {}
}

/// Keeps every event in memory, in order
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events
    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Names of recorded events, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(Event::name).collect()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &Event) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
