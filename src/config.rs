//! Configuration for the enrichment pipeline
//!
//! Configuration is handed over as JSON by the embedding host (page script,
//! server, or test). Every field has a default so partial documents work.

use crate::detection::BUILTIN_DETECTORS;
use crate::error::ConfigError;
use crate::telemetry::{EventSink, LogSink, NullSink};
use crate::transform::TransformMode;
use serde::Deserialize;
use std::sync::Arc;

/// Smallest probe bound that can still hold `livellm:` plus a short name.
pub const MIN_FENCE_PROBE: usize = 16;

/// Pipeline configuration
#[derive(Clone, Debug, Deserialize)]
pub struct EnrichConfig {
    /// Static transform mode
    #[serde(default)]
    pub mode: TransformMode,

    /// Minimum confidence for a detection to be applied
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Enabled detectors, in registration order
    #[serde(default = "default_detectors")]
    pub detectors: Vec<String>,

    /// Longest fence line (in chars) probed before it is replayed as text
    #[serde(default = "default_max_fence_probe")]
    pub max_fence_probe: usize,

    /// Whether the streaming renderer keeps a trailing cursor node
    #[serde(default)]
    pub show_cursor: bool,

    /// Whether lifecycle events are written to the log
    #[serde(default = "default_log_events")]
    pub log_events: bool,
}

fn default_confidence_threshold() -> f32 {
    0.7
}

fn default_detectors() -> Vec<String> {
    BUILTIN_DETECTORS.iter().map(|name| name.to_string()).collect()
}

fn default_max_fence_probe() -> usize {
    128
}

fn default_log_events() -> bool {
    true
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            mode: TransformMode::default(),
            confidence_threshold: default_confidence_threshold(),
            detectors: default_detectors(),
            max_fence_probe: default_max_fence_probe(),
            show_cursor: false,
            log_events: default_log_events(),
        }
    }
}

impl EnrichConfig {
    /// Parse configuration from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config_str =
            std::str::from_utf8(bytes).map_err(|e| ConfigError::InvalidUtf8(e.to_string()))?;
        Self::from_json(config_str)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidJson(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::InvalidThreshold(self.confidence_threshold));
        }
        if self.max_fence_probe < MIN_FENCE_PROBE {
            return Err(ConfigError::InvalidProbeBound {
                min: MIN_FENCE_PROBE,
                got: self.max_fence_probe,
            });
        }
        Ok(())
    }

    /// Event sink matching `log_events`
    pub fn event_sink(&self) -> Arc<dyn EventSink> {
        if self.log_events {
            Arc::new(LogSink)
        } else {
            Arc::new(NullSink)
        }
    }
}
