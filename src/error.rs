//! Error types
//!
//! Only `SetupError` is ever surfaced to a caller as a failure. Everything
//! else is recovered locally: detector errors are isolated, component errors
//! become fallback nodes plus an `error` event.

use crate::component::registry::FieldError;
use thiserror::Error;

/// Configuration parsing errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration bytes were not UTF-8.
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Configuration was not valid JSON for `EnrichConfig`.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Confidence threshold outside [0, 1].
    #[error("confidence_threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f32),

    /// Fence probe bound too small to hold a component info line.
    #[error("max_fence_probe must be at least {min}, got {got}")]
    InvalidProbeBound { min: usize, got: usize },
}

/// Construction-time failures. These are the only fatal conditions.
#[derive(Debug, Error)]
pub enum SetupError {
    /// No mount destination was supplied to render into.
    #[error("render target not found: no mount sink was provided")]
    TargetNotFound,

    /// No frame clock was supplied to batch partial renders.
    #[error("no frame clock was provided")]
    MissingFrameClock,
}

/// A detector failed while scanning or transforming.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// Detection failed for a detector-specific reason.
    #[error("detector '{detector}' failed: {reason}")]
    Failed { detector: String, reason: String },

    /// The match payload did not have the shape `transform` expects.
    #[error("detector '{detector}' cannot transform payload: {reason}")]
    BadPayload { detector: String, reason: String },

    /// The detector panicked; the panic was contained.
    #[error("detector '{0}' panicked")]
    Panicked(String),
}

/// Why a component could not be mounted.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// The registry does not know this component name.
    #[error("unknown component '{0}'")]
    UnknownComponent(String),

    /// The body was not valid JSON.
    #[error("malformed body for component '{name}': {source}")]
    MalformedBody {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The body parsed but was not a JSON object.
    #[error("body for component '{0}' is not a JSON object")]
    NotAnObject(String),

    /// Props failed registry validation.
    #[error("invalid props for component '{name}': {}", join_field_errors(.errors))]
    SchemaValidation {
        name: String,
        errors: Vec<FieldError>,
    },

    /// The stream ended before the closing fence.
    #[error("stream ended inside component '{0}'")]
    Incomplete(String),

    /// A registry call panicked; the panic was contained.
    #[error("registry failed while resolving component '{0}'")]
    RegistryFailure(String),
}

impl ComponentError {
    /// Short machine-readable tag, used in fallback markup and events.
    pub fn kind(&self) -> &'static str {
        match self {
            ComponentError::UnknownComponent(_) => "unknown_component",
            ComponentError::MalformedBody { .. } => "malformed_body",
            ComponentError::NotAnObject(_) => "not_an_object",
            ComponentError::SchemaValidation { .. } => "schema_validation",
            ComponentError::Incomplete(_) => "incomplete",
            ComponentError::RegistryFailure(_) => "registry_failure",
        }
    }

    /// Name of the component the error refers to.
    pub fn component(&self) -> &str {
        match self {
            ComponentError::UnknownComponent(name)
            | ComponentError::NotAnObject(name)
            | ComponentError::Incomplete(name)
            | ComponentError::RegistryFailure(name) => name,
            ComponentError::MalformedBody { name, .. }
            | ComponentError::SchemaValidation { name, .. } => name,
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(FieldError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
