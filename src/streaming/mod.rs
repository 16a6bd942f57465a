//! Streaming module for incremental model output
//!
//! This module provides streaming primitives that:
//! - Split a char stream into text and component blocks (per-char automaton)
//! - Handle UTF-8 boundaries across byte chunks

pub mod parser;
pub mod utf8_buffer;

pub use parser::{ComponentStreamParser, ParseEvent, StreamState, DEFAULT_MAX_FENCE_PROBE};
pub use utf8_buffer::Utf8Buffer;
