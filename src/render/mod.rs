//! Rendering
//!
//! This module provides:
//! - The node model and the mount-sink contract, plus an in-memory sink
//! - Frame-batched scheduling of partial text renders
//! - Markdown conversion for text segments
//! - The streaming render session and whole-document rendering

pub mod markdown;
pub mod node;
pub mod scheduler;
pub mod session;
pub mod sink;

pub use markdown::{CmarkConverter, MarkdownConverter, PlainTextConverter};
pub use node::{escape_html, Node, NodeId};
pub use scheduler::{FrameClock, FrameHandle, ManualFrames, RenderScheduler};
pub use session::{render_document, RenderOptions, StreamRenderer, StreamRendererBuilder};
pub use sink::{DocumentSink, MountSink};
