//! Component-block enrichment for LLM Markdown
//!
//! Two paths share one component grammar:
//!
//! - Static: [`Transformer`] runs heuristic detectors over a finished text
//!   and rewrites confident regions (tables, "Label: number" series, alerts,
//!   choices, steps) into `livellm:` component blocks.
//! - Streaming: [`StreamRenderer`] feeds chunks through a per-char automaton,
//!   mounts a skeleton as soon as a component fence appears and swaps it for
//!   the live component (or a fallback) when the block closes.
//!
//! Collaborators are injected: an [`EventSink`] for lifecycle events, a
//! [`ComponentRegistry`] for lookup and validation, a [`MountSink`] to render
//! into and a [`FrameClock`] to batch text renders.

pub mod component;
pub mod config;
pub mod detection;
pub mod error;
mod guard;
pub mod render;
pub mod streaming;
pub mod telemetry;
pub mod transform;

pub use component::{AliasTable, ComponentRegistry, SchemaRegistry};
pub use config::EnrichConfig;
pub use detection::{DetectionMatch, Detector};
pub use error::{ComponentError, ConfigError, DetectorError, SetupError};
pub use render::{
    render_document, DocumentSink, FrameClock, ManualFrames, MountSink, Node, RenderOptions,
    StreamRenderer,
};
pub use streaming::ComponentStreamParser;
pub use telemetry::{Event, EventSink, LogSink, NullSink, RecordingSink};
pub use transform::{TransformMode, Transformer};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_static_output_streams_back_into_components() {
        let enriched = Transformer::default().transform(
            "Quarterly numbers:\n\nRevenue: 1000\nCosts: 500\nProfit: 500\n",
            TransformMode::Auto,
        );

        let doc = render_document(&enriched, DocumentSink::new(), &RenderOptions::default());
        assert_eq!(doc.components().len(), 1);
        assert!(doc.to_markup().contains("<livellm-chart props="));
    }

    #[test]
    fn test_config_drives_both_paths() {
        let config = EnrichConfig::from_json(
            r#"{"mode": "passive", "show_cursor": true, "log_events": false}"#,
        )
        .unwrap();

        let text = "Step 1: a\nStep 2: b";
        let transformer = Transformer::from_config(&config);
        assert_eq!(transformer.transform(text, config.mode), text);

        let events = Arc::new(RecordingSink::new());
        let mut renderer = StreamRenderer::builder()
            .config(&config)
            .events(events.clone())
            .sink(DocumentSink::new())
            .frames(ManualFrames::new())
            .build()
            .unwrap();
        renderer.push("hi");
        renderer.end();
        assert_eq!(events.names(), vec!["start", "token", "end"]);
        assert_eq!(renderer.sink().to_markup(), "<p>hi</p>\n");
    }
}
