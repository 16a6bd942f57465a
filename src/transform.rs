//! Static transformer
//!
//! Runs the registered detectors over a complete text and, in `auto` mode,
//! replaces the accepted regions with component blocks. This is the only
//! place on the static path that emits events; detectors and the resolver
//! stay pure.

use crate::component::find_code_blocks;
use crate::config::EnrichConfig;
use crate::detection::{self, resolve_overlaps, validate_match, Candidate, Detector};
use crate::error::DetectorError;
use crate::guard::isolate;
use crate::telemetry::{DetectionSummary, Event, EventSink, NullSink};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default minimum confidence for a replacement
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// What `transform` does with detections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    /// Identity; detectors are not run
    Off,
    /// Detect and report, but return the input unchanged
    Passive,
    /// Detect, resolve and replace
    #[default]
    Auto,
}

/// Detector set plus threshold and event sink
pub struct Transformer {
    detectors: Vec<Box<dyn Detector>>,
    threshold: f32,
    events: Arc<dyn EventSink>,
}

impl Transformer {
    /// All built-in detectors in default order
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        let detectors = detection::BUILTIN_DETECTORS
            .iter()
            .filter_map(|name| detection::builtin(name))
            .collect();
        Self::with_detectors(detectors, events)
    }

    /// Detectors, threshold and sink from configuration
    pub fn from_config(config: &EnrichConfig) -> Self {
        let mut detectors = Vec::with_capacity(config.detectors.len());
        for name in &config.detectors {
            match detection::builtin(name) {
                Some(detector) => detectors.push(detector),
                None => warn!("[transform] unknown detector '{}' skipped", name),
            }
        }
        Self::with_detectors(detectors, config.event_sink())
            .with_threshold(config.confidence_threshold)
    }

    /// Explicit detectors; registration order is the vector order
    pub fn with_detectors(detectors: Vec<Box<dyn Detector>>, events: Arc<dyn EventSink>) -> Self {
        Self {
            detectors,
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            events,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Append a detector after the existing ones
    pub fn register(&mut self, detector: Box<dyn Detector>) {
        self.detectors.push(detector);
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Registered detector names, in registration order
    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Every validated match from every detector, in registration order.
    ///
    /// A detector that fails or panics contributes nothing. Matches touching
    /// a code block (component blocks included) are dropped.
    pub fn detect(&self, text: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let code_blocks = find_code_blocks(text);

        for (index, detector) in self.detectors.iter().enumerate() {
            let name = detector.name();
            let matches = match isolate(name, || detector.detect(text)) {
                Some(Ok(matches)) => matches,
                Some(Err(e)) => {
                    warn!("[transform] {}", e);
                    continue;
                }
                None => {
                    warn!("[transform] {}", DetectorError::Panicked(name.to_string()));
                    continue;
                }
            };

            for m in matches {
                match validate_match(text, m) {
                    Ok(m) if code_blocks.iter().any(|b| m.start < b.end && b.start < m.end) => {
                        debug!("[transform] '{}' match inside a code block skipped", name);
                    }
                    Ok(m) => candidates.push(Candidate {
                        detector: index,
                        kind: name.to_string(),
                        m,
                    }),
                    Err(reason) => warn!("[transform] dropping match from '{}': {}", name, reason),
                }
            }
        }

        candidates
    }

    /// Enrich `text` according to `mode`
    pub fn transform(&self, text: &str, mode: TransformMode) -> String {
        if mode == TransformMode::Off {
            return text.to_string();
        }

        self.emit(Event::TransformStart {
            text: text.to_string(),
        });

        let candidates = self.detect(text);
        self.emit(Event::Detected {
            detections: candidates
                .iter()
                .map(|c| DetectionSummary {
                    kind: c.kind.clone(),
                    span: (c.m.start, c.m.end),
                    confidence: c.m.confidence,
                })
                .collect(),
        });

        if mode == TransformMode::Passive {
            return text.to_string();
        }

        let eligible: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| c.m.confidence >= self.threshold)
            .collect();
        let accepted = resolve_overlaps(eligible);
        debug!("[transform] {} replacement(s) accepted", accepted.len());

        // accepted is ordered by start descending
        let mut out = text.to_string();
        for candidate in &accepted {
            let Some(detector) = self.detectors.get(candidate.detector) else {
                continue;
            };
            match isolate(detector.name(), || detector.transform(&candidate.m)) {
                Some(Ok(block)) => out.replace_range(candidate.m.start..candidate.m.end, &block),
                Some(Err(e)) => warn!("[transform] region left unchanged: {}", e),
                None => warn!(
                    "[transform] region left unchanged: {}",
                    DetectorError::Panicked(detector.name().to_string())
                ),
            }
        }

        self.emit(Event::TransformEnriched { text: out.clone() });
        out
    }

    fn emit(&self, event: Event) {
        self.events.emit(&event);
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new(Arc::new(NullSink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::grammar::parse_info_string;
    use crate::detection::DetectionMatch;
    use crate::telemetry::RecordingSink;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    /// Proposes one fixed region with a fixed confidence
    struct Fixed {
        name: &'static str,
        start: usize,
        end: usize,
        confidence: f32,
    }

    impl Detector for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn detect(&self, _text: &str) -> Result<Vec<DetectionMatch>, DetectorError> {
            Ok(vec![DetectionMatch::new(
                self.start,
                self.end,
                self.confidence,
                json!({"from": self.name}),
            )])
        }
    }

    struct Panics;

    impl Detector for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        fn detect(&self, _text: &str) -> Result<Vec<DetectionMatch>, DetectorError> {
            panic!("detector bug")
        }
    }

    struct Fails;

    impl Detector for Fails {
        fn name(&self) -> &str {
            "fails"
        }

        fn detect(&self, _text: &str) -> Result<Vec<DetectionMatch>, DetectorError> {
            Err(DetectorError::Failed {
                detector: "fails".to_string(),
                reason: "no luck".to_string(),
            })
        }
    }

    fn fixed(name: &'static str, start: usize, end: usize, confidence: f32) -> Box<dyn Detector> {
        Box::new(Fixed {
            name,
            start,
            end,
            confidence,
        })
    }

    #[test]
    fn test_identity_without_patterns() {
        let transformer = Transformer::default();
        let text = "Just a sentence.\n\nAnother paragraph, nothing to see.";
        assert_eq!(transformer.transform(text, TransformMode::Auto), text);
    }

    #[test]
    fn test_table_detected_whole() {
        let text = "| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n| 5 | 6 |";
        let candidates = Transformer::default().detect(text);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, "table");
        assert_eq!((candidates[0].m.start, candidates[0].m.end), (0, text.len()));
        assert!(candidates[0].m.confidence >= 0.7);
    }

    #[test]
    fn test_label_number_lines_become_chart() {
        let out = Transformer::default().transform(
            "Revenue: 1000\nCosts: 500\nProfit: 500",
            TransformMode::Auto,
        );

        assert!(out.starts_with("```livellm:chart\n"));
        assert!(out.ends_with("\n```"));
        let first_line = out.lines().next().unwrap_or_default();
        assert_eq!(parse_info_string(&first_line[3..]), Some("chart"));

        let body: String = out.lines().skip(1).take_while(|l| *l != "```").collect();
        let props: Value = serde_json::from_str(&body).unwrap();
        let labels: Vec<&str> = props["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["label"].as_str().unwrap())
            .collect();
        assert_eq!(labels, vec!["Revenue", "Costs", "Profit"]);
    }

    #[test]
    fn test_confidence_gating_keeps_loser_text() {
        let text = "aaaa bbbb cccc";
        let transformer = Transformer::with_detectors(
            vec![fixed("low", 0, 9, 0.90), fixed("high", 5, 14, 0.95)],
            Arc::new(NullSink),
        );
        let out = transformer.transform(text, TransformMode::Auto);

        assert!(out.starts_with("aaaa ```livellm:high\n"));
        assert!(!out.contains("livellm:low"));
    }

    #[test]
    fn test_disjoint_replacements_keep_offsets() {
        let text = "one two";
        let transformer = Transformer::with_detectors(
            vec![fixed("a", 0, 3, 0.9), fixed("b", 4, 7, 0.9)],
            Arc::new(NullSink),
        );
        let out = transformer.transform(text, TransformMode::Auto);
        let a = out.find("livellm:a").unwrap();
        let b = out.find("livellm:b").unwrap();
        assert!(a < b);
        assert!(out.contains("\n``` ```livellm:b\n"));
    }

    #[test]
    fn test_fenced_code_left_alone() {
        let text = "```yaml\ncpu: 1\nmemory: 512\nreplicas: 3\n```";
        let transformer = Transformer::default();
        assert!(transformer.detect(text).is_empty());
        assert_eq!(transformer.transform(text, TransformMode::Auto), text);

        let indented = "Config:\n\n    cpu: 1\n    memory: 512\n    replicas: 3\n";
        assert_eq!(transformer.transform(indented, TransformMode::Auto), indented);
    }

    #[test]
    fn test_component_blocks_not_rewritten() {
        let block = "```livellm:note\nStep 1: Install\nStep 2: Run\n```";
        let text = format!("Intro.\n\n{block}\n");
        let transformer = Transformer::default();
        assert_eq!(transformer.transform(&text, TransformMode::Auto), text);

        let once = transformer.transform("Revenue: 1000\nCosts: 500\nProfit: 500", TransformMode::Auto);
        assert_eq!(transformer.transform(&once, TransformMode::Auto), once);
    }

    #[test]
    fn test_below_threshold_ignored() {
        let transformer = Transformer::with_detectors(vec![fixed("x", 0, 3, 0.5)], Arc::new(NullSink));
        assert_eq!(transformer.transform("abc", TransformMode::Auto), "abc");
        let strict = Transformer::with_detectors(vec![fixed("x", 0, 3, 0.5)], Arc::new(NullSink))
            .with_threshold(0.4);
        assert_ne!(strict.transform("abc", TransformMode::Auto), "abc");
    }

    #[test]
    fn test_failing_detectors_isolated() {
        let transformer = Transformer::with_detectors(
            vec![Box::new(Panics), Box::new(Fails), fixed("ok", 0, 2, 0.9)],
            Arc::new(NullSink),
        );
        let candidates = transformer.detect("hi");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, "ok");
        assert_eq!(candidates[0].detector, 2);
    }

    #[test]
    fn test_invalid_spans_dropped() {
        let transformer = Transformer::with_detectors(
            vec![fixed("empty", 2, 2, 0.9), fixed("inverted", 3, 1, 0.9), fixed("long", 0, 99, 0.9)],
            Arc::new(NullSink),
        );
        assert!(transformer.detect("hello").is_empty());
        assert_eq!(transformer.transform("hello", TransformMode::Auto), "hello");
    }

    #[test]
    fn test_modes_and_events() {
        let events = Arc::new(RecordingSink::new());
        let transformer = Transformer::new(events.clone());
        let text = "Step 1: Install\nStep 2: Run";

        assert_eq!(transformer.transform(text, TransformMode::Off), text);
        assert!(events.events().is_empty());

        assert_eq!(transformer.transform(text, TransformMode::Passive), text);
        assert_eq!(events.names(), vec!["transform-start", "detected"]);
        match &events.events()[1] {
            Event::Detected { detections } => {
                assert_eq!(detections.len(), 1);
                assert_eq!(detections[0].kind, "steps");
                assert_eq!(detections[0].span, (0, text.len()));
            }
            other => panic!("unexpected event {other:?}"),
        }

        events.clear();
        let out = transformer.transform(text, TransformMode::Auto);
        assert!(out.starts_with("```livellm:steps\n"));
        assert_eq!(
            events.names(),
            vec!["transform-start", "detected", "transform-enriched"]
        );
    }

    #[test]
    fn test_from_config_skips_unknown_detectors() {
        let config = EnrichConfig::from_json(
            r#"{"detectors": ["steps", "gauge", "table"], "confidence_threshold": 0.8, "log_events": false}"#,
        )
        .unwrap();
        let transformer = Transformer::from_config(&config);
        assert_eq!(transformer.detector_names(), vec!["steps", "table"]);
        assert_eq!(transformer.threshold(), 0.8);
    }

    #[test]
    fn test_mode_deserializes_lowercase() {
        let mode: TransformMode = serde_json::from_str(r#""passive""#).unwrap();
        assert_eq!(mode, TransformMode::Passive);
        assert_eq!(TransformMode::default(), TransformMode::Auto);
    }
}
