//! Detection pipeline
//!
//! This module provides:
//! - The `Detector` contract and its match type
//! - Built-in detectors for tables, charts, alerts, choices and steps
//! - A case-insensitive keyword FSM for scoring
//! - Overlap resolution over confidence-scored candidates

pub mod alert;
pub mod chart;
pub mod choice;
pub mod detector;
pub mod keywords;
pub mod lines;
pub mod resolver;
pub mod steps;
pub mod table;

pub use alert::AlertDetector;
pub use chart::ChartDetector;
pub use choice::ChoiceDetector;
pub use detector::{validate_match, Candidate, DetectionMatch, Detector};
pub use keywords::{KeywordHit, KeywordSet};
pub use resolver::resolve_overlaps;
pub use steps::StepsDetector;
pub use table::TableDetector;

/// Names of the built-in detectors, in default registration order
pub const BUILTIN_DETECTORS: [&str; 5] = ["table", "chart", "alert", "choice", "steps"];

/// Instantiate a built-in detector by name
pub fn builtin(name: &str) -> Option<Box<dyn Detector>> {
    match name {
        "table" => Some(Box::new(TableDetector::new())),
        "chart" => Some(Box::new(ChartDetector::new())),
        "alert" => Some(Box::new(AlertDetector::new())),
        "choice" => Some(Box::new(ChoiceDetector::new())),
        "steps" => Some(Box::new(StepsDetector::new())),
        _ => None,
    }
}
