//! Overlap resolution
//!
//! Picks a non-intersecting subset of candidates, preferring higher
//! confidence. Greedy by confidence, then reordered back-to-front so that
//! replacements can be applied without invalidating earlier offsets.

use super::detector::Candidate;
use std::cmp::Ordering;

/// Deterministic acceptance order.
///
/// Confidence descending, then earlier start, then earlier-registered
/// detector, then the longer span.
fn priority(a: &Candidate, b: &Candidate) -> Ordering {
    b.m.confidence
        .total_cmp(&a.m.confidence)
        .then(a.m.start.cmp(&b.m.start))
        .then(a.detector.cmp(&b.detector))
        .then(b.m.end.cmp(&a.m.end))
}

/// Select the accepted subset, ordered by `start` descending.
pub fn resolve_overlaps(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(priority);

    let mut accepted: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if accepted.iter().all(|a| !a.m.overlaps(&candidate.m)) {
            accepted.push(candidate);
        }
    }

    accepted.sort_by(|a, b| b.m.start.cmp(&a.m.start));
    accepted
}
