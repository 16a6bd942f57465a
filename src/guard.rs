//! Panic containment at collaborator seams
//!
//! Detectors and registries are supplied from outside the crate. A panic in
//! one of them must cost only that call's contribution, never the session.

use log::warn;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run `f`, returning `None` if it panicked.
///
/// `what` names the call site for the log line.
pub(crate) fn isolate<T>(what: &str, f: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            warn!("[guard] {} panicked: {}", what, message);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_value_through() {
        assert_eq!(isolate("sum", || 2 + 2), Some(4));
    }

    #[test]
    fn test_contains_panic() {
        let result: Option<u32> = isolate("boom", || panic!("detector exploded"));
        assert_eq!(result, None);
    }
}
