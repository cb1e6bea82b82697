//! Per-rule association numbering.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Hands out sequence numbers to associations, one counter per rule.
///
/// Each registry owns one counter, so two registries never share numbering.
/// Numbers start at 1. Call [`SequenceCounter::reset`] between independent
/// runs (or tests) to start over.
///
/// # Example
///
/// ```
/// use asnforge_core::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next("Asn_Image"), 1);
/// assert_eq!(counter.next("Asn_Image"), 2);
/// assert_eq!(counter.next("Asn_WFSCMB"), 1);
///
/// counter.reset();
/// assert_eq!(counter.next("Asn_Image"), 1);
/// ```
#[derive(Debug, Default)]
pub struct SequenceCounter {
    counters: Mutex<HashMap<String, u32>>,
}

impl SequenceCounter {
    /// Creates a counter with every rule at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the map consistent, so poisoning
    // is ignored.
    fn counters(&self) -> MutexGuard<'_, HashMap<String, u32>> {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the next sequence number for `rule`.
    pub fn next(&self, rule: &str) -> u32 {
        let mut counters = self.counters();
        let counter = counters.entry(rule.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Returns the last number handed out for `rule` (0 if none).
    pub fn current(&self, rule: &str) -> u32 {
        self.counters().get(rule).copied().unwrap_or(0)
    }

    /// Resets every rule back to zero.
    pub fn reset(&self) {
        self.counters().clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_poisoned_lock_still_counts() {
        let counter = Arc::new(SequenceCounter::new());
        counter.next("Asn_Image");
        counter.next("Asn_Image");

        let holder = Arc::clone(&counter);
        let _ = thread::spawn(move || {
            let _guard = holder.counters.lock().unwrap();
            panic!("poisoning the counter lock");
        })
        .join();
        assert!(counter.counters.is_poisoned());

        assert_eq!(counter.current("Asn_Image"), 2);
        assert_eq!(counter.next("Asn_Image"), 3);
        counter.reset();
        assert_eq!(counter.current("Asn_Image"), 0);
        assert_eq!(counter.next("Asn_Image"), 1);
    }
}
