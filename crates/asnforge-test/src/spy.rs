//! Call counters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use asnforge_core::Item;

/// Counts how often a callback ran.
///
/// Clones share the same count, so a counter can be moved into a closure
/// and inspected afterwards.
///
/// # Example
///
/// ```
/// use asnforge_core::Item;
/// use asnforge_test::CallCounter;
///
/// let counter = CallCounter::new();
/// let predicate = counter.predicate(true);
///
/// assert!(predicate(&Item::new()));
/// assert!(predicate(&Item::new()));
/// assert_eq!(counter.count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    calls: Arc<AtomicUsize>,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one call.
    pub fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of calls recorded so far.
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    /// An item predicate that counts its calls and always returns `result`.
    pub fn predicate(&self, result: bool) -> impl Fn(&Item) -> bool + Send + Sync + 'static {
        let counter = self.clone();
        move |_| {
            counter.hit();
            result
        }
    }

    /// Wraps a value extractor so each call is counted.
    pub fn counting<F>(&self, f: F) -> impl Fn(&Item) -> String + Send + Sync + 'static
    where
        F: Fn(&Item) -> String + Send + Sync + 'static,
    {
        let counter = self.clone();
        move |item| {
            counter.hit();
            f(item)
        }
    }

    /// A value extractor reading `key`, counting each call.
    pub fn attribute(&self, key: &'static str) -> impl Fn(&Item) -> String + Send + Sync + 'static {
        self.counting(move |item| item.text(key).unwrap_or_default().to_string())
    }
}
