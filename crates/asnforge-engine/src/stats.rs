//! Generation statistics.

use std::time::{Duration, Instant};

/// Counters for one [`generate`](crate::generate) run.
///
/// # Example
///
/// ```
/// use asnforge_engine::GenerateStats;
///
/// let mut stats = GenerateStats::default();
/// stats.start();
/// stats.record_process_list(3);
/// stats.record_created(2);
/// stats.record_extended();
///
/// assert_eq!(stats.process_lists, 1);
/// assert_eq!(stats.items_offered, 3);
/// assert_eq!(stats.associations_created, 2);
/// assert_eq!(stats.existing_matches, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GenerateStats {
    start_time: Option<Instant>,
    end_time: Option<Instant>,
    /// Rows in the pool.
    pub pool_items: usize,
    /// Process lists taken off the worklist.
    pub process_lists: u64,
    /// Items offered, counting each item of each list once.
    pub items_offered: u64,
    /// Associations created from rule prototypes.
    pub associations_created: u64,
    /// Items accepted by an existing association.
    pub existing_matches: u64,
    /// Process lists appended to the worklist.
    pub reprocess_lists: u64,
    /// Pool rows that joined no association.
    pub orphans: usize,
}

impl GenerateStats {
    /// Creates empty statistics for a pool of `pool_items` rows.
    pub fn new(pool_items: usize) -> Self {
        Self {
            pool_items,
            ..Self::default()
        }
    }

    /// Marks the start of generation.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
        self.end_time = None;
    }

    /// Marks the end of generation.
    pub fn stop(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Time between start and stop, or until now if still running.
    pub fn elapsed(&self) -> Duration {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => end.duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::default(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    /// Records a process list of `items` items taken off the worklist.
    pub fn record_process_list(&mut self, items: usize) {
        self.process_lists += 1;
        self.items_offered += items as u64;
    }

    pub fn record_created(&mut self, count: usize) {
        self.associations_created += count as u64;
    }

    pub fn record_extended(&mut self) {
        self.existing_matches += 1;
    }

    pub fn record_reprocess(&mut self, count: usize) {
        self.reprocess_lists += count as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_counts_pool_only() {
        let mut stats = GenerateStats::new(4);
        assert_eq!(stats.pool_items, 4);
        assert_eq!(stats.process_lists, 0);
        assert_eq!(stats.elapsed(), Duration::default());

        stats.start();
        stats.record_reprocess(2);
        stats.stop();
        assert_eq!(stats.reprocess_lists, 2);
        assert!(stats.elapsed() <= Duration::from_secs(1));
    }
}
