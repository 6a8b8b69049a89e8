//! Relaxed event counters for pipeline and cache statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counts occurrences of one event. Readers get a snapshot that may lag
/// concurrent writers; nothing is ordered against it.
#[derive(Debug, Default)]
pub struct EventCounter(AtomicU64);

impl EventCounter {
    /// Record one occurrence.
    #[inline]
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn load(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counts_across_threads() {
        let counter = Arc::new(EventCounter::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || (0..100).for_each(|_| counter.bump()))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.load(), 400);
    }
}
