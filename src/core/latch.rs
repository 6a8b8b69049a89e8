//! Reentrancy latch for the error pipeline.
//!
//! Stack capture shares scratch state and is not reentrant. An error raised
//! while a report is being built (by the stack walker, a display hook, or
//! another thread) must not start a second capture; the latch tells the
//! pipeline which case it is in.

use std::sync::atomic::{AtomicBool, Ordering};

/// Binary claim token, taken with compare-and-swap.
#[derive(Debug, Default)]
pub struct ReentrancyLatch {
    claimed: AtomicBool,
}

impl ReentrancyLatch {
    /// Create an unclaimed latch.
    pub const fn new() -> Self {
        Self {
            claimed: AtomicBool::new(false),
        }
    }

    /// Claim the latch.
    ///
    /// Returns `None` if it is already held: the caller is nested inside
    /// another report. The guard releases the latch when dropped.
    pub fn try_claim(&self) -> Option<LatchGuard<'_>> {
        self.claimed
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| LatchGuard { latch: self })
    }

    /// Whether some report currently holds the latch.
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

/// Scoped ownership of a [`ReentrancyLatch`].
#[must_use = "dropping the guard releases the latch immediately"]
pub struct LatchGuard<'a> {
    latch: &'a ReentrancyLatch,
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.latch.claimed.store(false, Ordering::Release);
    }
}
