//! Activity log - a lossy sliding window over recent log lines.
//!
//! Appends format straight into a fixed buffer. When the space left drops
//! below the low-water mark the older half is thrown away, so the tail of
//! recent activity is always available for the crash log.

use std::fmt::{self, Write};

use super::message::BoundedWriter;

/// Fixed-capacity text buffer with a write cursor.
pub struct ActivityLog {
    /// Backing storage; `buf[..cursor]` is the live text
    buf: Box<[u8]>,

    /// Write position
    cursor: usize,

    /// Appends below this much free space evict the older half first
    low_water: usize,

    /// Number of half-buffer evictions performed
    evictions: u64,

    /// Number of lines abandoned because they did not fit
    dropped: u64,
}

/// Outcome of a single [`ActivityLog::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The line was stored.
    Written,
    /// The line was stored after discarding the older half of the log.
    WrittenAfterEviction,
    /// The line did not fit and was abandoned.
    Dropped,
}

impl ActivityLog {
    /// Create a log of `capacity` bytes.
    ///
    /// `capacity` is raised to `2 * low_water` if smaller, so that one
    /// eviction always frees at least `low_water` bytes.
    pub fn new(capacity: usize, low_water: usize) -> Self {
        let capacity = capacity.max(low_water.saturating_mul(2)).max(2);
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            cursor: 0,
            low_water,
            evictions: 0,
            dropped: 0,
        }
    }

    /// Format `args` into the log followed by a newline.
    pub fn append(&mut self, args: fmt::Arguments<'_>) -> AppendOutcome {
        debug_assert!(self.cursor <= self.buf.len());

        let mut evicted = false;
        if self.remaining() < self.low_water {
            self.evict_older_half();
            evicted = true;
        }

        // one byte is kept back for the line terminator
        let end = self.buf.len() - 1;
        let mut w = BoundedWriter::new(&mut self.buf[self.cursor..end]);
        if w.write_fmt(args).is_err() {
            self.dropped += 1;
            return AppendOutcome::Dropped;
        }
        let len = w.len();

        self.buf[self.cursor + len] = b'\n';
        self.cursor += len + 1;

        if evicted {
            AppendOutcome::WrittenAfterEviction
        } else {
            AppendOutcome::Written
        }
    }

    /// Copy the upper half down, zero it, and rebase the cursor.
    fn evict_older_half(&mut self) {
        let half = self.buf.len() / 2;
        self.buf.copy_within(half.., 0);
        self.buf[half..].fill(0);
        // the cursor moves back by exactly half; it is never snapped to the
        // midpoint, which would leave a gap of zeroes in the text
        self.cursor = self.cursor.saturating_sub(half);
        self.evictions += 1;
    }

    /// The log text, decoded lossily (an eviction may split a character).
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf[..self.cursor]).into_owned()
    }

    /// Bytes left before the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    /// Fill level and counters.
    pub fn stats(&self) -> ActivityLogStats {
        ActivityLogStats {
            cursor: self.cursor,
            capacity: self.buf.len(),
            low_water: self.low_water,
            evictions: self.evictions,
            dropped: self.dropped,
        }
    }
}

/// Activity log fill level and counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityLogStats {
    /// Bytes of live text.
    pub cursor: usize,
    /// Buffer size.
    pub capacity: usize,
    /// Free space below which the older half is discarded.
    pub low_water: usize,
    /// Half-buffer evictions so far.
    pub evictions: u64,
    /// Lines dropped because they did not fit.
    pub dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_contents() {
        let mut log = ActivityLog::new(1024, 64);

        assert_eq!(log.append(format_args!("loaded {}", "map01")), AppendOutcome::Written);
        assert_eq!(log.append(format_args!("spawned {} units", 12)), AppendOutcome::Written);

        assert_eq!(log.contents(), "loaded map01\nspawned 12 units\n");
        assert_eq!(log.stats().cursor, log.contents().len());
    }

    #[test]
    fn test_capacity_raised_to_twice_low_water() {
        let log = ActivityLog::new(100, 512);
        assert_eq!(log.stats().capacity, 1024);
    }

    #[test]
    fn test_eviction_exactly_at_low_water() {
        let mut log = ActivityLog::new(256, 64);
        let line = "x".repeat(15); // 16 bytes with the newline

        // fill until just before the low-water threshold
        while log.remaining() - 16 >= 64 {
            assert_eq!(log.append(format_args!("{}", line)), AppendOutcome::Written);
        }
        assert_eq!(log.stats().evictions, 0);

        // still at or above the mark: no eviction yet
        assert!(log.remaining() >= 64);
        assert_eq!(log.append(format_args!("{}", line)), AppendOutcome::Written);
        assert!(log.remaining() < 64);

        // now below the mark: the next append evicts first
        let before = log.stats().cursor;
        assert_eq!(
            log.append(format_args!("{}", line)),
            AppendOutcome::WrittenAfterEviction
        );
        assert_eq!(log.stats().evictions, 1);
        assert_eq!(log.stats().cursor, before - 128 + 16);
    }

    #[test]
    fn test_cursor_never_exceeds_capacity() {
        let mut log = ActivityLog::new(512, 64);
        for i in 0..10_000 {
            log.append(format_args!("event {} {}", i, "y".repeat(i % 50)));
            assert!(log.stats().cursor <= log.stats().capacity);
        }
        assert!(log.stats().evictions > 0);
    }

    #[test]
    fn test_eviction_keeps_newer_half() {
        let mut log = ActivityLog::new(128, 32);
        for i in 0..20 {
            log.append(format_args!("line{:02}", i));
        }
        let text = log.contents();
        assert!(text.ends_with("line19\n"));
        assert!(!text.contains("line00"));
    }

    #[test]
    fn test_oversized_line_is_dropped() {
        let mut log = ActivityLog::new(128, 32);
        log.append(format_args!("keep"));

        let huge = "z".repeat(500);
        assert_eq!(log.append(format_args!("{}", huge)), AppendOutcome::Dropped);
        assert_eq!(log.stats().dropped, 1);
        assert_eq!(log.contents(), "keep\n");
    }
}
