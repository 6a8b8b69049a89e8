//! Tag filter for debug output.
//!
//! Output lines may start with a category tag, `"render|frame started"`.
//! Once at least one tag is enabled, tagged lines are printed only while
//! their tag is enabled; untagged lines always are. An empty filter lets
//! everything through. Tags are stored as FNV-1a hashes so the set can be
//! changed at any time without allocating. A collision can only show or
//! hide text.

use crate::util::text::fnv1a_32;

/// Outcome of [`TagFilter::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The tag is now enabled.
    Added,
    /// The tag was already enabled.
    AlreadyPresent,
    /// The set is full; nothing changed.
    Full,
}

/// A fixed-capacity set of enabled tag hashes.
pub struct TagFilter {
    hashes: Vec<u32>,
    capacity: usize,
}

impl TagFilter {
    /// Create an empty filter holding at most `capacity` tags.
    pub fn new(capacity: usize) -> Self {
        Self {
            hashes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Enable a tag.
    pub fn add(&mut self, tag: &str) -> AddOutcome {
        let hash = fnv1a_32(tag.as_bytes());

        if self.hashes.contains(&hash) {
            return AddOutcome::AlreadyPresent;
        }
        if self.hashes.len() >= self.capacity {
            return AddOutcome::Full;
        }

        self.hashes.push(hash);
        AddOutcome::Added
    }

    /// Disable a tag. Returns whether it was enabled.
    pub fn remove(&mut self, tag: &str) -> bool {
        let hash = fnv1a_32(tag.as_bytes());

        match self.hashes.iter().position(|&h| h == hash) {
            Some(idx) => {
                // order is irrelevant; fill the hole with the last entry
                self.hashes.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    /// Disable all tags.
    pub fn clear(&mut self) {
        self.hashes.clear();
    }

    /// Number of enabled tags.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Whether no tags are enabled.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Decide whether `text` should be printed.
    ///
    /// With no tags enabled everything is printed. Otherwise the tag is
    /// everything before the first `|`, provided no space comes first; a
    /// leading `|` does not end an (empty) tag. Only that first segment is
    /// looked up: `"a|b|msg"` is shown iff `a` is enabled.
    pub fn allows(&self, text: &str) -> bool {
        if self.hashes.is_empty() {
            return true;
        }

        let bytes = text.as_bytes();

        let mut end = None;
        for (i, &b) in bytes.iter().enumerate() {
            if b == b' ' {
                break;
            }
            if b == b'|' && i != 0 {
                end = Some(i);
                break;
            }
        }

        match end {
            // no tag: always shown
            None => true,
            Some(i) => self.hashes.contains(&fnv1a_32(&bytes[..i])),
        }
    }
}
