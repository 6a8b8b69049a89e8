//! Bounded text buffers for composing messages without allocating.
//!
//! Error reports may be generated because the heap is corrupt, so the
//! message buffer is acquired with a fallible heap allocation first and a
//! fixed stack array second. Both are written through [`BoundedWriter`],
//! which never grows its backing slice.

use std::fmt;

use crate::util::size::kb;

/// Size of the stack fallback used when the heap buffer cannot be obtained.
///
/// Comfortably below the 2 MiB default stack of spawned threads.
pub const STACK_MESSAGE_SIZE: usize = kb(128);

/// `fmt::Write` over a fixed byte slice.
///
/// A write that does not fit stores the longest prefix ending on a char
/// boundary and fails; the text written so far stays valid UTF-8.
pub struct BoundedWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> BoundedWriter<'a> {
    /// Create a writer over `buf`, starting empty.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.len
    }

    /// Discard everything written after `len`.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
        }
    }

    /// The text written so far.
    pub fn as_str(&self) -> &str {
        // only whole `str` prefixes ending on char boundaries are ever copied in
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }
}

impl fmt::Write for BoundedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.remaining();
        let fitted = crate::util::text::truncate_at_boundary(s, room);
        self.buf[self.len..self.len + fitted.len()].copy_from_slice(fitted.as_bytes());
        self.len += fitted.len();

        if fitted.len() == s.len() {
            Ok(())
        } else {
            Err(fmt::Error)
        }
    }
}

/// Try to obtain a zeroed heap buffer of `size` bytes without aborting on OOM.
///
/// Returns `None` if `size` is zero or the allocation fails.
pub fn try_heap_buffer(size: usize) -> Option<Vec<u8>> {
    if size == 0 {
        return None;
    }
    let mut buf = Vec::new();
    buf.try_reserve_exact(size).ok()?;
    // capacity is already there, this does not reallocate
    buf.resize(size, 0);
    Some(buf)
}

/// Run `f` with a stack-allocated buffer of [`STACK_MESSAGE_SIZE`] bytes.
///
/// Kept out of line so callers that never need the fallback do not pay for
/// the array in their own frame.
#[inline(never)]
pub fn with_stack_buffer<R>(f: impl FnOnce(&mut [u8]) -> R) -> R {
    let mut buf = [0u8; STACK_MESSAGE_SIZE];
    f(&mut buf)
}
