//! Symbol string cache - code address to description string.
//!
//! Call stacks repeat the same addresses over and over, so each description
//! is built once and kept for the rest of the process:
//!
//! - [`StringArena`] is one fixed block obtained with a fallible allocation
//!   and then leaked. Strings are pushed and never moved, overwritten or
//!   freed, which is what makes handing out `&'static str` sound.
//! - [`SymbolCache`] is a fixed-size open-addressed table of
//!   `(address, &'static str)` with linear probing. Entries are never
//!   removed, so there are no tombstones. Once full it stops admitting
//!   entries; lookups of existing ones keep working.

use std::fmt::{self, Write};

use crate::util::demangle::simplify_name;
use crate::util::size::format_bytes;
use crate::util::text::{base_name, truncate_at_boundary};

/// Errors returned by the symbol cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolError {
    /// Memory for the string arena or the table could not be obtained.
    OutOfMemory,
}

impl std::fmt::Display for SymbolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolError::OutOfMemory => write!(f, "insufficient memory for the symbol cache"),
        }
    }
}

impl std::error::Error for SymbolError {}

/// Push-only string storage with process lifetime.
pub struct StringArena {
    /// The unused tail of the leaked block
    free: &'static mut [u8],

    /// Total size of the block
    capacity: usize,

    /// Space that must remain for a request to be accepted
    max_string_len: usize,
}

impl StringArena {
    /// Allocate and leak a block of `capacity` bytes.
    ///
    /// Returns `None` if the allocation fails.
    pub fn try_new(capacity: usize, max_string_len: usize) -> Option<Self> {
        let mut block = Vec::new();
        block.try_reserve_exact(capacity).ok()?;
        block.resize(capacity, 0u8);

        Some(Self {
            free: Box::leak(block.into_boxed_slice()),
            capacity,
            max_string_len,
        })
    }

    /// Copy `s` into the arena.
    ///
    /// Refused (`None`) once fewer than `max_string_len` bytes remain, so an
    /// accepted request never fails half-way.
    pub fn alloc(&mut self, s: &str) -> Option<&'static str> {
        if self.used() + self.max_string_len > self.capacity || s.len() > self.free.len() {
            return None;
        }

        let free = std::mem::take(&mut self.free);
        let (head, tail) = free.split_at_mut(s.len());
        head.copy_from_slice(s.as_bytes());
        self.free = tail;

        let head: &'static [u8] = head;
        std::str::from_utf8(head).ok()
    }

    /// Bytes handed out so far.
    pub fn used(&self) -> usize {
        self.capacity - self.free.len()
    }
}

/// One table slot; empty while `address == 0`.
#[derive(Clone, Copy)]
struct Slot {
    address: usize,
    string: &'static str,
}

impl Slot {
    const EMPTY: Slot = Slot { address: 0, string: "" };
}

/// Result of [`SymbolCache::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored; this is the arena copy.
    Cached(&'static str),
    /// Another caller stored this address first; this is its string.
    Existing(&'static str),
    /// The table reached capacity.
    TableFull,
    /// The arena has no room left.
    ArenaFull,
}

/// Counters describing how well the cache is doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolCacheStats {
    /// Addresses stored.
    pub entries: usize,
    /// Table slots.
    pub capacity: usize,
    /// Extra probes taken on insertion due to collisions.
    pub probe_jumps: u64,
    /// Inserts refused because the table was full.
    pub rejected_inserts: u64,
    /// Inserts refused because the arena was full.
    pub arena_refusals: u64,
    /// Arena bytes in use.
    pub arena_used: usize,
    /// Arena size.
    pub arena_capacity: usize,
}

impl SymbolCacheStats {
    /// Whether some addresses can no longer be cached.
    pub fn is_degraded(&self) -> bool {
        self.rejected_inserts > 0 || self.arena_refusals > 0
    }
}

impl fmt::Display for SymbolCacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} symbols, arena {} of {}, {} probe jumps",
            self.entries,
            self.capacity,
            format_bytes(self.arena_used),
            format_bytes(self.arena_capacity),
            self.probe_jumps
        )?;
        if self.is_degraded() {
            write!(
                f,
                " ({} rejected, {} arena refusals)",
                self.rejected_inserts, self.arena_refusals
            )?;
        }
        Ok(())
    }
}

/// Fixed-capacity address to string table backed by a [`StringArena`].
pub struct SymbolCache {
    slots: Option<Box<[Slot]>>,
    capacity: usize,
    entries: usize,
    arena: Option<StringArena>,
    arena_size: usize,
    max_string_len: usize,
    probe_jumps: u64,
    rejected_inserts: u64,
    arena_refusals: u64,
}

impl SymbolCache {
    /// Create an empty cache. Nothing is allocated until the first insert.
    pub fn new(capacity: usize, arena_size: usize, max_string_len: usize) -> Self {
        Self {
            slots: None,
            capacity: capacity.max(1),
            entries: 0,
            arena: None,
            arena_size,
            max_string_len,
            probe_jumps: 0,
            rejected_inserts: 0,
            arena_refusals: 0,
        }
    }

    /// Home slot of an address.
    ///
    /// The low two bits are dropped: distinct symbols are practically never
    /// closer than four bytes.
    #[inline]
    fn home(&self, address: usize) -> usize {
        (address >> 2) % self.capacity
    }

    /// Find the cached description of `address`.
    pub fn lookup(&self, address: usize) -> Option<&'static str> {
        if address == 0 {
            return None;
        }
        let slots = self.slots.as_ref()?;

        let mut idx = self.home(address);
        // bounded: a completely full table has no empty slot to stop at
        for _ in 0..self.capacity {
            let slot = &slots[idx];
            if slot.address == 0 {
                return None;
            }
            if slot.address == address {
                return Some(slot.string);
            }
            idx = (idx + 1) % self.capacity;
        }
        None
    }

    /// Store `text` as the description of `address`.
    ///
    /// `address` must not be 0, which marks empty slots.
    pub fn insert(&mut self, address: usize, text: &str) -> Result<InsertOutcome, SymbolError> {
        debug_assert!(address != 0);

        self.ensure_allocated()?;

        if let Some(existing) = self.lookup(address) {
            return Ok(InsertOutcome::Existing(existing));
        }

        if self.entries >= self.capacity {
            self.rejected_inserts += 1;
            return Ok(InsertOutcome::TableFull);
        }

        let string = match self.arena.as_mut().and_then(|arena| arena.alloc(text)) {
            Some(string) => string,
            None => {
                self.arena_refusals += 1;
                return Ok(InsertOutcome::ArenaFull);
            }
        };

        let capacity = self.capacity;
        let mut idx = self.home(address);
        let mut jumps = 0;
        let slots = self.slots.as_mut().ok_or(SymbolError::OutOfMemory)?;
        // entries < capacity, so an empty slot exists
        while slots[idx].address != 0 {
            idx = (idx + 1) % capacity;
            jumps += 1;
        }
        slots[idx] = Slot { address, string };

        self.entries += 1;
        self.probe_jumps += jumps;
        Ok(InsertOutcome::Cached(string))
    }

    fn ensure_allocated(&mut self) -> Result<(), SymbolError> {
        if self.arena.is_none() {
            let arena = StringArena::try_new(self.arena_size, self.max_string_len)
                .ok_or(SymbolError::OutOfMemory)?;
            self.arena = Some(arena);
        }

        if self.slots.is_none() {
            let mut slots = Vec::new();
            slots
                .try_reserve_exact(self.capacity)
                .map_err(|_| SymbolError::OutOfMemory)?;
            slots.resize(self.capacity, Slot::EMPTY);
            self.slots = Some(slots.into_boxed_slice());
        }

        Ok(())
    }

    /// Current statistics.
    pub fn stats(&self) -> SymbolCacheStats {
        SymbolCacheStats {
            entries: self.entries,
            capacity: self.capacity,
            probe_jumps: self.probe_jumps,
            rejected_inserts: self.rejected_inserts,
            arena_refusals: self.arena_refusals,
            arena_used: self.arena.as_ref().map_or(0, StringArena::used),
            arena_capacity: self.arena_size,
        }
    }

    /// Longest description stored, in bytes (including room for a terminator).
    pub fn max_string_len(&self) -> usize {
        self.max_string_len
    }
}

/// Build the description of a code address.
///
/// With file and line: `"<basename>:<line:05> <name>"`, otherwise
/// `"<0xaddress> <name>"`. The result is cut to `max_len - 1` bytes.
pub fn describe_symbol(
    address: usize,
    name: Option<&str>,
    file: Option<&str>,
    line: Option<u32>,
    max_len: usize,
) -> String {
    let mut out = String::with_capacity(64);

    let _ = match (file, line) {
        (Some(file), Some(line)) if !file.is_empty() && line != 0 => {
            write!(out, "{}:{:05}", base_name(file), line)
        }
        _ => write!(out, "{:#x}", address),
    };

    if let Some(name) = name.filter(|n| !n.is_empty()) {
        out.push(' ');
        out.push_str(&simplify_name(name));
    }

    let keep = truncate_at_boundary(&out, max_len.saturating_sub(1)).len();
    out.truncate(keep);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_strings_are_stable() {
        let mut arena = StringArena::try_new(256, 32).unwrap();
        let a = arena.alloc("first").unwrap();
        let b = arena.alloc("second").unwrap();

        assert_eq!(a, "first");
        assert_eq!(b, "second");
        assert_eq!(arena.used(), 11);
        // `a` is untouched by later allocations
        assert_eq!(a, "first");
    }

    #[test]
    fn test_arena_refuses_near_end() {
        let mut arena = StringArena::try_new(64, 32).unwrap();
        assert!(arena.alloc(&"a".repeat(20)).is_some());
        assert!(arena.alloc(&"b".repeat(12)).is_some());
        // 32 used, 32 left: still exactly enough
        assert!(arena.alloc("c").is_some());
        // 33 used: fewer than max_string_len remain
        assert!(arena.alloc("d").is_none());
    }

    #[test]
    fn test_lookup_before_any_insert() {
        let cache = SymbolCache::new(16, 1024, 100);
        assert_eq!(cache.lookup(0x1000), None);
        assert_eq!(cache.stats().arena_used, 0);
    }

    #[test]
    fn test_insert_and_lookup_same_pointer() {
        let mut cache = SymbolCache::new(16, 1024, 100);
        let stored = match cache.insert(0x4000, "main.rs:00010 main").unwrap() {
            InsertOutcome::Cached(s) => s,
            other => panic!("unexpected {:?}", other),
        };
        let found = cache.lookup(0x4000).unwrap();
        assert!(std::ptr::eq(stored, found));
    }

    #[test]
    fn test_collisions_probe_linearly() {
        let mut cache = SymbolCache::new(8, 1024, 100);
        // 0x20 >> 2 = 8 -> slot 0; 0x40 >> 2 = 16 -> slot 0 as well
        cache.insert(0x20, "a").unwrap();
        cache.insert(0x40, "b").unwrap();
        cache.insert(0x60, "c").unwrap();

        assert_eq!(cache.lookup(0x20), Some("a"));
        assert_eq!(cache.lookup(0x40), Some("b"));
        assert_eq!(cache.lookup(0x60), Some("c"));
        assert_eq!(cache.stats().probe_jumps, 1 + 2);
    }

    #[test]
    fn test_wraparound() {
        let mut cache = SymbolCache::new(4, 1024, 100);
        // home slot 3 for both
        cache.insert(3 << 2, "x").unwrap();
        cache.insert(7 << 2, "y").unwrap();
        assert_eq!(cache.lookup(7 << 2), Some("y"));
    }

    #[test]
    fn test_full_table_keeps_existing_entries() {
        let mut cache = SymbolCache::new(4, 4096, 64);
        for i in 1..=4usize {
            let out = cache.insert(i << 2, &format!("sym{}", i)).unwrap();
            assert!(matches!(out, InsertOutcome::Cached(_)));
        }

        assert_eq!(cache.insert(99 << 2, "late").unwrap(), InsertOutcome::TableFull);
        assert_eq!(cache.stats().rejected_inserts, 1);
        assert!(cache.stats().is_degraded());

        for i in 1..=4usize {
            assert_eq!(cache.lookup(i << 2), Some(format!("sym{}", i).as_str()));
        }
        // absent address in a packed table terminates
        assert_eq!(cache.lookup(99 << 2), None);
    }

    #[test]
    fn test_existing_is_reported() {
        let mut cache = SymbolCache::new(8, 1024, 100);
        cache.insert(0x100, "one").unwrap();
        assert_eq!(cache.insert(0x100, "two").unwrap(), InsertOutcome::Existing("one"));
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn test_arena_full() {
        let mut cache = SymbolCache::new(64, 128, 100);
        assert!(matches!(cache.insert(0x10, "abc").unwrap(), InsertOutcome::Cached(_)));
        // 3 used + 100 > 128 is false, so still room
        assert!(matches!(cache.insert(0x20, &"d".repeat(30)).unwrap(), InsertOutcome::Cached(_)));
        // 33 + 100 > 128
        assert_eq!(cache.insert(0x30, "e").unwrap(), InsertOutcome::ArenaFull);
        assert_eq!(cache.stats().arena_refusals, 1);
    }

    #[test]
    fn test_stats_display() {
        let mut cache = SymbolCache::new(1, 4096, 100);
        cache.insert(0x10, "first").unwrap();
        assert_eq!(cache.stats().to_string(), "1/1 symbols, arena 5 B of 4 KiB, 0 probe jumps");

        cache.insert(0x20, "second").unwrap();
        assert!(cache.stats().to_string().ends_with("(1 rejected, 0 arena refusals)"));
    }

    #[test]
    fn test_describe_with_file_and_line() {
        let s = describe_symbol(
            0x1234,
            Some("game::update::h0123456789abcdef"),
            Some("/src/game/update.rs"),
            Some(42),
            1000,
        );
        assert_eq!(s, "update.rs:00042 game::update");
    }

    #[test]
    fn test_describe_address_only() {
        assert_eq!(describe_symbol(0xdead_beef, Some("f"), None, None, 1000), "0xdeadbeef f");
        assert_eq!(describe_symbol(0x10, None, Some("a.rs"), None, 1000), "0x10");
        assert_eq!(describe_symbol(0x10, None, Some("a.rs"), Some(0), 1000), "0x10");
    }

    #[test]
    fn test_describe_truncates() {
        let long = "n".repeat(5000);
        let s = describe_symbol(0x10, Some(&long), None, None, 1000);
        assert_eq!(s.len(), 999);
    }
}
