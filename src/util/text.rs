//! Small text helpers shared by the log, the symbol cache and the reporter.

/// Strip directory components from a source path.
///
/// Both separators are honoured since `file!()` of a crate built on
/// Windows uses backslashes.
pub fn base_name(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Largest prefix of `s` no longer than `max` bytes that ends on a char boundary.
pub fn truncate_at_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// 32-bit FNV-1a.
///
/// Deterministic across runs, unlike the std hasher.
#[inline]
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut h: u32 = 0x811c_9dc5;
    for &b in bytes {
        h ^= b as u32;
        h = h.wrapping_mul(0x0100_0193);
    }
    h
}
