//! Byte sizes for buffer configuration and stats output.

/// `n` KiB in bytes.
#[inline]
pub const fn kb(n: usize) -> usize {
    n * 1024
}

/// Short size for stats lines: whole KiB/MiB when exact, one decimal
/// otherwise, plain bytes below 1 KiB.
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [(usize, &str); 2] = [(1024 * 1024, "MiB"), (1024, "KiB")];

    for (size, unit) in UNITS {
        if bytes >= size {
            return if bytes % size == 0 {
                format!("{} {}", bytes / size, unit)
            } else {
                format!("{:.1} {}", bytes as f64 / size as f64, unit)
            };
        }
    }
    format!("{} B", bytes)
}
