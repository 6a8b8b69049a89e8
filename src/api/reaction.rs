//! Recovery directives, display flags and per-call-site suppression.

use std::ops::{BitOr, BitOrAssign};
use std::sync::atomic::{AtomicU8, Ordering};

/// What the user (or a hook) wants done about a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorReaction {
    /// Ignore the error and carry on.
    Continue,
    /// Break into the debugger.
    Break,
    /// Carry on and never report this call site again.
    Suppress,
    /// Terminate the process.
    Exit,
}

impl std::fmt::Display for ErrorReaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorReaction::Continue => "continue",
            ErrorReaction::Break => "break",
            ErrorReaction::Suppress => "suppress",
            ErrorReaction::Exit => "exit",
        };
        f.write_str(s)
    }
}

/// Flags passed to `display_error` and on to the display hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DisplayFlags(u32);

impl DisplayFlags {
    /// No flags.
    pub const NONE: Self = Self(0);

    /// The caller handles a "break" reaction itself, so that the debugger
    /// stops in the caller's frame rather than inside the pipeline.
    pub const MANUAL_BREAK: Self = Self(1 << 0);

    /// Offer a "suppress" choice. Set automatically when a suppress flag is
    /// supplied.
    pub const ALLOW_SUPPRESS: Self = Self(1 << 1);

    /// Raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for DisplayFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DisplayFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Per-call-site suppression state.
///
/// Usually a `static` next to the call site (the `diag_*` macros declare one
/// each). Once armed, reports through this flag return
/// [`ErrorReaction::Continue`] without doing anything.
#[derive(Debug, Default)]
pub struct SuppressFlag(AtomicU8);

impl SuppressFlag {
    /// Value stored in an armed flag.
    pub const SUPPRESSED: u8 = 0xAB;

    /// Create an unarmed flag.
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// Whether the flag is armed.
    pub fn is_armed(&self) -> bool {
        self.0.load(Ordering::Relaxed) == Self::SUPPRESSED
    }

    /// Arm the flag.
    pub fn arm(&self) {
        self.0.store(Self::SUPPRESSED, Ordering::Relaxed);
    }

    /// Disarm the flag.
    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}
