//! Strict mode: turning local diagnostics into panics.
//!
//! framediag degrades quietly by design of its callers: a full symbol
//! table or an unwritable crash log only produce a diagnostic. In CI that
//! is usually too quiet, so `FRAMEDIAG_STRICT` (or [`set_strict_mode`])
//! makes them fatal.

use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use super::kind::DiagnosticKind;

/// How local diagnostics are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum StrictMode {
    /// Report and carry on.
    #[default]
    Warn = 0,
    /// Panic on `FD` errors, report warnings.
    PanicOnError = 1,
    /// Panic on `FD` errors and warnings.
    PanicOnWarning = 2,
}

impl StrictMode {
    const fn from_bits(bits: u8) -> Self {
        match bits {
            1 => StrictMode::PanicOnError,
            2 => StrictMode::PanicOnWarning,
            _ => StrictMode::Warn,
        }
    }

    /// Whether a diagnostic of `kind` panics under this mode.
    pub const fn is_fatal(self, kind: DiagnosticKind) -> bool {
        match kind {
            DiagnosticKind::Error => !matches!(self, StrictMode::Warn),
            DiagnosticKind::Warning => matches!(self, StrictMode::PanicOnWarning),
            DiagnosticKind::Note => false,
        }
    }
}

/// Unrecognized `FRAMEDIAG_STRICT` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStrictModeError(String);

impl std::fmt::Display for ParseStrictModeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown strict mode {:?} (expected warn, error or warning)", self.0)
    }
}

impl std::error::Error for ParseStrictModeError {}

impl FromStr for StrictMode {
    type Err = ParseStrictModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "warn" | "false" | "" => Ok(StrictMode::Warn),
            "1" | "error" | "true" => Ok(StrictMode::PanicOnError),
            "2" | "warning" | "all" => Ok(StrictMode::PanicOnWarning),
            _ => Err(ParseStrictModeError(s.to_string())),
        }
    }
}

static STRICT_MODE: AtomicU8 = AtomicU8::new(StrictMode::Warn as u8);

/// Set the process-wide strict mode.
pub fn set_strict_mode(mode: StrictMode) {
    STRICT_MODE.store(mode as u8, Ordering::Relaxed);
}

/// The process-wide strict mode.
pub fn strict_mode() -> StrictMode {
    StrictMode::from_bits(STRICT_MODE.load(Ordering::Relaxed))
}

/// Restores the previous strict mode when dropped.
pub struct StrictModeGuard {
    previous: StrictMode,
}

impl StrictModeGuard {
    /// Switch to `mode` until the guard is dropped.
    pub fn new(mode: StrictMode) -> Self {
        let previous = strict_mode();
        set_strict_mode(mode);
        Self { previous }
    }
}

impl Drop for StrictModeGuard {
    fn drop(&mut self) {
        set_strict_mode(self.previous);
    }
}

/// Read `FRAMEDIAG_STRICT` (`warn`, `error` or `warning`).
///
/// An unknown value leaves the mode alone and is reported on stderr.
pub fn init_from_env() {
    let Ok(val) = std::env::var("FRAMEDIAG_STRICT") else {
        return;
    };
    match val.parse() {
        Ok(mode) => set_strict_mode(mode),
        Err(err) => eprintln!("[framediag] FRAMEDIAG_STRICT ignored: {}", err),
    }
}
