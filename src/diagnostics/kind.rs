//! Local diagnostic codes and their severities.

/// Severity, spelled like rustc's levels on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A report or cache entry was lost.
    Error,
    /// Something degraded but kept working.
    Warning,
    Note,
}

impl DiagnosticKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Note => "note",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A diagnostic about framediag itself, with code, message, and optional context.
///
/// These report the subsystem's own degradations; they never go through the
/// error reporting pipeline (which may be the very thing that is degrading).
///
/// Diagnostic codes follow the pattern:
/// - `FD1xx` - Activity log and tag filter
/// - `FD2xx` - Symbol cache
/// - `FD3xx` - Crash log
/// - `FD9xx` - Platform failures
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level.
    pub kind: DiagnosticKind,
    /// Diagnostic code (e.g., "FD101").
    pub code: &'static str,
    /// Primary message.
    pub message: &'static str,
    /// Optional additional context.
    pub note: Option<&'static str>,
    /// Optional fix suggestion.
    pub help: Option<&'static str>,
}

impl Diagnostic {
    const fn new(kind: DiagnosticKind, code: &'static str, message: &'static str) -> Self {
        Self { kind, code, message, note: None, help: None }
    }

    pub const fn error(code: &'static str, message: &'static str) -> Self {
        Self::new(DiagnosticKind::Error, code, message)
    }

    pub const fn warning(code: &'static str, message: &'static str) -> Self {
        Self::new(DiagnosticKind::Warning, code, message)
    }

    pub const fn with_note(self, note: &'static str) -> Self {
        Self { note: Some(note), ..self }
    }

    pub const fn with_help(self, help: &'static str) -> Self {
        Self { help: Some(help), ..self }
    }
}

// =============================================================================
// FD1xx - Activity log and tag filter
// =============================================================================

/// FD101: Tag filter is full.
pub const FD101: Diagnostic = Diagnostic::warning(
    "FD101",
    "too many debug output tags, tag not added"
).with_note("the tag filter has a fixed capacity and never grows")
 .with_help("increase max_tags in DiagConfig, or remove tags that are no longer needed");

/// FD102: Activity log line dropped.
pub const FD102: Diagnostic = Diagnostic::warning(
    "FD102",
    "activity log line could not be formatted and was dropped"
).with_note("a single line must fit in the space left after eviction")
 .with_help("keep log lines shorter than log_low_water, or raise it in DiagConfig");

// =============================================================================
// FD2xx - Symbol cache
// =============================================================================

/// FD201: Symbol arena could not be allocated.
pub const FD201: Diagnostic = Diagnostic::error(
    "FD201",
    "failed to allocate the symbol string arena"
).with_note("symbol descriptions cannot be produced without it");

/// FD202: Symbol table full.
pub const FD202: Diagnostic = Diagnostic::warning(
    "FD202",
    "symbol cache table is full, address not cached"
).with_note("the description is rebuilt on every request from now on")
 .with_help("increase symbol_capacity in DiagConfig");

/// FD203: Symbol arena exhausted.
pub const FD203: Diagnostic = Diagnostic::warning(
    "FD203",
    "symbol string arena exhausted, address not cached"
).with_help("increase arena_size in DiagConfig");

// =============================================================================
// FD3xx - Crash log
// =============================================================================

/// FD301: Crash log not writable.
pub const FD301: Diagnostic = Diagnostic::error(
    "FD301",
    "crash log could not be written"
).with_note("the error report is still displayed")
 .with_help("check that the log directory exists and is writable");

/// FD302: Bundled logs failed.
pub const FD302: Diagnostic = Diagnostic::warning(
    "FD302",
    "application log bundling failed while writing the crash log"
).with_note("the activity log tail is still written");

// =============================================================================
// FD9xx - Platform
// =============================================================================

/// FD901: The platform could not walk the call stack.
pub const FD901: Diagnostic = Diagnostic::error(
    "FD901",
    "call stack could not be captured"
).with_note("the report was written without the remaining frames")
 .with_help("check that debug info is available, or override Platform::capture_stack");
