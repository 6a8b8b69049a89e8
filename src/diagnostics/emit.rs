//! Where local diagnostics go.
//!
//! [`emit`] is the process-wide backend: stderr in debug builds (or with
//! the `diagnostics` feature) plus the `log` crate. A [`Diagnostics`]
//! context sends through its own [`DiagnosticSink`], which defaults to
//! [`StderrSink`] and so ends up here.
//!
//! [`Diagnostics`]: crate::Diagnostics

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};

use super::kind::{Diagnostic, DiagnosticKind};
use super::strict::{strict_mode, StrictMode};
use crate::sync::mutex::Mutex;

static QUIET: AtomicBool = AtomicBool::new(false);

thread_local! {
    static PIPELINE_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Marks the calling thread as inside the error pipeline until dropped.
///
/// Strict mode does not panic there: the report being built has to reach
/// the user, so its degradations are only reported.
pub(crate) struct PipelineScope(());

impl PipelineScope {
    pub(crate) fn enter() -> Self {
        PIPELINE_DEPTH.with(|d| d.set(d.get() + 1));
        PipelineScope(())
    }
}

impl Drop for PipelineScope {
    fn drop(&mut self) {
        PIPELINE_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

fn in_pipeline() -> bool {
    PIPELINE_DEPTH.with(|d| d.get() > 0)
}

fn panics_under(mode: StrictMode, kind: DiagnosticKind) -> bool {
    mode.is_fatal(kind) && !in_pipeline()
}

/// Silence the stderr/log backend, e.g. in tests that provoke diagnostics
/// on purpose. Strict mode still applies.
pub fn suppress_diagnostics(suppress: bool) {
    QUIET.store(suppress, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Report `diag` through the process-wide backend.
pub fn emit(diag: &Diagnostic) {
    dispatch(diag, None);
}

/// Like [`emit`], with a runtime detail such as the offending tag or path.
pub fn emit_with_context(diag: &Diagnostic, context: &str) {
    dispatch(diag, Some(context));
}

fn dispatch(diag: &Diagnostic, context: Option<&str>) {
    if !is_quiet() {
        #[cfg(any(debug_assertions, feature = "diagnostics"))]
        eprint!("{}", render(diag, context));

        #[cfg(feature = "log")]
        forward_to_log(diag, context);
    }

    if panics_under(strict_mode(), diag.kind) {
        panic!("[framediag][{}] {} (strict mode)", diag.code, diag.message);
    }
}

/// Multi-line stderr form:
///
/// ```text
/// [framediag][FD202] warning: symbol table full
///   context: 0x7ff6a0
///   note: ...
/// ```
#[cfg(any(debug_assertions, feature = "diagnostics", test))]
fn render(diag: &Diagnostic, context: Option<&str>) -> String {
    let mut out = format!("[framediag][{}] {}: {}\n", diag.code, diag.kind, diag.message);
    let extra = [("context", context), ("note", diag.note), ("help", diag.help)];
    for (label, text) in extra {
        if let Some(text) = text {
            out.push_str(&format!("  {}: {}\n", label, text));
        }
    }
    out
}

#[cfg(feature = "log")]
fn forward_to_log(diag: &Diagnostic, context: Option<&str>) {
    let level = match diag.kind {
        DiagnosticKind::Error => log::Level::Error,
        DiagnosticKind::Warning => log::Level::Warn,
        DiagnosticKind::Note => log::Level::Info,
    };
    match context {
        Some(context) => log::log!(
            target: "framediag",
            level,
            "[{}] {}: {}",
            diag.code,
            diag.message,
            context
        ),
        None => {
            log::log!(target: "framediag", level, "[{}] {}", diag.code, diag.message)
        }
    }
}

/// Receives the local diagnostics of one [`Diagnostics`](crate::Diagnostics) context.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diag: &Diagnostic);

    /// The context string is dropped unless overridden.
    fn emit_with_context(&self, diag: &Diagnostic, _context: &str) {
        self.emit(diag);
    }
}

/// Forwards to [`emit`] / [`emit_with_context`].
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn emit(&self, diag: &Diagnostic) {
        emit(diag);
    }

    fn emit_with_context(&self, diag: &Diagnostic, context: &str) {
        emit_with_context(diag, context);
    }
}

/// Keeps every diagnostic it receives, for assertions in tests.
#[derive(Default)]
pub struct CollectingSink {
    seen: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, oldest first.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.seen.lock().clone()
    }

    /// Just the codes, oldest first.
    pub fn codes(&self) -> Vec<&'static str> {
        self.seen.lock().iter().map(|d| d.code).collect()
    }

    pub fn clear(&self) {
        self.seen.lock().clear();
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diag: &Diagnostic) {
        self.seen.lock().push(diag.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::kind::{FD101, FD202, FD301};

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.emit(&FD101);
        sink.emit_with_context(&FD202, "0x10");

        assert_eq!(sink.codes(), vec!["FD101", "FD202"]);

        sink.clear();
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn test_strict_mode_spares_the_pipeline() {
        assert!(panics_under(StrictMode::PanicOnError, DiagnosticKind::Error));
        {
            let _outer = PipelineScope::enter();
            let _nested = PipelineScope::enter();
            assert!(!panics_under(StrictMode::PanicOnWarning, DiagnosticKind::Error));
        }
        assert!(panics_under(StrictMode::PanicOnError, DiagnosticKind::Error));
        assert!(!panics_under(StrictMode::Warn, DiagnosticKind::Error));
    }

    #[test]
    fn test_render_includes_context_and_help() {
        let text = render(&FD301, Some("/tmp/x/crashlog.txt"));
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("[framediag][FD301] error: crash log could not be written")
        );
        assert_eq!(lines.next(), Some("  context: /tmp/x/crashlog.txt"));
        assert!(text.ends_with('\n'));
    }
}
