//! The process-wide diagnostics context.
//!
//! The free functions at the crate root (and the `diag_*` macros) all go
//! through one lazily created [`Diagnostics`]. Install a configured one at
//! startup with [`install`]; otherwise the first use creates a default one
//! from the environment.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::api::config::DiagConfig;
use crate::api::context::Diagnostics;
use crate::api::error_code::ErrorCode;
use crate::api::platform::StackContext;
use crate::api::reaction::{DisplayFlags, ErrorReaction, SuppressFlag};
use crate::api::report::{CrashLogError, SourceLocation};
use crate::api::thread_name::ThreadName;
use crate::core::symbols::SymbolError;
use crate::diagnostics::strict;

static GLOBAL: OnceLock<Diagnostics> = OnceLock::new();

/// The process-wide context, created on first use.
pub fn global() -> &'static Diagnostics {
    GLOBAL.get_or_init(|| {
        strict::init_from_env();
        Diagnostics::new(DiagConfig::from_env())
    })
}

/// Make `diag` the process-wide context.
///
/// Fails (returning `diag`) if the global context already exists, either
/// from an earlier `install` or because something was reported first.
pub fn install(diag: Diagnostics) -> Result<(), Diagnostics> {
    strict::init_from_env();
    GLOBAL.set(diag)
}

/// Append a line to the activity log. See [`diag_log!`](crate::diag_log).
pub fn log_append(args: fmt::Arguments<'_>) {
    global().log_append(args);
}

/// Enable output of messages tagged `tag`.
pub fn filter_add(tag: &str) {
    global().filter_add(tag);
}

/// Disable output of messages tagged `tag`.
pub fn filter_remove(tag: &str) -> bool {
    global().filter_remove(tag)
}

/// Disable every tag.
pub fn filter_clear() {
    global().filter_clear();
}

/// Print through the tag filter. See [`diag_print!`](crate::diag_print).
pub fn debug_print(args: fmt::Arguments<'_>) {
    global().debug_print(args);
}

/// Human-readable description of a code address.
pub fn get_symbol_string(
    address: usize,
    name: Option<&str>,
    file: Option<&str>,
    line: Option<u32>,
) -> Result<Cow<'static, str>, SymbolError> {
    global().get_symbol_string(address, name, file, line)
}

/// Name the calling thread.
pub fn set_thread_name(name: impl Into<ThreadName>) {
    global().set_thread_name(name);
}

/// The calling thread's name, if one was set.
pub fn get_thread_name() -> Option<ThreadName> {
    global().get_thread_name()
}

/// Report an error. See [`Diagnostics::display_error`].
pub fn display_error(
    description: &str,
    flags: DisplayFlags,
    skip_frames: usize,
    context: Option<&StackContext>,
    location: SourceLocation<'_>,
    suppress: Option<&SuppressFlag>,
) -> ErrorReaction {
    global().display_error(description, flags, skip_frames, context, location, suppress)
}

/// Report a failed assertion. See [`diag_assert!`](crate::diag_assert).
pub fn assertion_failed(
    expr: &str,
    suppress: Option<&SuppressFlag>,
    file: &str,
    line: u32,
    func: &str,
) -> ErrorReaction {
    global().assertion_failed(expr, suppress, file, line, func)
}

/// Report a failure code. See [`diag_warn_err!`](crate::diag_warn_err).
pub fn operation_failed(
    code: ErrorCode,
    suppress: Option<&SuppressFlag>,
    file: &str,
    line: u32,
    func: &str,
) -> ErrorReaction {
    global().operation_failed(code, suppress, file, line, func)
}

/// Report a warning. See [`diag_warn!`](crate::diag_warn).
pub fn warn(
    text: &str,
    suppress: Option<&SuppressFlag>,
    file: &str,
    line: u32,
    func: &str,
) -> ErrorReaction {
    global().warn(text, suppress, file, line, func)
}

/// Show an informational message.
pub fn display_message(caption: &str, text: &str) {
    global().display_message(caption, text);
}

/// Write the crash log.
pub fn write_crash_log(text: &str) -> Result<PathBuf, CrashLogError> {
    global().write_crash_log(text)
}

/// Trap into an attached debugger.
pub fn debug_break() {
    global().inner.platform.debug_break();
}

/// Release per-thread storage of the global context.
pub fn shutdown() {
    if let Some(diag) = GLOBAL.get() {
        diag.shutdown();
    }
}
