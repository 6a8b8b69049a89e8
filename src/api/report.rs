//! The error reporting pipeline.
//!
//! An error report goes through these steps:
//!
//! 1. Suppressed call sites (and everything after an "exit") return at once
//! 2. The location line goes to the activity log and the output channel
//! 3. A message buffer is acquired: heap first, stack if the heap fails
//! 4. The message is built with a call stack, unless this report is nested
//!    inside another one, which gets a fixed notice instead
//! 5. The message is saved to the crash log (outermost reports only)
//! 6. The application or platform dialog decides what happens next
//!
//! Nothing here returns an error to the caller. Failures along the way
//! degrade the report and show up as local diagnostics.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write as _};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use crate::api::context::Diagnostics;
use crate::api::error_code::ErrorCode;
use crate::api::platform::StackContext;
use crate::api::reaction::{DisplayFlags, ErrorReaction, SuppressFlag};
use crate::core::message::{try_heap_buffer, with_stack_buffer, BoundedWriter};
use crate::diagnostics::emit::PipelineScope;
use crate::diagnostics::kind::{FD301, FD302, FD901};
use crate::sync::counter::EventCounter;
use crate::util::text::base_name;

/// Shown when the message buffer has no room at all.
pub const INSUFFICIENT_MEMORY_MESSAGE: &str = "(insufficient memory to generate error message)";

/// Shown when the message header does not fit the buffer.
pub const FORMAT_ERROR_MESSAGE: &str = "(error while formatting error message)";

/// Replaces the call stack of a report raised while another is being built.
pub const NESTED_TRACE_NOTICE: &str = "(cannot start a nested stack trace; what probably \
    happened is that an assertion or error report fired during the current trace.)";

const CRASH_LOG_SEPARATOR: &str = "\n\n====================================\n\n";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Where a report was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation<'a> {
    /// Source file, usually `file!()`.
    pub file: &'a str,
    /// Line number.
    pub line: u32,
    /// Function or module, usually `module_path!()`.
    pub func: &'a str,
}

impl<'a> SourceLocation<'a> {
    /// Create a location.
    pub const fn new(file: &'a str, line: u32, func: &'a str) -> Self {
        Self { file, line, func }
    }
}

/// Error writing the crash log.
#[derive(Debug)]
pub enum CrashLogError {
    /// The file could not be created.
    FileAccess {
        /// Crash log path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Writing to the open file failed.
    Write {
        /// Crash log path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}

impl std::fmt::Display for CrashLogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrashLogError::FileAccess { path, source } => {
                write!(f, "cannot create crash log {}: {}", path.display(), source)
            }
            CrashLogError::Write { path, source } => {
                write!(f, "error writing crash log {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for CrashLogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CrashLogError::FileAccess { source, .. } | CrashLogError::Write { source, .. } => {
                Some(source)
            }
        }
    }
}

/// Live pipeline counters.
#[derive(Default)]
pub(crate) struct ReportCounters {
    reports: EventCounter,
    nested: EventCounter,
    suppressed: EventCounter,
    crash_logs_written: EventCounter,
    crash_log_failures: EventCounter,
}

/// Snapshot of pipeline activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Reports that got past the suppression check.
    pub reports: u64,
    /// Reports raised while another report was being built.
    pub nested: u64,
    /// Reports skipped because of a suppress flag or a pending exit.
    pub suppressed: u64,
    /// Crash logs written.
    pub crash_logs_written: u64,
    /// Crash logs that could not be written.
    pub crash_log_failures: u64,
}

impl Diagnostics {
    /// Report an error and carry out the reaction chosen for it.
    ///
    /// - `flags`: see [`DisplayFlags`]. With `MANUAL_BREAK`, a "break" is
    ///   returned to the caller instead of being carried out here.
    /// - `skip_frames`: innermost call stack frames to leave out.
    /// - `context`: register state to walk the stack from, e.g. in a fault
    ///   handler. `None` walks the current stack.
    /// - `suppress`: the call site's flag. Choosing "suppress" arms it, and
    ///   an armed flag makes this call return immediately.
    ///
    /// Returns [`ErrorReaction::Continue`] or, with `MANUAL_BREAK`,
    /// [`ErrorReaction::Break`]. An "exit" reaction does not return.
    pub fn display_error(
        &self,
        description: &str,
        mut flags: DisplayFlags,
        skip_frames: usize,
        context: Option<&StackContext>,
        location: SourceLocation<'_>,
        suppress: Option<&SuppressFlag>,
    ) -> ErrorReaction {
        let counters = &self.inner.counters;

        if suppress.is_some_and(SuppressFlag::is_armed) || self.is_exit_requested() {
            counters.suppressed.bump();
            return ErrorReaction::Continue;
        }
        counters.reports.bump();
        let _scope = PipelineScope::enter();

        let description = self.inner.hooks.translate(description);
        if suppress.is_some() {
            flags |= DisplayFlags::ALLOW_SUPPRESS;
        }
        let file = if location.file.is_empty() {
            "unknown"
        } else {
            base_name(location.file)
        };
        let func = if location.func.is_empty() { "?" } else { location.func };
        let location = SourceLocation::new(file, location.line, func);

        self.log_append(format_args!("{}({}): {}", file, location.line, description));
        self.debug_print(format_args!("{}({}): {}\n", file, location.line, description));

        let skip = skip_frames.saturating_add(usize::from(context.is_none()));
        let reaction = match try_heap_buffer(self.inner.config.message_buffer_size) {
            Some(mut buf) => {
                self.report_into(&mut buf, &description, flags, skip, context, location)
            }
            None => with_stack_buffer(|buf| {
                self.report_into(buf, &description, flags, skip, context, location)
            }),
        };

        self.carry_out(reaction, flags, suppress)
    }

    /// Build, persist and display one report in `buf`.
    ///
    /// The latch is held until the dialog returns, so reports raised by the
    /// stack walker, the crash log writer or a dialog are all nested.
    pub(crate) fn report_into(
        &self,
        buf: &mut [u8],
        description: &str,
        flags: DisplayFlags,
        skip: usize,
        context: Option<&StackContext>,
        location: SourceLocation<'_>,
    ) -> ErrorReaction {
        if buf.is_empty() {
            return self.show(INSUFFICIENT_MEMORY_MESSAGE, flags);
        }

        let guard = self.inner.latch.try_claim();
        let nested = guard.is_none();
        if nested {
            self.inner.counters.nested.bump();
        }

        let mut w = BoundedWriter::new(buf);
        let header = write!(
            w,
            "{}\nLocation: {}:{} ({})\nThread: {}\n\nCall stack:\n\n",
            description,
            location.file,
            location.line,
            location.func,
            self.thread_label()
        );

        if header.is_err() {
            w.truncate(0);
            let _ = w.write_str(FORMAT_ERROR_MESSAGE);
        } else if nested {
            let _ = w.write_str(NESTED_TRACE_NOTICE);
        } else {
            let walked = self.inner.platform.capture_stack(self, &mut w, skip, context);
            // a full buffer is expected; anything else is the walker's fault
            if walked.is_err() && w.remaining() > 0 {
                self.emit_with_context(&FD901, "stack walk failed");
            }
        }

        let text = w.as_str();
        if !nested {
            if let Err(err) = self.write_crash_log(text) {
                self.inner.counters.crash_log_failures.bump();
                self.emit_with_context(&FD301, &err.to_string());
            }
        }

        let reaction = self.show(text, flags);
        drop(guard);
        reaction
    }

    fn show(&self, text: &str, flags: DisplayFlags) -> ErrorReaction {
        self.inner
            .hooks
            .display_error(text, flags)
            .unwrap_or_else(|| self.inner.platform.display_error(text, flags))
    }

    fn carry_out(
        &self,
        reaction: ErrorReaction,
        flags: DisplayFlags,
        suppress: Option<&SuppressFlag>,
    ) -> ErrorReaction {
        match reaction {
            ErrorReaction::Continue => ErrorReaction::Continue,
            ErrorReaction::Break => {
                if flags.contains(DisplayFlags::MANUAL_BREAK) {
                    ErrorReaction::Break
                } else {
                    self.inner.platform.debug_break();
                    ErrorReaction::Continue
                }
            }
            ErrorReaction::Suppress => {
                if let Some(flag) = suppress {
                    flag.arm();
                }
                ErrorReaction::Continue
            }
            ErrorReaction::Exit => {
                self.inner.exit_requested.store(true, Ordering::Release);
                self.inner.platform.disable_leak_reporting();
                self.inner.platform.terminate_process(1)
            }
        }
    }

    /// Report a failed assertion of `expr`.
    ///
    /// Returns [`ErrorReaction::Break`] if the user wants to break; the
    /// caller should then break itself so the debugger stops at the
    /// assertion.
    pub fn assertion_failed(
        &self,
        expr: &str,
        suppress: Option<&SuppressFlag>,
        file: &str,
        line: u32,
        func: &str,
    ) -> ErrorReaction {
        let description = format!("Assertion failed: \"{}\"", expr);
        self.display_error(
            &description,
            DisplayFlags::MANUAL_BREAK,
            1,
            None,
            SourceLocation::new(file, line, func),
            suppress,
        )
    }

    /// Report that an operation returned the failure `code`.
    pub fn operation_failed(
        &self,
        code: ErrorCode,
        suppress: Option<&SuppressFlag>,
        file: &str,
        line: u32,
        func: &str,
    ) -> ErrorReaction {
        let description = format!(
            "Function call failed: return value was {} ({})",
            code,
            code.description()
        );
        self.display_error(
            &description,
            DisplayFlags::MANUAL_BREAK,
            1,
            None,
            SourceLocation::new(file, line, func),
            suppress,
        )
    }

    /// Report a warning.
    pub fn warn(
        &self,
        text: &str,
        suppress: Option<&SuppressFlag>,
        file: &str,
        line: u32,
        func: &str,
    ) -> ErrorReaction {
        self.display_error(
            text,
            DisplayFlags::MANUAL_BREAK,
            0,
            None,
            SourceLocation::new(file, line, func),
            suppress,
        )
    }

    /// Show an informational message (translated) through the platform.
    pub fn display_message(&self, caption: &str, text: &str) {
        let hooks = &self.inner.hooks;
        let caption = hooks.translate(caption);
        let text = hooks.translate(text);
        self.inner.platform.display_message(&caption, &text);
    }

    /// Where the crash log goes: the application's log directory, else the
    /// configured one, else the system temp directory.
    pub fn crash_log_path(&self) -> PathBuf {
        let config = &self.inner.config;
        self.inner
            .hooks
            .log_dir()
            .or_else(|| config.log_dir.clone())
            .unwrap_or_else(std::env::temp_dir)
            .join(&config.crash_log_name)
    }

    /// Write `text` to the crash log, followed by the application's logs
    /// and the activity log. Replaces any previous crash log.
    ///
    /// The file is UTF-8 with a byte order mark.
    pub fn write_crash_log(&self, text: &str) -> Result<PathBuf, CrashLogError> {
        let path = self.crash_log_path();
        let file = File::create(&path).map_err(|source| CrashLogError::FileAccess {
            path: path.clone(),
            source,
        })?;

        let mut out = BufWriter::new(file);
        match self.write_crash_contents(&mut out, text) {
            Ok(()) => {
                self.inner.counters.crash_logs_written.bump();
                Ok(path)
            }
            Err(source) => Err(CrashLogError::Write { path, source }),
        }
    }

    fn write_crash_contents(&self, out: &mut BufWriter<File>, text: &str) -> io::Result<()> {
        out.write_all(UTF8_BOM)?;
        out.write_all(text.as_bytes())?;
        out.write_all(b"\n")?;
        out.write_all(CRASH_LOG_SEPARATOR.as_bytes())?;

        if let Err(err) = self.inner.hooks.bundle_logs(out) {
            self.emit_with_context(&FD302, &err.to_string());
        }

        write!(out, "Last known activity:\n\n {}\n", self.log_contents())?;
        out.flush()
    }

    /// Pipeline counters.
    pub fn pipeline_stats(&self) -> PipelineStats {
        let counters = &self.inner.counters;
        PipelineStats {
            reports: counters.reports.load(),
            nested: counters.nested.load(),
            suppressed: counters.suppressed.load(),
            crash_logs_written: counters.crash_logs_written.load(),
            crash_log_failures: counters.crash_log_failures.load(),
        }
    }
}
