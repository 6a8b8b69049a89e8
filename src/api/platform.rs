//! Platform services used by the error pipeline.
//!
//! Stack walking, symbol lookup, dialogs, debugger traps and process exit
//! are operating-system business. The pipeline reaches them only through
//! [`Platform`], which keeps it testable: the tests plug in a recording
//! platform whose `terminate_process` panics instead of exiting.

use std::fmt;
use std::io::Write as _;

use crate::api::context::Diagnostics;
use crate::api::reaction::{DisplayFlags, ErrorReaction};

/// What the platform knows about a code address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolInfo {
    /// Symbol name, possibly mangled.
    pub name: Option<String>,
    /// Source file.
    pub file: Option<String>,
    /// Source line.
    pub line: Option<u32>,
}

/// Register state to start a stack walk from, e.g. from a fault handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackContext {
    /// Instruction pointer.
    pub ip: usize,
    /// Stack pointer.
    pub sp: usize,
    /// Frame pointer.
    pub fp: usize,
}

/// Operating-system collaborator of the error pipeline.
pub trait Platform: Send + Sync {
    /// Look up debug information for a code address.
    fn resolve_symbol(&self, address: usize) -> Option<SymbolInfo>;

    /// Write the current call stack, one frame per line.
    ///
    /// `skip` frames above the caller of the pipeline are left out. Frames
    /// should be described through [`Diagnostics::get_symbol_string`] so
    /// repeated reports hit the symbol cache. Running out of room in `out`
    /// is not an error worth reporting; the text is simply cut.
    fn capture_stack(
        &self,
        diag: &Diagnostics,
        out: &mut dyn fmt::Write,
        skip: usize,
        context: Option<&StackContext>,
    ) -> fmt::Result;

    /// Show an error report and return the user's choice.
    fn display_error(&self, text: &str, flags: DisplayFlags) -> ErrorReaction;

    /// Show an informational message.
    fn display_message(&self, caption: &str, text: &str);

    /// Write to the debug output channel.
    fn output(&self, text: &str);

    /// Trap into an attached debugger.
    fn debug_break(&self);

    /// End the process with `status`.
    fn terminate_process(&self, status: i32) -> !;

    /// Called right before terminating; leak checkers should stay quiet
    /// since nothing is cleaned up.
    fn disable_leak_reporting(&self) {}

    /// Tell a debugger about a thread name.
    fn set_thread_name(&self, _name: &str) {}
}

/// Frames belonging to the pipeline itself: `capture_stack`, the
/// pipeline, and the public entry point that called it.
#[cfg(feature = "backtrace")]
const INTERNAL_FRAMES: usize = 3;

/// Most frames written for one report.
#[cfg(feature = "backtrace")]
const MAX_FRAMES: usize = 128;

/// Platform built on the standard library and the `backtrace` crate.
///
/// Errors are printed to stderr; since there is no dialog to ask, the
/// configured default reaction is returned.
#[derive(Debug, Clone, Copy)]
pub struct StdPlatform {
    default_reaction: ErrorReaction,
}

impl StdPlatform {
    /// Create a platform that answers every error with `default_reaction`.
    pub const fn new(default_reaction: ErrorReaction) -> Self {
        Self { default_reaction }
    }
}

impl Default for StdPlatform {
    fn default() -> Self {
        Self::new(ErrorReaction::Continue)
    }
}

impl Platform for StdPlatform {
    #[cfg(feature = "backtrace")]
    fn resolve_symbol(&self, address: usize) -> Option<SymbolInfo> {
        let mut info = None;
        backtrace::resolve(address as *mut std::ffi::c_void, |symbol| {
            if info.is_none() {
                info = Some(SymbolInfo {
                    name: symbol.name().map(|n| n.to_string()),
                    file: symbol.filename().map(|p| p.to_string_lossy().into_owned()),
                    line: symbol.lineno(),
                });
            }
        });
        info
    }

    #[cfg(not(feature = "backtrace"))]
    fn resolve_symbol(&self, _address: usize) -> Option<SymbolInfo> {
        None
    }

    #[cfg(feature = "backtrace")]
    fn capture_stack(
        &self,
        diag: &Diagnostics,
        out: &mut dyn fmt::Write,
        skip: usize,
        context: Option<&StackContext>,
    ) -> fmt::Result {
        // collect first; resolving inside the trace callback would hold the
        // unwinder's lock across symbol lookups
        let mut ips = [0usize; MAX_FRAMES];
        let mut count = 0;
        let mut skipped = 0;
        let to_skip = skip.saturating_add(INTERNAL_FRAMES);
        backtrace::trace(|frame| {
            if let Some(ctx) = context {
                // frames deeper than the faulting one
                if (frame.sp() as usize) < ctx.sp {
                    return true;
                }
            } else if skipped < to_skip {
                skipped += 1;
                return true;
            }
            ips[count] = frame.ip() as usize;
            count += 1;
            count < MAX_FRAMES
        });

        if let Some(ctx) = context {
            write_frame(diag, out, ctx.ip)?;
        }
        for &ip in &ips[..count] {
            write_frame(diag, out, ip)?;
        }
        Ok(())
    }

    #[cfg(not(feature = "backtrace"))]
    fn capture_stack(
        &self,
        _diag: &Diagnostics,
        out: &mut dyn fmt::Write,
        _skip: usize,
        context: Option<&StackContext>,
    ) -> fmt::Result {
        if let Some(ctx) = context {
            writeln!(out, "{:#x}", ctx.ip)?;
        }
        out.write_str("(stack traces require the `backtrace` feature)\n")
    }

    fn display_error(&self, text: &str, _flags: DisplayFlags) -> ErrorReaction {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", text);
        self.default_reaction
    }

    fn display_message(&self, caption: &str, text: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}: {}", caption, text);
    }

    fn output(&self, text: &str) {
        let _ = std::io::stderr().lock().write_all(text.as_bytes());
    }

    fn debug_break(&self) {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        // SAFETY: a breakpoint trap has no operands and touches no memory
        unsafe {
            std::arch::asm!("int3");
        };

        #[cfg(target_arch = "aarch64")]
        // SAFETY: as above
        unsafe {
            std::arch::asm!("brk #0xf000");
        };

        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
        self.output("debug break requested, no breakpoint instruction on this target\n");
    }

    fn terminate_process(&self, status: i32) -> ! {
        std::process::exit(status)
    }
}

#[cfg(feature = "backtrace")]
fn write_frame(diag: &Diagnostics, out: &mut dyn fmt::Write, ip: usize) -> fmt::Result {
    match diag.get_symbol_string(ip, None, None, None) {
        Ok(desc) => writeln!(out, "{}", desc),
        Err(_) => writeln!(out, "{:#x}", ip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_platform_returns_default_reaction() {
        let platform = StdPlatform::new(ErrorReaction::Suppress);
        assert_eq!(
            platform.display_error("test report", DisplayFlags::NONE),
            ErrorReaction::Suppress
        );
        assert_eq!(
            StdPlatform::default().display_error("test report", DisplayFlags::NONE),
            ErrorReaction::Continue
        );
    }

    #[cfg(feature = "backtrace")]
    #[test]
    fn test_std_platform_walks_stack() {
        let diag = Diagnostics::new(crate::DiagConfig::minimal());
        let mut text = String::new();
        StdPlatform::default()
            .capture_stack(&diag, &mut text, 0, None)
            .unwrap();
        assert!(!text.is_empty());
        assert!(text.lines().count() >= 1);
    }

    #[cfg(feature = "backtrace")]
    #[test]
    fn test_huge_skip_yields_empty_stack() {
        let diag = Diagnostics::new(crate::DiagConfig::minimal());
        let mut text = String::new();
        StdPlatform::default()
            .capture_stack(&diag, &mut text, usize::MAX, None)
            .unwrap();
        assert!(text.is_empty());
    }
}
