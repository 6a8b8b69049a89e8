//! framediag's own diagnostics.
//!
//! The reporting pipeline degrades instead of failing: a full symbol table,
//! an exhausted arena or an unwritable crash log never reach the caller.
//! Those degradations are reported here instead, with codes:
//!
//! | Code  | Meaning                         |
//! |-------|---------------------------------|
//! | FD1xx | Activity log and tag filter     |
//! | FD2xx | Symbol cache                    |
//! | FD3xx | Crash log                       |
//! | FD9xx | Platform failures               |
//!
//! Output goes to stderr (debug builds or the `diagnostics` feature) and to
//! the `log` crate (feature `log`). Strict mode turns them into panics.
//!
//! This module also hosts the call-site macros ([`diag_assert!`],
//! [`diag_warn!`], [`diag_warn_err!`], [`diag_log!`], [`diag_print!`]).

pub mod emit;
pub mod kind;
pub mod macros;
pub mod strict;

pub use emit::{
    emit, emit_with_context, suppress_diagnostics, CollectingSink, DiagnosticSink, StderrSink,
};
pub use kind::{Diagnostic, DiagnosticKind};
pub use kind::{FD101, FD102, FD201, FD202, FD203, FD301, FD302, FD901};
pub use strict::{
    init_from_env, set_strict_mode, strict_mode, ParseStrictModeError, StrictMode, StrictModeGuard,
};
