//! # framediag
//!
//! In-process error reporting and diagnostics for game engines.
//!
//! ## Features
//!
//! - Activity log: bounded sliding window of recent messages, saved with
//!   every crash log
//! - Tagged debug output with a small runtime tag filter
//! - Cached symbol descriptions for code addresses (never freed, stable
//!   `&'static str`)
//! - Human-readable thread names
//! - Reentrancy-safe error pipeline: message with call stack, crash log,
//!   dialog, then continue / break / suppress / exit
//! - Works with a failing heap: message buffers fall back to the stack
//! - Local diagnostics (`FDxxx` codes) for the subsystem's own degradations
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use framediag::{diag_assert, diag_log, diag_print, diag_warn_err, ErrorCode};
//!
//! framediag::set_thread_name("main");
//! framediag::filter_add("render");
//!
//! diag_log!("loading level {}", 3);
//! diag_print!("render|frame {} took {} ms", 120, 17);
//!
//! let frames = [0u32; 4];
//! diag_assert!(frames.len() == 4);
//!
//! fn mount() -> ErrorCode {
//!     ErrorCode::FILE_NOT_FOUND
//! }
//! let _ = diag_warn_err!(mount());
//! ```
//!
//! ## Custom platforms
//!
//! Dialogs, stack walking and process exit go through the [`Platform`]
//! trait, application behaviour through [`AppHooks`]. Build a context with
//! your own and install it before anything is reported:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use framediag::{DiagConfig, Diagnostics, ErrorReaction, StdPlatform};
//!
//! let diag = Diagnostics::builder(DiagConfig::from_env().with_log_dir("logs"))
//!     .platform(Arc::new(StdPlatform::new(ErrorReaction::Exit)))
//!     .build();
//! framediag::install(diag).expect("diagnostics already in use");
//! ```

pub mod api;
pub mod diagnostics;

mod core;
mod sync;
mod util;

// Re-export public API at crate root for convenience
pub use api::config::DiagConfig;
pub use api::context::{Diagnostics, DiagnosticsBuilder};
pub use api::error_code::ErrorCode;
pub use api::hooks::{AppHooks, NullHooks};
pub use api::platform::{Platform, StackContext, StdPlatform, SymbolInfo};
pub use api::reaction::{DisplayFlags, ErrorReaction, SuppressFlag};
pub use api::report::{
    CrashLogError, PipelineStats, SourceLocation, FORMAT_ERROR_MESSAGE,
    INSUFFICIENT_MEMORY_MESSAGE, NESTED_TRACE_NOTICE,
};
pub use api::thread_name::ThreadName;
pub use crate::core::activity_log::ActivityLogStats;
pub use crate::core::symbols::{SymbolCacheStats, SymbolError};

// Free functions over the process-wide context
pub use api::global::{
    assertion_failed, debug_break, debug_print, display_error, display_message, filter_add,
    filter_clear, filter_remove, get_symbol_string, get_thread_name, global, install, log_append,
    operation_failed, set_thread_name, shutdown, warn, write_crash_log,
};

// Local diagnostics
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, StrictMode};
