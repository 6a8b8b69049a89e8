//! Application hooks.
//!
//! The application gets a say before the platform does: it may translate
//! messages, show its own error dialog, contribute its logs to the crash
//! report and choose where crash logs go. Every method has a default, so
//! an application only overrides what it cares about.

use std::borrow::Cow;
use std::io;
use std::path::PathBuf;

use crate::api::reaction::{DisplayFlags, ErrorReaction};

/// Application-side collaborator of the error pipeline.
///
/// Hooks are called without any diagnostics lock held, so they may log or
/// even report errors themselves. A report raised from inside
/// `display_error` is treated as nested.
pub trait AppHooks: Send + Sync {
    /// Translate user-visible text. Default: unchanged.
    fn translate<'a>(&self, text: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(text)
    }

    /// Show an error report and return the user's choice.
    ///
    /// `None` means the application has no dialog of its own; the platform
    /// dialog is used instead.
    fn display_error(&self, _text: &str, _flags: DisplayFlags) -> Option<ErrorReaction> {
        None
    }

    /// Append the application's own logs to a crash log being written.
    fn bundle_logs(&self, _out: &mut dyn io::Write) -> io::Result<()> {
        Ok(())
    }

    /// Directory for crash logs. `None` defers to the configuration.
    fn log_dir(&self) -> Option<PathBuf> {
        None
    }
}

/// Hooks that do nothing beyond the defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHooks;

impl AppHooks for NullHooks {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_hooks_defaults() {
        let hooks = NullHooks;
        assert!(matches!(hooks.translate("hello"), Cow::Borrowed("hello")));
        assert_eq!(hooks.display_error("text", DisplayFlags::NONE), None);
        assert_eq!(hooks.log_dir(), None);

        let mut out = Vec::new();
        hooks.bundle_logs(&mut out).unwrap();
        assert!(out.is_empty());
    }
}
