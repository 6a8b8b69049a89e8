//! Recording collaborators for unit tests.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::api::context::Diagnostics;
use crate::api::hooks::AppHooks;
use crate::api::platform::{Platform, StackContext, SymbolInfo};
use crate::api::reaction::{DisplayFlags, ErrorReaction};
use crate::sync::counter::EventCounter;
use crate::sync::mutex::Mutex;

/// Platform that records every call and answers with a preset reaction.
///
/// `terminate_process` panics with `"terminate_process(<status>)"`.
pub(crate) struct RecordingPlatform {
    symbols: Mutex<HashMap<usize, SymbolInfo>>,
    resolves: EventCounter,
    frames: Mutex<Vec<String>>,
    skips: Mutex<Vec<usize>>,
    nest_during_capture: AtomicBool,
    nested_reactions: Mutex<Vec<ErrorReaction>>,
    reaction: Mutex<ErrorReaction>,
    displayed: Mutex<Vec<(String, DisplayFlags)>>,
    messages: Mutex<Vec<(String, String)>>,
    outputs: Mutex<Vec<String>>,
    thread_names: Mutex<Vec<String>>,
    breaks: EventCounter,
    leak_reporting_disabled: AtomicBool,
}

impl RecordingPlatform {
    pub(crate) fn new() -> Self {
        Self {
            symbols: Mutex::new(HashMap::new()),
            resolves: EventCounter::default(),
            frames: Mutex::new(vec!["game.rs:00010 game::update".into()]),
            skips: Mutex::new(Vec::new()),
            nest_during_capture: AtomicBool::new(false),
            nested_reactions: Mutex::new(Vec::new()),
            reaction: Mutex::new(ErrorReaction::Continue),
            displayed: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            outputs: Mutex::new(Vec::new()),
            thread_names: Mutex::new(Vec::new()),
            breaks: EventCounter::default(),
            leak_reporting_disabled: AtomicBool::new(false),
        }
    }

    pub(crate) fn add_symbol(&self, address: usize, info: SymbolInfo) {
        self.symbols.lock().insert(address, info);
    }

    pub(crate) fn set_reaction(&self, reaction: ErrorReaction) {
        *self.reaction.lock() = reaction;
    }

    pub(crate) fn set_frames(&self, frames: &[&str]) {
        *self.frames.lock() = frames.iter().map(|f| f.to_string()).collect();
    }

    /// Raise an assertion from inside the next stack capture.
    pub(crate) fn nest_during_capture(&self) {
        self.nest_during_capture.store(true, Ordering::Relaxed);
    }

    pub(crate) fn nested_reactions(&self) -> Vec<ErrorReaction> {
        self.nested_reactions.lock().clone()
    }

    pub(crate) fn resolve_count(&self) -> u64 {
        self.resolves.load()
    }

    pub(crate) fn skips(&self) -> Vec<usize> {
        self.skips.lock().clone()
    }

    pub(crate) fn displayed(&self) -> Vec<(String, DisplayFlags)> {
        self.displayed.lock().clone()
    }

    pub(crate) fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().clone()
    }

    pub(crate) fn outputs(&self) -> Vec<String> {
        self.outputs.lock().clone()
    }

    pub(crate) fn thread_names(&self) -> Vec<String> {
        self.thread_names.lock().clone()
    }

    pub(crate) fn break_count(&self) -> u64 {
        self.breaks.load()
    }

    pub(crate) fn leak_reporting_disabled(&self) -> bool {
        self.leak_reporting_disabled.load(Ordering::Relaxed)
    }
}

impl Platform for RecordingPlatform {
    fn resolve_symbol(&self, address: usize) -> Option<SymbolInfo> {
        self.resolves.bump();
        self.symbols.lock().get(&address).cloned()
    }

    fn capture_stack(
        &self,
        diag: &Diagnostics,
        out: &mut dyn fmt::Write,
        skip: usize,
        _context: Option<&StackContext>,
    ) -> fmt::Result {
        self.skips.lock().push(skip);

        if self.nest_during_capture.swap(false, Ordering::Relaxed) {
            let reaction = diag.assertion_failed("walker_ok", None, "walker.rs", 3, "walk");
            self.nested_reactions.lock().push(reaction);
        }

        let frames = self.frames.lock().clone();
        for frame in frames {
            writeln!(out, "{}", frame)?;
        }
        Ok(())
    }

    fn display_error(&self, text: &str, flags: DisplayFlags) -> ErrorReaction {
        self.displayed.lock().push((text.to_string(), flags));
        *self.reaction.lock()
    }

    fn display_message(&self, caption: &str, text: &str) {
        self.messages.lock().push((caption.to_string(), text.to_string()));
    }

    fn output(&self, text: &str) {
        self.outputs.lock().push(text.to_string());
    }

    fn debug_break(&self) {
        self.breaks.bump();
    }

    fn terminate_process(&self, status: i32) -> ! {
        panic!("terminate_process({})", status)
    }

    fn disable_leak_reporting(&self) {
        self.leak_reporting_disabled.store(true, Ordering::Relaxed);
    }

    fn set_thread_name(&self, name: &str) {
        self.thread_names.lock().push(name.to_string());
    }
}

/// Hooks with a fixed log directory and an optional dialog answer.
pub(crate) struct RecordingHooks {
    pub(crate) log_dir: Option<PathBuf>,
    pub(crate) reaction: Option<ErrorReaction>,
    pub(crate) bundle: Option<&'static str>,
    pub(crate) fail_bundle: bool,
    pub(crate) prefix: Option<&'static str>,
}

impl RecordingHooks {
    pub(crate) fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: Some(dir.into()),
            reaction: None,
            bundle: None,
            fail_bundle: false,
            prefix: None,
        }
    }
}

impl AppHooks for RecordingHooks {
    fn translate<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        match self.prefix {
            Some(prefix) => format!("{}{}", prefix, text).into(),
            None => text.into(),
        }
    }

    fn display_error(&self, _text: &str, _flags: DisplayFlags) -> Option<ErrorReaction> {
        self.reaction
    }

    fn bundle_logs(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        if self.fail_bundle {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "application logs unavailable",
            ));
        }
        out.write_all(self.bundle.unwrap_or("").as_bytes())
    }

    fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir.clone()
    }
}
