//! Recording collaborators shared by the integration tests.

#![allow(dead_code)]

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use framediag::{
    AppHooks, CollectingSink, DiagConfig, Diagnostics, DisplayFlags, ErrorReaction, Platform,
    StackContext, SymbolInfo,
};

/// Platform without debug info that records what it is asked to show.
#[derive(Default)]
pub struct TestPlatform {
    pub reaction: Mutex<Option<ErrorReaction>>,
    pub displayed: Mutex<Vec<String>>,
    pub outputs: Mutex<Vec<String>>,
}

impl TestPlatform {
    pub fn displayed(&self) -> Vec<String> {
        self.displayed.lock().unwrap().clone()
    }

    pub fn outputs(&self) -> Vec<String> {
        self.outputs.lock().unwrap().clone()
    }

    pub fn answer(&self, reaction: ErrorReaction) {
        *self.reaction.lock().unwrap() = Some(reaction);
    }
}

impl Platform for TestPlatform {
    fn resolve_symbol(&self, _address: usize) -> Option<SymbolInfo> {
        None
    }

    fn capture_stack(
        &self,
        diag: &Diagnostics,
        out: &mut dyn fmt::Write,
        _skip: usize,
        _context: Option<&StackContext>,
    ) -> fmt::Result {
        for ip in [0x1000usize, 0x2000] {
            let desc = diag
                .get_symbol_string(ip, Some("frame"), None, None)
                .map_err(|_| fmt::Error)?;
            writeln!(out, "{}", desc)?;
        }
        Ok(())
    }

    fn display_error(&self, text: &str, _flags: DisplayFlags) -> ErrorReaction {
        self.displayed.lock().unwrap().push(text.to_string());
        self.reaction.lock().unwrap().unwrap_or(ErrorReaction::Continue)
    }

    fn display_message(&self, _caption: &str, _text: &str) {}

    fn output(&self, text: &str) {
        self.outputs.lock().unwrap().push(text.to_string());
    }

    fn debug_break(&self) {}

    fn terminate_process(&self, status: i32) -> ! {
        panic!("terminate_process({})", status)
    }
}

/// Hooks writing crash logs to a fixed directory. A report raised from
/// the dialog can be armed with `report_from_dialog`.
pub struct TestHooks {
    pub dir: PathBuf,
    pub diag: OnceLock<Diagnostics>,
    pub report_from_dialog: Mutex<bool>,
}

impl TestHooks {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            diag: OnceLock::new(),
            report_from_dialog: Mutex::new(false),
        }
    }
}

impl AppHooks for TestHooks {
    fn display_error(&self, _text: &str, _flags: DisplayFlags) -> Option<ErrorReaction> {
        let nest = std::mem::take(&mut *self.report_from_dialog.lock().unwrap());
        if nest {
            if let Some(diag) = self.diag.get() {
                diag.warn("raised from the dialog", None, file!(), line!(), module_path!());
            }
        }
        None
    }

    fn bundle_logs(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        out.write_all(b"app: 3 warnings\n")
    }

    fn log_dir(&self) -> Option<PathBuf> {
        Some(self.dir.clone())
    }
}

pub struct Harness {
    pub diag: Diagnostics,
    pub platform: Arc<TestPlatform>,
    pub hooks: Arc<TestHooks>,
    pub sink: Arc<CollectingSink>,
    pub dir: tempfile::TempDir,
}

pub fn harness(config: DiagConfig) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let platform = Arc::new(TestPlatform::default());
    let hooks = Arc::new(TestHooks::new(dir.path()));
    let sink = Arc::new(CollectingSink::new());
    let diag = Diagnostics::builder(config)
        .platform(platform.clone())
        .hooks(hooks.clone())
        .sink(sink.clone())
        .build();
    Harness { diag, platform, hooks, sink, dir }
}
