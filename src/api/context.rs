//! The diagnostics context.

use std::borrow::Cow;
use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::config::DiagConfig;
use crate::api::hooks::{AppHooks, NullHooks};
use crate::api::platform::{Platform, StdPlatform};
use crate::api::report::ReportCounters;
use crate::api::thread_name::{ThreadName, ThreadNameRegistry};
use crate::core::activity_log::{ActivityLog, ActivityLogStats, AppendOutcome};
use crate::core::latch::ReentrancyLatch;
use crate::core::message::BoundedWriter;
use crate::core::symbols::{
    describe_symbol, InsertOutcome, SymbolCache, SymbolCacheStats, SymbolError,
};
use crate::core::tag_filter::{AddOutcome, TagFilter};
use crate::diagnostics::kind::{Diagnostic, FD101, FD102, FD201, FD202, FD203};
use crate::diagnostics::{DiagnosticSink, StderrSink};
use crate::sync::mutex::Mutex;

/// Longest text a single `debug_print` passes to the output channel.
pub(crate) const DEBUG_PRINT_MAX: usize = 511;

/// All diagnostics state plus the collaborators it reports through.
///
/// Cheap to clone (internally uses `Arc`) and thread-safe. Most programs
/// use the process-wide instance behind the crate's free functions; tests
/// and embedders create their own.
///
/// # Example
///
/// ```rust,no_run
/// use framediag::{DiagConfig, Diagnostics, ThreadName};
///
/// let diag = Diagnostics::new(DiagConfig::default());
/// diag.set_thread_name(ThreadName::new("main"));
/// diag.log_append(format_args!("loading {}", "level1.map"));
/// diag.filter_add("render");
/// ```
#[derive(Clone)]
pub struct Diagnostics {
    pub(crate) inner: Arc<DiagState>,
}

pub(crate) struct DiagState {
    pub(crate) config: DiagConfig,
    pub(crate) log: Mutex<ActivityLog>,
    pub(crate) filter: Mutex<TagFilter>,
    pub(crate) symbols: Mutex<SymbolCache>,
    pub(crate) thread_names: ThreadNameRegistry,
    pub(crate) latch: ReentrancyLatch,
    pub(crate) exit_requested: AtomicBool,
    pub(crate) counters: ReportCounters,
    pub(crate) platform: Arc<dyn Platform>,
    pub(crate) hooks: Arc<dyn AppHooks>,
    pub(crate) sink: Arc<dyn DiagnosticSink>,
}

/// Builder for a [`Diagnostics`] with custom collaborators.
pub struct DiagnosticsBuilder {
    config: DiagConfig,
    platform: Option<Arc<dyn Platform>>,
    hooks: Option<Arc<dyn AppHooks>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl DiagnosticsBuilder {
    /// Use `platform` instead of [`StdPlatform`].
    pub fn platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Use `hooks` instead of [`NullHooks`].
    pub fn hooks(mut self, hooks: Arc<dyn AppHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Send local diagnostics to `sink` instead of stderr and `log`.
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Create the context. Nothing large is allocated until first use.
    pub fn build(self) -> Diagnostics {
        let config = self.config.validated();
        let platform = self
            .platform
            .unwrap_or_else(|| Arc::new(StdPlatform::new(config.default_reaction)));

        let state = DiagState {
            log: Mutex::new(ActivityLog::new(config.log_capacity, config.log_low_water)),
            filter: Mutex::new(TagFilter::new(config.max_tags)),
            symbols: Mutex::new(SymbolCache::new(
                config.symbol_capacity,
                config.arena_size,
                config.max_symbol_len,
            )),
            thread_names: ThreadNameRegistry::new(),
            latch: ReentrancyLatch::new(),
            exit_requested: AtomicBool::new(false),
            counters: ReportCounters::default(),
            platform,
            hooks: self.hooks.unwrap_or_else(|| Arc::new(NullHooks)),
            sink: self.sink.unwrap_or_else(|| Arc::new(StderrSink)),
            config,
        };

        Diagnostics {
            inner: Arc::new(state),
        }
    }
}

impl Diagnostics {
    /// Create a context with the standard platform and no application hooks.
    pub fn new(config: DiagConfig) -> Self {
        Self::builder(config).build()
    }

    /// Start building a context with custom collaborators.
    pub fn builder(config: DiagConfig) -> DiagnosticsBuilder {
        DiagnosticsBuilder {
            config,
            platform: None,
            hooks: None,
            sink: None,
        }
    }

    /// The (validated) configuration.
    pub fn config(&self) -> &DiagConfig {
        &self.inner.config
    }

    // ---- activity log ----

    /// Append a line to the activity log.
    ///
    /// Old activity is discarded in bulk when the log runs low on space. A
    /// line that does not fit even then is dropped.
    pub fn log_append(&self, args: fmt::Arguments<'_>) {
        let outcome = self.inner.log.lock().append(args);
        if outcome == AppendOutcome::Dropped {
            self.emit(&FD102);
        }
    }

    /// Current activity log text, oldest first.
    pub fn log_contents(&self) -> String {
        self.inner.log.lock().contents()
    }

    /// Activity log fill level and counters.
    pub fn log_stats(&self) -> ActivityLogStats {
        self.inner.log.lock().stats()
    }

    // ---- tag filter ----

    /// Enable output of messages tagged `tag`.
    ///
    /// While no tag is enabled, all output is shown.
    pub fn filter_add(&self, tag: &str) {
        let (outcome, enabled) = {
            let mut filter = self.inner.filter.lock();
            (filter.add(tag), filter.len())
        };
        if outcome == AddOutcome::Full {
            self.emit_with_context(&FD101, &format!("'{}' ({} tags enabled)", tag, enabled));
        }
    }

    /// Disable output of messages tagged `tag`. Returns whether it was enabled.
    pub fn filter_remove(&self, tag: &str) -> bool {
        self.inner.filter.lock().remove(tag)
    }

    /// Disable every tag.
    pub fn filter_clear(&self) {
        self.inner.filter.lock().clear();
    }

    /// Whether `text` would currently be printed.
    pub fn filter_allows(&self, text: &str) -> bool {
        self.inner.filter.lock().allows(text)
    }

    /// Print to the output channel if the tag filter allows it.
    ///
    /// Text is cut to 511 bytes. Messages are tagged by a leading
    /// `"tag|"`, e.g. `"render|frame 12 took 17 ms"`.
    pub fn debug_print(&self, args: fmt::Arguments<'_>) {
        let mut storage = [0u8; DEBUG_PRINT_MAX];
        let mut w = BoundedWriter::new(&mut storage);
        // overflow keeps the prefix
        let _ = w.write_fmt(args);

        if self.filter_allows(w.as_str()) {
            self.inner.platform.output(w.as_str());
        }
    }

    // ---- symbols ----

    /// Human-readable description of a code address.
    ///
    /// Missing `name`, `file` or `line` are looked up through the platform.
    /// Descriptions are cached: asking twice for the same address returns
    /// the same `&'static str`. Once the cache is full, descriptions of new
    /// addresses are built fresh on every call and returned owned.
    pub fn get_symbol_string(
        &self,
        address: usize,
        name: Option<&str>,
        file: Option<&str>,
        line: Option<u32>,
    ) -> Result<Cow<'static, str>, SymbolError> {
        let max_len = {
            let symbols = self.inner.symbols.lock();
            if let Some(cached) = symbols.lookup(address) {
                return Ok(Cow::Borrowed(cached));
            }
            symbols.max_string_len()
        };

        // resolve without the lock: the platform may be slow, or report
        let resolved = if name.is_none() || file.is_none() || line.is_none() {
            self.inner.platform.resolve_symbol(address).unwrap_or_default()
        } else {
            Default::default()
        };
        let text = describe_symbol(
            address,
            name.or(resolved.name.as_deref()),
            file.or(resolved.file.as_deref()),
            line.or(resolved.line),
            max_len,
        );

        if address == 0 {
            return Ok(Cow::Owned(text));
        }

        let outcome = self.inner.symbols.lock().insert(address, &text);
        match outcome {
            Ok(InsertOutcome::Cached(s)) | Ok(InsertOutcome::Existing(s)) => Ok(Cow::Borrowed(s)),
            Ok(InsertOutcome::TableFull) => {
                self.emit(&FD202);
                Ok(Cow::Owned(text))
            }
            Ok(InsertOutcome::ArenaFull) => {
                self.emit(&FD203);
                Ok(Cow::Owned(text))
            }
            Err(err) => {
                self.emit(&FD201);
                Err(err)
            }
        }
    }

    /// Symbol cache statistics.
    pub fn symbol_stats(&self) -> SymbolCacheStats {
        self.inner.symbols.lock().stats()
    }

    // ---- threads ----

    /// Name the calling thread for diagnostics and the debugger.
    pub fn set_thread_name(&self, name: impl Into<ThreadName>) {
        let name = name.into();
        self.inner.thread_names.set(name);
        self.inner.platform.set_thread_name(name.as_str());
    }

    /// The calling thread's name, if one was set.
    pub fn get_thread_name(&self) -> Option<ThreadName> {
        self.inner.thread_names.get()
    }

    /// The calling thread as shown in error reports.
    pub fn thread_label(&self) -> String {
        self.inner.thread_names.label()
    }

    /// Release per-thread storage. Thread names set afterwards start over.
    pub fn shutdown(&self) {
        self.inner.thread_names.shutdown();
    }

    // ---- state ----

    /// Whether a report ended in "exit". Further reports are ignored.
    pub fn is_exit_requested(&self) -> bool {
        self.inner.exit_requested.load(Ordering::Acquire)
    }

    /// Whether a report is currently being built.
    pub fn is_reporting(&self) -> bool {
        self.inner.latch.is_claimed()
    }

    pub(crate) fn emit(&self, diag: &Diagnostic) {
        self.inner.sink.emit(diag);
    }

    pub(crate) fn emit_with_context(&self, diag: &Diagnostic, context: &str) {
        self.inner.sink.emit_with_context(diag, context);
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DiagConfig::default())
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("config", &self.inner.config)
            .field("exit_requested", &self.is_exit_requested())
            .finish_non_exhaustive()
    }
}
