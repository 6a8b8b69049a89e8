//! Diagnostics configuration.

use std::path::PathBuf;

use crate::api::reaction::ErrorReaction;
use crate::util::size::kb;

/// Configuration for a [`Diagnostics`](crate::Diagnostics) context.
#[derive(Debug, Clone)]
pub struct DiagConfig {
    /// Size of the activity log in bytes (default: 16 KB)
    pub log_capacity: usize,

    /// Free space below which the log discards its older half (default: 512)
    pub log_low_water: usize,

    /// Maximum number of enabled output tags (default: 20)
    pub max_tags: usize,

    /// Size of the symbol string arena (default: 64 KB)
    pub arena_size: usize,

    /// Maximum length of one symbol description, in bytes (default: 1000)
    pub max_symbol_len: usize,

    /// Number of symbol cache slots (default: 2048)
    pub symbol_capacity: usize,

    /// Heap buffer for composing error messages (default: 256 KB).
    /// 0 skips the heap and goes straight to the stack fallback.
    pub message_buffer_size: usize,

    /// File name of the crash log (default: "crashlog.txt")
    pub crash_log_name: String,

    /// Directory for the crash log when the application hooks name none
    pub log_dir: Option<PathBuf>,

    /// What the standard platform answers when asked to display an error
    pub default_reaction: ErrorReaction,
}

impl Default for DiagConfig {
    fn default() -> Self {
        Self {
            log_capacity: kb(16),
            log_low_water: 512,
            max_tags: 20,
            arena_size: kb(64),
            max_symbol_len: 1000,
            symbol_capacity: 2048,
            message_buffer_size: kb(256),
            crash_log_name: "crashlog.txt".to_string(),
            log_dir: None,
            default_reaction: ErrorReaction::Continue,
        }
    }
}

impl DiagConfig {
    /// Create a minimal config for testing or constrained environments.
    pub fn minimal() -> Self {
        Self {
            log_capacity: kb(2),
            log_low_water: 128,
            max_tags: 4,
            arena_size: kb(4),
            max_symbol_len: 256,
            symbol_capacity: 64,
            message_buffer_size: kb(16),
            ..Self::default()
        }
    }

    /// Default config with overrides from the environment.
    ///
    /// - `FRAMEDIAG_LOG_DIR`: crash log directory
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = std::env::var_os("FRAMEDIAG_LOG_DIR") {
            if !dir.is_empty() {
                config.log_dir = Some(PathBuf::from(dir));
            }
        }
        config
    }

    /// Clamp values that would break the structures' invariants.
    ///
    /// - the log must hold two low-water marks, so an eviction frees enough
    /// - the arena must hold at least one maximal string
    /// - the symbol table needs at least one slot
    pub fn validated(mut self) -> Self {
        self.log_low_water = self.log_low_water.max(1);
        self.log_capacity = self.log_capacity.max(self.log_low_water * 2);
        self.max_symbol_len = self.max_symbol_len.max(2);
        self.arena_size = self.arena_size.max(self.max_symbol_len);
        self.symbol_capacity = self.symbol_capacity.max(1);
        self
    }

    /// Builder pattern: set activity log size.
    pub fn with_log_capacity(mut self, size: usize) -> Self {
        self.log_capacity = size;
        self
    }

    /// Builder pattern: set maximum tag count.
    pub fn with_max_tags(mut self, count: usize) -> Self {
        self.max_tags = count;
        self
    }

    /// Builder pattern: set symbol cache slot count.
    pub fn with_symbol_capacity(mut self, slots: usize) -> Self {
        self.symbol_capacity = slots;
        self
    }

    /// Builder pattern: set symbol arena size.
    pub fn with_arena_size(mut self, size: usize) -> Self {
        self.arena_size = size;
        self
    }

    /// Builder pattern: set heap message buffer size.
    pub fn with_message_buffer_size(mut self, size: usize) -> Self {
        self.message_buffer_size = size;
        self
    }

    /// Builder pattern: set crash log directory.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Builder pattern: set crash log file name.
    pub fn with_crash_log_name(mut self, name: impl Into<String>) -> Self {
        self.crash_log_name = name.into();
        self
    }

    /// Builder pattern: set the standard platform's answer to error dialogs.
    pub fn with_default_reaction(mut self, reaction: ErrorReaction) -> Self {
        self.default_reaction = reaction;
        self
    }
}
