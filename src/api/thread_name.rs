//! Human-readable thread names for diagnostics.
//!
//! When debugging threading problems, "loader" is easier to follow than a
//! `ThreadId(7)`. Names are registered per thread and looked up by the
//! error reporter to attribute a report to the thread that raised it.
//! An entry lives as long as its thread: a thread-local guard removes it
//! when the thread exits.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::thread::ThreadId;

use crate::sync::mutex::Mutex;

/// A thread name with process lifetime.
///
/// The registry only stores the reference, so the text must live for the
/// rest of the program: a literal, or an explicitly leaked string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadName(&'static str);

impl ThreadName {
    /// Wrap a static string.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Leak a dynamically built name.
    ///
    /// The memory is never reclaimed; call this once per thread, not per
    /// frame.
    pub fn leak(name: String) -> Self {
        Self(Box::leak(name.into_boxed_str()))
    }

    /// The name.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl From<&'static str> for ThreadName {
    fn from(name: &'static str) -> Self {
        Self(name)
    }
}

impl std::fmt::Display for ThreadName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

type SlotMap = Mutex<Option<HashMap<ThreadId, ThreadName>>>;

/// Drops the exiting thread's entry from every registry it named itself in.
struct ExitGuard {
    id: ThreadId,
    registries: Vec<Weak<SlotMap>>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        for slots in self.registries.iter().filter_map(Weak::upgrade) {
            if let Some(map) = slots.lock().as_mut() {
                map.remove(&self.id);
            }
        }
    }
}

thread_local! {
    static EXIT_GUARD: RefCell<Option<ExitGuard>> = const { RefCell::new(None) };
}

/// Per-thread name slots.
///
/// The slot map is created under the lock by the first `set`, so racing
/// first calls see a single map. A thread's entry goes away when the
/// thread exits; `shutdown` releases the whole map.
#[derive(Default)]
pub struct ThreadNameRegistry {
    slots: Arc<SlotMap>,
}

impl ThreadNameRegistry {
    /// Create a registry with no storage yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the calling thread.
    pub fn set(&self, name: ThreadName) {
        let id = std::thread::current().id();
        self.slots
            .lock()
            .get_or_insert_with(HashMap::new)
            .insert(id, name);
        self.watch_exit(id);
    }

    // Registers this registry with the calling thread's exit guard once.
    // Fails quietly while the thread is already tearing down its locals.
    fn watch_exit(&self, id: ThreadId) {
        let _ = EXIT_GUARD.try_with(|guard| {
            let mut guard = guard.borrow_mut();
            let guard = guard.get_or_insert_with(|| ExitGuard {
                id,
                registries: Vec::new(),
            });
            let weak = Arc::downgrade(&self.slots);
            if !guard.registries.iter().any(|r| r.ptr_eq(&weak)) {
                guard.registries.retain(|r| r.strong_count() > 0);
                guard.registries.push(weak);
            }
        });
    }

    /// The calling thread's name, if one was set.
    pub fn get(&self) -> Option<ThreadName> {
        self.get_for(std::thread::current().id())
    }

    /// The name registered for `id`.
    pub fn get_for(&self, id: ThreadId) -> Option<ThreadName> {
        self.slots.lock().as_ref()?.get(&id).copied()
    }

    /// Number of live threads with a name.
    pub fn len(&self) -> usize {
        self.slots.lock().as_ref().map_or(0, HashMap::len)
    }

    /// Whether no thread currently has a name.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the calling thread for display: the registered name, else
    /// the std thread name, else the thread id.
    pub fn label(&self) -> String {
        if let Some(name) = self.get() {
            return name.as_str().to_string();
        }
        let thread = std::thread::current();
        match thread.name() {
            Some(name) => name.to_string(),
            None => format!("{:?}", thread.id()),
        }
    }

    /// Whether slot storage currently exists.
    pub fn is_initialized(&self) -> bool {
        self.slots.lock().is_some()
    }

    /// Release slot storage. Names set afterwards start from scratch.
    pub fn shutdown(&self) {
        *self.slots.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unset_is_none() {
        let registry = ThreadNameRegistry::new();
        assert_eq!(registry.get(), None);
        assert!(!registry.is_initialized());
    }

    #[test]
    fn test_set_and_get() {
        let registry = ThreadNameRegistry::new();
        registry.set(ThreadName::new("main"));
        assert_eq!(registry.get(), Some(ThreadName::new("main")));
        assert_eq!(registry.label(), "main");

        registry.set("renamed".into());
        assert_eq!(registry.get().unwrap().as_str(), "renamed");
    }

    #[test]
    fn test_names_are_per_thread() {
        let registry = Arc::new(ThreadNameRegistry::new());
        registry.set(ThreadName::new("main"));

        let worker = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                assert_eq!(registry.get(), None);
                registry.set(ThreadName::leak(format!("worker-{}", 3)));
                registry.get().map(|n| n.as_str())
            })
        };

        assert_eq!(worker.join().unwrap(), Some("worker-3"));
        assert_eq!(registry.get(), Some(ThreadName::new("main")));
    }

    #[test]
    fn test_concurrent_first_set() {
        let registry = Arc::new(ThreadNameRegistry::new());
        let handles: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|name| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry.set(ThreadName::new(name));
                    registry.get()
                })
            })
            .collect();

        for (h, name) in handles.into_iter().zip(["a", "b", "c", "d"]) {
            assert_eq!(h.join().unwrap(), Some(ThreadName::new(name)));
        }
    }

    #[test]
    fn test_shutdown_releases_storage() {
        let registry = ThreadNameRegistry::new();
        registry.set(ThreadName::new("main"));
        registry.shutdown();

        assert!(!registry.is_initialized());
        assert_eq!(registry.get(), None);

        registry.set(ThreadName::new("again"));
        assert_eq!(registry.get(), Some(ThreadName::new("again")));
    }

    #[test]
    fn test_exited_threads_leave_no_entries() {
        let registry = Arc::new(ThreadNameRegistry::new());
        registry.set(ThreadName::new("main"));

        for batch in 0..10 {
            let workers: Vec<_> = (0..100)
                .map(|_| {
                    let registry = Arc::clone(&registry);
                    std::thread::spawn(move || {
                        registry.set(ThreadName::new("worker"));
                        // a second name for the same thread reuses the guard
                        registry.set(ThreadName::new("worker-renamed"));
                        registry.len()
                    })
                })
                .collect();
            for w in workers {
                assert!(w.join().unwrap() >= 2, "batch {}", batch);
            }
        }

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(), Some(ThreadName::new("main")));
    }

    #[test]
    fn test_exit_after_registry_dropped() {
        use std::sync::mpsc;

        let registry = Arc::new(ThreadNameRegistry::new());
        let (named_tx, named_rx) = mpsc::channel();
        let (exit_tx, exit_rx) = mpsc::channel::<()>();

        let worker = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                registry.set(ThreadName::new("short-lived"));
                drop(registry);
                named_tx.send(()).unwrap();
                exit_rx.recv().unwrap();
            })
        };

        // the guard outlives the registry and must skip it on exit
        named_rx.recv().unwrap();
        drop(registry);
        exit_tx.send(()).unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn test_label_falls_back_to_std_name() {
        let registry = Arc::new(ThreadNameRegistry::new());
        let label = {
            let registry = Arc::clone(&registry);
            std::thread::Builder::new()
                .name("asset-loader".into())
                .spawn(move || registry.label())
                .unwrap()
                .join()
                .unwrap()
        };
        assert_eq!(label, "asset-loader");
    }
}
