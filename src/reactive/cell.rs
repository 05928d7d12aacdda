use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

type Watcher<S> = Arc<dyn Fn(&S) + Send + Sync>;
type WatcherList<S> = RwLock<Vec<(usize, Watcher<S>)>>;

/// A state value that notifies watchers after every write.
///
/// Cloning a `Reactive` produces another handle to the same value.
pub struct Reactive<S> {
    value: Arc<RwLock<S>>,
    watchers: Arc<WatcherList<S>>,
    next_id: Arc<AtomicUsize>,
    version: Arc<AtomicU64>,
}

impl<S: Send + Sync + 'static> Reactive<S> {
    /// Wrap an initial value.
    pub fn new(initial: S) -> Self {
        Self {
            value: Arc::new(RwLock::new(initial)),
            watchers: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicUsize::new(0)),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> S
    where
        S: Clone,
    {
        self.value.read_recursive().clone()
    }

    /// Read the value with a function without cloning.
    ///
    /// Reads nest: a watcher or subscriber may read again while notified.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let value = self.value.read_recursive();
        f(&*value)
    }

    /// Number of writes applied so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Apply a write and notify watchers.
    ///
    /// The write lock is released before watchers run, so watchers may read
    /// the value but must not write it.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let result = {
            let mut value = self.value.write();
            f(&mut *value)
        };
        self.version.fetch_add(1, Ordering::SeqCst);
        self.notify();
        result
    }

    /// Watch the value for changes.
    ///
    /// The callback runs once immediately with the current value and then
    /// after every write until the returned guard is dropped.
    pub fn watch<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let callback: Watcher<S> = Arc::new(callback);
        self.watchers.write().push((id, Arc::clone(&callback)));

        self.read(|value| callback(value));

        let weak: Weak<WatcherList<S>> = Arc::downgrade(&self.watchers);
        WatchGuard {
            detach: Some(Box::new(move || {
                if let Some(watchers) = weak.upgrade() {
                    watchers.write().retain(|(watcher_id, _)| *watcher_id != id);
                }
            })),
        }
    }

    /// Number of live watchers.
    pub fn watcher_count(&self) -> usize {
        self.watchers.read().len()
    }

    fn notify(&self) {
        // Snapshot so a watcher can drop its own guard while being notified.
        let watchers: Vec<Watcher<S>> = self
            .watchers
            .read()
            .iter()
            .map(|(_, watcher)| Arc::clone(watcher))
            .collect();

        let value = self.value.read_recursive();
        for watcher in watchers {
            watcher(&*value);
        }
    }
}

impl<S> Clone for Reactive<S> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            watchers: Arc::clone(&self.watchers),
            next_id: Arc::clone(&self.next_id),
            version: Arc::clone(&self.version),
        }
    }
}

/// RAII guard for state watchers.
pub struct WatchGuard {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl WatchGuard {
    /// Keep the watcher attached for the lifetime of the state.
    pub fn forget(mut self) {
        self.detach.take();
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}
