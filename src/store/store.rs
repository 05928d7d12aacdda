use crate::error::StoreError;
use crate::plugin::Plugin;
use crate::reactive::{Reactive, WatchGuard};
use crate::store::{Action, Mutation, Registry};
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{hash_map, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

/// Callback notified before every commit.
pub type Subscriber<S> = Arc<dyn Fn(&MutationRecord, &S) + Send + Sync>;

type SubscriberList<S> = RwLock<Vec<(usize, Subscriber<S>)>>;

/// Result of [`Store::dispatch`]: always a future, whatever the handler kind.
pub type Dispatch = BoxFuture<'static, Result<Option<Value>, StoreError>>;

/// What subscribers see for each commit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MutationRecord {
    pub name: String,
    pub payload: Value,
}

struct StoreInner<S> {
    state: Reactive<S>,
    mutations: Registry<Mutation<S>>,
    actions: Registry<Action<S>>,
    subscribers: Arc<SubscriberList<S>>,
    next_subscriber: AtomicUsize,
}

/// A centralized state container.
///
/// State changes only through registered mutations; actions orchestrate
/// (possibly asynchronous) work and commit mutations themselves. `Store` is a
/// cheap handle: clones share the same state, handlers and subscribers.
///
/// # Nested commits
///
/// A commit issued while another commit of the same store is running on the
/// same thread (from a subscriber, a mutation handler or a watcher) is
/// queued. It runs, subscribers included, once the running commit has
/// finished, and queued commits run in the order they were issued. A
/// subscriber that commits on every notification therefore never settles.
pub struct Store<S> {
    inner: Arc<StoreInner<S>>,
}

impl<S: Send + Sync + 'static> Store<S> {
    pub(crate) fn from_parts(
        state: S,
        mutations: Registry<Mutation<S>>,
        actions: Registry<Action<S>>,
        subscribers: Vec<Subscriber<S>>,
    ) -> Self {
        let next_subscriber = AtomicUsize::new(subscribers.len());
        let subscribers = subscribers.into_iter().enumerate().collect();

        Self {
            inner: Arc::new(StoreInner {
                state: Reactive::new(state),
                mutations,
                actions,
                subscribers: Arc::new(RwLock::new(subscribers)),
                next_subscriber,
            }),
        }
    }

    /// The observable state cell.
    pub fn state(&self) -> &Reactive<S> {
        &self.inner.state
    }

    /// Get a clone of the current state.
    pub fn get(&self) -> S
    where
        S: Clone,
    {
        self.inner.state.get()
    }

    /// Read state without cloning.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        self.inner.state.read(f)
    }

    /// Watch the state; see [`Reactive::watch`].
    ///
    /// Commits made by the immediate first call are queued until it returns.
    pub fn watch<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.batch(|| self.inner.state.watch(callback))
    }

    /// Registered mutations.
    pub fn mutations(&self) -> &Registry<Mutation<S>> {
        &self.inner.mutations
    }

    /// Registered actions.
    pub fn actions(&self) -> &Registry<Action<S>> {
        &self.inner.actions
    }

    /// Subscribe to commits.
    ///
    /// The callback sees every commit, known or not, before the mutation
    /// runs. Subscribing or unsubscribing from inside a subscriber takes
    /// effect from the next commit; no other ordering is promised.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&MutationRecord, &S) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::SeqCst);
        self.inner
            .subscribers
            .write()
            .push((id, Arc::new(callback)));

        let subscribers: Weak<SubscriberList<S>> = Arc::downgrade(&self.inner.subscribers);
        Subscription {
            remove: Box::new(move || {
                if let Some(subscribers) = subscribers.upgrade() {
                    let mut subscribers = subscribers.write();
                    if let Some(position) = subscribers.iter().position(|(sub_id, _)| *sub_id == id)
                    {
                        subscribers.remove(position);
                    }
                }
            }),
        }
    }

    /// Number of current subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Commit a mutation.
    ///
    /// Every subscriber is notified, in subscription order, before the
    /// handler runs. Unknown names are ignored. A mutation handler gets the
    /// state as its argument and must not read it back through the store,
    /// which is write-locked while the handler runs. See the
    /// [type docs](Store#nested-commits) for commits issued while one is
    /// already running.
    pub fn commit(&self, name: &str, payload: Value) {
        let record = MutationRecord {
            name: name.to_string(),
            payload,
        };
        match CommitScope::defer(self.key(), record) {
            Some(record) => self.batch(|| self.apply(&record)),
            None => tracing::trace!(mutation = name, "commit queued behind running commit"),
        }
    }

    /// Run `f` as the outermost commit scope of this thread, then drain the
    /// commits it queued. Inside an existing scope `f` just runs.
    fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        let Some(scope) = CommitScope::enter(self.key()) else {
            return f();
        };
        let result = f();
        while let Some(record) = scope.next() {
            self.apply(&record);
        }
        result
    }

    fn apply(&self, record: &MutationRecord) {
        let name = record.name.as_str();
        tracing::trace!(mutation = name, "commit");

        self.notify(record);

        match self.inner.mutations.resolve(name) {
            Some(mutation) => {
                self.inner
                    .state
                    .update(|state| mutation.apply(state, &record.payload));
            }
            None => tracing::debug!(mutation = name, "ignoring commit of unknown mutation"),
        }
    }

    /// Commit a mutation, failing on unknown names.
    ///
    /// Unlike [`commit`](Self::commit), an unknown name notifies no one.
    pub fn try_commit(&self, name: &str, payload: Value) -> Result<(), StoreError> {
        if !self.inner.mutations.contains(name) {
            return Err(StoreError::UnknownMutation {
                name: name.to_string(),
            });
        }
        self.commit(name, payload);
        Ok(())
    }

    /// Dispatch an action.
    ///
    /// The handler runs before this returns: synchronous handlers to
    /// completion, asynchronous ones up to their first suspension point.
    /// Awaiting the returned future drives the rest. Unknown names resolve
    /// to `Ok(None)`.
    pub fn dispatch(&self, name: &str, payload: Value) -> Dispatch {
        tracing::trace!(action = name, "dispatch");

        match self.inner.actions.resolve(name) {
            Some(action) => {
                let name = name.to_string();
                let mut dispatch = action
                    .invoke(self, payload)
                    .map(move |result| {
                        result
                            .map(Some)
                            .map_err(|source| StoreError::ActionFailed { name, source })
                    })
                    .boxed();

                let mut cx = Context::from_waker(futures::task::noop_waker_ref());
                match dispatch.poll_unpin(&mut cx) {
                    Poll::Ready(output) => future::ready(output).boxed(),
                    Poll::Pending => dispatch,
                }
            }
            None => {
                tracing::debug!(action = name, "ignoring dispatch of unknown action");
                future::ready(Ok(None)).boxed()
            }
        }
    }

    /// Dispatch an action, failing on unknown names.
    pub fn try_dispatch(&self, name: &str, payload: Value) -> Dispatch {
        if !self.inner.actions.contains(name) {
            let err = StoreError::UnknownAction {
                name: name.to_string(),
            };
            return future::ready(Err(err)).boxed();
        }
        self.dispatch(name, payload)
    }

    /// Apply a plugin to this store.
    pub fn use_plugin<P>(&self, plugin: &P)
    where
        P: Plugin<S> + ?Sized,
    {
        plugin.configure(self);
    }

    fn key(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    fn notify(&self, record: &MutationRecord) {
        let subscribers: Vec<Subscriber<S>> = self
            .inner
            .subscribers
            .read()
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();

        self.inner.state.read(|state| {
            for subscriber in &subscribers {
                subscriber(record, state);
            }
        });
    }
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

thread_local! {
    /// Commits queued per store while that store is committing on this thread.
    static PENDING: RefCell<HashMap<usize, VecDeque<MutationRecord>>> =
        RefCell::new(HashMap::new());
}

/// Marks a store as committing on the current thread until dropped.
struct CommitScope {
    key: usize,
}

impl CommitScope {
    fn enter(key: usize) -> Option<Self> {
        PENDING.with(|pending| match pending.borrow_mut().entry(key) {
            hash_map::Entry::Occupied(_) => None,
            hash_map::Entry::Vacant(slot) => {
                slot.insert(VecDeque::new());
                Some(CommitScope { key })
            }
        })
    }

    /// Queue `record` if the store is already committing on this thread,
    /// otherwise hand it back.
    fn defer(key: usize, record: MutationRecord) -> Option<MutationRecord> {
        PENDING.with(|pending| match pending.borrow_mut().get_mut(&key) {
            Some(queue) => {
                queue.push_back(record);
                None
            }
            None => Some(record),
        })
    }

    fn next(&self) -> Option<MutationRecord> {
        PENDING.with(|pending| {
            pending
                .borrow_mut()
                .get_mut(&self.key)
                .and_then(VecDeque::pop_front)
        })
    }
}

impl Drop for CommitScope {
    fn drop(&mut self) {
        // A panicking commit discards whatever it queued.
        let _ = PENDING.try_with(|pending| pending.borrow_mut().remove(&self.key));
    }
}

/// Handle returned by [`Store::subscribe`].
///
/// Dropping the handle keeps the subscriber registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[must_use = "dropping a Subscription keeps the subscriber; call unsubscribe() to remove it"]
pub struct Subscription {
    remove: Box<dyn FnOnce() + Send + Sync>,
}

impl Subscription {
    /// Remove the subscriber. A no-op once the store is gone.
    pub fn unsubscribe(self) {
        (self.remove)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreOptions;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Mutex, OnceLock};

    #[derive(Clone, Debug, PartialEq, Default)]
    struct AppState {
        count: i64,
        name: String,
    }

    fn counter_store() -> Store<AppState> {
        StoreOptions::from_factory(AppState::default)
            .mutation("inc", |state: &mut AppState, payload: &Value| {
                state.count += payload.as_i64().unwrap_or(0);
            })
            .mutation("rename", |state: &mut AppState, payload: &Value| {
                state.name = payload.as_str().unwrap_or_default().to_string();
            })
            .build()
    }

    #[test]
    fn commit_known_and_unknown() {
        let store = counter_store();

        store.commit("inc", json!(5));
        assert_eq!(store.get().count, 5);

        store.commit("dec", json!(5));
        assert_eq!(store.get().count, 5);
    }

    #[test]
    fn subscribers_run_in_order_before_handler() {
        let store = counter_store();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second"] {
            let seen = seen.clone();
            let _ = store.subscribe(move |record, state| {
                seen.lock()
                    .unwrap()
                    .push((label, record.name.clone(), state.count));
            });
        }

        store.commit("inc", json!(3));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("first", "inc".to_string(), 0), ("second", "inc".to_string(), 0)]
        );
        assert_eq!(store.get().count, 3);
    }

    #[test]
    fn unsubscribe_removes_only_that_callback() {
        let store = counter_store();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let first_clone = first.clone();
        let subscription = store.subscribe(move |_, _| {
            first_clone.fetch_add(1, Ordering::SeqCst);
        });
        let second_clone = second.clone();
        let _keep = store.subscribe(move |_, _| {
            second_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.commit("inc", json!(1));
        subscription.unsubscribe();
        store.commit("inc", json!(1));

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn unknown_commit_still_notifies_subscribers() {
        let store = counter_store();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let _sub = store.subscribe(move |_, _| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.commit("missing", Value::Null);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get(), AppState::default());
    }

    #[test]
    fn try_commit_rejects_unknown_without_notifying() {
        let store = counter_store();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let _sub = store.subscribe(move |_, _| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        let err = store.try_commit("missing", Value::Null).unwrap_err();

        assert!(matches!(err, StoreError::UnknownMutation { ref name } if name == "missing"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(store.try_commit("rename", json!("tin")).is_ok());
        assert_eq!(store.get().name, "tin");
    }

    #[test]
    fn commit_from_subscriber_runs_after_outer_commit() {
        let store = counter_store();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let handle = store.clone();
        let seen_clone = seen.clone();
        let _sub = store.subscribe(move |record, state| {
            seen_clone
                .lock()
                .unwrap()
                .push((record.name.clone(), state.count));
            if record.name == "inc" {
                handle.commit("rename", json!(format!("after {}", record.payload)));
            }
        });

        store.commit("inc", json!(2));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("inc".to_string(), 0), ("rename".to_string(), 2)]
        );
        assert_eq!(store.get().name, "after 2");
    }

    #[test]
    fn commit_from_mutation_handler_is_queued() {
        let slot: Arc<OnceLock<Store<AppState>>> = Arc::new(OnceLock::new());
        let slot_clone = slot.clone();

        let store = StoreOptions::new(AppState::default())
            .mutation("inc", |state: &mut AppState, payload: &Value| {
                state.count += payload.as_i64().unwrap_or(0);
            })
            .mutation("incAndName", move |state: &mut AppState, _: &Value| {
                state.count += 1;
                if let Some(store) = slot_clone.get() {
                    store.commit("inc", json!(10));
                }
            })
            .build();
        let _ = slot.set(store.clone());

        store.commit("incAndName", Value::Null);

        assert_eq!(store.get().count, 11);
    }

    #[test]
    fn nested_commits_run_in_issue_order() {
        let store = counter_store();
        let handle = store.clone();
        let _sub = store.subscribe(move |record, _| {
            if record.name == "inc" && record.payload == json!(1) {
                handle.commit("rename", json!("a"));
                handle.commit("rename", json!("b"));
            }
        });

        store.commit("inc", json!(1));

        assert_eq!(store.get().name, "b");
    }

    #[test]
    fn watcher_commits_settle() {
        let store = counter_store();

        let handle = store.clone();
        let _guard = store.watch(move |state| {
            if state.count == 0 {
                handle.commit("inc", json!(5));
            } else if state.count == 6 && state.name.is_empty() {
                handle.commit("rename", json!("six"));
            }
        });
        assert_eq!(store.get().count, 5);

        store.commit("inc", json!(1));

        let state = store.get();
        assert_eq!(state.count, 6);
        assert_eq!(state.name, "six");
    }

    #[test]
    fn clones_share_state() {
        let store = counter_store();
        let other = store.clone();

        other.commit("inc", json!(2));

        assert_eq!(store.read(|state| state.count), 2);
    }
}
