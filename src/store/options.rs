use crate::plugin::Plugin;
use crate::store::{Action, Mutation, MutationRecord, Registry, Store, Subscriber};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Where the initial state comes from.
pub enum StateInit<S> {
    Value(S),
    Factory(Box<dyn FnOnce() -> S + Send>),
}

impl<S> StateInit<S> {
    pub(crate) fn resolve(self) -> S {
        match self {
            StateInit::Value(value) => value,
            StateInit::Factory(factory) => factory(),
        }
    }
}

/// Construction options for a [`Store`].
///
/// ```
/// use larder::StoreOptions;
/// use serde_json::json;
///
/// #[derive(Clone, Default)]
/// struct Counter {
///     count: i64,
/// }
///
/// let store = StoreOptions::from_factory(Counter::default)
///     .mutation("inc", |state: &mut Counter, payload| {
///         state.count += payload.as_i64().unwrap_or(1);
///     })
///     .build();
///
/// store.commit("inc", json!(5));
/// assert_eq!(store.get().count, 5);
/// ```
pub struct StoreOptions<S> {
    state: StateInit<S>,
    mutations: Registry<Mutation<S>>,
    actions: Registry<Action<S>>,
    plugins: Vec<Box<dyn Plugin<S>>>,
    subscribers: Vec<Subscriber<S>>,
}

impl<S: Send + Sync + 'static> StoreOptions<S> {
    /// Start from an initial state value.
    pub fn new(state: S) -> Self {
        Self::with_init(StateInit::Value(state))
    }

    /// Start from a state factory. The factory runs once, in [`build`](Self::build).
    pub fn from_factory<F>(factory: F) -> Self
    where
        F: FnOnce() -> S + Send + 'static,
    {
        Self::with_init(StateInit::Factory(Box::new(factory)))
    }

    fn with_init(state: StateInit<S>) -> Self {
        Self {
            state,
            mutations: Registry::new(),
            actions: Registry::new(),
            plugins: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    /// Register a mutation at the root namespace.
    pub fn mutation<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut S, &Value) + Send + Sync + 'static,
    {
        self.mutations.insert(name, Mutation::new(handler));
        self
    }

    /// Merge a prepared (possibly namespaced) mutation registry.
    pub fn mutations(mut self, mutations: Registry<Mutation<S>>) -> Self {
        self.mutations.merge(mutations);
        self
    }

    /// Register an asynchronous action at the root namespace.
    pub fn action<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Store<S>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.actions.insert(name, Action::new(handler));
        self
    }

    /// Register a synchronous action at the root namespace.
    pub fn sync_action<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Store<S>, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.actions.insert(name, Action::sync(handler));
        self
    }

    /// Merge a prepared (possibly namespaced) action registry.
    pub fn actions(mut self, actions: Registry<Action<S>>) -> Self {
        self.actions.merge(actions);
        self
    }

    /// Add a plugin. Plugins run in registration order once the store exists.
    pub fn plugin<P>(mut self, plugin: P) -> Self
    where
        P: Plugin<S> + 'static,
    {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Add an initial subscriber.
    pub fn subscriber<F>(mut self, callback: F) -> Self
    where
        F: Fn(&MutationRecord, &S) + Send + Sync + 'static,
    {
        self.subscribers.push(Arc::new(callback));
        self
    }

    /// Build the store and apply plugins.
    pub fn build(self) -> Store<S> {
        let StoreOptions {
            state,
            mutations,
            actions,
            plugins,
            subscribers,
        } = self;

        let store = Store::from_parts(state.resolve(), mutations, actions, subscribers);
        for plugin in &plugins {
            store.use_plugin(plugin.as_ref());
        }
        store
    }
}
