use crate::store::Store;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

type MutationFn<S> = dyn Fn(&mut S, &Value) + Send + Sync;
type SyncActionFn<S> = dyn Fn(&Store<S>, Value) -> anyhow::Result<Value> + Send + Sync;
type AsyncActionFn<S> =
    dyn Fn(Store<S>, Value) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync;

/// A synchronous state-mutation handler.
///
/// Handlers receive the state by mutable reference together with the commit
/// payload. A panicking handler propagates the panic to the caller of
/// `commit`.
pub struct Mutation<S> {
    run: Arc<MutationFn<S>>,
}

impl<S> Mutation<S> {
    /// Wrap a synchronous state transition.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut S, &Value) + Send + Sync + 'static,
    {
        Self {
            run: Arc::new(handler),
        }
    }

    pub(crate) fn apply(&self, state: &mut S, payload: &Value) {
        (self.run)(state, payload)
    }
}

impl<S> Clone for Mutation<S> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

/// An orchestration handler invoked by `dispatch`.
///
/// `Sync` handlers run to completion inside `dispatch`; `Async` handlers run
/// up to their first suspension point there and finish when the dispatch
/// result is awaited.
pub enum Action<S> {
    Sync(Arc<SyncActionFn<S>>),
    Async(Arc<AsyncActionFn<S>>),
}

impl<S: Send + Sync + 'static> Action<S> {
    /// Wrap an asynchronous handler.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Store<S>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Action::Async(Arc::new(move |store, payload| handler(store, payload).boxed()))
    }

    /// Wrap a synchronous handler.
    pub fn sync<F>(handler: F) -> Self
    where
        F: Fn(&Store<S>, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Action::Sync(Arc::new(handler))
    }

    pub(crate) fn invoke(
        &self,
        store: &Store<S>,
        payload: Value,
    ) -> BoxFuture<'static, anyhow::Result<Value>> {
        match self {
            Action::Sync(run) => futures::future::ready(run(store, payload)).boxed(),
            Action::Async(run) => run(store.clone(), payload),
        }
    }
}

impl<S> Clone for Action<S> {
    fn clone(&self) -> Self {
        match self {
            Action::Sync(run) => Action::Sync(Arc::clone(run)),
            Action::Async(run) => Action::Async(Arc::clone(run)),
        }
    }
}
