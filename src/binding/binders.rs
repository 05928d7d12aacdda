use crate::binding::{Mapping, StateSource, TypeSource};
use crate::store::{Action, Dispatch, Mutation, Registry, Store};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

type Accessor<C> = Arc<dyn Fn(&C) -> Value + Send + Sync>;
type Method<C, R> = Arc<dyn Fn(&C, Value) -> R + Send + Sync>;

/// Read-only accessors produced by [`Store::map_state`].
pub struct StateAccessors<C> {
    accessors: BTreeMap<String, Accessor<C>>,
}

impl<C> StateAccessors<C> {
    /// Read the value bound to `name`, evaluated against the current state.
    pub fn call(&self, name: &str, ctx: &C) -> Option<Value> {
        self.accessors.get(name).map(|accessor| accessor(ctx))
    }

    /// The accessor bound to `name`, for callers that want to keep it.
    pub fn get(&self, name: &str) -> Option<Accessor<C>> {
        self.accessors.get(name).cloned()
    }

    /// Bound names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.accessors.keys().map(String::as_str)
    }
}

/// Payload-taking methods produced by [`Store::map_mutations`] and
/// [`Store::map_actions`].
pub struct BoundMethods<C, R> {
    methods: BTreeMap<String, Method<C, R>>,
}

/// Methods forwarding to `commit`.
pub type MutationMethods<C> = BoundMethods<C, ()>;

/// Methods forwarding to `dispatch`.
pub type ActionMethods<C> = BoundMethods<C, Dispatch>;

impl<C, R> BoundMethods<C, R> {
    /// Invoke the method bound to `name`. `None` if nothing is bound to it.
    pub fn call(&self, name: &str, ctx: &C, payload: Value) -> Option<R> {
        self.methods.get(name).map(|method| method(ctx, payload))
    }

    /// The method bound to `name`, for callers that want to keep it.
    pub fn get(&self, name: &str) -> Option<Method<C, R>> {
        self.methods.get(name).cloned()
    }

    /// Bound names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

impl<S: Send + Sync + 'static> Store<S> {
    /// Bind state fields and getters to named accessors.
    ///
    /// Only field sources need `S: Serialize`; a mapping made purely of
    /// getters works for any state type.
    ///
    /// ```
    /// use larder::{Mapping, StoreOptions};
    /// use serde_json::{json, Value};
    ///
    /// let store = StoreOptions::new(json!({ "x": 1 }))
    ///     .mutation("set", |state: &mut Value, payload: &Value| state["x"] = payload.clone())
    ///     .build();
    /// let accessors = store.map_state::<()>(Mapping::new().entry("a", "x"));
    ///
    /// assert_eq!(accessors.call("a", &()), Some(json!(1)));
    /// store.commit("set", json!(2));
    /// assert_eq!(accessors.call("a", &()), Some(json!(2)));
    /// ```
    pub fn map_state<C: 'static>(&self, mapping: Mapping<StateSource<C, S>>) -> StateAccessors<C> {
        let accessors = mapping
            .into_entries()
            .into_iter()
            .map(|(name, source)| {
                let store = self.clone();
                let accessor: Accessor<C> =
                    Arc::new(move |ctx: &C| store.read(|state| source.evaluate(ctx, state)));
                (name, accessor)
            })
            .collect();

        StateAccessors { accessors }
    }

    /// Bind mutation names to methods that commit them.
    pub fn map_mutations<C: 'static>(
        &self,
        mapping: Mapping<TypeSource<C, Registry<Mutation<S>>>>,
    ) -> MutationMethods<C> {
        map_to_methods(self, mapping, Store::mutations, Store::commit)
    }

    /// Bind action names to methods that dispatch them.
    pub fn map_actions<C: 'static>(
        &self,
        mapping: Mapping<TypeSource<C, Registry<Action<S>>>>,
    ) -> ActionMethods<C> {
        map_to_methods(self, mapping, Store::actions, Store::dispatch)
    }
}

fn map_to_methods<S, C, H, R>(
    store: &Store<S>,
    mapping: Mapping<TypeSource<C, Registry<H>>>,
    registry: fn(&Store<S>) -> &Registry<H>,
    run: fn(&Store<S>, &str, Value) -> R,
) -> BoundMethods<C, R>
where
    S: Send + Sync + 'static,
    C: 'static,
    H: 'static,
    R: 'static,
{
    let methods = mapping
        .into_entries()
        .into_iter()
        .map(|(name, source)| {
            let store = store.clone();
            let method: Method<C, R> = Arc::new(move |ctx: &C, payload: Value| {
                let target: Cow<'_, str> = match &source {
                    TypeSource::Name(target) => Cow::Borrowed(target.as_str()),
                    TypeSource::Resolver(resolve) => Cow::Owned(resolve(ctx, registry(&store))),
                };
                run(&store, &target, payload)
            });
            (name, method)
        })
        .collect();

    BoundMethods { methods }
}
