use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// A normalized binding description: exposed name to source.
///
/// Built either from a plain key list, where each key binds to the source of
/// the same name, or entry by entry. Re-binding a name replaces its source in
/// place.
///
/// ```
/// use larder::{Mapping, StateSource};
///
/// let keys: Mapping<StateSource<(), serde_json::Value>> = Mapping::keys(["count", "name"]);
/// assert_eq!(keys.names().collect::<Vec<_>>(), ["count", "name"]);
///
/// let aliased: Mapping<StateSource<(), serde_json::Value>> = Mapping::new()
///     .entry("total", "count")
///     .entry(
///         "doubled",
///         StateSource::<(), serde_json::Value>::getter(|_, state| {
///             (state["count"].as_i64().unwrap_or(0) * 2).into()
///         }),
///     );
/// assert_eq!(aliased.len(), 2);
/// ```
pub struct Mapping<V> {
    entries: Vec<(String, V)>,
}

impl<V> Mapping<V> {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Bind every key to the source of the same name.
    pub fn keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
        V: From<String>,
    {
        keys.into_iter()
            .map(|key| {
                let key = key.into();
                (key.clone(), V::from(key))
            })
            .collect()
    }

    /// Bind `name` to `source`.
    pub fn entry(mut self, name: impl Into<String>, source: impl Into<V>) -> Self {
        self.insert(name.into(), source.into());
        self
    }

    /// Exposed names, in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of bound names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<(String, V)> {
        self.entries
    }

    fn insert(&mut self, name: String, source: V) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = source,
            None => self.entries.push((name, source)),
        }
    }
}

impl<V> Default for Mapping<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, K, T> FromIterator<(K, T)> for Mapping<V>
where
    K: Into<String>,
    T: Into<V>,
{
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (name, source) in iter {
            mapping.insert(name.into(), source.into());
        }
        mapping
    }
}

/// Where a `map_state` accessor reads from.
pub enum StateSource<C, S> {
    /// A top-level field of the serialized state.
    ///
    /// Every read serializes the whole state to JSON and picks the field;
    /// prefer a getter for large states or hot paths.
    Field {
        name: String,
        read: fn(&S, &str) -> Value,
    },
    /// A function of the calling context and the state.
    Getter(Arc<dyn Fn(&C, &S) -> Value + Send + Sync>),
}

impl<C, S: Serialize> StateSource<C, S> {
    /// Read the top-level field `name` of the serialized state.
    pub fn field(name: impl Into<String>) -> Self {
        StateSource::Field {
            name: name.into(),
            read: field_value::<S>,
        }
    }
}

impl<C, S> StateSource<C, S> {
    /// Compute the value from the calling context and the state.
    pub fn getter<F>(getter: F) -> Self
    where
        F: Fn(&C, &S) -> Value + Send + Sync + 'static,
    {
        StateSource::Getter(Arc::new(getter))
    }

    pub(crate) fn evaluate(&self, ctx: &C, state: &S) -> Value {
        match self {
            StateSource::Field { name, read } => read(state, name),
            StateSource::Getter(getter) => getter(ctx, state),
        }
    }
}

impl<C, S: Serialize> From<String> for StateSource<C, S> {
    fn from(name: String) -> Self {
        StateSource::field(name)
    }
}

impl<C, S: Serialize> From<&str> for StateSource<C, S> {
    fn from(name: &str) -> Self {
        StateSource::field(name)
    }
}

fn field_value<S: Serialize>(state: &S, field: &str) -> Value {
    match serde_json::to_value(state) {
        Ok(Value::Object(mut fields)) => fields.remove(field).unwrap_or(Value::Null),
        Ok(_) => Value::Null,
        Err(e) => {
            tracing::warn!(field, error = %e, "state could not be serialized for field access");
            Value::Null
        }
    }
}

/// How a bound mutation or action method picks the name it forwards to.
///
/// `R` is the registry the resolver inspects.
pub enum TypeSource<C, R> {
    /// A fixed handler name.
    Name(String),
    /// Computed per call from the calling context and the registry.
    Resolver(Arc<dyn Fn(&C, &R) -> String + Send + Sync>),
}

impl<C, R> TypeSource<C, R> {
    /// Forward to a fixed handler name.
    pub fn name(name: impl Into<String>) -> Self {
        TypeSource::Name(name.into())
    }

    /// Compute the handler name per call.
    pub fn resolver<F>(resolver: F) -> Self
    where
        F: Fn(&C, &R) -> String + Send + Sync + 'static,
    {
        TypeSource::Resolver(Arc::new(resolver))
    }
}

impl<C, R> From<String> for TypeSource<C, R> {
    fn from(name: String) -> Self {
        TypeSource::Name(name)
    }
}

impl<C, R> From<&str> for TypeSource<C, R> {
    fn from(name: &str) -> Self {
        TypeSource::Name(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Source = StateSource<(), Value>;

    #[test]
    fn keys_bind_to_same_name() {
        let mapping: Mapping<Source> = Mapping::keys(["a", "b"]);
        let entries = mapping.into_entries();

        assert_eq!(entries.len(), 2);
        assert!(matches!(&entries[0], (key, StateSource::Field { name, .. }) if key == "a" && name == "a"));
        assert!(matches!(&entries[1], (key, StateSource::Field { name, .. }) if key == "b" && name == "b"));
    }

    #[test]
    fn rebinding_replaces_in_place() {
        let mapping: Mapping<Source> = Mapping::new()
            .entry("a", "x")
            .entry("b", "y")
            .entry("a", "z");

        assert_eq!(mapping.names().collect::<Vec<_>>(), ["a", "b"]);
        let entries = mapping.into_entries();
        assert!(matches!(&entries[0].1, StateSource::Field { name, .. } if name == "z"));
    }

    #[test]
    fn collects_from_pairs() {
        let mapping: Mapping<TypeSource<(), ()>> =
            vec![("add", "cart/add"), ("clear", "cart/clear")].into_iter().collect();

        assert_eq!(mapping.len(), 2);
        assert!(!mapping.is_empty());
    }
}
