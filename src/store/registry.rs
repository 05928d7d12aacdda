use std::collections::BTreeMap;

/// Separator between namespace segments in a handler name.
pub const NAMESPACE_SEPARATOR: char = '/';

/// A node in a handler registry: either a handler or a nested namespace.
pub enum Entry<H> {
    Handler(H),
    Namespace(Registry<H>),
}

/// Name-to-handler map with nested namespaces.
///
/// Names resolve in two steps. The whole name is first tried as a direct key
/// of this registry. If that fails and the name contains `/`, it is split into
/// segments: every segment but the last must name a namespace and the last
/// must name a handler. Empty segments never match.
///
/// ```
/// use larder::Registry;
///
/// let cart = Registry::new().with("add", 1);
/// let registry = Registry::new().with("reset", 0).nest("cart", cart);
///
/// assert_eq!(registry.resolve("reset"), Some(&0));
/// assert_eq!(registry.resolve("cart/add"), Some(&1));
/// assert_eq!(registry.resolve("cart"), None);
/// ```
pub struct Registry<H> {
    entries: BTreeMap<String, Entry<H>>,
}

impl<H> Registry<H> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register a handler, replacing any entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, handler: H) {
        self.entries.insert(name.into(), Entry::Handler(handler));
    }

    /// Register a nested namespace, replacing any entry with the same name.
    pub fn insert_namespace(&mut self, name: impl Into<String>, namespace: Registry<H>) {
        self.entries.insert(name.into(), Entry::Namespace(namespace));
    }

    /// Builder form of [`Registry::insert`].
    pub fn with(mut self, name: impl Into<String>, handler: H) -> Self {
        self.insert(name, handler);
        self
    }

    /// Builder form of [`Registry::insert_namespace`].
    pub fn nest(mut self, name: impl Into<String>, namespace: Registry<H>) -> Self {
        self.insert_namespace(name, namespace);
        self
    }

    /// Resolve a handler by name.
    pub fn resolve(&self, name: &str) -> Option<&H> {
        if let Some(Entry::Handler(handler)) = self.entries.get(name) {
            return Some(handler);
        }
        if !name.contains(NAMESPACE_SEPARATOR) {
            return None;
        }

        let mut segments = name.split(NAMESPACE_SEPARATOR).peekable();
        let mut current = self;
        while let Some(segment) = segments.next() {
            if segment.is_empty() {
                return None;
            }
            match (current.entries.get(segment), segments.peek()) {
                (Some(Entry::Handler(handler)), None) => return Some(handler),
                (Some(Entry::Namespace(namespace)), Some(_)) => current = namespace,
                _ => return None,
            }
        }
        None
    }

    /// Whether `name` resolves to a handler.
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Fully qualified names of every handler, namespaces flattened with `/`.
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names("", &mut names);
        names
    }

    /// Number of handlers, including those in nested namespaces.
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .map(|entry| match entry {
                Entry::Handler(_) => 1,
                Entry::Namespace(namespace) => namespace.len(),
            })
            .sum()
    }

    /// Whether no handler is registered at any depth.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move every entry of `other` into this registry.
    ///
    /// Namespaces present on both sides are merged recursively; otherwise the
    /// entry from `other` wins.
    pub fn merge(&mut self, other: Registry<H>) {
        for (name, entry) in other.entries {
            match (self.entries.get_mut(&name), entry) {
                (Some(Entry::Namespace(existing)), Entry::Namespace(incoming)) => {
                    existing.merge(incoming);
                }
                (_, entry) => {
                    self.entries.insert(name, entry);
                }
            }
        }
    }

    fn collect_names(&self, prefix: &str, out: &mut Vec<String>) {
        for (name, entry) in &self.entries {
            let qualified = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}{NAMESPACE_SEPARATOR}{name}")
            };
            match entry {
                Entry::Handler(_) => out.push(qualified),
                Entry::Namespace(namespace) => namespace.collect_names(&qualified, out),
            }
        }
    }
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Registry<&'static str> {
        let items = Registry::new().with("add", "cart/items/add");
        let cart = Registry::new()
            .with("clear", "cart/clear")
            .nest("items", items);
        Registry::new()
            .with("inc", "inc")
            .with("a/b", "literal a/b")
            .nest("cart", cart)
    }

    #[test]
    fn direct_key_lookup() {
        let registry = sample();
        assert_eq!(registry.resolve("inc"), Some(&"inc"));
        assert_eq!(registry.resolve("dec"), None);
    }

    #[test]
    fn direct_key_wins_over_traversal() {
        let registry = sample();
        assert_eq!(registry.resolve("a/b"), Some(&"literal a/b"));
    }

    #[test]
    fn nested_lookup_walks_namespaces() {
        let registry = sample();
        assert_eq!(registry.resolve("cart/clear"), Some(&"cart/clear"));
        assert_eq!(registry.resolve("cart/items/add"), Some(&"cart/items/add"));
    }

    #[test]
    fn namespace_or_malformed_path_does_not_resolve() {
        let registry = sample();
        assert_eq!(registry.resolve("cart"), None);
        assert_eq!(registry.resolve("cart/items"), None);
        assert_eq!(registry.resolve("cart//clear"), None);
        assert_eq!(registry.resolve("/inc"), None);
        assert_eq!(registry.resolve("inc/extra"), None);
    }

    #[test]
    fn names_are_flattened() {
        let registry = sample();
        assert_eq!(
            registry.names(),
            vec!["a/b", "cart/clear", "cart/items/add", "inc"]
        );
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn merge_combines_namespaces() {
        let mut registry = sample();
        registry.merge(
            Registry::new()
                .with("inc", "inc v2")
                .nest("cart", Registry::new().with("checkout", "cart/checkout")),
        );

        assert_eq!(registry.resolve("inc"), Some(&"inc v2"));
        assert!(registry.contains("cart/clear"));
        assert!(registry.contains("cart/checkout"));
    }
}
