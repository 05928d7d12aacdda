//! Store plugins.
//!
//! A plugin is anything that configures a freshly built store: registering
//! subscribers, attaching watchers, replaying commits into an external sink.
//! Plain closures taking `&Store<S>` are plugins too.

mod logger;

pub use logger::Logger;

use crate::store::Store;

/// Capability implemented by every plugin.
pub trait Plugin<S>: Send + Sync {
    /// Set the plugin up against `store`. Called once per application.
    fn configure(&self, store: &Store<S>);
}

impl<S, F> Plugin<S> for F
where
    F: Fn(&Store<S>) + Send + Sync,
{
    fn configure(&self, store: &Store<S>) {
        self(store)
    }
}
