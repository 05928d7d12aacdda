//! The centralized store.
//!
//! A store owns one state value, a registry of synchronous mutations, a
//! registry of actions and an ordered subscriber list. State changes only by
//! committing mutations; actions orchestrate work and commit in turn.

mod handler;
mod options;
mod registry;
mod store;

pub use handler::{Action, Mutation};
pub use options::{StateInit, StoreOptions};
pub use registry::{Entry, Registry, NAMESPACE_SEPARATOR};
pub use store::{Dispatch, MutationRecord, Store, Subscriber, Subscription};
