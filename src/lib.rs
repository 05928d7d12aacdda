//! # Larder
//!
//! A minimal centralized state container for Rust.
//!
//! A [`Store`] owns a single state value and exposes it through a small,
//! fixed surface:
//!
//! - **Mutations** - synchronous handlers, the only way state changes
//!   ([`Store::commit`])
//! - **Actions** - synchronous or asynchronous orchestration handlers that
//!   commit mutations ([`Store::dispatch`], always returns a future)
//! - **Subscribers** - callbacks notified before every commit
//!   ([`Store::subscribe`])
//! - **Plugins** - setup hooks applied once the store exists
//!   ([`Store::use_plugin`])
//! - **Binders** - [`Store::map_state`], [`Store::map_mutations`] and
//!   [`Store::map_actions`] turn the store into named accessor maps
//!
//! Handler names may be namespaced with `/` (`"cart/add"`); see
//! [`Registry`] for the resolution rule.
//!
//! ```
//! use larder::StoreOptions;
//! use serde_json::json;
//!
//! #[derive(Clone, Default)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! let store = StoreOptions::from_factory(Counter::default)
//!     .mutation("inc", |state: &mut Counter, payload: &serde_json::Value| {
//!         state.count += payload.as_i64().unwrap_or(0);
//!     })
//!     .build();
//!
//! store.commit("inc", json!(5));
//! store.commit("dec", json!(5)); // unknown: ignored
//! assert_eq!(store.get().count, 5);
//! ```

pub mod binding;
pub mod error;
pub mod plugin;
pub mod reactive;
pub mod store;

// Re-export main types for convenience
pub use binding::{
    ActionMethods, BoundMethods, Mapping, MutationMethods, StateAccessors, StateSource, TypeSource,
};
pub use error::StoreError;
pub use plugin::{Logger, Plugin};
pub use reactive::{Reactive, WatchGuard};
pub use store::{
    Action, Dispatch, Mutation, MutationRecord, Registry, StateInit, Store, StoreOptions,
    Subscription,
};
