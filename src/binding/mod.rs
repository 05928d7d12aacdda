//! Binder helpers that expose a store as named accessor and method maps.
//!
//! A [`Mapping`] describes what to bind; `Store::map_state`,
//! `Store::map_mutations` and `Store::map_actions` turn it into callables a
//! caller can hang off its own type. Every callable takes a calling context
//! `C`, which getters and resolvers receive; use `()` when there is none.

mod binders;
mod mapping;

pub use binders::{ActionMethods, BoundMethods, MutationMethods, StateAccessors};
pub use mapping::{Mapping, StateSource, TypeSource};
