//! Observable state holder backing every store.
//!
//! The store never hands out mutable access to its state. Writes go through
//! mutation handlers, and anything that wants to react to them (a UI binding,
//! a debugger) registers a watcher here.

mod cell;

pub use cell::{Reactive, WatchGuard};
