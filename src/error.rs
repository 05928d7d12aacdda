//! Error types for store operations.

use thiserror::Error;

/// Errors surfaced by the strict store operations and by failing actions.
///
/// The loose `commit`/`dispatch` pair never produces the `Unknown*` variants;
/// those only come from `try_commit`/`try_dispatch`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unknown mutation: {name}")]
    UnknownMutation { name: String },

    #[error("Unknown action: {name}")]
    UnknownAction { name: String },

    #[error("Action `{name}` failed: {source}")]
    ActionFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl StoreError {
    /// Name of the mutation or action the error refers to.
    pub fn name(&self) -> &str {
        match self {
            StoreError::UnknownMutation { name }
            | StoreError::UnknownAction { name }
            | StoreError::ActionFailed { name, .. } => name,
        }
    }
}
