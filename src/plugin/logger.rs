use crate::plugin::Plugin;
use crate::store::{MutationRecord, Store};
use serde::Serialize;
use std::sync::Arc;
use tracing::Level;

type Filter = Arc<dyn Fn(&MutationRecord) -> bool + Send + Sync>;

/// Plugin that emits a `tracing` event for every commit.
///
/// Events carry the mutation name and payload. With
/// [`with_state`](Logger::with_state) the pre-commit state is attached as
/// JSON, which requires the state to be `Serialize`.
#[derive(Clone)]
pub struct Logger {
    level: Level,
    filter: Option<Filter>,
    with_state: bool,
}

impl Logger {
    /// A logger at `INFO` that accepts every mutation and omits state.
    pub fn new() -> Self {
        Self {
            level: Level::INFO,
            filter: None,
            with_state: false,
        }
    }

    /// Level of the emitted events.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Only log commits for which `filter` returns `true`.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&MutationRecord) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Attach the serialized state to each event.
    pub fn with_state(mut self) -> Self {
        self.with_state = true;
        self
    }

    fn accepts(&self, record: &MutationRecord) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(record))
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Plugin<S> for Logger
where
    S: Serialize + Send + Sync + 'static,
{
    fn configure(&self, store: &Store<S>) {
        let logger = self.clone();
        // Lives as long as the store.
        let _ = store.subscribe(move |record, state| {
            if !logger.accepts(record) {
                return;
            }
            let state = if logger.with_state {
                serde_json::to_string(state).unwrap_or_else(|e| format!("<unserializable: {e}>"))
            } else {
                String::new()
            };
            emit(logger.level, record, &state);
        });
    }
}

// `tracing` macros need the level as a constant.
fn emit(level: Level, record: &MutationRecord, state: &str) {
    let name = record.name.as_str();
    let payload = &record.payload;
    match level {
        Level::ERROR => tracing::error!(mutation = name, %payload, state, "mutation"),
        Level::WARN => tracing::warn!(mutation = name, %payload, state, "mutation"),
        Level::INFO => tracing::info!(mutation = name, %payload, state, "mutation"),
        Level::DEBUG => tracing::debug!(mutation = name, %payload, state, "mutation"),
        _ => tracing::trace!(mutation = name, %payload, state, "mutation"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreOptions;
    use serde_json::json;

    #[derive(Clone, Default, Serialize)]
    struct Counter {
        count: i64,
    }

    #[test]
    fn logger_registers_one_subscriber() {
        let store = StoreOptions::new(Counter::default())
            .mutation("inc", |state: &mut Counter, _: &serde_json::Value| {
                state.count += 1
            })
            .plugin(Logger::new().level(Level::DEBUG).with_state())
            .build();

        assert_eq!(store.subscriber_count(), 1);
        store.commit("inc", json!(null));
        assert_eq!(store.get().count, 1);
    }

    #[test]
    fn filter_is_consulted() {
        let logger = Logger::new().filter(|record| record.name.starts_with("cart/"));
        let record = |name: &str| MutationRecord {
            name: name.to_string(),
            payload: json!(null),
        };

        assert!(logger.accepts(&record("cart/add")));
        assert!(!logger.accepts(&record("inc")));
        assert!(Logger::default().accepts(&record("inc")));
    }
}
