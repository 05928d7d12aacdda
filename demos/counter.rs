//! Counter application demonstrating commits, actions, subscribers and binders

use larder::{Logger, Mapping, Store, StoreOptions};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Clone, Debug, Serialize)]
struct CounterState {
    count: i64,
    step: i64,
    history: Vec<i64>,
}

impl CounterState {
    fn new() -> Self {
        Self {
            count: 0,
            step: 1,
            history: vec![0],
        }
    }
}

fn increment(state: &mut CounterState, _: &Value) {
    state.count += state.step;
    state.history.push(state.count);
}

fn set_step(state: &mut CounterState, payload: &Value) {
    state.step = payload.as_i64().unwrap_or(1);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("larder=debug")
        .init();

    println!("=== Counter Application ===\n");

    println!("1. Building the store");
    let store = StoreOptions::from_factory(CounterState::new)
        .mutation("increment", increment)
        .mutation("setStep", set_step)
        .action("incrementLater", |store: Store<CounterState>, payload| async move {
            let delay = payload.as_u64().unwrap_or(10);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            store.commit("increment", Value::Null);
            anyhow::Ok(json!(store.read(|s| s.count)))
        })
        .plugin(Logger::new())
        .build();

    println!("\n2. Subscribing to commits");
    let subscription = store.subscribe(|record, state| {
        println!(
            "   [Commit] {} (count before: {})",
            record.name, state.count
        );
    });

    println!("\n3. Binding accessors");
    let view = store.map_state::<()>(Mapping::keys(["count", "step"]));
    let methods = store.map_mutations::<()>(Mapping::keys(["increment", "setStep"]));

    methods.call("increment", &(), Value::Null);
    methods.call("setStep", &(), json!(5));
    methods.call("increment", &(), Value::Null);
    println!(
        "   count = {}, step = {}",
        view.call("count", &()).unwrap_or_default(),
        view.call("step", &()).unwrap_or_default()
    );

    println!("\n4. Dispatching an action");
    let count = store.dispatch("incrementLater", json!(20)).await?;
    println!("   action resolved with {count:?}");

    println!("\n5. Unknown names are ignored");
    store.commit("decrement", Value::Null);
    println!("   dispatch(unknown) = {:?}", store.dispatch("reset", Value::Null).await?);

    subscription.unsubscribe();
    println!("\nFinal history: {:?}", store.read(|s| s.history.clone()));
    Ok(())
}
