use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use larder::{Mapping, Mutation, Registry, Store, StoreOptions};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Clone, Serialize)]
struct State {
    counter: i64,
    name: String,
}

fn store() -> Store<State> {
    StoreOptions::new(State {
        counter: 0,
        name: "test".to_string(),
    })
    .mutation("inc", |state: &mut State, payload: &Value| {
        state.counter += payload.as_i64().unwrap_or(1);
    })
    .mutations(Registry::new().nest(
        "deep",
        Registry::new().nest(
            "er",
            Registry::new().with(
                "inc",
                Mutation::new(|state: &mut State, _: &Value| state.counter += 1),
            ),
        ),
    ))
    .sync_action("read", |store: &Store<State>, _| {
        Ok(json!(store.read(|state| state.counter)))
    })
    .build()
}

fn commit_benchmark(c: &mut Criterion) {
    let store = store();

    c.bench_function("commit", |b| {
        b.iter(|| store.commit(black_box("inc"), json!(1)));
    });
}

fn namespaced_commit_benchmark(c: &mut Criterion) {
    let store = store();

    c.bench_function("commit_namespaced", |b| {
        b.iter(|| store.commit(black_box("deep/er/inc"), Value::Null));
    });
}

fn unknown_commit_benchmark(c: &mut Criterion) {
    let store = store();

    c.bench_function("commit_unknown", |b| {
        b.iter(|| store.commit(black_box("missing"), Value::Null));
    });
}

fn dispatch_benchmark(c: &mut Criterion) {
    let store = store();

    c.bench_function("dispatch_sync", |b| {
        b.iter(|| black_box(futures::executor::block_on(store.dispatch("read", Value::Null))));
    });
}

fn map_state_benchmark(c: &mut Criterion) {
    let store = store();
    let accessors = store.map_state::<()>(Mapping::keys(["counter", "name"]));

    c.bench_function("map_state_field", |b| {
        b.iter(|| black_box(accessors.call("counter", &())));
    });
}

fn commit_subscribers_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_subscribers");

    for subscriber_count in [1, 10, 100].iter() {
        let store = store();

        for _ in 0..*subscriber_count {
            let _ = store.subscribe(|_, _| {
                // Empty subscriber
            });
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(subscriber_count),
            subscriber_count,
            |b, _| {
                b.iter(|| store.commit("inc", black_box(json!(1))));
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    commit_benchmark,
    namespaced_commit_benchmark,
    unknown_commit_benchmark,
    dispatch_benchmark,
    map_state_benchmark,
    commit_subscribers_benchmark,
);
criterion_main!(benches);
