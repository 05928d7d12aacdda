//! Namespaced mutations and actions with a resolver-based binding

use larder::{Action, Mapping, Mutation, Registry, Store, StoreOptions, TypeSource};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Clone, Debug, Default, Serialize)]
struct Shop {
    cart: Vec<String>,
    orders: Vec<Vec<String>>,
}

/// A UI component that decides which list its "add" button targets.
struct AddButton {
    target: &'static str,
}

fn cart_module() -> (Registry<Mutation<Shop>>, Registry<Action<Shop>>) {
    let mutations = Registry::new()
        .with(
            "add",
            Mutation::new(|shop: &mut Shop, item: &Value| {
                shop.cart.push(item.as_str().unwrap_or("?").to_string());
            }),
        )
        .with(
            "place",
            Mutation::new(|shop: &mut Shop, _: &Value| {
                let items = std::mem::take(&mut shop.cart);
                shop.orders.push(items);
            }),
        );

    let actions = Registry::new().with(
        "checkout",
        Action::new(|store: Store<Shop>, _| async move {
            let size = store.read(|shop| shop.cart.len());
            if size == 0 {
                anyhow::bail!("nothing to check out");
            }
            store.commit("cart/place", Value::Null);
            Ok(json!(size))
        }),
    );

    (mutations, actions)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let (mutations, actions) = cart_module();
    let store = StoreOptions::new(Shop::default())
        .mutations(Registry::new().nest("cart", mutations))
        .actions(Registry::new().nest("cart", actions))
        .build();

    println!("Mutations: {:?}", store.mutations().names());
    println!("Actions:   {:?}", store.actions().names());

    let buttons = store.map_mutations::<AddButton>(Mapping::new().entry(
        "add",
        TypeSource::resolver(|button: &AddButton, registry: &Registry<Mutation<Shop>>| {
            let name = format!("{}/add", button.target);
            if !registry.contains(&name) {
                println!("  (no mutation {name}, commit will be ignored)");
            }
            name
        }),
    ));

    buttons.call("add", &AddButton { target: "cart" }, json!("tea"));
    buttons.call("add", &AddButton { target: "cart" }, json!("scones"));
    buttons.call("add", &AddButton { target: "wishlist" }, json!("teapot"));

    match store.dispatch("cart/checkout", Value::Null).await {
        Ok(placed) => println!("Checked out {placed:?} items"),
        Err(e) => println!("Checkout failed: {e}"),
    }
    match store.try_dispatch("cart/checkout", Value::Null).await {
        Ok(placed) => println!("Checked out {placed:?} items"),
        Err(e) => println!("Checkout failed: {e}"),
    }

    println!("Orders: {:?}", store.read(|shop| shop.orders.clone()));
}
