use common::{CustomerId, Money};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Actor, CartService, OrderLine, OrderService};
use store::{CatalogStore, MemoryStore, NewProduct};

fn bench_place_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = MemoryStore::new();
    let service = OrderService::new(store.clone());
    let product = rt.block_on(async {
        store
            .create_product(NewProduct::new("Widget", Money::from_cents(1000), u32::MAX))
            .await
            .unwrap()
    });

    c.bench_function("domain/place_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                let actor = Actor::customer(CustomerId::new());
                let lines = [OrderLine {
                    product_id: product.id,
                    quantity: 1,
                }];
                service
                    .place_order(&actor, &lines, "1 Main St", None)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_checkout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = MemoryStore::new();
    let cart = CartService::new(store.clone());
    let orders = OrderService::new(store.clone());
    let product = rt.block_on(async {
        store
            .create_product(NewProduct::new("Widget", Money::from_cents(1000), u32::MAX))
            .await
            .unwrap()
    });

    c.bench_function("domain/cart_checkout", |b| {
        b.iter(|| {
            rt.block_on(async {
                let actor = Actor::customer(CustomerId::new());
                cart.add_item(&actor, product.id, 2).await.unwrap();
                orders.checkout(&actor, "1 Main St", None).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_place_order, bench_checkout);
criterion_main!(benches);
