use std::sync::Arc;

use common::{Money, SessionIdentity};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use domain::{CartConfig, CartStore, CartTotals, Product};
use persistence::{InMemoryStorage, PersistenceAdapter};

fn make_cart() -> CartStore {
    let persistence =
        PersistenceAdapter::new(Arc::new(InMemoryStorage::new()), SessionIdentity::Anonymous);
    CartStore::new(persistence, CartConfig::default())
}

fn make_product(i: usize) -> Product {
    Product::new(
        format!("SKU-{i:04}"),
        "Benchmark Widget",
        Money::from_rupees(100 + i as i64),
        Money::from_rupees(150 + i as i64),
    )
}

fn bench_add_item(c: &mut Criterion) {
    let cart = make_cart();
    let product = make_product(1);

    c.bench_function("cart/add_item_merge", |b| {
        b.iter(|| {
            cart.add_item(&product, 1).unwrap();
            cart.set_quantity(&product.id, 1);
        });
    });
}

fn bench_totals(c: &mut Criterion) {
    let mut group = c.benchmark_group("cart/totals");

    for lines in [1usize, 10, 100] {
        let cart = make_cart();
        for i in 0..lines {
            cart.add_item(&make_product(i), 2).unwrap();
        }
        let items = cart.items();

        group.bench_with_input(BenchmarkId::from_parameter(lines), &items, |b, items| {
            b.iter(|| CartTotals::of(items));
        });
    }

    group.finish();
}

fn bench_restore(c: &mut Criterion) {
    let storage = InMemoryStorage::new();
    let persistence = PersistenceAdapter::new(Arc::new(storage.clone()), SessionIdentity::Anonymous);
    let cart = CartStore::new(persistence, CartConfig::default());
    for i in 0..50 {
        cart.add_item(&make_product(i), 3).unwrap();
    }

    c.bench_function("cart/restore_50_lines", |b| {
        b.iter(|| {
            let reopened = CartStore::new(
                PersistenceAdapter::new(Arc::new(storage.clone()), SessionIdentity::Anonymous),
                CartConfig::default(),
            );
            reopened.restore()
        });
    });
}

criterion_group!(benches, bench_add_item, bench_totals, bench_restore);
criterion_main!(benches);
