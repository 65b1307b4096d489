//! Benchmarks for dashboard analytics and the cart store
//!
//! Run with: cargo bench

use cartback::analytics::{dashboard_cards, monthly_trend, recent_carts, CartMetrics};
use cartback::demo::demo_carts;
use cartback::store::{AbandonedCart, CartFilter, Store, StoreConfig};
use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;
use uuid::Uuid;

fn create_test_carts(count: usize) -> Vec<AbandonedCart> {
    let mut rng = StdRng::seed_from_u64(7);
    demo_carts(&mut rng, count, Utc::now())
        .into_iter()
        .map(|new| AbandonedCart {
            id: Uuid::new_v4(),
            user_email: new.user_email,
            cart_value: new.cart_value,
            items: new.items,
            abandoned_at: new.abandoned_at,
            recovered: new.recovered,
            recovery_email_sent: new.recovery_email_sent,
            recovery_email_sent_at: new.recovery_email_sent_at,
            recovery_email_opened: new.recovery_email_opened,
        })
        .collect()
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");

    for size in [100, 1000, 10000] {
        let carts = create_test_carts(size);
        let now = Utc::now();

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("cart_metrics_{}", size), |b| {
            b.iter(|| CartMetrics::from_carts(black_box(&carts)))
        });

        group.bench_function(format!("dashboard_cards_{}", size), |b| {
            b.iter(|| dashboard_cards(black_box(&carts), now))
        });

        group.bench_function(format!("monthly_trend_{}", size), |b| {
            b.iter(|| monthly_trend(black_box(&carts), now, 7))
        });

        group.bench_function(format!("recent_carts_{}", size), |b| {
            b.iter(|| recent_carts(black_box(&carts), now, 5))
        });
    }

    group.finish();
}

fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    group.bench_function("insert_batch_100", |b| {
        let dir = tempdir().unwrap();
        let store = Store::open(&StoreConfig::file(dir.path().join("bench.db"))).unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        b.iter(|| {
            let carts = demo_carts(&mut rng, 100, Utc::now());
            runtime.block_on(store.insert_carts(black_box(carts))).unwrap()
        });
    });

    group.bench_function("list_carts_1000", |b| {
        let dir = tempdir().unwrap();
        let store = Store::open(&StoreConfig::file(dir.path().join("bench.db"))).unwrap();
        let mut rng = StdRng::seed_from_u64(13);
        runtime
            .block_on(store.insert_carts(demo_carts(&mut rng, 1000, Utc::now())))
            .unwrap();

        let filter = CartFilter::default();
        b.iter(|| runtime.block_on(store.list_carts(black_box(&filter))).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_metrics, bench_store);
criterion_main!(benches);
