use std::sync::Arc;

use blobmeter_core::{AggregateRegistry, InMemoryCounterDirectory, MeterContext};
use blobmeter_domain::{CounterSet, TenantKey};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn tenant_keys(count: usize) -> Vec<TenantKey> {
    (0..count)
        .map(|idx| TenantKey::pair(format!("container{idx}"), "scope").unwrap())
        .collect()
}

fn registry_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_registry");
    group.sample_size(50);

    group.bench_function("get_or_create_hit", |b| {
        let registry = AggregateRegistry::new(
            Arc::new(InMemoryCounterDirectory::new()),
            "blobmeter",
            CounterSet::full(),
        );
        let keys = tenant_keys(64);
        for key in &keys {
            registry.get_or_create(key);
        }

        let mut idx = 0;
        b.iter(|| {
            idx = (idx + 1) % keys.len();
            black_box(registry.get_or_create(&keys[idx]));
        });
    });

    group.bench_function("get_or_create_hit_contended", |b| {
        let registry = Arc::new(AggregateRegistry::new(
            Arc::new(InMemoryCounterDirectory::new()),
            "blobmeter",
            CounterSet::full(),
        ));
        let key = TenantKey::aws();
        registry.get_or_create(&key);

        b.iter(|| {
            std::thread::scope(|scope| {
                for _ in 0..4 {
                    let registry = Arc::clone(&registry);
                    let key = &key;
                    scope.spawn(move || {
                        for _ in 0..256 {
                            black_box(registry.get_or_create(key));
                        }
                    });
                }
            });
        });
    });

    group.finish();
}

fn tracker_benchmark(c: &mut Criterion) {
    let context = MeterContext::with_defaults().unwrap();
    let key = TenantKey::aws();
    context.aggregate(&key);

    let mut group = c.benchmark_group("trackers");

    group.bench_function("put_lifecycle", |b| {
        b.iter(|| {
            let mut put = context.put_tracker(Some(key.clone()));
            put.start(4_096);
            put.boundary_event(4_096);
            black_box(put.succeed());
        });
    });

    group.bench_function("get_lifecycle", |b| {
        b.iter(|| {
            let mut get = context.get_tracker(Some(key.clone()));
            get.start_read();
            get.bytes_read(4_096);
            black_box(get.succeed());
        });
    });

    group.finish();
}

criterion_group!(core_benchmarks, registry_benchmark, tracker_benchmark);
criterion_main!(core_benchmarks);
