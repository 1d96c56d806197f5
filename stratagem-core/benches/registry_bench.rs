//! Benchmarks for registry lookups
//!
//! Compares cached vs uncached choice lists and measures condition
//! evaluation on its own.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use stratagem_core::{Condition, Context, Implementation, Lookup, Registry};

trait Codec: Send + Sync {
    fn name(&self) -> &'static str;
}

struct Plain;

impl Codec for Plain {
    fn name(&self) -> &'static str {
        "plain"
    }
}

fn codec(slug: String, priority: i32) -> Implementation<dyn Codec> {
    Implementation::<dyn Codec>::new::<Plain>(slug, || Box::new(Plain))
        .with_priority(priority)
        .with_condition(Condition::feature_flag("codecs"))
}

fn create_registry(size: usize) -> Registry<dyn Codec> {
    let registry = Registry::<dyn Codec>::builder("Codecs").build();
    for i in 0..size {
        registry
            .register(codec(format!("codec-{}", i), (size - i) as i32))
            .unwrap();
    }
    registry
}

fn bench_register(c: &mut Criterion) {
    c.bench_function("register_100", |b| {
        b.iter(|| {
            let registry = create_registry(100);
            black_box(registry)
        })
    });
}

fn bench_get(c: &mut Criterion) {
    let registry = create_registry(100);

    c.bench_function("get_by_slug", |b| {
        b.iter(|| {
            let codec = registry.get(Lookup::slug(black_box("codec-50"))).unwrap();
            black_box(codec)
        })
    });
}

fn bench_choices(c: &mut Criterion) {
    let mut group = c.benchmark_group("choices");

    for size in [10usize, 100, 1000] {
        let registry = create_registry(size);

        group.bench_function(BenchmarkId::new("cached", size), |b| {
            b.iter(|| black_box(registry.get_choices()))
        });

        group.bench_function(BenchmarkId::new("uncached", size), |b| {
            b.iter(|| {
                registry.clear_cache();
                black_box(registry.get_choices())
            })
        });
    }

    group.finish();
}

fn bench_conditions(c: &mut Criterion) {
    let mut group = c.benchmark_group("conditions");

    let condition = Condition::feature_flag("beta")
        & (Condition::Staff | Condition::permission("reports.view"))
        & !Condition::setting("MAINTENANCE", true);
    let context = Context::from(json!({
        "feature_flags": {"beta": true},
        "user": {"is_authenticated": true, "permissions": ["reports.view"]},
        "settings": {"MAINTENANCE": false}
    }));

    group.bench_function(BenchmarkId::new("is_met", "compound"), |b| {
        b.iter(|| black_box(condition.is_met(black_box(&context))))
    });

    group.bench_function(BenchmarkId::new("check_with_details", "compound"), |b| {
        b.iter(|| black_box(condition.check_with_details(black_box(&context))))
    });

    let registry = create_registry(100);
    group.bench_function(BenchmarkId::new("available", "100_implementations"), |b| {
        b.iter(|| black_box(registry.get_available_implementations(&context)))
    });

    group.finish();
}

criterion_group!(benches, bench_register, bench_get, bench_choices, bench_conditions);
criterion_main!(benches);
