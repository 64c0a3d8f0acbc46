use codeintel_core::request::{CoreRequest, Fingerprint, Operation, Position};
use codeintel_core::CacheService;
use codeintel_core::config::knobs::CacheConfig;
use codeintel_core::EventBus;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

fn fingerprint_benchmark(c: &mut Criterion) {
    let request = CoreRequest::new(Operation::FindDefinition, "file:///workspace/src/main.rs")
        .with_identifier("process_request")
        .with_position(Position { line: 120, character: 8 })
        .with_option("include_declaration", "true");

    c.bench_function("fingerprint_compute", |b| {
        b.iter(|| Fingerprint::compute(black_box(&request)))
    });
}

fn cache_roundtrip_benchmark(c: &mut Criterion) {
    let config = CacheConfig::default();
    let events = Arc::new(EventBus::default());
    let cache = CacheService::new(&config, events);

    c.bench_function("cache_set_then_get", |b| {
        b.iter(|| {
            cache.set("bench-key", &black_box(42u32), None).unwrap();
            let _: Option<u32> = cache.get("bench-key").unwrap();
        })
    });
}

criterion_group!(benches, fingerprint_benchmark, cache_roundtrip_benchmark);
criterion_main!(benches);
