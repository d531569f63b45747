use cachesim_rust::cache::Cache;
use cachesim_rust::hierarchy::CacheHierarchy;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn sequential_addresses(n: u64, stride: u64) -> Vec<u64> {
    (0..n).map(|i| i * stride).collect()
}

fn cache_read_write_benchmark(c: &mut Criterion) {
    let addresses = sequential_addresses(4096, 64);

    c.bench_function("l2_cache_sequential_access", |b| {
        b.iter(|| {
            let mut cache = Cache::with_geometry(15, 6, 5).unwrap();
            for &addr in &addresses {
                black_box(cache.read(addr));
                cache.tick();
            }
        });
    });
}

fn hierarchy_stride_benchmark(c: &mut Criterion) {
    let addresses = sequential_addresses(4096, 64);

    c.bench_function("hierarchy_stride_trace", |b| {
        b.iter(|| {
            let (c1, b1, s1, c2, b2, s2, k) = CacheHierarchy::default_config();
            let mut hierarchy = CacheHierarchy::setup(c1, b1, s1, c2, b2, s2, k).unwrap();
            for &addr in &addresses {
                hierarchy.access('r', addr).unwrap();
            }
            black_box(hierarchy.complete());
        });
    });
}

fn hierarchy_mixed_trace_benchmark(c: &mut Criterion) {
    let addresses = sequential_addresses(4096, 37);

    c.bench_function("hierarchy_mixed_trace", |b| {
        b.iter(|| {
            let (c1, b1, s1, c2, b2, s2, k) = CacheHierarchy::default_config();
            let mut hierarchy = CacheHierarchy::setup(c1, b1, s1, c2, b2, s2, k).unwrap();
            for (i, &addr) in addresses.iter().enumerate() {
                let op = if i % 4 == 0 { 'w' } else { 'r' };
                hierarchy.access(op, addr).unwrap();
            }
            black_box(hierarchy.complete());
        });
    });
}

criterion_group!(
    benches,
    cache_read_write_benchmark,
    hierarchy_stride_benchmark,
    hierarchy_mixed_trace_benchmark
);
criterion_main!(benches);
