//! Benchmarks for allocator placement.
//!
//! Measures the bookkeeping cost of both allocators:
//! - General-purpose allocation and release through a backend
//! - Region table churn with hundreds of live regions
//! - Best-fit gap selection in a fragmented code cave

extern crate memscope;

use criterion::{criterion_group, criterion_main, Criterion};
use memscope::prelude::*;
use std::collections::VecDeque;
use std::hint::black_box;

/// Benchmark a full allocate and release cycle against the backend.
fn bench_base_alloc_free_cycle(c: &mut Criterion) {
    let backend = SharedBackend::new(LocalBackend::new(0x0100_0000));
    let mut heap = BaseAllocator::new(backend);

    c.bench_function("base_alloc_free_cycle", |b| {
        b.iter(|| {
            let view = heap.alloc(black_box(0x80)).unwrap();
            heap.free(&view).unwrap();
        });
    });
}

/// Benchmark table maintenance with 256 live regions and FIFO turnover.
fn bench_base_table_churn(c: &mut Criterion) {
    let backend = SharedBackend::new(LocalBackend::new(0x0100_0000));
    let mut heap = BaseAllocator::new(backend);

    let mut queue = VecDeque::new();
    for _ in 0..256 {
        queue.push_back(heap.alloc(0x40).unwrap());
    }

    c.bench_function("base_table_churn_256", |b| {
        b.iter(|| {
            queue.push_back(heap.alloc(black_box(0x40)).unwrap());
            let oldest = queue.pop_front().unwrap();
            heap.free(&oldest).unwrap();
        });
    });
}

/// Benchmark best-fit selection over a cave fragmented into 64 gaps.
fn bench_cave_best_fit_fragmented(c: &mut Criterion) {
    let start = 0x0040_0000;
    let window = 0x4000;
    let local = LocalBackend::new(0x0100_0000);
    local
        .map(start, vec![0u8; window], Protection::READ_WRITE_EXECUTE)
        .unwrap();

    let mut cave = CaveAllocator::new(SharedBackend::new(local), start, window);

    // Alternate keep and free to leave a comb of small gaps.
    let mut toss = Vec::new();
    for i in 0..128 {
        let view = cave.alloc(0x40).unwrap();
        if i % 2 != 0 {
            toss.push(view);
        }
    }
    for view in &toss {
        cave.free(view).unwrap();
    }

    c.bench_function("cave_best_fit_fragmented", |b| {
        b.iter(|| {
            let view = cave.alloc(black_box(0x40)).unwrap();
            cave.free(&view).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_base_alloc_free_cycle,
    bench_base_table_churn,
    bench_cave_best_fit_fragmented,
);
criterion_main!(benches);
