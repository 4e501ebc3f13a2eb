//! Basic benchmarks for the hash map of the `arena_collections` crate, compared against the
//! standard library hash map.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::collections::HashMap as StdHashMap;
use std::hint::black_box;
use std::time::Instant;

use arena_collections::{FixedHashMap, FnvBuildHasher, HeapHashMap};
use criterion::{Criterion, criterion_group, criterion_main};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

const KEY_COUNT: u32 = 200;

// Room for every key plus the two list sentinels, and enough bins to never stop growing.
const SLOTS: usize = KEY_COUNT as usize + 2;
const BINS: usize = 512;

type Fixed = FixedHashMap<u32, u32, SLOTS, BINS>;
type Std = StdHashMap<u32, u32, FnvBuildHasher>;

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_map_basic");

    group.bench_function("heap_insert", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let mut map: HeapHashMap<u32, u32> = HeapHashMap::new();

                for key in 0..KEY_COUNT {
                    _ = black_box(map.insert(black_box(key), key));
                }

                drop(black_box(map));
            }

            start.elapsed()
        });
    });

    group.bench_function("fixed_insert", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let mut map = Fixed::new();

                for key in 0..KEY_COUNT {
                    _ = black_box(map.insert(black_box(key), key));
                }

                drop(black_box(map));
            }

            start.elapsed()
        });
    });

    group.bench_function("std_insert", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let mut map = Std::default();

                for key in 0..KEY_COUNT {
                    _ = black_box(map.insert(black_box(key), key));
                }

                drop(black_box(map));
            }

            start.elapsed()
        });
    });

    let heap: HeapHashMap<u32, u32> = (0..KEY_COUNT).map(|key| (key, key)).collect();
    let fixed: Fixed = (0..KEY_COUNT).map(|key| (key, key)).collect();
    let standard: Std = (0..KEY_COUNT).map(|key| (key, key)).collect();

    group.bench_function("heap_get", |b| {
        b.iter(|| {
            for key in 0..KEY_COUNT {
                _ = black_box(heap.get(black_box(&key)));
            }
        });
    });

    group.bench_function("fixed_get", |b| {
        b.iter(|| {
            for key in 0..KEY_COUNT {
                _ = black_box(fixed.get(black_box(&key)));
            }
        });
    });

    group.bench_function("std_get", |b| {
        b.iter(|| {
            for key in 0..KEY_COUNT {
                _ = black_box(standard.get(black_box(&key)));
            }
        });
    });

    group.bench_function("heap_remove_all", |b| {
        b.iter_custom(|iters| {
            let mut maps = (0..iters).map(|_| heap.clone()).collect::<Vec<_>>();

            let start = Instant::now();

            for map in &mut maps {
                for key in 0..KEY_COUNT {
                    _ = black_box(map.remove(black_box(&key)));
                }
            }

            start.elapsed()
        });
    });

    group.bench_function("fixed_take", |b| {
        b.iter_custom(|iters| {
            let mut maps = (0..iters).map(|_| fixed.clone()).collect::<Vec<_>>();

            let start = Instant::now();

            for map in &mut maps {
                drop(black_box(map.take()));
            }

            start.elapsed()
        });
    });

    group.finish();
}
