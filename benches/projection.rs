#![allow(clippy::unwrap_used)]
//! Benchmarks for view projection and identifier allocation

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use gameshelf::config::{GameEntry, SortMode};
use gameshelf::registry::{IdAllocator, project};
use std::collections::HashSet;
use std::hint::black_box;
use uuid::Uuid;

fn create_library(size: usize) -> Vec<GameEntry> {
    (0..size)
        .map(|i| {
            // Mixed case and repeated names exercise the tie-break path
            let name = if i % 3 == 0 {
                format!("game {}", i % 97)
            } else {
                format!("Game {}", i % 89)
            };
            let mut entry = GameEntry::new(name, format!("C:\\Games\\Game{i}\\game.exe"), "C:\\Games");
            entry.id = Uuid::new_v4();
            entry
        })
        .collect()
}

fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");
    for size in [100, 1_000, 10_000] {
        let library = create_library(size);
        group.bench_with_input(BenchmarkId::new("alphabetical", size), &library, |b, lib| {
            b.iter(|| project(black_box(lib), SortMode::Alphabetical).len());
        });
        group.bench_with_input(BenchmarkId::new("insertion", size), &library, |b, lib| {
            b.iter(|| project(black_box(lib), SortMode::InsertionOrder).len());
        });
    }
    group.finish();
}

fn bench_allocation(c: &mut Criterion) {
    let taken: HashSet<Uuid> = (0..10_000).map(|_| Uuid::new_v4()).collect();
    let allocator = IdAllocator::new();

    c.bench_function("allocate_against_10k", |b| {
        b.iter(|| allocator.allocate(black_box(&taken)).unwrap());
    });
}

criterion_group!(benches, bench_projection, bench_allocation);
criterion_main!(benches);
