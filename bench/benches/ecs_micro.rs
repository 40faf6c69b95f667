//! ECS microbenchmarks using Criterion.
//!
//! - Registry lookups by name
//! - Component attach/detach
//! - Per-frame system dispatch
//! - Entity despawn

use std::time::Duration;

use blaze_bench::{components::*, populate};
use blaze_engine::{
    core::time::{SIXTY_FPS, Time},
    ecs::World,
};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

// =============================================================================
// Registry Benchmarks
// =============================================================================

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    let (registry, _) = populate::registry();

    group.bench_function("index_of_hit", |b| {
        b.iter(|| black_box(registry.index_of(black_box("Health"))));
    });

    group.bench_function("index_of_miss", |b| {
        b.iter(|| black_box(registry.index_of(black_box("Missing"))));
    });

    group.bench_function("descriptor", |b| {
        let id = registry.index_of("Sprite").expect("registered");
        b.iter(|| black_box(registry.descriptor(black_box(id))));
    });

    group.bench_function("register_five", |b| {
        b.iter(|| black_box(populate::registry()));
    });

    group.finish();
}

// =============================================================================
// Attach/Detach Benchmarks
// =============================================================================

fn bench_attach_detach(c: &mut Criterion) {
    let mut group = c.benchmark_group("attach_detach");

    for count in [1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("default", count), &count, |b, &n| {
            let (registry, types) = populate::registry();
            let mut world = World::new(registry);
            let entities: Vec<_> = (0..n).map(|_| world.spawn()).collect();

            b.iter(|| {
                for &entity in &entities {
                    world.attach(entity, types.transform).expect("alive");
                }
                for &entity in &entities {
                    world.detach(entity, types.transform).expect("attached");
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("value", count), &count, |b, &n| {
            let (registry, types) = populate::registry();
            let mut world = World::new(registry);
            let entities: Vec<_> = (0..n).map(|_| world.spawn()).collect();

            b.iter(|| {
                for (i, &entity) in entities.iter().enumerate() {
                    let velocity = Velocity {
                        x: i as f32,
                        y: 0.0,
                        z: 0.0,
                    };
                    world.attach_value(entity, velocity).expect("alive");
                }
                for &entity in &entities {
                    world.detach(entity, types.velocity).expect("attached");
                }
            });
        });
    }

    group.finish();
}

// =============================================================================
// Dispatch Benchmarks
// =============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    for count in [1_000, 10_000, 100_000] {
        group.throughput(Throughput::Elements(count as u64));

        for density in [0.25, 1.0] {
            let label = format!("{count}@{density}");
            group.bench_function(BenchmarkId::new("frame", label), |b| {
                let (mut world, _, _) = populate::world(count, density);
                let mut time = Time::new();
                b.iter(|| {
                    time = time.advance(Duration::from_nanos(SIXTY_FPS));
                    black_box(world.update(&time))
                });
            });
        }
    }

    group.finish();
}

// =============================================================================
// Despawn Benchmarks
// =============================================================================

fn bench_despawn(c: &mut Criterion) {
    let mut group = c.benchmark_group("despawn");

    for count in [1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("all", count), &count, |b, &n| {
            b.iter_batched(
                || populate::world(n, 0.5),
                |(mut world, _, entities)| {
                    for entity in entities {
                        world.despawn(entity).expect("alive");
                    }
                    world
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_registry,
    bench_attach_detach,
    bench_dispatch,
    bench_despawn
);
criterion_main!(benches);
