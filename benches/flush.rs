use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ecs_core::World;

struct Health(i32);

fn bench_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush");
    for size in [1_000usize, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut world = World::default();
                let health = world.component::<Health>();
                let entities: Vec<_> = (0..size).map(|_| world.spawn()).collect();

                world.defer(true);
                for &e in &entities {
                    world.defer_set(e, health, Health(100));
                }
                world.defer(false);
                world.flush();
                world
            });
        });
    }
    group.finish();
}

fn bench_deferred_spawn_with_callback(c: &mut Criterion) {
    let mut group = c.benchmark_group("deferred_spawn_callback");
    for size in [1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut world = World::default();
                let health = world.component::<Health>();
                for _ in 0..size {
                    world.defer_spawn(Some(Box::new(move |world: &mut World, e| {
                        world.set(e, health, Health(50)).unwrap();
                    })));
                }
                world.flush();
                world
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_flush, bench_deferred_spawn_with_callback);
criterion_main!(benches);
