use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ecs_core::{ComponentId, World};

struct Position {
    x: f32,
    y: f32,
}

struct Velocity {
    dx: f32,
    dy: f32,
}

fn populated_world(count: usize) -> (World, ComponentId, ComponentId) {
    let mut world = World::default();
    let position = world.component::<Position>();
    let velocity = world.component::<Velocity>();
    for i in 0..count {
        let e = world.spawn();
        world.set(e, position, Position { x: i as f32, y: 0.0 }).unwrap();
        if i % 2 == 0 {
            world.set(e, velocity, Velocity { dx: 1.0, dy: 0.0 }).unwrap();
        }
    }
    (world, position, velocity)
}

fn bench_spawn(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn");
    for size in [1_000usize, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut world = World::default();
                let position = world.component::<Position>();
                for i in 0..size {
                    let e = world.spawn();
                    world.set(e, position, Position { x: i as f32, y: 0.0 }).unwrap();
                }
                world
            });
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_iter");
    for size in [1_000usize, 10_000, 100_000] {
        let (mut world, position, velocity) = populated_world(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0_f32;
                for (_, values) in world.query(&[position, velocity]).iter() {
                    if let (Some(pos), Some(vel)) = (&values[0], &values[1]) {
                        let pos = pos.downcast_ref::<Position>().unwrap();
                        let vel = vel.downcast_ref::<Velocity>().unwrap();
                        sum += pos.x + vel.dx;
                    }
                }
                sum
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_spawn, bench_query);
criterion_main!(benches);
