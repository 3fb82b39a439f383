use std::cell::RefCell;
use std::rc::Rc;

use ecs_core::{Phase, Prefab, PrefabBuilder, SystemAccess, World, WorldOptions};

struct Position {
    x: f32,
    y: f32,
}

struct Velocity {
    dx: f32,
    dy: f32,
}

struct Name(&'static str);

/// E1: a movement tick. A single `Update`-phase system reads Velocity
/// and writes Position; after one `step()` every moving entity has
/// advanced exactly once.
#[test]
fn movement_tick_advances_every_entity_with_velocity() {
    let mut world = World::default();
    let position = world.component::<Position>();
    let velocity = world.component::<Velocity>();

    let moving = world.spawn();
    world.set(moving, position, Position { x: 0.0, y: 0.0 }).unwrap();
    world.set(moving, velocity, Velocity { dx: 1.0, dy: 2.0 }).unwrap();

    let still = world.spawn();
    world.set(still, position, Position { x: 5.0, y: 5.0 }).unwrap();

    world
        .add_system(
            "movement",
            Phase::Update,
            SystemAccess::new().reads(&[velocity]).writes(&[position]),
            Box::new(move |world: &mut World, dt: f32| {
                let mut updates = Vec::new();
                for (e, values) in world.query(&[position, velocity]).iter() {
                    let pos = values[0].as_ref().unwrap().downcast_ref::<Position>().unwrap();
                    let vel = values[1].as_ref().unwrap().downcast_ref::<Velocity>().unwrap();
                    updates.push((e, pos.x + vel.dx * dt, pos.y + vel.dy * dt));
                }
                for (e, x, y) in updates {
                    world.set(e, position, Position { x, y }).unwrap();
                }
            }),
        )
        .unwrap();

    world.step(1.0);

    let moved = world.get::<Position>(moving, position).unwrap();
    assert_eq!((moved.x, moved.y), (1.0, 2.0));

    let unmoved = world.get::<Position>(still, position).unwrap();
    assert_eq!((unmoved.x, unmoved.y), (5.0, 5.0));
}

/// E2: destroying an entity while "iterating" a query. Because
/// `.iter()` snapshots entities and fetched values up front, the loop
/// body is free to call `world.destroy` without fighting the borrow
/// checker, and the snapshot itself stays valid even though the world
/// underneath it changed.
#[test]
fn destroying_an_entity_mid_query_does_not_disturb_the_snapshot() {
    let mut world = World::default();
    let marker = world.component::<Name>();

    let a = world.spawn();
    world.set(a, marker, Name("a")).unwrap();
    let b = world.spawn();
    world.set(b, marker, Name("b")).unwrap();
    let c = world.spawn();
    world.set(c, marker, Name("c")).unwrap();

    let mut seen = Vec::new();
    for (e, values) in world.query(&[marker]).iter() {
        let name = values[0].as_ref().unwrap().downcast_ref::<Name>().unwrap().0;
        seen.push(name);
        if name == "b" {
            world.destroy(e).unwrap();
        }
    }

    assert_eq!(seen, vec!["a", "b", "c"]);
    assert!(!world.is_alive(b));
    assert!(world.is_alive(a));
    assert!(world.is_alive(c));

    // A fresh query (new epoch) no longer sees the destroyed entity.
    let remaining: Vec<_> = world.query(&[marker]).iter().map(|(e, _)| e).collect();
    assert_eq!(remaining.len(), 2);
    assert!(!remaining.contains(&b));
}

/// E3: change tracking's add-then-remove-same-frame cancellation rule.
#[test]
fn add_then_remove_same_frame_leaves_no_trace_in_change_sets() {
    let mut world = World::new(WorldOptions::new().with_track_changes(true));
    let health = world.component::<i32>();

    let e = world.spawn();
    world.set(e, health, 10).unwrap();
    assert_eq!(world.added(health).collect::<Vec<_>>(), vec![e]);

    world.remove(e, health).unwrap();
    assert_eq!(world.added(health).count(), 0);
    assert_eq!(world.removed(health).count(), 0);

    // But a component that existed before this frame, removed this
    // frame, does show up as removed.
    world.set(e, health, 20).unwrap();
    world.clear_changes();
    world.remove(e, health).unwrap();
    assert_eq!(world.removed(health).collect::<Vec<_>>(), vec![e]);
}

/// E4: destroying an entity drops every relation triple that references
/// it, from both the forward and reverse index.
#[test]
fn destroying_an_entity_cleans_up_its_relations() {
    let mut world = World::default();
    let owns = world.component::<()>();

    let player = world.spawn();
    let sword = world.spawn();
    let shield = world.spawn();

    world.relate(player, owns, sword, None).unwrap();
    world.relate(player, owns, shield, None).unwrap();
    assert_eq!(world.targets(player, owns).collect::<Vec<_>>(), vec![sword, shield]);

    world.destroy(sword).unwrap();
    assert_eq!(world.targets(player, owns).collect::<Vec<_>>(), vec![shield]);
    assert_eq!(world.sources(owns, sword).count(), 0);

    world.destroy(player).unwrap();
    assert_eq!(world.sources(owns, shield).count(), 0);
}

/// E5: instantiating a prefab replays every entry in template order,
/// including both value-bearing and tag components.
#[test]
fn spawning_a_prefab_applies_every_template_entry() {
    let mut world = World::default();
    let position = world.component::<Position>();
    let flying = world.tag();

    let prefab: Prefab = PrefabBuilder::new("falcon")
        .with_value(position, Rc::new(Position { x: 3.0, y: 4.0 }))
        .with_tag(flying)
        .build();
    world.register_prefab(prefab);

    let bird = world.spawn_prefab("falcon").unwrap();
    assert!(world.has(bird, &[position, flying]));
    let pos = world.get::<Position>(bird, position).unwrap();
    assert_eq!((pos.x, pos.y), (3.0, 4.0));

    assert!(world.spawn_prefab("dragon").is_err());
}

/// E6: a phased step flushes deferred commands raised mid-phase before
/// the next phase runs, and a spawn callback's own enqueued commands are
/// drained in the same flush.
#[test]
fn phased_step_flushes_deferred_spawns_and_their_callbacks_before_the_next_phase() {
    let mut world = World::default();
    let tag = world.tag();
    let spawned_in_pre_update: Rc<RefCell<Vec<ecs_core::Entity>>> = Rc::new(RefCell::new(Vec::new()));

    {
        let spawned = spawned_in_pre_update.clone();
        world
            .add_system(
                "spawner",
                Phase::PreUpdate,
                SystemAccess::new(),
                Box::new(move |world: &mut World, _dt: f32| {
                    let spawned = spawned.clone();
                    world.defer_spawn(Some(Box::new(move |world: &mut World, e| {
                        world.add(e, tag).unwrap();
                        spawned.borrow_mut().push(e);
                    })));
                }),
            )
            .unwrap();
    }

    world.step(1.0);

    let tagged_count = world.query(&[]).with(&[tag]).iter().count();
    assert_eq!(tagged_count, 1);

    assert_eq!(spawned_in_pre_update.borrow().len(), 1);
    let entity = spawned_in_pre_update.borrow()[0];
    assert!(world.is_alive(entity));
    assert!(world.has(entity, &[tag]));
    assert!(!world.has_pending_commands());
}
