//! Deterministic world population.

use blaze_engine::ecs::{Entity, TypeRegistry, World, component::Id};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::components::{Health, Position, Sprite, Transform, Velocity};

/// Seed shared by every benchmark so runs are comparable.
pub const SEED: u64 = 0x0b1a_2e00;

/// Type indices of the benchmark component set.
#[derive(Debug, Clone, Copy)]
pub struct Types {
    pub position: Id,
    pub velocity: Id,
    pub transform: Id,
    pub health: Id,
    pub sprite: Id,
}

/// Register the benchmark component set in a fresh registry.
pub fn registry() -> (TypeRegistry, Types) {
    let registry = TypeRegistry::new();
    let types = Types {
        position: registry.register_type::<Position>().expect("fresh registry"),
        velocity: registry.register_type::<Velocity>().expect("fresh registry"),
        transform: registry.register_type::<Transform>().expect("fresh registry"),
        health: registry.register_type::<Health>().expect("fresh registry"),
        sprite: registry.register_type::<Sprite>().expect("fresh registry"),
    };
    (registry, types)
}

/// Spawn `count` entities. Every entity gets a position; the other components are attached at
/// random with roughly the given probability each.
pub fn world(count: usize, density: f64) -> (World, Types, Vec<Entity>) {
    let (registry, types) = registry();
    let mut world = World::new(registry);
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);

    let entities = world.spawn_many(count);
    for &entity in &entities {
        world
            .attach_value(
                entity,
                Position {
                    x: rng.gen_range(-100.0..100.0),
                    y: rng.gen_range(-100.0..100.0),
                    z: 0.0,
                },
            )
            .expect("entity is alive");
        for id in [types.velocity, types.transform, types.health, types.sprite] {
            if rng.gen_bool(density) {
                world.attach(entity, id).expect("entity is alive");
            }
        }
    }

    (world, types, entities)
}
