//! A tiny particle simulation: particles fall under gravity, age, and are replaced by new ones
//! once they expire. Engine log records are collected through a channel and printed at the end.

use std::time::Duration;

use blaze_engine::{
    core::{
        log::ChannelLogger,
        time::{SIXTY_FPS, Time},
    },
    ecs::{Component, Context, Entity, System, TypeRegistry, World},
};
use log::LevelFilter;

const PARTICLES: usize = 32;
const FRAMES: usize = 180;

#[derive(Component, Default, Debug, Clone, Copy)]
#[component(system = Gravity)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Default)]
struct Gravity;

impl System<Velocity> for Gravity {
    fn update(&mut self, ctx: &mut Context<'_>, _entity: Entity, velocity: &mut Velocity) {
        velocity.dy -= 9.8 * ctx.time().delta_secs();
    }
}

#[derive(Component, Default, Debug)]
#[component(system = Reaper)]
struct Lifetime {
    remaining: f32,
}

#[derive(Default)]
struct Reaper {
    expired: usize,
}

impl System<Lifetime> for Reaper {
    fn update(&mut self, ctx: &mut Context<'_>, entity: Entity, lifetime: &mut Lifetime) {
        lifetime.remaining -= ctx.time().delta_secs();
        if lifetime.remaining > 0.0 {
            return;
        }
        self.expired += 1;

        let commands = ctx.commands();
        commands.despawn(entity);
        let replacement = commands.spawn();
        commands.attach_value(replacement, Velocity { dx: 0.5, dy: 4.0 });
        commands.attach_value(replacement, Lifetime { remaining: 1.0 });
    }
}

fn main() {
    let (logger, records) = ChannelLogger::with_receiver(LevelFilter::Debug);
    if let Err(err) = logger.install() {
        eprintln!("logger already installed: {err}");
    }

    let registry = TypeRegistry::new();
    let velocity = registry.register_type::<Velocity>().expect("register Velocity");
    let lifetime = registry.register_type::<Lifetime>().expect("register Lifetime");
    let mut world = World::new(registry);

    for i in 0..PARTICLES {
        let particle = world.spawn();
        world
            .attach_value(particle, Velocity { dx: i as f32 * 0.1, dy: 0.0 })
            .expect("attach Velocity");
        world
            .attach_value(particle, Lifetime { remaining: 0.5 + i as f32 * 0.05 })
            .expect("attach Lifetime");
    }

    let mut time = Time::new();
    let mut invocations = 0;
    for _ in 0..FRAMES {
        time = time.advance(Duration::from_nanos(SIXTY_FPS));
        let stats = world.update(&time);
        invocations += stats.invocations(velocity) + stats.invocations(lifetime);
    }

    println!(
        "{FRAMES} frames, {} live particles, {invocations} system calls, {} expired, {} bytes",
        world.len(),
        world.system::<Lifetime>().map_or(0, |reaper| reaper.expired),
        world.memory_usage()
    );

    drop(world);
    for record in records.try_iter() {
        println!("[{:<5}] {}: {}", record.level, record.target, record.message);
    }
}
