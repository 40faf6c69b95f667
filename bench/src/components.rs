//! Component types sized like real game data, each with a system doing a little work.

use blaze_engine::ecs::{Component, Context, Entity, System};

/// 3D position (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 3D velocity (12 bytes), integrated by [`Integrate`].
#[derive(Component, Clone, Copy, Debug, Default)]
#[component(system = Integrate)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Default)]
pub struct Integrate;

impl System<Velocity> for Integrate {
    #[inline]
    fn update(&mut self, ctx: &mut Context<'_>, _entity: Entity, velocity: &mut Velocity) {
        let dt = ctx.time().delta_secs();
        velocity.x *= 1.0 - 0.1 * dt;
        velocity.y -= 9.8 * dt;
        velocity.z *= 1.0 - 0.1 * dt;
    }
}

/// 4x4 transformation matrix (64 bytes).
#[derive(Component, Clone, Copy, Debug)]
pub struct Transform {
    pub matrix: [[f32; 4]; 4],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            matrix: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }
}

/// Damageable entities, regenerated by [`Regenerate`].
#[derive(Component, Clone, Copy, Debug)]
#[component(system = Regenerate)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self {
            current: 100.0,
            max: 100.0,
        }
    }
}

#[derive(Default)]
pub struct Regenerate {
    pub healed: u64,
}

impl System<Health> for Regenerate {
    #[inline]
    fn update(&mut self, ctx: &mut Context<'_>, _entity: Entity, health: &mut Health) {
        if health.current < health.max {
            health.current = (health.current + 5.0 * ctx.time().delta_secs()).min(health.max);
            self.healed += 1;
        }
    }
}

/// A sprite payload (32 bytes), with no per-frame logic.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Sprite {
    pub atlas: u32,
    pub frame: u32,
    pub tint: [f32; 4],
    pub layer: u32,
    pub flags: u32,
}
