//! Deferred structural changes.
//!
//! Systems run while the world is iterating its columns, so they cannot spawn or despawn entities
//! or attach and detach components directly. Instead they push [`Command`]s through
//! [`Commands`], and the world applies the queue in FIFO order once the dispatch pass is over.
//!
//! ```text
//! ┌──────────────────────────── World::update ────────────────────────────┐
//! │  Position system ──push──┐                                            │
//! │  Velocity system ──push──┼──► CommandBuffer ──flush──► World          │
//! │  Sprite system   ──push──┘     (after the last type has been run)     │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Spawned entity ids are reserved at push time, so a system can spawn an entity and queue
//! attachments for it in the same call.

use crossbeam::queue::SegQueue;
use log::warn;

use crate::ecs::{
    component::{self, Component},
    entity::{Allocator, Entity, Reserved},
    error::Result,
    world::World,
};

/// Applies a typed component value to a world.
pub type ApplyFn = Box<dyn FnOnce(&mut World, Entity) -> Result<()> + Send>;

/// A deferred world operation.
pub enum Command {
    /// Bring a reserved entity to life.
    Spawn { reserved: Reserved },
    /// Destroy an entity along with all of its components.
    Despawn { entity: Entity },
    /// Attach a default constructed component by type index.
    Attach { entity: Entity, id: component::Id },
    /// Attach a component with a concrete value.
    AttachValue { entity: Entity, apply: ApplyFn },
    /// Detach and destruct a component by type index.
    Detach { entity: Entity, id: component::Id },
}

impl Command {
    fn apply(self, world: &mut World) -> Result<()> {
        match self {
            Command::Spawn { reserved } => world.spawn_reserved(reserved.entity()),
            Command::Despawn { entity } => world.despawn(entity),
            Command::Attach { entity, id } => world.attach(entity, id),
            Command::AttachValue { entity, apply } => apply(world, entity),
            Command::Detach { entity, id } => world.detach(entity, id),
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Spawn { reserved } => f
                .debug_struct("Spawn")
                .field("entity", &reserved.entity())
                .finish(),
            Command::Despawn { entity } => {
                f.debug_struct("Despawn").field("entity", entity).finish()
            }
            Command::Attach { entity, id } => f
                .debug_struct("Attach")
                .field("entity", entity)
                .field("id", id)
                .finish(),
            Command::AttachValue { entity, .. } => f
                .debug_struct("AttachValue")
                .field("entity", entity)
                .finish_non_exhaustive(),
            Command::Detach { entity, id } => f
                .debug_struct("Detach")
                .field("entity", entity)
                .field("id", id)
                .finish(),
        }
    }
}

/// Lock-free queue of pending commands.
#[derive(Default)]
pub struct CommandBuffer {
    commands: SegQueue<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self {
            commands: SegQueue::new(),
        }
    }

    /// Queue a command. Safe to call from several threads at once.
    pub fn push(&self, command: Command) {
        self.commands.push(command);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Take every queued command in FIFO order, leaving the buffer empty.
    pub fn drain(&self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(self.commands.len());
        while let Some(cmd) = self.commands.pop() {
            commands.push(cmd);
        }
        commands
    }

    /// Apply every queued command to `world` in order, returning how many were processed.
    ///
    /// A command that fails (for example a despawn of an entity an earlier command already
    /// destroyed) is logged and skipped; the rest of the queue still runs.
    pub fn flush(&self, world: &mut World) -> usize {
        let commands = self.drain();
        let count = commands.len();
        for command in commands {
            let label = format!("{command:?}");
            if let Err(err) = command.apply(world) {
                warn!("Deferred command {label} failed: {err}");
            }
        }
        count
    }
}

/// Handle systems use to queue structural changes.
pub struct Commands<'w> {
    buffer: &'w CommandBuffer,
    allocator: &'w Allocator,
}

impl<'w> Commands<'w> {
    pub(crate) fn new(buffer: &'w CommandBuffer, allocator: &'w Allocator) -> Self {
        Self { buffer, allocator }
    }

    /// Reserve a new entity. It becomes alive when the queue is flushed.
    pub fn spawn(&mut self) -> Entity {
        let reserved = self.allocator.reserve();
        self.buffer.push(Command::Spawn { reserved });
        reserved.entity()
    }

    pub fn despawn(&mut self, entity: Entity) {
        self.buffer.push(Command::Despawn { entity });
    }

    /// Attach a default constructed component of type index `id`.
    pub fn attach(&mut self, entity: Entity, id: component::Id) {
        self.buffer.push(Command::Attach { entity, id });
    }

    /// Attach `value` as the entity's `C` component.
    pub fn attach_value<C: Component>(&mut self, entity: Entity, value: C) {
        self.buffer.push(Command::AttachValue {
            entity,
            apply: Box::new(move |world: &mut World, entity: Entity| {
                world.attach_value(entity, value)
            }),
        });
    }

    pub fn detach(&mut self, entity: Entity, id: component::Id) {
        self.buffer.push(Command::Detach { entity, id });
    }
}
