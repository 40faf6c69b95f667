//! Per-type systems and their dispatch.
//!
//! # Overview
//!
//! Every component type nominates one system type (`Component::System`). The world holds exactly
//! one instance of it, constructed in place from the type's [`Descriptor`] as soon as the world
//! learns about the type, and destructed when the world is torn down. Each frame the world runs
//! every system over every entity carrying its component:
//!
//! ```rust,ignore
//! #[derive(Component, Default)]
//! #[component(system = Integrate)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! #[derive(Default)]
//! struct Integrate { moved: u64 }
//!
//! impl System<Velocity> for Integrate {
//!     fn update(&mut self, ctx: &mut Context<'_>, entity: Entity, velocity: &mut Velocity) {
//!         velocity.dy -= 9.8 * ctx.time().delta_secs();
//!         self.moved += 1;
//!     }
//! }
//! ```
//!
//! # Ordering
//!
//! Types are dispatched in registration order. Within a type, entities are visited in column
//! row order. Systems cannot change the set of entities or components while a pass is running:
//! structural changes go through [`Commands`] and are applied after the pass, so no entity is
//! skipped or visited twice within a frame. Row order may differ between frames.

use std::ptr::NonNull;

use crate::{
    core::time::Time,
    ecs::{
        component::{self, Descriptor},
        entity::{Allocator, Entity},
        storage::{GrowthStrategy, IndexedMemory},
    },
};

mod command;

pub use command::{Command, CommandBuffer, Commands};

/// Per-frame logic for one component type.
///
/// The instance is a singleton shared by every entity carrying `C`. It is default constructed
/// in place by the world, so any state it keeps lives for the world's lifetime.
pub trait System<C>: Default + Send + 'static {
    /// Process one entity's component.
    fn update(&mut self, ctx: &mut Context<'_>, entity: Entity, component: &mut C);
}

/// The system of component types that have no per-frame logic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSystem;

impl<C> System<C> for NoopSystem {
    #[inline]
    fn update(&mut self, _ctx: &mut Context<'_>, _entity: Entity, _component: &mut C) {}
}

/// What a system can see of the world while it runs.
pub struct Context<'w> {
    time: &'w Time,
    commands: Commands<'w>,
}

impl<'w> Context<'w> {
    pub(crate) fn new(time: &'w Time, buffer: &'w CommandBuffer, allocator: &'w Allocator) -> Self {
        Self {
            time,
            commands: Commands::new(buffer, allocator),
        }
    }

    /// Timing of the frame being dispatched.
    #[inline]
    pub fn time(&self) -> &Time {
        self.time
    }

    /// Queue structural changes to apply once the dispatch pass finishes.
    #[inline]
    pub fn commands(&mut self) -> &mut Commands<'w> {
        &mut self.commands
    }
}

/// The type-erased singleton system of one registered component type.
pub(crate) struct Instance {
    descriptor: Descriptor,
    memory: IndexedMemory,
}

impl Instance {
    /// Allocate and construct the system described by `descriptor`.
    pub(crate) fn new(descriptor: Descriptor) -> Self {
        let lifecycle = descriptor.system();
        let mut memory = IndexedMemory::with_capacity(lifecycle.layout(), 1, GrowthStrategy::Exact);
        // SAFETY: slot 0 is allocated for exactly this layout.
        unsafe { (lifecycle.construct_fn())(memory.ptr_at_mut(0)) };
        Self { descriptor, memory }
    }

    #[inline]
    pub(crate) fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    #[inline]
    pub(crate) fn ptr(&self) -> NonNull<u8> {
        self.memory.ptr_at(0)
    }

    /// Run the system for one component.
    ///
    /// # Safety
    ///
    /// `component` must point at a live component of this instance's type, not aliased for the
    /// duration of the call.
    #[inline]
    pub(crate) unsafe fn update(
        &mut self,
        ctx: &mut Context<'_>,
        entity: Entity,
        component: NonNull<u8>,
    ) {
        let system = self.memory.ptr_at_mut(0);
        unsafe { (self.descriptor.update_fn())(system, ctx, entity, component) };
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        // SAFETY: slot 0 was constructed in `new` and is destructed exactly once.
        unsafe { (self.descriptor.system().destruct_fn())(self.memory.ptr_at_mut(0)) };
    }
}

/// The outcome of one dispatch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// System invocations per type index, in registration order.
    invocations: Vec<usize>,
    /// Deferred commands applied after the pass (including ones that failed).
    commands: usize,
}

impl DispatchStats {
    pub(crate) fn new(types: usize) -> Self {
        Self {
            invocations: vec![0; types],
            commands: 0,
        }
    }

    pub(crate) fn record(&mut self, id: component::Id, count: usize) {
        self.invocations[id.index()] = count;
    }

    pub(crate) fn set_commands(&mut self, count: usize) {
        self.commands = count;
    }

    /// How many entities the system of `id` was run for.
    #[inline]
    pub fn invocations(&self, id: component::Id) -> usize {
        self.invocations.get(id.index()).copied().unwrap_or(0)
    }

    /// Total system invocations across all types.
    pub fn total(&self) -> usize {
        self.invocations.iter().sum()
    }

    /// Number of deferred commands processed after the pass.
    #[inline]
    pub fn commands(&self) -> usize {
        self.commands
    }
}
