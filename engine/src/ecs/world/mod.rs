//! The world owns every entity, component and system instance.
//!
//! A `World` is built on top of a [`TypeRegistry`]. For every registered type it keeps one
//! [`Column`] of component data and one system instance. Entities are plain handles; which
//! components an entity holds is tracked in a per-entity bit mask indexed by type index.
//!
//! # Example
//!
//! ```ignore
//! use blaze_engine::{core::time::Time, ecs::{component::TypeRegistry, world::World}};
//!
//! let registry = TypeRegistry::new();
//! let position = registry.register_type::<Position>()?;
//!
//! let mut world = World::new(registry);
//! let entity = world.spawn();
//! world.attach(entity, position)?;
//!
//! let stats = world.update(&Time::new());
//! assert_eq!(stats.invocations(position), 1);
//! ```
//!
//! # Teardown
//!
//! Dropping the world destructs every component that is still attached, and only then destructs
//! the system instances, last registered first.

use fixedbitset::FixedBitSet;
use log::{debug, trace, warn};

use crate::{
    core::time::Time,
    ecs::{
        component::{self, Component, Descriptor, TypeRegistry},
        entity::{self, Allocator, Entity, Generation},
        error::{Error, Result},
        storage::{Column, GrowthStrategy, Row},
        system::{CommandBuffer, Context, DispatchStats, Instance},
    },
};

/// Storage tuning for a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// How component columns grow when full.
    pub growth: GrowthStrategy,
    /// Rows reserved by each column when it is created.
    pub initial_capacity: usize,
    /// Entities covered by each block of a column's sparse index.
    pub index_block_size: usize,
}

impl Config {
    pub const DEFAULT_INITIAL_CAPACITY: usize = 64;
    pub const DEFAULT_INDEX_BLOCK_SIZE: usize = 256;

    pub fn with_growth(mut self, growth: GrowthStrategy) -> Self {
        self.growth = growth;
        self
    }

    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// # Panics
    ///
    /// Panics if `index_block_size` is zero.
    pub fn with_index_block_size(mut self, index_block_size: usize) -> Self {
        assert!(index_block_size > 0, "index block size must be non-zero");
        self.index_block_size = index_block_size;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            growth: GrowthStrategy::default(),
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            index_block_size: Self::DEFAULT_INDEX_BLOCK_SIZE,
        }
    }
}

/// Book-keeping for a live entity.
struct Entry {
    generation: Generation,
    /// Bit `i` is set while the entity holds a component of type index `i`.
    mask: FixedBitSet,
}

pub struct World {
    registry: TypeRegistry,
    config: Config,
    allocator: Allocator,

    /// Indexed by entity index. `None` for ids that are free or only reserved.
    entities: Vec<Option<Entry>>,
    alive: usize,

    /// One column and one system per known type, both indexed by type index.
    columns: Vec<Column>,
    systems: Vec<Instance>,

    commands: CommandBuffer,
}

impl World {
    /// Create a world over `registry`, constructing a system for every type already in it.
    pub fn new(registry: TypeRegistry) -> Self {
        Self::with_config(registry, Config::default())
    }

    pub fn with_config(registry: TypeRegistry, config: Config) -> Self {
        let mut world = Self {
            registry,
            config,
            allocator: Allocator::new(),
            entities: Vec::new(),
            alive: 0,
            columns: Vec::new(),
            systems: Vec::new(),
            commands: CommandBuffer::new(),
        };
        world.sync_types();
        world
    }

    #[inline]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Register a component type and construct its system.
    pub fn register(&mut self, descriptor: Descriptor) -> Result<component::Id> {
        let id = self.registry.register(descriptor)?;
        self.sync_types();
        Ok(id)
    }

    pub fn register_type<C: Component>(&mut self) -> Result<component::Id> {
        self.register(Descriptor::of::<C>())
    }

    /// Create columns and systems for types added to the registry since the last sync.
    ///
    /// The registry only grows, so everything past `columns.len()` is new.
    fn sync_types(&mut self) {
        for index in self.columns.len()..self.registry.len() {
            let id = component::Id::from(index);
            let descriptor = self.registry.descriptor(id);
            self.columns.push(Column::new(id, descriptor, &self.config));
            self.systems.push(Instance::new(descriptor));
            debug!(
                "Constructed system for component type '{}' ({id}, {} bytes)",
                descriptor.name(),
                descriptor.system_size()
            );
        }
    }

    /// Spawn an entity with no components.
    pub fn spawn(&mut self) -> Entity {
        let entity = self.allocator.alloc();
        self.insert_entry(entity);
        entity
    }

    /// Spawn `count` entities with no components.
    pub fn spawn_many(&mut self, count: usize) -> Vec<Entity> {
        let entities = self.allocator.alloc_many(count);
        for &entity in &entities {
            self.insert_entry(entity);
        }
        entities
    }

    /// Bring an entity reserved through the allocator to life.
    ///
    /// Fails without touching the world if the entity's slot is already held.
    pub(crate) fn spawn_reserved(&mut self, entity: Entity) -> Result<()> {
        if let Some(Some(_)) = self.entities.get(entity.index()) {
            return Err(Error::SlotInUse(entity));
        }
        self.insert_entry(entity);
        Ok(())
    }

    /// The allocator only issues free slots, so `entity`'s slot is vacant here.
    fn insert_entry(&mut self, entity: Entity) {
        let index = entity.index();
        if self.entities.len() <= index {
            self.entities.resize_with(index + 1, || None);
        }
        self.entities[index] = Some(Entry {
            generation: entity.generation(),
            mask: FixedBitSet::with_capacity(self.columns.len()),
        });
        self.alive += 1;
        trace!("Spawned {entity:?}");
    }

    /// Destroy an entity, destructing each of its components once.
    pub fn despawn(&mut self, entity: Entity) -> Result<()> {
        if !self.is_alive(entity) {
            warn!("Ignoring despawn of {entity:?}: not alive");
            return Err(Error::NoSuchEntity(entity));
        }
        if let Some(entry) = self.entities[entity.index()].take() {
            for index in entry.mask.ones() {
                self.columns[index].remove(entity);
            }
        }
        self.alive -= 1;
        self.allocator.free(entity);
        trace!("Despawned {entity:?}");
        Ok(())
    }

    /// Determine if `entity` is alive. Handles of despawned entities are never alive again, even
    /// after their id is reused.
    pub fn is_alive(&self, entity: Entity) -> bool {
        matches!(
            self.entities.get(entity.index()),
            Some(Some(entry)) if entry.generation == entity.generation()
        )
    }

    /// Number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.alive
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.alive == 0
    }

    /// Iterate the live entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref().map(|entry| {
                Entity::new_with_generation(entity::Id::from(index as u32), entry.generation)
            })
        })
    }

    /// Attach a default constructed component of type index `id`.
    pub fn attach(&mut self, entity: Entity, id: component::Id) -> Result<()> {
        let column = self.prepare_attach(entity, id)?;
        column.insert_default(entity);
        let name = column.descriptor().name();
        self.mark_attached(entity, id);
        debug!("Attached '{name}' to {entity:?}");
        Ok(())
    }

    /// Attach `value` as the entity's `C` component.
    pub fn attach_value<C: Component>(&mut self, entity: Entity, value: C) -> Result<()> {
        let id = self.typed_id::<C>().ok_or(Error::UnregisteredType(C::NAME))?;
        let column = self.prepare_attach(entity, id)?;
        // SAFETY: the column holds `C` values (checked by `typed_id`) and the slot is written
        // in full.
        unsafe { column.insert_with(entity, |slot| slot.cast::<C>().write(value)) };
        self.mark_attached(entity, id);
        debug!("Attached '{}' to {entity:?}", C::NAME);
        Ok(())
    }

    /// Validate an attach, returning the column to fill.
    fn prepare_attach(&mut self, entity: Entity, id: component::Id) -> Result<&mut Column> {
        self.sync_types();
        let column = self
            .columns
            .get_mut(id.index())
            .ok_or(Error::UnknownTypeIndex(id))?;
        let entry = live_entry(&mut self.entities, entity)?;
        if entry.mask.contains(id.index()) {
            return Err(Error::AlreadyAttached {
                entity,
                name: column.descriptor().name(),
            });
        }
        Ok(column)
    }

    /// Record `id` in the entity's mask once its row exists.
    fn mark_attached(&mut self, entity: Entity, id: component::Id) {
        if let Ok(entry) = live_entry(&mut self.entities, entity) {
            entry.mask.grow(id.index() + 1);
            entry.mask.insert(id.index());
        }
    }

    /// Destruct and remove the entity's component of type index `id`.
    pub fn detach(&mut self, entity: Entity, id: component::Id) -> Result<()> {
        self.sync_types();
        let column = self
            .columns
            .get_mut(id.index())
            .ok_or(Error::UnknownTypeIndex(id))?;
        let entry = live_entry(&mut self.entities, entity)?;
        if !entry.mask.contains(id.index()) {
            return Err(Error::NotAttached {
                entity,
                name: column.descriptor().name(),
            });
        }
        entry.mask.set(id.index(), false);
        column.remove(entity);
        debug!("Detached '{}' from {entity:?}", column.descriptor().name());
        Ok(())
    }

    /// Determine if a live `entity` holds a component of type index `id`.
    pub fn has(&self, entity: Entity, id: component::Id) -> bool {
        self.entry(entity)
            .is_some_and(|entry| entry.mask.contains(id.index()))
    }

    /// The type indices attached to `entity`, ascending.
    pub fn components_of(&self, entity: Entity) -> Result<Vec<component::Id>> {
        let entry = self.entry(entity).ok_or(Error::NoSuchEntity(entity))?;
        Ok(entry.mask.ones().map(component::Id::from).collect())
    }

    /// Borrow the entity's `C` component.
    ///
    /// # Panics
    ///
    /// Panics if `C::NAME` is registered with a descriptor for a different Rust type.
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        let ptr = self.component_ptr::<C>(entity)?;
        // SAFETY: the column holds initialised `C` values and the borrow is tied to `&self`.
        Some(unsafe { ptr.cast::<C>().as_ref() })
    }

    /// Mutably borrow the entity's `C` component.
    ///
    /// # Panics
    ///
    /// Panics if `C::NAME` is registered with a descriptor for a different Rust type.
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        let mut ptr = self.component_ptr::<C>(entity)?.cast::<C>();
        // SAFETY: as for `get`, with exclusivity guaranteed by `&mut self`.
        Some(unsafe { ptr.as_mut() })
    }

    fn component_ptr<C: Component>(&self, entity: Entity) -> Option<std::ptr::NonNull<u8>> {
        let id = self.typed_id::<C>()?;
        if !self.has(entity, id) {
            return None;
        }
        self.columns.get(id.index())?.get_ptr(entity)
    }

    /// The system instance for component type `C`.
    ///
    /// # Panics
    ///
    /// Panics if `C::NAME` is registered with a descriptor for a different Rust type.
    pub fn system<C: Component>(&self) -> Option<&C::System> {
        let instance = self.systems.get(self.typed_id::<C>()?.index())?;
        // SAFETY: the instance was constructed from `C`'s descriptor, so it holds a `C::System`.
        Some(unsafe { instance.ptr().cast::<C::System>().as_ref() })
    }

    /// Mutable access to the system instance for component type `C`.
    ///
    /// # Panics
    ///
    /// Panics if `C::NAME` is registered with a descriptor for a different Rust type.
    pub fn system_mut<C: Component>(&mut self) -> Option<&mut C::System> {
        let index = self.typed_id::<C>()?.index();
        let instance = self.systems.get_mut(index)?;
        // SAFETY: as for `system`, with exclusivity guaranteed by `&mut self`.
        Some(unsafe { instance.ptr().cast::<C::System>().as_mut() })
    }

    /// The column of type index `id`, if the world has created it.
    #[inline]
    pub fn column(&self, id: component::Id) -> Option<&Column> {
        self.columns.get(id.index())
    }

    /// Resolve `C` to its type index, asserting that the registered descriptor really is `C`.
    fn typed_id<C: Component>(&self) -> Option<component::Id> {
        let id = self.registry.index_of_type::<C>()?;
        let descriptor = self.registry.descriptor(id);
        assert!(
            descriptor.is::<C>(),
            "component type '{}' is registered for a different Rust type",
            C::NAME
        );
        Some(id)
    }

    fn entry(&self, entity: Entity) -> Option<&Entry> {
        match self.entities.get(entity.index()) {
            Some(Some(entry)) if entry.generation == entity.generation() => Some(entry),
            _ => None,
        }
    }

    /// Run one frame: every type's system over every entity holding that type, in registration
    /// order, then apply the commands the systems queued.
    pub fn update(&mut self, time: &Time) -> DispatchStats {
        self.sync_types();
        let mut stats = DispatchStats::new(self.columns.len());

        {
            let mut ctx = Context::new(time, &self.commands, &self.allocator);
            for (column, system) in self.columns.iter().zip(self.systems.iter_mut()) {
                for (row, &entity) in column.entities().iter().enumerate() {
                    // SAFETY: rows are live for the whole pass; structural changes are deferred.
                    unsafe { system.update(&mut ctx, entity, column.ptr(Row::new(row))) };
                }
                stats.record(column.id(), column.len());
                trace!(
                    "Frame {}: ran '{}' system for {} entities",
                    time.frame,
                    system.descriptor().name(),
                    column.len()
                );
            }
        }

        stats.set_commands(self.flush_commands());
        stats
    }

    /// Apply every queued command, returning how many were processed.
    pub fn flush_commands(&mut self) -> usize {
        let pending = std::mem::take(&mut self.commands);
        let applied = pending.flush(self);
        if applied > 0 {
            trace!("Applied {applied} deferred commands");
        }
        applied
    }

    /// The command buffer systems push into. Commands queued here are applied by the next
    /// [`update`](Self::update) or [`flush_commands`](Self::flush_commands).
    #[inline]
    pub fn commands(&self) -> &CommandBuffer {
        &self.commands
    }

    /// Approximate bytes held by component storage, entity book-keeping and systems.
    pub fn memory_usage(&self) -> usize {
        let columns: usize = self.columns.iter().map(Column::memory_usage).sum();
        let systems: usize = self
            .systems
            .iter()
            .map(|system| system.descriptor().system_size())
            .sum();
        let entities = self.entities.capacity() * std::mem::size_of::<Option<Entry>>()
            + self
                .entities
                .iter()
                .flatten()
                .map(|entry| entry.mask.as_slice().len() * std::mem::size_of::<usize>())
                .sum::<usize>();
        columns + systems + entities
    }
}

impl Drop for World {
    fn drop(&mut self) {
        for column in &mut self.columns {
            column.clear();
        }
        self.entities.clear();
        while let Some(system) = self.systems.pop() {
            drop(system);
        }
    }
}

fn live_entry(entities: &mut [Option<Entry>], entity: Entity) -> Result<&mut Entry> {
    match entities.get_mut(entity.index()) {
        Some(Some(entry)) if entry.generation == entity.generation() => Ok(entry),
        _ => Err(Error::NoSuchEntity(entity)),
    }
}
