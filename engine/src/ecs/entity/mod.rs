//! Entity identifiers and allocation.
//!
//! An [`Entity`] is a lightweight handle combining an [`Id`] (the slot) with a [`Generation`]
//! (how many times the slot has been reused). Freed ids are recycled with the next generation, so
//! a handle kept past its entity's despawn no longer matches and is rejected by the world.
//!
//! ```rust,ignore
//! let entity = allocator.alloc(); // Entity { id: 0, generation: 0 }
//! allocator.free(entity);
//! let reused = allocator.alloc();  // Entity { id: 0, generation: 1 }
//! assert_ne!(entity, reused);
//! ```
//!
//! The [`Allocator`] only hands out identifiers; whether an entity is alive, and which
//! components it carries, is tracked by the world.

use std::sync::atomic::{AtomicU32, Ordering};

use crossbeam::queue::SegQueue;

/// The generation of an entity id. Starts at `FIRST` and is incremented each time the id is
/// recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u32);

impl Generation {
    /// The first generation of an entity.
    pub const FIRST: Self = Self(0);

    /// Get the next generation from the current.
    #[inline]
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// An entity slot identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl From<u32> for Id {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A handle to an entity. A world holds at most one live entity per `id`; the `generation`
/// tells whether this handle still refers to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity {
    id: Id,
    generation: Generation,
}

impl Entity {
    /// Construct an entity in its first generation.
    #[inline]
    pub(crate) fn new(id: impl Into<Id>) -> Self {
        Self::new_with_generation(id.into(), Generation::FIRST)
    }

    #[inline]
    pub(crate) const fn new_with_generation(id: Id, generation: Generation) -> Self {
        Self { id, generation }
    }

    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Get the index of this entity if it were to live in indexable storage (e.g. Vec)
    #[inline]
    pub fn index(&self) -> usize {
        self.id.0 as usize
    }

    /// Get a new entity with the same id but the next generation.
    #[inline]
    pub fn genned(&self) -> Self {
        Self::new_with_generation(self.id, self.generation.next())
    }
}

/// An entity handle fresh from an [`Allocator`], not yet alive in any world.
///
/// Only the allocator hands these out, so a spawn command can never name an entity that is
/// already alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserved(pub(crate) Entity);

impl Reserved {
    #[inline]
    pub fn entity(&self) -> Entity {
        self.0
    }
}

/// Allocates entity handles and recycles freed ones.
///
/// Allocation only needs `&self` so systems can reserve handles through deferred commands while
/// the world is busy dispatching.
#[derive(Default, Debug)]
pub struct Allocator {
    /// Freed entities, already advanced to the generation they will be reissued with.
    dead_pool: SegQueue<Entity>,

    /// Next fresh id to allocate.
    next_id: AtomicU32,
}

impl Allocator {
    /// Construct a new entity allocator starting from ID 0.
    #[inline]
    pub const fn new() -> Self {
        Self {
            dead_pool: SegQueue::new(),
            next_id: AtomicU32::new(0),
        }
    }

    /// Allocate an entity, reusing a freed id when one is available.
    pub fn alloc(&self) -> Entity {
        if let Some(entity) = self.dead_pool.pop() {
            return entity;
        }
        Entity::new(Id(self.next_id.fetch_add(1, Ordering::Relaxed)))
    }

    /// Allocate an entity to be spawned later through a command.
    #[inline]
    pub(crate) fn reserve(&self) -> Reserved {
        Reserved(self.alloc())
    }

    /// Allocate `count` entities at once, draining the dead pool first.
    pub fn alloc_many(&self, count: usize) -> Vec<Entity> {
        let mut alloced = Vec::with_capacity(count);
        while alloced.len() < count
            && let Some(entity) = self.dead_pool.pop()
        {
            alloced.push(entity);
        }

        let remaining = (count - alloced.len()) as u32;
        if remaining > 0 {
            let start = self.next_id.fetch_add(remaining, Ordering::Relaxed);
            alloced.extend((start..start + remaining).map(|id| Entity::new(Id(id))));
        }
        alloced
    }

    /// Return an entity's id for reuse. The next allocation of this id carries the next
    /// generation, invalidating `entity`.
    pub fn free(&self, entity: Entity) {
        self.dead_pool.push(entity.genned());
    }

    /// Number of ids ever issued (the exclusive upper bound of entity indices).
    #[inline]
    pub fn issued(&self) -> usize {
        self.next_id.load(Ordering::Relaxed) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_uniqueness() {
        // Given
        let allocator = Allocator::new();

        // When
        let mut entities: Vec<_> = (0..200).map(|_| allocator.alloc()).collect();

        // Then - No dupes generated
        let pre_len = entities.len();
        entities.sort();
        entities.dedup();
        assert_eq!(pre_len, entities.len());
        assert_eq!(allocator.issued(), 200);
    }

    #[test]
    fn allocator_reuse_bumps_generation() {
        // Given
        let allocator = Allocator::new();
        let entities: Vec<_> = (0..10).map(|_| allocator.alloc()).collect();

        // When
        for e in &entities {
            allocator.free(*e);
        }
        let mut reused: Vec<_> = (0..10).map(|_| allocator.alloc()).collect();

        // Then
        reused.sort();
        for (i, e) in reused.iter().enumerate() {
            assert_eq!(e.id, Id(i as u32));
            assert_eq!(e.generation, Generation(1));
            assert_ne!(*e, entities[i]);
        }
        assert_eq!(allocator.issued(), 10);
    }

    #[test]
    fn allocator_multiple_generations() {
        // Given
        let allocator = Allocator::new();
        let entity = allocator.alloc();

        // When
        allocator.free(entity);
        let gen1 = allocator.alloc();
        allocator.free(gen1);
        let gen2 = allocator.alloc();

        // Then - Same ID, incrementing generations
        assert_eq!(gen1.id, entity.id);
        assert_eq!(gen1.generation, Generation(1));
        assert_eq!(gen2.id, entity.id);
        assert_eq!(gen2.generation, Generation(2));
    }

    #[test]
    fn allocator_alloc_many_mixed() {
        // Given
        let allocator = Allocator::new();
        for e in allocator.alloc_many(3) {
            allocator.free(e);
        }

        // When - Allocate 5 (more than pool size)
        let entities = allocator.alloc_many(5);

        // Then - Should get 3 reused + 2 new
        let reused = entities
            .iter()
            .filter(|e| e.generation == Generation(1))
            .count();
        let mut new_ids: Vec<_> = entities
            .iter()
            .filter(|e| e.generation == Generation::FIRST)
            .map(|e| e.id.0)
            .collect();
        new_ids.sort();
        assert_eq!(reused, 3);
        assert_eq!(new_ids, vec![3, 4]);
        assert_eq!(allocator.issued(), 5);
    }

    #[test]
    fn entity_ordering() {
        // Given
        let e1 = Entity::new(Id(1));
        let e2 = Entity::new(Id(2));
        let e1_gen1 = e1.genned();

        // Then - Ordered by ID first, then generation
        assert!(e1 < e2);
        assert!(e1 < e1_gen1);
        assert!(e1_gen1 < e2);
    }
}
