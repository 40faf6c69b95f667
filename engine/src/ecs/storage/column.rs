use std::ptr::{self, NonNull};

use crate::ecs::{
    component::{self, Descriptor},
    entity::Entity,
    storage::{DynamicIndex, IndexedMemory},
    world::Config,
};

/// A dense row index into a [`Column`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Row(usize);

impl Row {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Densely packed storage for every instance of one component type.
///
/// Rows `0..len` are initialised. `entities[row]` is the owner of the component in that row and
/// the sparse index maps each owner back to its row. Removing a row moves the last row into the
/// hole, so rows are only stable while the column's entity set is unchanged.
///
/// All construction and destruction goes through the descriptor's function pointers; the column
/// never sees the concrete type.
pub struct Column {
    id: component::Id,
    descriptor: Descriptor,
    data: IndexedMemory,
    entities: Vec<Entity>,
    index: DynamicIndex,
}

impl Column {
    pub fn new(id: component::Id, descriptor: Descriptor, config: &Config) -> Self {
        let layout = descriptor.component().layout();
        Self {
            id,
            descriptor,
            data: IndexedMemory::with_capacity(layout, config.initial_capacity, config.growth),
            entities: Vec::with_capacity(config.initial_capacity),
            index: DynamicIndex::new_with_block_size(config.index_block_size),
        }
    }

    #[inline]
    pub fn id(&self) -> component::Id {
        self.id
    }

    #[inline]
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Owners of each row, in row order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.index.contains(entity)
    }

    #[inline]
    pub fn row_of(&self, entity: Entity) -> Option<Row> {
        self.index.get(entity)
    }

    /// Pointer to the component in `row`.
    #[inline]
    pub fn ptr(&self, row: Row) -> NonNull<u8> {
        debug_assert!(row.index() < self.len(), "invalid row index");
        self.data.ptr_at(row.index())
    }

    /// Pointer to the component owned by `entity`, if it has one in this column.
    #[inline]
    pub fn get_ptr(&self, entity: Entity) -> Option<NonNull<u8>> {
        self.row_of(entity).map(|row| self.ptr(row))
    }

    /// Append a default-constructed component for `entity`.
    pub fn insert_default(&mut self, entity: Entity) -> Row {
        let construct = self.descriptor.component().construct_fn();
        // SAFETY: the descriptor's construct function initialises a value of its own layout.
        unsafe { self.insert_with(entity, |slot| construct(slot)) }
    }

    /// Append a component for `entity`, initialised by `init`.
    ///
    /// # Safety
    ///
    /// `init` must fully initialise the slot with a value of this column's component type.
    pub unsafe fn insert_with(&mut self, entity: Entity, init: impl FnOnce(NonNull<u8>)) -> Row {
        debug_assert!(!self.contains(entity), "entity already present in column");
        let row = Row::new(self.len());
        self.data.ensure_capacity(row.index() + 1);
        init(self.data.ptr_at_mut(row.index()));
        // Only publish the row once the value exists.
        self.entities.push(entity);
        self.index.insert(entity, row);
        row
    }

    /// Destruct and remove the component owned by `entity`. Returns `false` if there is none.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(row) = self.index.remove(entity) else {
            return false;
        };
        let last = self.len() - 1;
        let removed = self.data.ptr_at_mut(row.index());

        // SAFETY: the row is initialised; after this it is treated as uninitialised.
        unsafe { (self.descriptor.component().destruct_fn())(removed) };

        if row.index() != last {
            let moved = self.data.ptr_at(last);
            // SAFETY: both rows lie within the allocation and are distinct; the last row becomes
            // logically uninitialised once its bytes are moved.
            unsafe {
                ptr::copy_nonoverlapping(
                    moved.as_ptr(),
                    removed.as_ptr(),
                    self.data.element_layout().size(),
                );
            }
            let moved_entity = self.entities[last];
            self.index.insert(moved_entity, row);
        }
        self.entities.swap_remove(row.index());
        true
    }

    /// Destruct every component in the column.
    pub fn clear(&mut self) {
        let destruct = self.descriptor.component().destruct_fn();
        for (row, entity) in self.entities.drain(..).enumerate() {
            self.index.remove(entity);
            // SAFETY: rows 0..len are initialised and each is destructed once.
            unsafe { destruct(self.data.ptr_at_mut(row)) };
        }
    }

    /// Approximate bytes held by this column (slots, owner list and sparse index).
    pub fn memory_usage(&self) -> usize {
        self.data.allocated_bytes()
            + self.entities.capacity() * std::mem::size_of::<Entity>()
            + self.index.memory_usage()
    }
}

impl Drop for Column {
    fn drop(&mut self) {
        self.clear();
    }
}
