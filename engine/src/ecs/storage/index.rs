//! Sparse entity → row lookup.

use crate::ecs::{entity::Entity, storage::Row};

/// A block-based sparse index from entity ids to dense column rows.
///
/// The entity id space is split into fixed-size blocks. A block is only allocated once an entity
/// in its range is inserted; within a block, rows are stored densely so lookups are two array
/// reads. Entity ids are allocated sequentially and recycled, so they cluster and most blocks end
/// up well populated.
///
/// | Operation | Time |
/// |-----------|------|
/// | `insert()` | O(1) amortized, allocates a block on first use |
/// | `get()` | O(1) |
/// | `remove()` | O(1), never frees blocks |
///
/// The index is keyed by entity id only. Generation checks happen before the index is consulted.
#[derive(Debug)]
pub struct DynamicIndex {
    block_size: usize,

    /// Outer Vec is indexed by `id / block_size`, inner by `id % block_size`.
    blocks: Vec<Option<Box<[Option<Row>]>>>,
}

impl DynamicIndex {
    /// Default block size balances memory usage and access speed for typical entity patterns.
    pub const DEFAULT_BLOCK_SIZE: usize = 256;

    #[inline]
    pub const fn new() -> Self {
        Self::new_with_block_size(Self::DEFAULT_BLOCK_SIZE)
    }

    /// Create an index with a custom block size.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is 0.
    #[inline]
    pub const fn new_with_block_size(block_size: usize) -> Self {
        assert!(block_size > 0, "block_size must be greater than 0");
        Self {
            block_size,
            blocks: Vec::new(),
        }
    }

    #[inline]
    fn indices(&self, entity: Entity) -> (usize, usize) {
        let index = entity.index();
        (index / self.block_size, index % self.block_size)
    }

    /// Map `entity` to `row`, replacing any previous mapping.
    pub fn insert(&mut self, entity: Entity, row: Row) {
        let (block_index, slot) = self.indices(entity);
        if block_index >= self.blocks.len() {
            self.blocks.resize_with(block_index + 1, || None);
        }
        let block_size = self.block_size;
        let block = self.blocks[block_index]
            .get_or_insert_with(|| vec![None; block_size].into_boxed_slice());
        block[slot] = Some(row);
    }

    /// Get the row for `entity`, if mapped.
    #[inline]
    pub fn get(&self, entity: Entity) -> Option<Row> {
        let (block_index, slot) = self.indices(entity);
        self.blocks.get(block_index)?.as_ref()?[slot]
    }

    /// Remove and return the row for `entity`, if mapped.
    #[inline]
    pub fn remove(&mut self, entity: Entity) -> Option<Row> {
        let (block_index, slot) = self.indices(entity);
        self.blocks.get_mut(block_index)?.as_mut()?[slot].take()
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }

    /// Number of blocks that have been allocated.
    pub fn allocated_block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }

    /// Estimate memory usage in bytes (excluding allocator metadata).
    pub fn memory_usage(&self) -> usize {
        self.blocks.capacity() * std::mem::size_of::<Option<Box<[Option<Row>]>>>()
            + self.allocated_block_count() * self.block_size * std::mem::size_of::<Option<Row>>()
    }
}

impl Default for DynamicIndex {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: u32) -> Entity {
        Entity::new(id)
    }

    #[test]
    fn single_block() {
        // Given
        let mut index = DynamicIndex::new_with_block_size(10);

        // When
        index.insert(entity(0), Row::new(10));
        index.insert(entity(5), Row::new(40));
        index.insert(entity(9), Row::new(80));

        // Then
        assert_eq!(index.allocated_block_count(), 1);
        assert_eq!(index.get(entity(0)), Some(Row::new(10)));
        assert_eq!(index.get(entity(1)), None);
        assert_eq!(index.get(entity(5)), Some(Row::new(40)));
        assert_eq!(index.get(entity(9)), Some(Row::new(80)));
    }

    #[test]
    fn skipped_blocks_are_not_allocated() {
        // Given
        let mut index = DynamicIndex::new_with_block_size(4);

        // When
        index.insert(entity(0), Row::new(0));
        index.insert(entity(13), Row::new(1));

        // Then
        assert_eq!(index.allocated_block_count(), 2);
        assert_eq!(index.get(entity(6)), None);
        assert_eq!(index.get(entity(1000)), None);
        assert_eq!(index.get(entity(13)), Some(Row::new(1)));
    }

    #[test]
    fn remove_and_replace() {
        // Given
        let mut index = DynamicIndex::new();
        index.insert(entity(7), Row::new(3));

        // When
        index.insert(entity(7), Row::new(4));

        // Then
        assert_eq!(index.remove(entity(7)), Some(Row::new(4)));
        assert_eq!(index.remove(entity(7)), None);
        assert!(!index.contains(entity(7)));
        assert_eq!(index.remove(entity(9999)), None);
    }

    #[test]
    #[should_panic(expected = "block_size must be greater than 0")]
    fn zero_block_size_panics() {
        let _ = DynamicIndex::new_with_block_size(0);
    }
}
