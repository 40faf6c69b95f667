//! Raw, type-erased memory for uniformly sized slots.
//!
//! [`IndexedMemory`] owns one contiguous allocation of `capacity` slots of a fixed [`Layout`] and
//! hands out pointers by index. It does not know which slots are initialised and never runs
//! constructors or destructors: the [`Column`](super::Column) above it does that through the
//! component descriptor.
//!
//! Zero-sized layouts never allocate; every slot pointer is the same well-aligned dangling
//! address.

use std::{
    alloc::{self, Layout},
    cmp,
    ptr::NonNull,
};

/// How [`IndexedMemory`] grows when more slots are required than are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthStrategy {
    /// Grow to a multiple of the current capacity (exponential growth, fewer reallocations).
    Multiply(usize),
    /// Grow by a fixed number of extra slots.
    Buffer(usize),
    /// Grow to exactly the requested capacity.
    Exact,
}

impl GrowthStrategy {
    /// Calculate the capacity to grow to from the current capacity and the required capacity.
    pub fn new_capacity(&self, current: usize, required: usize) -> usize {
        match self {
            Self::Multiply(factor) => cmp::max(current.saturating_mul(*factor), required),
            Self::Buffer(buffer) => cmp::max(current.saturating_add(*buffer), required),
            Self::Exact => required,
        }
    }
}

impl Default for GrowthStrategy {
    fn default() -> Self {
        Self::Multiply(2)
    }
}

/// A contiguous block of `capacity` slots sized and aligned for `element_layout`.
///
/// # Safety
///
/// This structure does **not** track initialization state or handle drop. The caller is
/// responsible for:
/// - Only reading from initialized slots
/// - Destructing values before they are overwritten or the memory is deallocated
/// - Keeping indices below [`capacity`](Self::capacity)
pub struct IndexedMemory {
    ptr: NonNull<u8>,
    capacity: usize,
    element_layout: Layout,
    growth: GrowthStrategy,
}

impl IndexedMemory {
    /// Construct an empty block. Nothing is allocated until capacity is requested.
    #[inline]
    pub fn new(element_layout: Layout, growth: GrowthStrategy) -> Self {
        let element_layout = element_layout.pad_to_align();
        Self {
            ptr: Self::dangling(element_layout),
            capacity: 0,
            element_layout,
            growth,
        }
    }

    pub fn with_capacity(element_layout: Layout, capacity: usize, growth: GrowthStrategy) -> Self {
        let mut block = Self::new(element_layout, growth);
        block.grow_to(capacity);
        block
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// The (padded) layout of one slot.
    #[inline]
    pub const fn element_layout(&self) -> Layout {
        self.element_layout
    }

    /// Number of bytes currently allocated.
    #[inline]
    pub fn allocated_bytes(&self) -> usize {
        self.capacity * self.element_layout.size()
    }

    /// Get a pointer to the slot at `index`.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `index >= capacity()`.
    #[inline]
    pub fn ptr_at(&self, index: usize) -> NonNull<u8> {
        debug_assert!(
            index < self.capacity,
            "index {} out of bounds (capacity: {})",
            index,
            self.capacity
        );
        // SAFETY: index is within the allocation (or the layout is zero sized).
        unsafe { self.ptr.add(index * self.element_layout.size()) }
    }

    /// Get a pointer to the slot at `index` for writing.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `index >= capacity()`.
    #[inline]
    pub fn ptr_at_mut(&mut self, index: usize) -> NonNull<u8> {
        self.ptr_at(index)
    }

    /// Ensure at least `required` slots are allocated, growing by the configured strategy.
    pub fn ensure_capacity(&mut self, required: usize) {
        if required <= self.capacity {
            return;
        }
        let new_capacity = self.growth.new_capacity(self.capacity, required);
        self.grow_to(new_capacity);
    }

    /// Grow the allocation to exactly `capacity` slots, preserving existing bytes.
    fn grow_to(&mut self, capacity: usize) {
        if capacity <= self.capacity {
            return;
        }
        if self.element_layout.size() == 0 {
            self.capacity = capacity;
            return;
        }

        let new_layout = Self::array_layout(self.element_layout, capacity);
        let new_ptr = if self.capacity == 0 {
            // SAFETY: new_layout has a non-zero size.
            unsafe { alloc::alloc(new_layout) }
        } else {
            let old_layout = Self::array_layout(self.element_layout, self.capacity);
            // SAFETY: ptr was allocated with old_layout, new size is non-zero.
            unsafe { alloc::realloc(self.ptr.as_ptr(), old_layout, new_layout.size()) }
        };

        self.ptr = match NonNull::new(new_ptr) {
            Some(ptr) => ptr,
            None => alloc::handle_alloc_error(new_layout),
        };
        self.capacity = capacity;
    }

    fn array_layout(element: Layout, count: usize) -> Layout {
        match element
            .size()
            .checked_mul(count)
            .and_then(|size| Layout::from_size_align(size, element.align()).ok())
        {
            Some(layout) => layout,
            None => panic!("capacity overflow allocating {count} slots of {element:?}"),
        }
    }

    fn dangling(layout: Layout) -> NonNull<u8> {
        // An address equal to the alignment is never null and always aligned.
        NonNull::new(layout.align() as *mut u8).unwrap_or(NonNull::dangling())
    }
}

impl Drop for IndexedMemory {
    fn drop(&mut self) {
        if self.capacity > 0 && self.element_layout.size() > 0 {
            let layout = Self::array_layout(self.element_layout, self.capacity);
            // SAFETY: ptr was allocated with this layout.
            unsafe {
                alloc::dealloc(self.ptr.as_ptr(), layout);
            }
        }
    }
}

// SAFETY: IndexedMemory owns its allocation. The owner is responsible for only storing values
// that are themselves Send/Sync; components are required to be both.
unsafe impl Send for IndexedMemory {}

// SAFETY: no interior mutability; see above.
unsafe impl Sync for IndexedMemory {}
