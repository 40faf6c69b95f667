//! Component types and their runtime descriptors.
//!
//! A component is a plain data payload attached to at most one slot per entity. The rest of the
//! engine never sees the concrete type: everything it needs is captured in a [`Descriptor`], a
//! `Copy` table holding the type's name, memory layout and type-erased function pointers.
//!
//! ## Architecture
//!
//! - [`Component`]: the trait concrete component types implement (usually via
//!   `#[derive(Component)]`), naming the type and its associated system.
//! - [`Lifecycle`]: layout plus in-place construct/destruct functions for one type.
//! - [`Descriptor`]: the component lifecycle, the system lifecycle and the erased system
//!   update entry point. [`Descriptor::of`] bridges a static type to its descriptor.
//! - [`TypeRegistry`]: append-only table assigning each descriptor a dense [`Id`].
//!
//! ## Usage
//!
//! ```ignore
//! use blaze_engine::ecs::component::{Component, Descriptor, TypeRegistry};
//!
//! #[derive(Component, Default)]
//! struct Position { x: f32, y: f32 }
//!
//! let registry = TypeRegistry::new();
//! let id = registry.register(Descriptor::of::<Position>())?;
//! assert_eq!(registry.index_of("Position"), Some(id));
//! ```

use std::{alloc::Layout, any::TypeId as StdTypeId, fmt, ptr::NonNull};

mod registry;

pub use registry::TypeRegistry;

use crate::ecs::{
    entity::Entity,
    system::{Context, NoopSystem, System},
};

/// A component type index. Indices are dense, assigned in registration order starting at `0`,
/// and never reused.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// Construct a new component Id from a raw u32 value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the index of this component if it were to live in indexable storage (e.g. Vec)
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Id {
    #[inline]
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<usize> for Id {
    #[inline]
    fn from(value: usize) -> Self {
        Self::new(value as u32)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A statically typed component.
///
/// Every component names itself (the name is the registry key) and nominates the singleton
/// [`System`] that processes it each frame. Components must be default constructible because the
/// world constructs them in place when a type index is attached to an entity.
pub trait Component: Default + Send + Sync + 'static {
    /// The unique registry name of this component type.
    const NAME: &'static str;

    /// The system run once per frame over every entity carrying this component.
    type System: System<Self>;
}

/// Type-erased system entry point: runs the system at `system` for one entity whose component
/// lives at `component`.
pub type UpdateFn =
    unsafe fn(system: NonNull<u8>, ctx: &mut Context<'_>, entity: Entity, component: NonNull<u8>);

/// Memory layout and in-place lifecycle functions for one type.
#[derive(Debug, Clone, Copy)]
pub struct Lifecycle {
    layout: Layout,
    construct: unsafe fn(NonNull<u8>),
    destruct: unsafe fn(NonNull<u8>),
}

impl Lifecycle {
    /// Describe a type by hand.
    ///
    /// `construct` must fully initialise `layout.size()` bytes at the given (aligned) address and
    /// `destruct` must release whatever `construct` acquired.
    #[inline]
    pub const fn new(
        layout: Layout,
        construct: unsafe fn(NonNull<u8>),
        destruct: unsafe fn(NonNull<u8>),
    ) -> Self {
        Self {
            layout,
            construct,
            destruct,
        }
    }

    /// The lifecycle of `T`: default construction in place and `drop_in_place`.
    pub fn of<T: Default + 'static>() -> Self {
        let destruct = if std::mem::needs_drop::<T>() {
            Self::destruct_impl::<T>
        } else {
            Self::destruct_noop
        };
        Self::new(Layout::new::<T>(), Self::construct_impl::<T>, destruct)
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    #[inline]
    pub fn construct_fn(&self) -> unsafe fn(NonNull<u8>) {
        self.construct
    }

    #[inline]
    pub fn destruct_fn(&self) -> unsafe fn(NonNull<u8>) {
        self.destruct
    }

    unsafe fn construct_impl<T: Default>(ptr: NonNull<u8>) {
        unsafe {
            ptr.cast::<T>().write(T::default());
        }
    }

    unsafe fn destruct_impl<T>(ptr: NonNull<u8>) {
        unsafe {
            std::ptr::drop_in_place(ptr.cast::<T>().as_ptr());
        }
    }

    unsafe fn destruct_noop(_ptr: NonNull<u8>) {}
}

/// Runtime metadata for a component type and its associated system.
///
/// Descriptors are immutable: once registered, a type's name, sizes and function pointers never
/// change. The registry stores them by value and hands out copies.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    name: &'static str,
    /// Present for descriptors built from a Rust type; enables typed access.
    type_id: Option<StdTypeId>,
    component: Lifecycle,
    system: Lifecycle,
    update: UpdateFn,
}

impl Descriptor {
    /// Build the descriptor for the component type `C` and its system `C::System`.
    pub fn of<C: Component>() -> Self {
        Self {
            name: C::NAME,
            type_id: Some(StdTypeId::of::<C>()),
            component: Lifecycle::of::<C>(),
            system: Lifecycle::of::<C::System>(),
            update: Self::update_impl::<C>,
        }
    }

    /// Build a descriptor for a type known only at runtime.
    ///
    /// Such descriptors have no Rust type attached, so typed accessors on the world refuse them;
    /// the data is reachable only through the system `update` function.
    ///
    /// # Safety
    ///
    /// - `component` and `system` must satisfy the contract of [`Lifecycle::new`].
    /// - `update` must only interpret its `system` pointer as the type constructed by
    ///   `system` and its `component` pointer as the type constructed by `component`.
    pub const unsafe fn from_raw(
        name: &'static str,
        component: Lifecycle,
        system: Lifecycle,
        update: UpdateFn,
    ) -> Self {
        Self {
            name,
            type_id: None,
            component,
            system,
            update,
        }
    }

    /// Build a runtime descriptor whose system does nothing.
    ///
    /// # Safety
    ///
    /// `component` must satisfy the contract of [`Lifecycle::new`].
    pub unsafe fn without_system(name: &'static str, component: Lifecycle) -> Self {
        unsafe {
            Self::from_raw(
                name,
                component,
                Lifecycle::of::<NoopSystem>(),
                Self::update_noop,
            )
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The Rust type id of the component, when the descriptor was built from a Rust type.
    #[inline]
    pub fn type_id(&self) -> Option<StdTypeId> {
        self.type_id
    }

    /// Determine if this descriptor was built from the Rust type `C`.
    #[inline]
    pub fn is<C: 'static>(&self) -> bool {
        self.type_id == Some(StdTypeId::of::<C>())
    }

    /// Byte size of one component instance.
    #[inline]
    pub fn component_size(&self) -> usize {
        self.component.size()
    }

    /// Byte size of the system singleton.
    #[inline]
    pub fn system_size(&self) -> usize {
        self.system.size()
    }

    #[inline]
    pub fn component(&self) -> &Lifecycle {
        &self.component
    }

    #[inline]
    pub fn system(&self) -> &Lifecycle {
        &self.system
    }

    #[inline]
    pub fn update_fn(&self) -> UpdateFn {
        self.update
    }

    unsafe fn update_impl<C: Component>(
        system: NonNull<u8>,
        ctx: &mut Context<'_>,
        entity: Entity,
        component: NonNull<u8>,
    ) {
        let (system, component) = unsafe {
            (
                system.cast::<C::System>().as_mut(),
                component.cast::<C>().as_mut(),
            )
        };
        system.update(ctx, entity, component);
    }

    unsafe fn update_noop(
        _system: NonNull<u8>,
        _ctx: &mut Context<'_>,
        _entity: Entity,
        _component: NonNull<u8>,
    ) {
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use blaze_macros::Component;

    use super::*;
    use crate::ecs::storage::IndexedMemory;

    #[derive(Component, Default, Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Component, Default)]
    #[component(name = "sprite", system = SpriteSystem)]
    struct Sprite {
        _texture: u32,
        _frames: Vec<u8>,
    }

    #[derive(Default)]
    struct SpriteSystem {
        _drawn: u64,
    }

    impl System<Sprite> for SpriteSystem {
        fn update(&mut self, _ctx: &mut Context<'_>, _entity: Entity, _sprite: &mut Sprite) {}
    }

    #[test]
    fn descriptor_of_type() {
        // When
        let descriptor = Descriptor::of::<Position>();

        // Then
        assert_eq!(descriptor.name(), "Position");
        assert_eq!(descriptor.component_size(), std::mem::size_of::<Position>());
        assert_eq!(descriptor.system_size(), 0);
        assert!(descriptor.is::<Position>());
        assert!(!descriptor.is::<Sprite>());
    }

    #[test]
    fn derive_attribute_overrides() {
        // When
        let descriptor = Descriptor::of::<Sprite>();

        // Then
        assert_eq!(descriptor.name(), "sprite");
        assert_eq!(
            descriptor.system_size(),
            std::mem::size_of::<SpriteSystem>()
        );
    }

    #[test]
    fn lifecycle_constructs_default_in_place() {
        // Given
        let lifecycle = Lifecycle::of::<Position>();
        let mut mem = IndexedMemory::with_capacity(
            lifecycle.layout(),
            1,
            crate::ecs::storage::GrowthStrategy::Exact,
        );
        let slot = mem.ptr_at_mut(0);

        // When
        unsafe { (lifecycle.construct_fn())(slot) };

        // Then
        assert_eq!(
            unsafe { slot.cast::<Position>().as_ref() },
            &Position::default()
        );
        unsafe { (lifecycle.destruct_fn())(slot) };
    }

    #[test]
    fn lifecycle_destructs_in_place() {
        // Given
        static DROPS: AtomicUsize = AtomicUsize::new(0);

        #[derive(Default)]
        struct Tracked;

        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::Relaxed);
            }
        }

        let lifecycle = Lifecycle::of::<Tracked>();
        let mut mem = IndexedMemory::with_capacity(
            lifecycle.layout(),
            1,
            crate::ecs::storage::GrowthStrategy::Exact,
        );
        let slot = mem.ptr_at_mut(0);

        // When
        unsafe {
            (lifecycle.construct_fn())(slot);
            (lifecycle.destruct_fn())(slot);
        }

        // Then
        assert_eq!(DROPS.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn runtime_descriptor_has_no_type() {
        // Given
        unsafe fn construct(ptr: NonNull<u8>) {
            unsafe { ptr.cast::<[u8; 8]>().write([0; 8]) };
        }
        unsafe fn destruct(_ptr: NonNull<u8>) {}

        // When
        let descriptor = unsafe {
            Descriptor::without_system(
                "Raw",
                Lifecycle::new(Layout::new::<[u8; 8]>(), construct, destruct),
            )
        };

        // Then
        assert_eq!(descriptor.name(), "Raw");
        assert_eq!(descriptor.component_size(), 8);
        assert_eq!(descriptor.type_id(), None);
        assert!(!descriptor.is::<[u8; 8]>());
    }
}
