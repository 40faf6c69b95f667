use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dashmap::DashMap;
use log::{debug, warn};

use crate::ecs::{
    component::{Component, Descriptor, Id},
    error::{Error, Result},
};

/// An append-only registry of component type descriptors.
///
/// Each successful registration appends the descriptor and assigns it the next dense [`Id`]
/// (`0`, `1`, `2`, ...). Names are unique; ids are never reassigned or reused, so any id handed
/// out stays valid for the lifetime of the registry.
///
/// The registry only holds type metadata. It never owns component or system instances.
///
/// Name lookups are lock-free reads through a `DashMap`. Registration takes a write lock on the
/// descriptor list for its whole duration, which keeps index assignment contiguous when several
/// threads register at once. Registrations are expected to finish before entities are created;
/// after that the registry is effectively read-only and can be shared freely.
pub struct TypeRegistry {
    /// Map from type name to assigned index.
    names: DashMap<&'static str, Id>,

    /// Registered descriptors in registration order. Position is the type index.
    types: RwLock<Vec<Descriptor>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TypeRegistry {
    /// Snapshot the registry. The copy assigns future indices independently of the original.
    fn clone(&self) -> Self {
        let types = self.read().clone();
        let names = types
            .iter()
            .enumerate()
            .map(|(index, descriptor)| (descriptor.name(), Id::from(index)))
            .collect();
        Self {
            names,
            types: RwLock::new(types),
        }
    }
}

impl TypeRegistry {
    /// Create a new, empty registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            names: DashMap::new(),
            types: RwLock::new(Vec::new()),
        }
    }

    /// Register a component type descriptor and get its index.
    ///
    /// Fails with [`Error::DuplicateType`] if a type with the same name is already registered; the
    /// registry is left untouched in that case. No component or system instance is created.
    pub fn register(&self, descriptor: Descriptor) -> Result<Id> {
        let mut types = self.write();
        match self.names.entry(descriptor.name()) {
            dashmap::Entry::Occupied(_) => {
                warn!(
                    "rejected duplicate registration of component type '{}'",
                    descriptor.name()
                );
                Err(Error::DuplicateType(descriptor.name()))
            }
            dashmap::Entry::Vacant(vacant) => {
                let id = Id::from(types.len());
                types.push(descriptor);
                vacant.insert(id);
                debug!(
                    "registered component type '{}' as {} ({} bytes, system {} bytes)",
                    descriptor.name(),
                    id,
                    descriptor.component_size(),
                    descriptor.system_size()
                );
                Ok(id)
            }
        }
    }

    /// Register the component type `C`.
    #[inline]
    pub fn register_type<C: Component>(&self) -> Result<Id> {
        self.register(Descriptor::of::<C>())
    }

    /// Look up the index assigned to a type name. `None` if no such type was registered.
    #[inline]
    pub fn index_of(&self, name: &str) -> Option<Id> {
        self.names.get(name).map(|entry| *entry.value())
    }

    /// Look up the index assigned to the component type `C`.
    #[inline]
    pub fn index_of_type<C: Component>(&self) -> Option<Id> {
        self.index_of(C::NAME)
    }

    /// Determine if `index` is a valid type index, i.e. `0 <= index < len()`.
    #[inline]
    pub fn is_valid_index(&self, index: i64) -> bool {
        usize::try_from(index).is_ok_and(|index| index < self.len())
    }

    /// Determine if `id` refers to a registered type.
    #[inline]
    pub fn contains(&self, id: Id) -> bool {
        id.index() < self.len()
    }

    /// Get the descriptor registered under `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range. Check [`contains`](Self::contains) or bound by
    /// [`len`](Self::len) first; use [`get_descriptor`](Self::get_descriptor) when absence is
    /// expected.
    #[inline]
    pub fn descriptor(&self, id: Id) -> Descriptor {
        let types = self.read();
        match types.get(id.index()) {
            Some(descriptor) => *descriptor,
            None => panic!(
                "component type index {} out of range (registered types: {})",
                id.index(),
                types.len()
            ),
        }
    }

    /// Get the descriptor registered under `id`, if any.
    #[inline]
    pub fn get_descriptor(&self, id: Id) -> Option<Descriptor> {
        self.read().get(id.index()).copied()
    }

    /// Iterate the registered types in registration order.
    ///
    /// The iterator walks a snapshot taken when it is created; types registered afterwards are
    /// not included.
    pub fn iter(&self) -> impl Iterator<Item = (Id, Descriptor)> + use<> {
        self.read()
            .clone()
            .into_iter()
            .enumerate()
            .map(|(index, descriptor)| (Id::from(index), descriptor))
    }

    /// Number of registered types. Also the exclusive upper bound of valid indices.
    #[inline]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the registry is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Lock poisoning cannot leave the descriptor list half-written: the only mutation is a
    // single push after all fallible work is done.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Descriptor>> {
        self.types.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Descriptor>> {
        self.types.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::{alloc::Layout, ptr::NonNull, sync::Arc, thread};

    use blaze_macros::Component;

    use super::*;
    use crate::ecs::component::Lifecycle;

    #[derive(Component, Default)]
    struct Position {
        _x: f32,
        _y: f32,
    }

    #[derive(Component, Default)]
    struct Velocity {
        _dx: f32,
        _dy: f32,
    }

    #[derive(Component, Default)]
    struct Health(u32);

    unsafe fn zero(ptr: NonNull<u8>) {
        unsafe { ptr.cast::<[u8; 8]>().write([0; 8]) };
    }
    unsafe fn nothing(_ptr: NonNull<u8>) {}

    fn raw(name: &'static str) -> Descriptor {
        unsafe {
            Descriptor::without_system(
                name,
                Lifecycle::new(Layout::new::<[u8; 8]>(), zero, nothing),
            )
        }
    }

    // ==================== Registration ====================

    #[test]
    fn indices_follow_registration_order() {
        // Given
        let registry = TypeRegistry::new();

        // When
        let pos_id = registry.register_type::<Position>().unwrap();
        let vel_id = registry.register_type::<Velocity>().unwrap();
        let health_id = registry.register_type::<Health>().unwrap();

        // Then
        assert_eq!(pos_id, Id::new(0));
        assert_eq!(vel_id, Id::new(1));
        assert_eq!(health_id, Id::new(2));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.index_of("Position"), Some(pos_id));
        assert_eq!(registry.index_of("Velocity"), Some(vel_id));
        assert_eq!(registry.index_of_type::<Health>(), Some(health_id));
    }

    #[test]
    fn duplicate_registration_leaves_registry_unchanged() {
        // Given
        let registry = TypeRegistry::new();
        let pos_id = registry.register_type::<Position>().unwrap();
        let vel_id = registry.register_type::<Velocity>().unwrap();

        // When
        let result = registry.register_type::<Position>();

        // Then
        assert_eq!(result, Err(Error::DuplicateType("Position")));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.index_of("Position"), Some(pos_id));
        assert_eq!(registry.index_of("Velocity"), Some(vel_id));

        // Then - the next registration still gets the next dense index
        assert_eq!(registry.register_type::<Health>(), Ok(Id::new(2)));
    }

    #[test]
    fn duplicate_name_from_runtime_descriptor() {
        // Given
        let registry = TypeRegistry::new();
        registry.register_type::<Position>().unwrap();

        // When
        let result = registry.register(raw("Position"));

        // Then
        assert_eq!(result, Err(Error::DuplicateType("Position")));
        assert!(registry.descriptor(Id::new(0)).is::<Position>());
    }

    // ==================== Lookup ====================

    #[test]
    fn unknown_name_is_none() {
        // Given
        let registry = TypeRegistry::new();
        registry.register_type::<Position>().unwrap();

        // Then
        assert_eq!(registry.index_of("Positon"), None);
        assert_eq!(registry.index_of(""), None);
        assert_eq!(registry.index_of_type::<Velocity>(), None);
    }

    #[test]
    fn valid_index_bounds() {
        // Given
        let registry = TypeRegistry::new();
        assert!(!registry.is_valid_index(0));

        registry.register(raw("A")).unwrap();
        registry.register(raw("B")).unwrap();

        // Then
        assert!(!registry.is_valid_index(-1));
        assert!(!registry.is_valid_index(i64::MIN));
        assert!(registry.is_valid_index(0));
        assert!(registry.is_valid_index(1));
        assert!(!registry.is_valid_index(2));
        assert!(!registry.is_valid_index(i64::MAX));
        assert!(registry.contains(Id::new(1)));
        assert!(!registry.contains(Id::new(2)));
    }

    #[test]
    fn descriptor_access() {
        // Given
        let registry = TypeRegistry::new();
        let id = registry.register(raw("Raw")).unwrap();

        // When
        let descriptor = registry.descriptor(id);

        // Then
        assert_eq!(descriptor.name(), "Raw");
        assert_eq!(descriptor.component_size(), 8);
        assert!(registry.get_descriptor(Id::new(1)).is_none());
    }

    #[test]
    fn iter_in_registration_order() {
        // Given
        let registry = TypeRegistry::new();
        registry.register(raw("First")).unwrap();
        registry.register(raw("Second")).unwrap();
        registry.register(raw("Third")).unwrap();

        // When
        let snapshot = registry.iter();
        registry.register(raw("Late")).unwrap();

        // Then
        let listed: Vec<_> = snapshot.map(|(id, d)| (id, d.name())).collect();
        assert_eq!(
            listed,
            vec![
                (Id::new(0), "First"),
                (Id::new(1), "Second"),
                (Id::new(2), "Third")
            ]
        );
        assert_eq!(registry.iter().count(), 4);
    }

    #[test]
    #[should_panic(expected = "component type index 3 out of range (registered types: 1)")]
    fn descriptor_out_of_range_panics() {
        // Given
        let registry = TypeRegistry::new();
        registry.register(raw("Raw")).unwrap();

        // When
        registry.descriptor(Id::new(3));
    }

    // ==================== Clone ====================

    #[test]
    fn clone_is_independent_snapshot() {
        // Given
        let registry = TypeRegistry::new();
        registry.register_type::<Position>().unwrap();

        // When
        let copy = registry.clone();
        registry.register_type::<Velocity>().unwrap();
        copy.register_type::<Health>().unwrap();

        // Then
        assert_eq!(copy.index_of("Position"), Some(Id::new(0)));
        assert_eq!(copy.index_of("Health"), Some(Id::new(1)));
        assert_eq!(copy.index_of("Velocity"), None);
        assert_eq!(registry.index_of("Velocity"), Some(Id::new(1)));
        assert_eq!(registry.index_of("Health"), None);
    }

    // ==================== Concurrent Registration ====================

    #[test]
    fn concurrent_registration_keeps_indices_dense() {
        // Given
        const NAMES: [&str; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];
        let registry = Arc::new(TypeRegistry::new());

        // When - every name is attempted from two threads
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.register(raw(NAMES[i % NAMES.len()])).is_ok())
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        // Then - exactly one registration per name won and indices are 0..8
        assert_eq!(successes, NAMES.len());
        assert_eq!(registry.len(), NAMES.len());
        let mut ids: Vec<_> = NAMES
            .iter()
            .map(|name| registry.index_of(name).unwrap().index())
            .collect();
        ids.sort();
        assert_eq!(ids, (0..NAMES.len()).collect::<Vec<_>>());
        for name in NAMES {
            let id = registry.index_of(name).unwrap();
            assert_eq!(registry.descriptor(id).name(), name);
        }
    }
}
