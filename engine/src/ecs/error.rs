//! Error types for expected ECS failures.
//!
//! Contract violations (reading a descriptor past the end of the registry, typed access through
//! a descriptor of another Rust type) are not represented here; they panic.

use crate::ecs::{component, entity::Entity};

/// Recoverable failures surfaced by the registry and the world.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A component type with this name is already registered.
    #[error("component type '{0}' is already registered")]
    DuplicateType(&'static str),

    /// The type index does not refer to a registered component type.
    #[error("unknown component type index {0:?}")]
    UnknownTypeIndex(component::Id),

    /// No component type is registered under this Rust type's name.
    #[error("component type '{0}' is not registered")]
    UnregisteredType(&'static str),

    /// The entity already holds a component of this type.
    #[error("entity {entity:?} already has component '{name}'")]
    AlreadyAttached {
        entity: Entity,
        name: &'static str,
    },

    /// The entity does not hold a component of this type.
    #[error("entity {entity:?} has no component '{name}'")]
    NotAttached {
        entity: Entity,
        name: &'static str,
    },

    /// The entity's slot is already held by a live entity.
    #[error("entity slot of {0:?} is already in use")]
    SlotInUse(Entity),

    /// The entity is not alive in this world (never spawned, despawned, or a stale generation).
    #[error("entity {0:?} is not alive")]
    NoSuchEntity(Entity),
}

/// Convenience alias for ECS results.
pub type Result<T, E = Error> = std::result::Result<T, E>;
