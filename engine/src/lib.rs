//! Blaze engine core: a type-erased entity component system.
//!
//! Component types are described at runtime by a [`Descriptor`](ecs::component::Descriptor), a
//! plain table of layout and construct/destruct function pointers. The
//! [`TypeRegistry`](ecs::component::TypeRegistry) assigns each descriptor a dense, stable index
//! and the [`World`](ecs::World) stores component instances per index, dispatching each type's
//! singleton system once per frame.
//!
//! ```rust,ignore
//! use blaze_engine::core::time::Time;
//! use blaze_engine::ecs::{Component, World, component::TypeRegistry};
//!
//! #[derive(Component, Default)]
//! struct Position { x: f32, y: f32 }
//!
//! let registry = TypeRegistry::new();
//! let position = registry.register_type::<Position>()?;
//!
//! let mut world = World::new(registry);
//! let entity = world.spawn();
//! world.attach(entity, position)?;
//! world.update(&Time::default());
//! ```

// Allow the derive macro to refer to `::blaze_engine` from inside this crate.
extern crate self as blaze_engine;

pub mod core;
pub mod ecs;
