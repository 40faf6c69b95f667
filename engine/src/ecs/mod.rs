//! Type-erased entity component system.
//!
//! - [`component`]: runtime type descriptors and the type registry.
//! - [`entity`]: entity handles and their allocator.
//! - [`storage`]: raw per-type columns of component data.
//! - [`system`]: per-type systems, dispatch context and deferred commands.
//! - [`world`]: entities, components and systems brought together.

pub mod component;
pub mod entity;
pub mod error;
pub mod storage;
pub mod system;
pub mod world;

pub use blaze_macros::Component;
pub use component::{Component, Descriptor, TypeRegistry};
pub use entity::Entity;
pub use error::{Error, Result};
pub use system::{Commands, Context, DispatchStats, NoopSystem, System};
pub use world::{Config, World};
