//! Type-erased component storage.
//!
//! Storage is struct-of-arrays: one [`Column`] per registered component type, each a dense run of
//! raw slots plus the entities that own them.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Column (type index 0: Position)              │
//! │  entities: [E4, E1, E7]                      │
//! │  slots:    [Pos, Pos, Pos]  ← IndexedMemory  │
//! │  index:    E1→1, E4→0, E7→2 ← DynamicIndex   │
//! └──────────────────────────────────────────────┘
//! ┌──────────────────────────────────────────────┐
//! │ Column (type index 1: Velocity)              │
//! │  entities: [E1, E7]                          │
//! │  slots:    [Vel, Vel]                        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Per-type dispatch walks one column front to back, touching only contiguous memory.

mod column;
mod index;
mod mem;

pub use column::{Column, Row};
pub use index::DynamicIndex;
pub use mem::{GrowthStrategy, IndexedMemory};
