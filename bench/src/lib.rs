//! Benchmark support for the Blaze engine ECS.
//!
//! - [`components`]: representative component types and systems.
//! - [`populate`]: deterministic world population for repeatable runs.
//!
//! ```bash
//! cargo bench -p blaze_bench
//! cargo bench -p blaze_bench -- dispatch
//! ```
//!
//! Criterion writes reports to `target/criterion/`.

pub mod components;
pub mod populate;
