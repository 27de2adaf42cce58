//! Core orchestration for Sanstha.
//!
//! This crate ties the storage, gateway and aggregation crates together:
//! - [`generator`]: AI-assisted post authoring (the write path)
//! - [`scheduler`]: periodic reseeding from feeds
//! - [`service`]: the [`Sanstha`] command facade

pub mod generator;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod testing;

pub use generator::{GeneratorOptions, PostGenerator, build_prompt};
pub use scheduler::{DEFAULT_PERIOD, SchedulerHandle};
pub use service::{Sanstha, Services};
