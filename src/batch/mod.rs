// src/batch/mod.rs

//! Work units and their partitioning into batches.
//!
//! - [`unit`] holds the `WorkUnit` type handed over by a stage.
//! - [`partition`] splits an ordered unit list into a `BatchPlan`.

pub mod partition;
pub mod unit;

pub use partition::{partition, Batch, BatchPlan};
pub use unit::WorkUnit;
