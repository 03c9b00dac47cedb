// src/cluster/mod.rs

//! Cluster job header checks.
//!
//! - [`header`] validates that the job header reserves exactly the number of
//!   processors a stage's commands are configured to use.

pub mod header;

pub use header::{declared_processor_count, validate, validate_header, PROCESSOR_PARAMS};
