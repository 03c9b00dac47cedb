// src/config/mod.rs

//! Configuration loading and validation for stagebatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`) and the stage file that a
//!   task producer hands over (`stage_file.rs`).
//! - Load both from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod stage_file;
pub mod validate;

pub use loader::{
    load_and_validate, load_from_path, load_or_default, load_stage_file, DEFAULT_CONFIG_FILE,
};
pub use model::{ClusterSection, ConfigFile, ContainerSection, RawConfigFile, ScriptSection};
pub use stage_file::{default_mode, StageFile, UnitConfig};
