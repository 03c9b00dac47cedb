// src/engine/mod.rs

//! Stage orchestration.
//!
//! - [`build`] turns a stage and its work units into script files on disk.
//! - [`run`] launches a built main script and follows it through the
//!   sentinel markers until the stage completes, fails or times out.

pub mod build;
pub mod run;

pub use build::{build_scripts, BuildOutput, ScriptBuilder};
pub use run::{run_stage, RunOptions, StageOutcome};
