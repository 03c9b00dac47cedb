// src/exec/mod.rs

//! Backend dispatch and process execution.
//!
//! - [`dispatch`] decides how the main script invokes each batch script
//!   (directly, through a cluster submission, or inside a container) and
//!   emits the matching shell function definitions.
//! - [`container`] builds the container-spawn command and maps host paths
//!   to the paths the container sees.
//! - [`runner`] launches a generated main script on this machine using
//!   `tokio::process::Command`.

pub mod container;
pub mod dispatch;
pub mod runner;

pub use container::{ContainerSpawn, VolumeMount};
pub use dispatch::Dispatcher;
pub use runner::run_script;
