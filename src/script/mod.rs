// src/script/mod.rs

//! Shell script generation.
//!
//! - [`text`] is a line buffer that knows the 1-based number of the next line.
//! - [`wrapper`] builds the fail-fast `execute` function and wrapped lines.
//! - [`worker`] assembles one worker script per batch.
//! - [`main_script`] assembles the stage's main script, which drives the
//!   batches through the resolved backend.

pub mod main_script;
pub mod text;
pub mod worker;
pub mod wrapper;

pub use main_script::build_main_script;
pub use text::ScriptText;
pub use worker::assemble_worker;

/// Name written into the metadata comment of every generated script.
pub const ENGINE_NAME: &str = "stagebatch";

/// `#stagebatch.<version> <path> | batch size = <n>`
pub fn metadata_comment(script: &std::path::Path, batch_size: usize) -> String {
    format!(
        "#{}.{} {} | batch size = {}",
        ENGINE_NAME,
        env!("CARGO_PKG_VERSION"),
        script.display(),
        batch_size
    )
}
