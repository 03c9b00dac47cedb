// src/sentinel/mod.rs

//! File-based execution state.
//!
//! Marker files are the only channel between generated scripts, the cluster
//! or container runtime, and whoever polls for progress. They survive process
//! restarts and need no shared memory.
//!
//! Per script (`<path>` is the script file):
//!
//! | marker              | written by               | meaning                     |
//! |---------------------|--------------------------|-----------------------------|
//! | `<path>_STARTED`    | the script, first line   | execution began             |
//! | `<path>_SUCCESS`    | the script, last line    | every command exited 0      |
//! | `<path>_FAILURES`   | `execute` on failure     | failure lines (text)        |
//!
//! Per stage (`<dir>` is the stage dir):
//!
//! | marker              | meaning                                          |
//! |---------------------|--------------------------------------------------|
//! | `<dir>/BLJ_STARTED` | stage running; removed when the stage completes  |
//! | `<dir>/BLJ_COMPLETE`| stage finished cleanly                           |
//!
//! - [`tracker`] writes and queries markers.
//! - [`status`] summarises a script directory for pollers.

pub mod status;
pub mod tracker;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub use status::{format_runtime, poll_status, script_errors, stage_runtime, ScriptStatus};
pub use tracker::{Scope, SentinelTracker};

pub const STAGE_STARTED: &str = "BLJ_STARTED";
pub const STAGE_COMPLETE: &str = "BLJ_COMPLETE";

/// Per-script marker kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Started,
    Success,
    Failures,
}

impl Marker {
    pub const ALL: [Marker; 3] = [Marker::Started, Marker::Success, Marker::Failures];

    pub fn suffix(self) -> &'static str {
        match self {
            Marker::Started => "_STARTED",
            Marker::Success => "_SUCCESS",
            Marker::Failures => "_FAILURES",
        }
    }
}

/// `<script>_STARTED`, `<script>_SUCCESS` or `<script>_FAILURES`.
pub fn marker_path(script: &Path, marker: Marker) -> PathBuf {
    let mut name = OsString::from(script.as_os_str());
    name.push(marker.suffix());
    PathBuf::from(name)
}
