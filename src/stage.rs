// src/stage.rs

//! Stage description and the generated-script naming scheme.
//!
//! Naming is bit-exact because restarts match scripts by path:
//!
//! - script dir:    `<stage_dir>/script`
//! - main script:   `<script_dir>/MAIN_<stage dir name>.sh`
//! - worker script: `<script_dir>/<stage index>.<batch id>.<main suffix>`
//!
//! where `<main suffix>` is the main script file name without `MAIN_` and the
//! stage index is zero-padded to two digits.

use std::path::{Path, PathBuf};

use crate::exec::container::VolumeMount;
use crate::types::ExecutionMode;

pub const SCRIPT_DIR: &str = "script";
pub const MAIN_SCRIPT_PREFIX: &str = "MAIN_";
pub const SH_EXT: &str = ".sh";

/// Everything the engine needs to know about one pipeline stage.
///
/// The stage itself (the thing that produced the command lines) is opaque;
/// this only carries the flags that affect how its scripts are built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    /// Display name, used in log lines.
    pub name: String,
    /// Position of the stage in its pipeline.
    pub index: usize,
    /// Stage root directory, e.g. `<pipeline>/01_Trimmer`.
    pub stage_dir: PathBuf,
    pub num_threads: u32,
    /// In-process stage that reports its own completion; its worker scripts
    /// get no trailing success touch.
    pub managed_runtime: bool,
    pub mode: ExecutionMode,
    /// Stage-specific cluster job header, preferred over the configured one.
    pub job_header: Option<String>,
    /// Container image for container mode, preferred over the configured one.
    pub image: Option<String>,
    /// Shell function definitions embedded verbatim in every worker script.
    pub helper_functions: Vec<String>,
    /// Extra container volume bindings (metadata, primers, databases...).
    pub mounts: Vec<VolumeMount>,
}

impl StageSpec {
    pub fn new(name: impl Into<String>, index: usize, stage_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            index,
            stage_dir: stage_dir.into(),
            num_threads: 1,
            managed_runtime: false,
            mode: ExecutionMode::Local,
            job_header: None,
            image: None,
            helper_functions: Vec::new(),
            mounts: Vec::new(),
        }
    }

    pub fn script_dir(&self) -> PathBuf {
        self.stage_dir.join(SCRIPT_DIR)
    }

    pub fn stage_dir_name(&self) -> String {
        self.stage_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }

    pub fn main_script_name(&self) -> String {
        format!("{MAIN_SCRIPT_PREFIX}{}{SH_EXT}", self.stage_dir_name())
    }

    pub fn main_script_path(&self) -> PathBuf {
        self.script_dir().join(self.main_script_name())
    }

    pub fn worker_script_path(&self, batch_id: &str) -> PathBuf {
        let main = self.main_script_name();
        let suffix = main.strip_prefix(MAIN_SCRIPT_PREFIX).unwrap_or(&main);
        self.script_dir()
            .join(format!("{:02}.{}.{}", self.index, batch_id, suffix))
    }

    /// Whether `path` names this stage's main script.
    pub fn is_main_script(&self, path: &Path) -> bool {
        path == self.main_script_path()
    }
}
