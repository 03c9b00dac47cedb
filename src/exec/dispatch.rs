// src/exec/dispatch.rs

//! Backend dispatch.
//!
//! A `Dispatcher` is resolved once per stage from its `ExecutionMode`, before
//! any script text exists, and stays fixed for the whole build. The main
//! script assembler only asks it two things: which extra shell functions to
//! define, and what command invokes a given batch script.

use std::path::{Path, PathBuf};

use crate::config::ConfigFile;
use crate::errors::{Result, StageError};
use crate::exec::container::{ContainerSpawn, SPAWN_FN};
use crate::stage::StageSpec;
use crate::types::ExecutionMode;

/// Name of the shell function that submits one batch script to the cluster.
pub const RUN_JOB_FN: &str = "runJob";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatcher {
    /// The main script runs each batch script itself and waits for it.
    Local,
    /// Each batch script is submitted with `batch_command`. Only failure of
    /// the submission call is seen by the main script.
    Cluster { batch_command: String },
    /// Each batch script runs in its own container; the main script waits
    /// for the container to exit.
    Container(ContainerSpawn),
}

impl Dispatcher {
    pub fn resolve(stage: &StageSpec, cfg: &ConfigFile) -> Result<Self> {
        match stage.mode {
            ExecutionMode::Local => Ok(Dispatcher::Local),
            ExecutionMode::Cluster => {
                let batch_command = cfg
                    .cluster
                    .batch_command
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| {
                        StageError::ConfigMissing(
                            "[cluster].batch_command is required for cluster execution"
                                .to_string(),
                        )
                    })?;
                Ok(Dispatcher::Cluster {
                    batch_command: batch_command.to_string(),
                })
            }
            ExecutionMode::Container => {
                Ok(Dispatcher::Container(ContainerSpawn::from_config(stage, cfg)?))
            }
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        match self {
            Dispatcher::Local => ExecutionMode::Local,
            Dispatcher::Cluster { .. } => ExecutionMode::Cluster,
            Dispatcher::Container(_) => ExecutionMode::Container,
        }
    }

    /// Shell function definitions the main script needs for this backend.
    pub fn functions(&self) -> Vec<String> {
        match self {
            Dispatcher::Local => Vec::new(),
            Dispatcher::Cluster { batch_command } => vec![
                format!("function {RUN_JOB_FN}() {{"),
                format!("    {batch_command} $1"),
                "}".to_string(),
            ],
            Dispatcher::Container(spawn) => spawn.function_lines(),
        }
    }

    /// Command (before wrapping) that runs `worker` from the main script.
    pub fn invocation(&self, worker: &Path) -> String {
        match self {
            Dispatcher::Local => worker.display().to_string(),
            Dispatcher::Cluster { .. } => format!("{RUN_JOB_FN} {}", worker.display()),
            Dispatcher::Container(spawn) => {
                format!("{SPAWN_FN} {}", spawn.container_path(worker).display())
            }
        }
    }

    /// Path of `host` as seen by the environment that runs batch scripts.
    pub fn runtime_path(&self, host: &Path) -> PathBuf {
        match self {
            Dispatcher::Container(spawn) => spawn.container_path(host),
            _ => host.to_path_buf(),
        }
    }
}
