// src/config/stage_file.rs

//! The file a task producer writes to describe one stage's work.
//!
//! ```toml
//! name = "Trimmer"
//! index = 1
//! stage_dir = "/pipelines/run1/01_Trimmer"
//! batch_size = 2
//!
//! [[unit]]
//! commands = ["trim a.fq", "mv a.trim.fq output/"]
//!
//! [[unit]]
//! commands = ["trim b.fq", "mv b.trim.fq output/"]
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use crate::batch::WorkUnit;
use crate::config::model::ConfigFile;
use crate::errors::{Result, StageError};
use crate::exec::container::VolumeMount;
use crate::stage::StageSpec;
use crate::types::ExecutionMode;

#[derive(Debug, Clone, Deserialize)]
pub struct StageFile {
    pub name: String,

    #[serde(default)]
    pub index: usize,

    pub stage_dir: PathBuf,

    /// Overrides `[script].batch_size`.
    #[serde(default)]
    pub batch_size: Option<i64>,

    /// Overrides `[script].num_threads`.
    #[serde(default)]
    pub num_threads: Option<u32>,

    #[serde(default)]
    pub managed_runtime: bool,

    /// If `None`, derived from `[cluster].enabled` / `[container].enabled`.
    #[serde(default)]
    pub mode: Option<ExecutionMode>,

    #[serde(default)]
    pub job_header: Option<String>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub functions: Vec<String>,

    #[serde(default)]
    pub mounts: Vec<VolumeMount>,

    #[serde(default, rename = "unit")]
    pub units: Vec<UnitConfig>,
}

/// `[[unit]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitConfig {
    pub commands: Vec<String>,
}

impl StageFile {
    /// Resolve this file against the global config.
    ///
    /// Returns the stage spec, its work units and the effective batch size.
    pub fn resolve(self, cfg: &ConfigFile) -> Result<(StageSpec, Vec<WorkUnit>, i64)> {
        let mode = self.mode.unwrap_or_else(|| default_mode(cfg));

        if self.units.is_empty() {
            return Err(StageError::EmptyInput(format!(
                "stage '{}' lists no [[unit]] entries",
                self.name
            )));
        }

        let units = self
            .units
            .into_iter()
            .enumerate()
            .map(|(i, u)| {
                WorkUnit::new(u.commands).map_err(|_| {
                    StageError::EmptyInput(format!(
                        "stage '{}': unit #{} has no commands",
                        self.name, i
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let num_threads = self.num_threads.unwrap_or(cfg.script.num_threads);
        if num_threads == 0 {
            return Err(StageError::ConfigFormat(format!(
                "stage '{}': num_threads must be >= 1",
                self.name
            )));
        }

        let spec = StageSpec {
            name: self.name,
            index: self.index,
            stage_dir: self.stage_dir,
            num_threads,
            managed_runtime: self.managed_runtime,
            mode,
            job_header: self.job_header,
            image: self.image,
            helper_functions: self.functions,
            mounts: self.mounts,
        };

        let batch_size = self.batch_size.unwrap_or(cfg.script.batch_size);
        Ok((spec, units, batch_size))
    }
}

/// Mode used by stages that do not pick one themselves.
pub fn default_mode(cfg: &ConfigFile) -> ExecutionMode {
    if cfg.container.enabled {
        ExecutionMode::Container
    } else if cfg.cluster.enabled {
        ExecutionMode::Cluster
    } else {
        ExecutionMode::Local
    }
}
