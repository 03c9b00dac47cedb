// src/exec/container.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ConfigFile;
use crate::errors::{Result, StageError};
use crate::stage::StageSpec;

/// Name of the shell function that runs one batch script in a container.
pub const SPAWN_FN: &str = "spawnContainer";

/// Environment variable carrying the batch script path into the container.
pub const SCRIPT_ENV_VAR: &str = "COMPUTE_SCRIPT";

pub const CONTAINER_MOUNT_ROOT: &str = "/mnt/efs";
pub const CONTAINER_INPUT_DIR: &str = "/mnt/efs/input";
pub const CONTAINER_PIPELINE_DIR: &str = "/mnt/efs/pipelines";
pub const CONTAINER_CONFIG_DIR: &str = "/mnt/efs/config";

/// One `-v host:container[:ro]` binding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VolumeMount {
    pub host: PathBuf,
    pub container: PathBuf,
    #[serde(default)]
    pub read_only: bool,
}

impl VolumeMount {
    pub fn read_only(host: impl Into<PathBuf>, container: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
            read_only: true,
        }
    }

    pub fn writable(host: impl Into<PathBuf>, container: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
            read_only: false,
        }
    }

    pub fn to_flag(&self) -> String {
        format!(
            "-v {}:{}{}",
            self.host.display(),
            self.container.display(),
            if self.read_only { ":ro" } else { "" }
        )
    }
}

/// Everything needed to write the `spawnContainer` function for a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpawn {
    runtime: String,
    image: String,
    remove_on_exit: bool,
    mounts: Vec<VolumeMount>,
    pipeline_host: PathBuf,
}

impl ContainerSpawn {
    /// Resolve runtime, image and volume bindings for `stage`.
    ///
    /// The input, pipeline and config directories are required; the stage's
    /// own mounts (metadata, primers, databases...) are appended after them.
    pub fn from_config(stage: &StageSpec, cfg: &ConfigFile) -> Result<Self> {
        let c = &cfg.container;

        let image = stage
            .image
            .clone()
            .or_else(|| c.image.clone())
            .filter(|i| !i.trim().is_empty())
            .ok_or_else(|| {
                StageError::ConfigMissing(format!(
                    "stage '{}' runs in a container but no image is set ([container].image)",
                    stage.name
                ))
            })?;

        let input = require_dir(c.input_dir.as_deref(), "[container].input_dir")?;
        let pipeline = require_dir(c.pipeline_dir.as_deref(), "[container].pipeline_dir")?;
        let config = require_dir(c.config_dir.as_deref(), "[container].config_dir")?;

        if !stage.stage_dir.starts_with(&pipeline) {
            warn!(
                stage = %stage.name,
                stage_dir = %stage.stage_dir.display(),
                pipeline_dir = %pipeline.display(),
                "stage dir is outside the mounted pipeline dir; container will not see its scripts"
            );
        }

        let mut mounts = vec![
            VolumeMount::writable(&c.socket, &c.socket),
            VolumeMount::read_only(&input, CONTAINER_INPUT_DIR),
            VolumeMount::writable(&pipeline, CONTAINER_PIPELINE_DIR),
            VolumeMount::read_only(&config, CONTAINER_CONFIG_DIR),
        ];
        mounts.extend(stage.mounts.iter().cloned());

        debug!(stage = %stage.name, image = %image, mounts = mounts.len(), "resolved container spawn");

        Ok(Self {
            runtime: c.runtime.clone(),
            image,
            remove_on_exit: !c.save_on_exit,
            mounts,
            pipeline_host: pipeline,
        })
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn mounts(&self) -> &[VolumeMount] {
        &self.mounts
    }

    /// The runtime invocation; `$1` is the batch script path in the container.
    pub fn command(&self) -> String {
        let mut parts = vec![self.runtime.clone(), "run".to_string()];
        if self.remove_on_exit {
            parts.push("--rm".to_string());
        }
        parts.push(format!("-e \"{SCRIPT_ENV_VAR}=$1\""));
        parts.extend(self.mounts.iter().map(VolumeMount::to_flag));
        parts.push(self.image.clone());
        parts.push("/bin/bash \"$1\"".to_string());
        parts.join(" ")
    }

    pub fn function_lines(&self) -> Vec<String> {
        vec![
            format!("function {SPAWN_FN}() {{"),
            format!("    {}", self.command()),
            "}".to_string(),
        ]
    }

    /// Translate a host path under the pipeline dir to the container's view.
    /// Paths outside it are returned unchanged.
    pub fn container_path(&self, host: &Path) -> PathBuf {
        match host.strip_prefix(&self.pipeline_host) {
            Ok(rel) => Path::new(CONTAINER_PIPELINE_DIR).join(rel),
            Err(_) => host.to_path_buf(),
        }
    }
}

fn require_dir(dir: Option<&Path>, key: &str) -> Result<PathBuf> {
    match dir {
        Some(d) if !d.as_os_str().is_empty() => Ok(d.to_path_buf()),
        _ => Err(StageError::ConfigMissing(format!(
            "{key} is required for container execution"
        ))),
    }
}
