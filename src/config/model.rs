// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [script]
/// batch_size = 10
/// num_threads = 4
/// default_header = "#!/bin/bash"
///
/// [cluster]
/// enabled = true
/// batch_command = "qsub"
/// job_header = "#PBS -l procs=4,mem=8gb"
/// modules = ["python/3.6"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub script: ScriptSection,

    #[serde(default)]
    pub cluster: ClusterSection,

    #[serde(default)]
    pub container: ContainerSection,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// `Default`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub script: ScriptSection,
    pub cluster: ClusterSection,
    pub container: ContainerSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        script: ScriptSection,
        cluster: ClusterSection,
        container: ContainerSection,
    ) -> Self {
        Self {
            script,
            cluster,
            container,
        }
    }
}

/// `[script]` section: settings shared by every generated script.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptSection {
    /// Work units per worker script; `0` (or negative) means one batch.
    #[serde(default)]
    pub batch_size: i64,

    /// Threads each command line may use. Must match the cluster header.
    #[serde(default = "default_num_threads")]
    pub num_threads: u32,

    /// First line(s) of every script when no cluster header applies.
    #[serde(default)]
    pub default_header: Option<String>,

    /// Octal permission bits applied to generated scripts.
    #[serde(default = "default_permissions")]
    pub permissions: String,

    /// Minutes the runner waits for worker scripts to finish; `None` or `0`
    /// waits forever. Individual commands are never timed out.
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Seconds between sentinel polls while waiting on worker scripts.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

fn default_num_threads() -> u32 {
    1
}

fn default_permissions() -> String {
    "770".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

impl Default for ScriptSection {
    fn default() -> Self {
        Self {
            batch_size: 0,
            num_threads: default_num_threads(),
            default_header: None,
            permissions: default_permissions(),
            timeout: None,
            poll_interval: default_poll_interval(),
        }
    }
}

impl ScriptSection {
    /// Parsed permission bits. Validation guarantees this succeeds for a
    /// loaded config; the fallback only applies to hand-built sections.
    pub fn permission_mode(&self) -> u32 {
        u32::from_str_radix(self.permissions.trim(), 8).unwrap_or(0o770)
    }
}

/// `[cluster]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSection {
    /// Submit worker scripts to the cluster scheduler.
    #[serde(default)]
    pub enabled: bool,

    /// Submission command, e.g. `qsub`. The script path is appended.
    #[serde(default)]
    pub batch_command: Option<String>,

    /// Job header written as the first line of every worker script.
    #[serde(default)]
    pub job_header: Option<String>,

    /// Prefix every job header must start with.
    #[serde(default = "default_directive_prefix")]
    pub directive_prefix: String,

    /// Check that the header's processor count matches `script.num_threads`.
    #[serde(default = "default_true")]
    pub validate_params: bool,

    /// Environment modules loaded at the top of each worker script.
    #[serde(default)]
    pub modules: Vec<String>,
}

fn default_directive_prefix() -> String {
    "#PBS".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ClusterSection {
    fn default() -> Self {
        Self {
            enabled: false,
            batch_command: None,
            job_header: None,
            directive_prefix: default_directive_prefix(),
            validate_params: true,
            modules: Vec::new(),
        }
    }
}

/// `[container]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerSection {
    /// Run every stage in containers unless the stage says otherwise.
    #[serde(default)]
    pub enabled: bool,

    /// Container runtime executable.
    #[serde(default = "default_runtime")]
    pub runtime: String,

    /// Runtime socket, mounted into every container.
    #[serde(default = "default_socket")]
    pub socket: PathBuf,

    /// Default image when the stage does not name one.
    #[serde(default)]
    pub image: Option<String>,

    /// Keep containers after they exit (omit the `--rm` flag).
    #[serde(default)]
    pub save_on_exit: bool,

    #[serde(default)]
    pub input_dir: Option<PathBuf>,

    #[serde(default)]
    pub pipeline_dir: Option<PathBuf>,

    #[serde(default)]
    pub config_dir: Option<PathBuf>,
}

fn default_runtime() -> String {
    "docker".to_string()
}

fn default_socket() -> PathBuf {
    PathBuf::from("/var/run/docker.sock")
}

impl Default for ContainerSection {
    fn default() -> Self {
        Self {
            enabled: false,
            runtime: default_runtime(),
            socket: default_socket(),
            image: None,
            save_on_exit: false,
            input_dir: None,
            pipeline_dir: None,
            config_dir: None,
        }
    }
}
