#![allow(dead_code)]

use std::path::{Path, PathBuf};

use stagebatch::batch::WorkUnit;
use stagebatch::config::{ConfigFile, RawConfigFile};
use stagebatch::exec::VolumeMount;
use stagebatch::stage::StageSpec;
use stagebatch::types::ExecutionMode;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn batch_size(mut self, n: i64) -> Self {
        self.config.script.batch_size = n;
        self
    }

    pub fn num_threads(mut self, n: u32) -> Self {
        self.config.script.num_threads = n;
        self
    }

    pub fn default_header(mut self, header: &str) -> Self {
        self.config.script.default_header = Some(header.to_string());
        self
    }

    pub fn permissions(mut self, perms: &str) -> Self {
        self.config.script.permissions = perms.to_string();
        self
    }

    pub fn poll_interval(mut self, secs: u64) -> Self {
        self.config.script.poll_interval = secs;
        self
    }

    pub fn timeout_minutes(mut self, minutes: u64) -> Self {
        self.config.script.timeout = Some(minutes);
        self
    }

    /// Enable cluster mode with a submission command and job header.
    pub fn with_cluster(mut self, batch_command: &str, job_header: &str) -> Self {
        self.config.cluster.enabled = true;
        self.config.cluster.batch_command = Some(batch_command.to_string());
        self.config.cluster.job_header = Some(job_header.to_string());
        self
    }

    pub fn cluster_modules(mut self, modules: &[&str]) -> Self {
        self.config.cluster.modules = modules.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn validate_params(mut self, val: bool) -> Self {
        self.config.cluster.validate_params = val;
        self
    }

    /// Enable container mode with an image and the three required dirs.
    pub fn with_container(
        mut self,
        image: &str,
        input_dir: impl AsRef<Path>,
        pipeline_dir: impl AsRef<Path>,
        config_dir: impl AsRef<Path>,
    ) -> Self {
        let c = &mut self.config.container;
        c.enabled = true;
        c.image = Some(image.to_string());
        c.input_dir = Some(input_dir.as_ref().to_path_buf());
        c.pipeline_dir = Some(pipeline_dir.as_ref().to_path_buf());
        c.config_dir = Some(config_dir.as_ref().to_path_buf());
        self
    }

    pub fn save_on_exit(mut self, val: bool) -> Self {
        self.config.container.save_on_exit = val;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `StageSpec`.
pub struct StageSpecBuilder {
    spec: StageSpec,
}

impl StageSpecBuilder {
    /// Stage `name` at `index`, rooted at `<parent>/<index:02>_<name>`.
    pub fn new(parent: impl AsRef<Path>, index: usize, name: &str) -> Self {
        let dir: PathBuf = parent.as_ref().join(format!("{index:02}_{name}"));
        Self {
            spec: StageSpec::new(name, index, dir),
        }
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.spec.mode = mode;
        self
    }

    pub fn num_threads(mut self, n: u32) -> Self {
        self.spec.num_threads = n;
        self
    }

    pub fn managed_runtime(mut self) -> Self {
        self.spec.managed_runtime = true;
        self
    }

    pub fn job_header(mut self, header: &str) -> Self {
        self.spec.job_header = Some(header.to_string());
        self
    }

    pub fn image(mut self, image: &str) -> Self {
        self.spec.image = Some(image.to_string());
        self
    }

    pub fn helper_function(mut self, body: &str) -> Self {
        self.spec.helper_functions.push(body.to_string());
        self
    }

    pub fn mount(mut self, mount: VolumeMount) -> Self {
        self.spec.mounts.push(mount);
        self
    }

    pub fn build(self) -> StageSpec {
        self.spec
    }
}

/// Work units from literal command lists.
pub fn units(commands: &[&[&str]]) -> Vec<WorkUnit> {
    commands
        .iter()
        .map(|c| WorkUnit::new(c.iter().copied()).expect("unit must have commands"))
        .collect()
}

/// `n` single-command units: `echo unit-0`, `echo unit-1`, ...
pub fn echo_units(n: usize) -> Vec<WorkUnit> {
    (0..n)
        .map(|i| WorkUnit::new([format!("echo unit-{i}")]).expect("unit must have commands"))
        .collect()
}
