// src/engine/build.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::Glob;
use tracing::{debug, info, warn};

use crate::batch::{partition, BatchPlan, WorkUnit};
use crate::cluster;
use crate::config::ConfigFile;
use crate::errors::{Result, StageError};
use crate::exec::Dispatcher;
use crate::fs::FileSystem;
use crate::script::worker::BuildContext;
use crate::script::{assemble_worker, build_main_script, ScriptText};
use crate::sentinel::{Scope, SentinelTracker};
use crate::stage::{StageSpec, SH_EXT};

/// Paths written by one stage build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub main_script: PathBuf,
    /// Worker scripts in batch order.
    pub worker_scripts: Vec<PathBuf>,
    pub plan: BatchPlan,
}

/// Builds the scripts of a stage through a [`FileSystem`].
#[derive(Debug, Clone, Copy)]
pub struct ScriptBuilder<'a> {
    fs: &'a dyn FileSystem,
    cfg: &'a ConfigFile,
}

impl<'a> ScriptBuilder<'a> {
    pub fn new(fs: &'a dyn FileSystem, cfg: &'a ConfigFile) -> Self {
        Self { fs, cfg }
    }

    /// Validate, partition, assemble and write every script of `stage`.
    ///
    /// Nothing is written until every script text has been assembled. If a
    /// write fails part way, the scripts already written are removed again so
    /// a later run never sees a partial set.
    pub fn build_scripts(
        &self,
        stage: &StageSpec,
        units: Vec<WorkUnit>,
        batch_size: i64,
    ) -> Result<BuildOutput> {
        cluster::validate(stage, self.cfg)?;
        let dispatcher = Dispatcher::resolve(stage, self.cfg)?;
        let plan = partition(units, batch_size, stage.mode)?;

        let ctx = BuildContext {
            stage,
            cfg: self.cfg,
            dispatcher: &dispatcher,
            batch_size: plan.batch_size(),
        };

        let mut scripts: Vec<(PathBuf, ScriptText)> = Vec::with_capacity(plan.len() + 1);
        for batch in plan.batches() {
            scripts.push((batch.script_path(stage), assemble_worker(batch, &ctx)?));
        }
        let main_script = stage.main_script_path();
        scripts.push((main_script.clone(), build_main_script(&plan, &ctx)));

        self.remove_stale_scripts(stage, &scripts)?;
        self.write_all(&scripts)?;

        info!(
            stage = %stage.name,
            mode = %stage.mode,
            batches = plan.len(),
            units = plan.unit_count(),
            main_script = %main_script.display(),
            "built stage scripts"
        );

        let worker_scripts = plan.script_paths(stage);
        Ok(BuildOutput {
            main_script,
            worker_scripts,
            plan,
        })
    }

    fn write_all(&self, scripts: &[(PathBuf, ScriptText)]) -> Result<()> {
        let tracker = SentinelTracker::new(self.fs);
        let mode = self.cfg.script.permission_mode();

        let mut written: Vec<&PathBuf> = Vec::with_capacity(scripts.len());
        for (path, text) in scripts {
            let res = tracker
                .clear(&Scope::script(path))
                .and_then(|_| self.write_one(path, text, mode));
            if let Err(e) = res {
                // The failing script may exist in part; it goes too.
                written.push(path);
                self.remove_partial(&written);
                return Err(e);
            }
            written.push(path);
        }
        Ok(())
    }

    /// Remove scripts in the stage's script dir that the new plan does not
    /// produce, with their markers. A rebuild with fewer batches would
    /// otherwise leave workers that pollers count but nothing runs.
    fn remove_stale_scripts(&self, stage: &StageSpec, scripts: &[(PathBuf, ScriptText)]) -> Result<()> {
        let script_dir = stage.script_dir();
        if !self.fs.is_dir(&script_dir) {
            return Ok(());
        }

        let shell_scripts = Glob::new(&format!("*{SH_EXT}"))
            .context("compiling script glob")?
            .compile_matcher();
        let keep: HashSet<&Path> = scripts.iter().map(|(p, _)| p.as_path()).collect();
        let tracker = SentinelTracker::new(self.fs);

        let entries = self
            .fs
            .read_dir(&script_dir)
            .map_err(|e| StageError::assembly(&script_dir, format!("{e:#}")))?;
        for path in entries {
            let is_script = path
                .file_name()
                .is_some_and(|n| shell_scripts.is_match(n));
            if !is_script || keep.contains(path.as_path()) || !self.fs.is_file(&path) {
                continue;
            }
            tracker.clear(&Scope::script(&path))?;
            self.fs
                .remove_file(&path)
                .map_err(|e| StageError::assembly(&path, format!("{e:#}")))?;
            info!(stage = %stage.name, script = %path.display(), "removed stale script");
        }
        Ok(())
    }

    fn write_one(&self, path: &Path, text: &ScriptText, mode: u32) -> Result<()> {
        self.fs
            .write(path, text.render().as_bytes())
            .map_err(|e| StageError::assembly(path, format!("{e:#}")))?;
        self.fs
            .set_mode(path, mode)
            .map_err(|e| StageError::assembly(path, format!("{e:#}")))?;

        debug!(script = %path.display(), lines = text.len(), "wrote script");
        for (i, line) in text.lines().iter().enumerate() {
            debug!(script = %path.display(), "{:>4} | {}", i + 1, line);
        }
        Ok(())
    }

    fn remove_partial(&self, written: &[&PathBuf]) {
        for path in written {
            if let Err(e) = self.fs.remove_file(path) {
                warn!(script = %path.display(), error = %e, "failed to remove partially built script");
            }
        }
    }
}

/// Convenience wrapper around [`ScriptBuilder::build_scripts`].
pub fn build_scripts(
    fs: &dyn FileSystem,
    cfg: &ConfigFile,
    stage: &StageSpec,
    units: Vec<WorkUnit>,
    batch_size: i64,
) -> Result<BuildOutput> {
    ScriptBuilder::new(fs, cfg).build_scripts(stage, units, batch_size)
}
