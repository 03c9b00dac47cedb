// src/script/worker.rs

//! Worker script assembly: one script per batch.
//!
//! Layout:
//!
//! ```text
//! <header>                                  (cluster job header or default header, optional)
//! #stagebatch.<version> <path> | batch size = <n>
//! touch <path>_STARTED
//! failLog="<path>_FAILURES"
//! module load <module>                      (cluster mode, one per module)
//! <stage helper functions>
//! <execute function>
//! execute "<command>" <line>                (every command of every unit)
//! touch <path>_SUCCESS                      (omitted for managed-runtime stages)
//! ```

use tracing::debug;

use crate::batch::Batch;
use crate::config::ConfigFile;
use crate::errors::{Result, StageError};
use crate::exec::Dispatcher;
use crate::script::{metadata_comment, wrapper, ScriptText};
use crate::sentinel::{marker_path, Marker};
use crate::stage::StageSpec;
use crate::types::ExecutionMode;

/// Inputs shared by every script of one stage build.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub stage: &'a StageSpec,
    pub cfg: &'a ConfigFile,
    pub dispatcher: &'a Dispatcher,
    /// Effective batch size of the plan, reported in metadata comments.
    pub batch_size: usize,
}

/// Pick the first line(s) of a worker script.
///
/// Cluster mode prefers the stage's own job header, then the configured one.
/// Otherwise the configured default header is used, if any.
pub fn select_header(stage: &StageSpec, cfg: &ConfigFile, mode: ExecutionMode) -> Option<String> {
    if mode == ExecutionMode::Cluster {
        if let Some(header) = stage.job_header.as_ref().or(cfg.cluster.job_header.as_ref()) {
            return Some(header.clone());
        }
    }
    cfg.script.default_header.clone()
}

pub fn assemble_worker(batch: &Batch, ctx: &BuildContext<'_>) -> Result<ScriptText> {
    let host_path = batch.script_path(ctx.stage);
    // Paths the script refers to itself by, as seen where it runs.
    let path = ctx.dispatcher.runtime_path(&host_path);
    let mode = ctx.dispatcher.mode();

    let mut text = ScriptText::new();
    if let Some(header) = select_header(ctx.stage, ctx.cfg, mode) {
        text.push_block(&header);
    }
    text.push(metadata_comment(&path, ctx.batch_size));
    text.push(format!("touch {}", marker_path(&path, Marker::Started).display()));
    text.push(wrapper::fail_log_assignment(&path));

    if mode == ExecutionMode::Cluster {
        for module in &ctx.cfg.cluster.modules {
            text.push(format!("module load {module}"));
        }
    }

    for function in &ctx.stage.helper_functions {
        text.push_block(function);
    }
    text.push_all(wrapper::execute_function());

    for unit in &batch.units {
        for command in unit.commands() {
            if command.trim().is_empty() {
                return Err(StageError::assembly(&host_path, "blank command line in work unit"));
            }
            if command.contains('\n') {
                return Err(StageError::assembly(
                    &host_path,
                    format!("command spans multiple lines: {command:?}"),
                ));
            }
            text.push_wrapped(command);
        }
    }

    if !ctx.stage.managed_runtime {
        text.push(format!("touch {}", marker_path(&path, Marker::Success).display()));
    }

    debug!(
        stage = %ctx.stage.name,
        script = %host_path.display(),
        units = batch.units.len(),
        commands = batch.command_count(),
        "assembled worker script"
    );

    Ok(text)
}
