// src/lib.rs

pub mod batch;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod script;
pub mod sentinel;
pub mod stage;
pub mod types;

use std::path::Path;
use std::time::SystemTime;

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::batch::{partition, BatchPlan};
use crate::cli::{CliArgs, Command};
use crate::config::{load_or_default, load_stage_file, ConfigFile};
use crate::engine::{build_scripts, run_stage, RunOptions, StageOutcome};
use crate::exec::Dispatcher;
use crate::fs::{FileSystem, RealFileSystem};
use crate::sentinel::{format_runtime, poll_status, script_errors, stage_runtime, Scope, SentinelTracker};
use crate::stage::{StageSpec, MAIN_SCRIPT_PREFIX, SCRIPT_DIR, SH_EXT};

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(&args.config)?;
    let fs = RealFileSystem;

    match args.command {
        Command::Build { stage, dry_run } => {
            let (spec, units, batch_size) = load_stage_file(&stage)?.resolve(&cfg)?;
            if dry_run {
                cluster::validate(&spec, &cfg)?;
                let dispatcher = Dispatcher::resolve(&spec, &cfg)?;
                let plan = partition(units, batch_size, spec.mode)?;
                print_dry_run(&spec, &cfg, &plan, &dispatcher);
                return Ok(());
            }
            let out = build_scripts(&fs, &cfg, &spec, units, batch_size)?;
            println!("{}", out.main_script.display());
            Ok(())
        }
        Command::Run { stage } => {
            let (spec, units, batch_size) = load_stage_file(&stage)?.resolve(&cfg)?;
            let out = build_scripts(&fs, &cfg, &spec, units, batch_size)?;
            let outcome = run_stage(&fs, RunOptions::from_config(&cfg), &spec, &out.main_script).await?;
            report_outcome(&spec, outcome)
        }
        Command::Status { stage_dir } => print_status(&fs, &stage_dir),
    }
}

fn report_outcome(stage: &StageSpec, outcome: StageOutcome) -> Result<()> {
    match outcome {
        StageOutcome::Complete { runtime } => {
            println!("{} complete in {}", stage.name, format_runtime(runtime));
            Ok(())
        }
        StageOutcome::Failed { exit_code, failures } => {
            for line in &failures {
                println!("{line}");
            }
            match exit_code {
                Some(code) => bail!("stage '{}' failed: main script exited with {code}", stage.name),
                None => bail!("stage '{}' failed: {} failure line(s)", stage.name, failures.len()),
            }
        }
        StageOutcome::TimedOut { status } => {
            println!("{status}");
            bail!("stage '{}' timed out waiting for worker scripts", stage.name)
        }
    }
}

fn print_status(fs: &dyn FileSystem, stage_dir: &Path) -> Result<()> {
    let name = stage_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let script_dir = stage_dir.join(SCRIPT_DIR);
    let main_script = script_dir.join(format!("{MAIN_SCRIPT_PREFIX}{name}{SH_EXT}"));
    if !fs.exists(&main_script) {
        bail!("no main script at {}", main_script.display());
    }

    let status = poll_status(fs, &script_dir, &main_script)?;
    println!("{status}");

    let tracker = SentinelTracker::new(fs);
    let scope = Scope::stage(stage_dir);
    if tracker.is_complete(&scope) {
        println!("stage complete");
    } else if tracker.is_incomplete(&scope) {
        let runtime = stage_runtime(fs, stage_dir, SystemTime::now())?;
        println!("stage running for {}", format_runtime(runtime));
    }

    for line in script_errors(fs, &script_dir)? {
        println!("{line}");
    }
    Ok(())
}

/// Print the batch plan and the scripts that would be written.
fn print_dry_run(stage: &StageSpec, cfg: &ConfigFile, plan: &BatchPlan, dispatcher: &Dispatcher) {
    println!("stagebatch dry-run");
    println!("  stage = {} (index {})", stage.name, stage.index);
    println!("  mode = {}", dispatcher.mode());
    println!("  num_threads = {}", stage.num_threads);
    println!("  permissions = {}", cfg.script.permissions);
    println!("  main script: {}", stage.main_script_path().display());
    println!();

    println!("batches ({}, batch size {}):", plan.len(), plan.batch_size());
    for batch in plan.batches() {
        println!(
            "  - {} ({} units, {} commands)",
            batch.script_path(stage).display(),
            batch.units.len(),
            batch.command_count()
        );
        println!("      invoked as: {}", dispatcher.invocation(&batch.script_path(stage)));
    }

    debug!("dry-run complete (nothing written)");
    info!(batches = plan.len(), "dry-run plan printed");
}
