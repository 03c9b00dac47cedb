// src/engine/run.rs

use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::exec::run_script;
use crate::fs::FileSystem;
use crate::sentinel::{
    format_runtime, poll_status, script_errors, stage_runtime, Scope, ScriptStatus,
    SentinelTracker,
};
use crate::stage::StageSpec;

/// How [`run_stage`] waits on worker scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub poll_interval: Duration,
    /// Give up waiting after this long. Commands already running are left
    /// alone.
    pub timeout: Option<Duration>,
}

impl RunOptions {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            poll_interval: Duration::from_secs(cfg.script.poll_interval.max(1)),
            timeout: cfg
                .script
                .timeout
                .filter(|m| *m > 0)
                .map(|m| Duration::from_secs(m * 60)),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&ConfigFile::default())
    }
}

/// How a stage run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Every worker script succeeded; `BLJ_COMPLETE` has been written.
    Complete { runtime: Duration },
    /// The main script exited non-zero (`exit_code` is set) or a worker
    /// recorded a failure. `failures` holds every failure line found.
    Failed {
        exit_code: Option<i32>,
        failures: Vec<String>,
    },
    /// The poll timeout ran out before the workers finished.
    TimedOut { status: ScriptStatus },
}

impl StageOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, StageOutcome::Complete { .. })
    }
}

/// Run a built stage: launch its main script, then follow the worker
/// markers until the stage finishes.
///
/// In local and container mode the main script only returns once every
/// batch has run. In cluster mode it returns after submission and the
/// workers are tracked through their markers.
pub async fn run_stage(
    fs: &dyn FileSystem,
    options: RunOptions,
    stage: &StageSpec,
    main_script: &Path,
) -> Result<StageOutcome> {
    let tracker = SentinelTracker::new(fs);
    let stage_scope = Scope::stage(&stage.stage_dir);
    let script_dir = stage.script_dir();

    tracker.mark_started(&stage_scope)?;
    info!(stage = %stage.name, script = %main_script.display(), "stage started");

    let code = run_script(main_script).await?;
    if code != 0 {
        let failures = script_errors(fs, &script_dir)?;
        warn!(stage = %stage.name, exit_code = code, failures = failures.len(), "main script failed");
        return Ok(StageOutcome::Failed {
            exit_code: Some(code),
            failures,
        });
    }

    let waiting_since = Instant::now();
    loop {
        let status = poll_status(fs, &script_dir, main_script)?;
        info!(stage = %stage.name, "{status}");

        if status.has_failures() {
            let failures = script_errors(fs, &script_dir)?;
            warn!(stage = %stage.name, failures = failures.len(), "worker script failed");
            return Ok(StageOutcome::Failed {
                exit_code: None,
                failures,
            });
        }

        if status.is_finished() {
            let runtime = stage_runtime(fs, &stage.stage_dir, SystemTime::now())?;
            tracker.mark_complete(&stage_scope)?;
            info!(
                stage = %stage.name,
                runtime = %format_runtime(runtime),
                "stage complete"
            );
            return Ok(StageOutcome::Complete { runtime });
        }

        if let Some(limit) = options.timeout {
            if waiting_since.elapsed() >= limit {
                warn!(stage = %stage.name, "{status}");
                warn!(stage = %stage.name, timeout = ?limit, "timed out waiting for worker scripts");
                return Ok(StageOutcome::TimedOut { status });
            }
        }

        debug!(interval = ?options.poll_interval, "waiting before next poll");
        tokio::time::sleep(options.poll_interval).await;
    }
}
