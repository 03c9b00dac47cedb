// src/sentinel/status.rs

//! Read-only views over a script directory, for pollers.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};

use crate::fs::FileSystem;
use crate::sentinel::{marker_path, Marker, STAGE_STARTED};
use crate::stage::SH_EXT;

/// Marker counts for the worker scripts of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStatus {
    /// File name of the main script.
    pub main_script: String,
    /// Number of worker scripts (the main script is not counted).
    pub total: usize,
    pub started: usize,
    pub success: usize,
    pub failed: usize,
    /// The main script itself recorded a failure.
    pub main_failed: bool,
}

impl ScriptStatus {
    pub fn running(&self) -> usize {
        self.started.saturating_sub(self.success + self.failed)
    }

    pub fn queued(&self) -> usize {
        self.total.saturating_sub(self.started)
    }

    pub fn has_failures(&self) -> bool {
        self.main_failed || self.failed > 0
    }

    /// Every worker script reached a terminal state, successful or not.
    pub fn is_finished(&self) -> bool {
        self.success + self.failed >= self.total
    }
}

impl fmt::Display for ScriptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Status (Total={}): Success={}; Failed={}; Running={}; Queued={}",
            self.main_script,
            self.total,
            self.success,
            self.failed,
            self.running(),
            self.queued()
        )
    }
}

fn matcher(pattern: &str) -> Result<GlobMatcher> {
    Ok(Glob::new(pattern)
        .with_context(|| format!("compiling glob {pattern:?}"))?
        .compile_matcher())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Count worker scripts in `script_dir` and their markers.
pub fn poll_status(fs: &dyn FileSystem, script_dir: &Path, main_script: &Path) -> Result<ScriptStatus> {
    let scripts = matcher(&format!("*{SH_EXT}"))?;

    let mut workers: Vec<PathBuf> = fs
        .read_dir(script_dir)?
        .into_iter()
        .filter(|p| p.as_path() != main_script && scripts.is_match(file_name(p)))
        .collect();
    workers.sort();

    let count = |marker: Marker| {
        workers
            .iter()
            .filter(|w| fs.exists(&marker_path(w, marker)))
            .count()
    };

    Ok(ScriptStatus {
        main_script: file_name(main_script),
        total: workers.len(),
        started: count(Marker::Started),
        success: count(Marker::Success),
        failed: count(Marker::Failures),
        main_failed: fs.exists(&marker_path(main_script, Marker::Failures)),
    })
}

/// Every line of every `*_FAILURES` file in `script_dir`, as
/// `<file name> | <line>`, ordered by file name.
pub fn script_errors(fs: &dyn FileSystem, script_dir: &Path) -> Result<Vec<String>> {
    let failures = matcher(&format!("*{}", Marker::Failures.suffix()))?;

    let mut files: Vec<PathBuf> = fs
        .read_dir(script_dir)?
        .into_iter()
        .filter(|p| failures.is_match(file_name(p)))
        .collect();
    files.sort();

    let mut errors = Vec::new();
    for file in files {
        let name = file_name(&file);
        let contents = fs.read_to_string(&file)?;
        errors.extend(
            contents
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| format!("{name} | {l}")),
        );
    }
    Ok(errors)
}

/// Time elapsed since the stage's `BLJ_STARTED` marker was written.
pub fn stage_runtime(fs: &dyn FileSystem, stage_dir: &Path, now: SystemTime) -> Result<Duration> {
    let started = stage_dir.join(STAGE_STARTED);
    let since = fs
        .modified(&started)
        .with_context(|| format!("stage {:?} has not started", stage_dir))?;
    Ok(now.duration_since(since).unwrap_or(Duration::ZERO))
}

/// `HH hours : MM minutes : SS seconds`. A zero duration reports one second.
pub fn format_runtime(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = total % 3600 / 60;
    let mut seconds = total % 60;
    if total == 0 {
        seconds = 1;
    }
    format!("{hours:02} hours : {minutes:02} minutes : {seconds:02} seconds")
}
