// src/sentinel/tracker.rs

use std::path::PathBuf;

use tracing::debug;

use crate::errors::{Result, StageError};
use crate::fs::FileSystem;
use crate::sentinel::{marker_path, Marker, STAGE_COMPLETE, STAGE_STARTED};

/// What a marker describes: a whole stage or one generated script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Keyed by the stage directory.
    Stage(PathBuf),
    /// Keyed by the script file path.
    Script(PathBuf),
}

impl Scope {
    pub fn stage(dir: impl Into<PathBuf>) -> Self {
        Scope::Stage(dir.into())
    }

    pub fn script(path: impl Into<PathBuf>) -> Self {
        Scope::Script(path.into())
    }

    pub fn started_marker(&self) -> PathBuf {
        match self {
            Scope::Stage(dir) => dir.join(STAGE_STARTED),
            Scope::Script(path) => marker_path(path, Marker::Started),
        }
    }

    pub fn complete_marker(&self) -> PathBuf {
        match self {
            Scope::Stage(dir) => dir.join(STAGE_COMPLETE),
            Scope::Script(path) => marker_path(path, Marker::Success),
        }
    }

    /// Failure log; only scripts have one.
    pub fn failures_marker(&self) -> Option<PathBuf> {
        match self {
            Scope::Stage(_) => None,
            Scope::Script(path) => Some(marker_path(path, Marker::Failures)),
        }
    }
}

/// Writes and queries sentinel markers.
///
/// Marker writes are fatal on failure: a missing marker would leave pollers
/// waiting forever.
#[derive(Debug, Clone, Copy)]
pub struct SentinelTracker<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> SentinelTracker<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Create the started marker. A complete marker left by an earlier run is
    /// removed first, so the two are never both present.
    pub fn mark_started(&self, scope: &Scope) -> Result<()> {
        let complete = scope.complete_marker();
        self.fs
            .remove_file(&complete)
            .map_err(|e| StageError::sentinel(&complete, &e))?;

        let started = scope.started_marker();
        self.fs
            .touch(&started)
            .map_err(|e| StageError::sentinel(&started, &e))?;
        debug!(marker = %started.display(), "marked started");
        Ok(())
    }

    /// Create the complete marker and remove the started marker.
    pub fn mark_complete(&self, scope: &Scope) -> Result<()> {
        let complete = scope.complete_marker();
        self.fs
            .touch(&complete)
            .map_err(|e| StageError::sentinel(&complete, &e))?;

        let started = scope.started_marker();
        if let Err(e) = self.fs.remove_file(&started) {
            // Roll back so the two markers are never both present.
            let _ = self.fs.remove_file(&complete);
            return Err(StageError::sentinel(&started, &e));
        }

        debug!(marker = %complete.display(), "marked complete");
        Ok(())
    }

    pub fn is_complete(&self, scope: &Scope) -> bool {
        self.fs.exists(&scope.complete_marker())
    }

    /// Started but not completed.
    pub fn is_incomplete(&self, scope: &Scope) -> bool {
        self.fs.exists(&scope.started_marker()) && !self.is_complete(scope)
    }

    pub fn has_executed(&self, scope: &Scope) -> bool {
        self.is_complete(scope) || self.is_incomplete(scope)
    }

    pub fn has_failures(&self, scope: &Scope) -> bool {
        scope
            .failures_marker()
            .is_some_and(|f| self.fs.exists(&f))
    }

    /// Remove every marker of `scope`, e.g. before a rebuild overwrites a script.
    pub fn clear(&self, scope: &Scope) -> Result<()> {
        let markers = [
            Some(scope.started_marker()),
            Some(scope.complete_marker()),
            scope.failures_marker(),
        ];
        for marker in markers.into_iter().flatten() {
            self.fs
                .remove_file(&marker)
                .map_err(|e| StageError::sentinel(&marker, &e))?;
        }
        Ok(())
    }
}
