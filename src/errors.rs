// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Configuration and assembly problems abort a stage build and surface here.
//! A command that exits non-zero inside a generated script is *not* an error
//! of this crate: it is recorded in that script's `_FAILURES` marker and seen
//! by whoever polls the sentinel files.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StageError {
    #[error("No work units to build: {0}")]
    EmptyInput(String),

    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    #[error("Configuration format error: {0}")]
    ConfigFormat(String),

    #[error("Unable to write sentinel marker {path:?}: {reason}")]
    SentinelWrite { path: PathBuf, reason: String },

    #[error("Unable to assemble script {path:?}: {reason}")]
    ScriptAssembly { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    pub(crate) fn sentinel(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        StageError::SentinelWrite {
            path: path.into(),
            reason: format!("{err:#}"),
        }
    }

    pub(crate) fn assembly(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StageError::ScriptAssembly {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, StageError>;
