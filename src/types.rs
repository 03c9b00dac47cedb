// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// How the Main Script hands each batch script to the operating environment.
///
/// - `Local`: the Main Script runs each batch script itself, one after the
///   other.
/// - `Cluster`: each batch script is submitted with the configured batch
///   command (`qsub`, `sbatch`, ...). Submission is fire-and-forget.
/// - `Container`: each batch script runs inside a freshly spawned container.
///
/// The mode is resolved once per stage before any script text is generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Local,
    Cluster,
    Container,
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(ExecutionMode::Local),
            "cluster" => Ok(ExecutionMode::Cluster),
            "container" => Ok(ExecutionMode::Container),
            other => Err(format!(
                "invalid execution mode: {other} (expected \"local\", \"cluster\" or \"container\")"
            )),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionMode::Local => "local",
            ExecutionMode::Cluster => "cluster",
            ExecutionMode::Container => "container",
        };
        f.write_str(s)
    }
}
