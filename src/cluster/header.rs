// src/cluster/header.rs

//! Cluster header validator.
//!
//! Headers look like `#PBS -l procs=4,mem=8gb` or
//! `#PBS -l nodes=1:ppn=4,walltime=10:00:00`. The resource list is split on
//! `,` (and `:` for node specs), then on `=`.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::ConfigFile;
use crate::errors::{Result, StageError};
use crate::stage::StageSpec;
use crate::types::ExecutionMode;

/// Parameter names recognised as a processor count.
pub const PROCESSOR_PARAMS: &[&str] = &["procs", "ppn", "ncpus"];

static PROCESSOR_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s,:])(?:procs|ppn|ncpus)\s*=").expect("static regex is valid")
});

/// Validate cluster settings for `stage`. No-op unless the stage runs in
/// cluster mode.
pub fn validate(stage: &StageSpec, cfg: &ConfigFile) -> Result<()> {
    if stage.mode != ExecutionMode::Cluster {
        return Ok(());
    }

    let has_batch_command = cfg
        .cluster
        .batch_command
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());
    if !has_batch_command {
        return Err(StageError::ConfigMissing(
            "[cluster].batch_command is required for cluster execution".to_string(),
        ));
    }

    if !cfg.cluster.validate_params {
        warn!(
            stage = %stage.name,
            "[cluster].validate_params = false; job header processor count is not checked against num_threads = {}",
            stage.num_threads
        );
        return Ok(());
    }

    let header = stage
        .job_header
        .as_deref()
        .or(cfg.cluster.job_header.as_deref())
        .ok_or_else(|| {
            StageError::ConfigMissing(format!(
                "stage '{}' runs on the cluster but no job header is set ([cluster].job_header)",
                stage.name
            ))
        })?;

    validate_header(header, &cfg.cluster.directive_prefix, stage.num_threads)
}

/// Check a single job header against the expected thread count.
pub fn validate_header(header: &str, directive_prefix: &str, num_threads: u32) -> Result<()> {
    let header = header.trim();
    if !header.starts_with(directive_prefix) {
        return Err(StageError::ConfigFormat(format!(
            "cluster job header must start with \"{directive_prefix}\" (got \"{header}\")"
        )));
    }

    match declared_processor_count(header)? {
        None => {
            warn!(
                header,
                "cluster job header declares no processor count ({}); not checking against num_threads",
                PROCESSOR_PARAMS.join(", ")
            );
            Ok(())
        }
        Some(procs) if procs != num_threads => Err(StageError::ConfigFormat(format!(
            "inconsistent config values: num_threads = {num_threads} but job header \"{header}\" reserves {procs} processors"
        ))),
        Some(procs) => {
            debug!(header, procs, "cluster job header processor count matches num_threads");
            Ok(())
        }
    }
}

/// Processor count declared by `header`, if it names one of
/// [`PROCESSOR_PARAMS`].
pub fn declared_processor_count(header: &str) -> Result<Option<u32>> {
    if !PROCESSOR_PARAM_RE.is_match(header) {
        return Ok(None);
    }

    for word in header.split_whitespace().filter(|w| w.contains('=')) {
        for token in word.split(',').flat_map(|t| t.split(':')) {
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };
            if !PROCESSOR_PARAMS.contains(&key.trim()) {
                continue;
            }
            let value = value.trim();
            return value.parse::<u32>().map(Some).map_err(|_| {
                StageError::ConfigFormat(format!(
                    "cluster job header parameter {}={} is not a whole number",
                    key.trim(),
                    value
                ))
            });
        }
    }

    Ok(None)
}
