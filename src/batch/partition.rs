// src/batch/partition.rs

//! Batch partitioner.
//!
//! The number of batches is `max(1, n / batch_size)` using integer division.
//! The last batch absorbs the remainder instead of spilling it into an extra,
//! smaller batch. Script paths are derived from batch ids, and restarts match
//! scripts by path, so this arithmetic must not change.

use std::path::PathBuf;

use tracing::debug;

use crate::batch::WorkUnit;
use crate::errors::{Result, StageError};
use crate::stage::StageSpec;
use crate::types::ExecutionMode;

/// A contiguous run of work units materialized as one worker script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Zero-padded, lexicographically sortable id (`"0"`, `"07"`, `"113"`).
    pub id: String,
    pub units: Vec<WorkUnit>,
}

impl Batch {
    /// Worker script path for this batch within the given stage.
    pub fn script_path(&self, stage: &StageSpec) -> PathBuf {
        stage.worker_script_path(&self.id)
    }

    /// Total number of command lines across all units.
    pub fn command_count(&self) -> usize {
        self.units.iter().map(WorkUnit::len).sum()
    }
}

/// Ordered batches computed from a unit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    batches: Vec<Batch>,
    batch_size: usize,
}

impl BatchPlan {
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Effective batch size: the requested size, or the unit count when the
    /// plan is a single batch by request (`<= 0`) or by backend.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn unit_count(&self) -> usize {
        self.batches.iter().map(|b| b.units.len()).sum()
    }

    pub fn script_paths(&self, stage: &StageSpec) -> Vec<PathBuf> {
        self.batches.iter().map(|b| b.script_path(stage)).collect()
    }
}

/// Split `units` into batches.
///
/// - `batch_size <= 0` or container mode: a single batch with every unit.
/// - otherwise `max(1, n / batch_size)` batches of `batch_size` units, the
///   last one also holding the remainder.
pub fn partition(units: Vec<WorkUnit>, batch_size: i64, mode: ExecutionMode) -> Result<BatchPlan> {
    let n = units.len();
    if n == 0 {
        return Err(StageError::EmptyInput(
            "a stage must supply at least one work unit".to_string(),
        ));
    }

    let effective = if batch_size <= 0 || mode == ExecutionMode::Container {
        n
    } else {
        usize::try_from(batch_size).unwrap_or(usize::MAX)
    };

    let num_batches = (n / effective).max(1);
    let width = (num_batches - 1).to_string().len();

    let mut remaining = units.into_iter();
    let mut batches = Vec::with_capacity(num_batches);
    for index in 0..num_batches {
        let units: Vec<WorkUnit> = if index + 1 == num_batches {
            remaining.by_ref().collect()
        } else {
            remaining.by_ref().take(effective).collect()
        };
        batches.push(Batch {
            id: format!("{:0width$}", index, width = width),
            units,
        });
    }

    debug!(
        units = n,
        requested_batch_size = batch_size,
        batch_size = effective,
        batches = num_batches,
        %mode,
        "partitioned work units"
    );

    Ok(BatchPlan {
        batches,
        batch_size: effective,
    })
}
