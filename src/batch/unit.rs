// src/batch/unit.rs

use crate::errors::{Result, StageError};

/// The ordered command lines for one sample or file.
///
/// A unit is never empty; [`WorkUnit::new`] rejects an empty command list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    commands: Vec<String>,
}

impl WorkUnit {
    pub fn new<I, S>(commands: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let commands: Vec<String> = commands.into_iter().map(Into::into).collect();
        if commands.is_empty() {
            return Err(StageError::EmptyInput(
                "a work unit must contain at least one command".to_string(),
            ));
        }
        Ok(Self { commands })
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
