// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, StageError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::StageError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.script, raw.cluster, raw.container))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_script_section(cfg)?;
    validate_backends(cfg)?;
    Ok(())
}

fn validate_script_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.script.num_threads == 0 {
        return Err(StageError::ConfigFormat(
            "[script].num_threads must be >= 1 (got 0)".to_string(),
        ));
    }

    let perms = cfg.script.permissions.trim();
    let is_octal = (3..=4).contains(&perms.len()) && perms.chars().all(|c| ('0'..='7').contains(&c));
    if !is_octal {
        return Err(StageError::ConfigFormat(format!(
            "[script].permissions must be 3 or 4 octal digits (got \"{}\")",
            cfg.script.permissions
        )));
    }

    if cfg.script.poll_interval == 0 {
        return Err(StageError::ConfigFormat(
            "[script].poll_interval must be >= 1 second (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_backends(cfg: &RawConfigFile) -> Result<()> {
    if cfg.cluster.enabled && cfg.container.enabled {
        return Err(StageError::ConfigFormat(
            "[cluster].enabled and [container].enabled are mutually exclusive".to_string(),
        ));
    }

    if cfg.cluster.directive_prefix.trim().is_empty() {
        return Err(StageError::ConfigFormat(
            "[cluster].directive_prefix must not be empty".to_string(),
        ));
    }

    if cfg.container.runtime.trim().is_empty() {
        return Err(StageError::ConfigMissing(
            "[container].runtime must name the container executable".to_string(),
        ));
    }

    Ok(())
}
