// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;

/// Command-line arguments for `stagebatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stagebatch",
    version,
    about = "Generate and run fail-fast batch scripts for pipeline stages.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Stagebatch.toml` in the current working directory. A missing
    /// file means built-in defaults.
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STAGEBATCH_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Write the main and worker scripts for a stage.
    Build {
        /// Stage file (TOML) listing the stage's work units.
        stage: PathBuf,

        /// Print the batch plan without writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Build a stage, run its main script and wait for the workers.
    Run {
        /// Stage file (TOML) listing the stage's work units.
        stage: PathBuf,
    },

    /// Report worker progress and failures of a built stage.
    Status {
        /// Stage directory (the parent of `script/`).
        stage_dir: PathBuf,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
