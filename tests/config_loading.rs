use std::io::Write;
use std::path::Path;

use stagebatch::config::{
    default_mode, load_and_validate, load_or_default, load_stage_file, ConfigFile, DEFAULT_CONFIG_FILE,
};
use stagebatch::errors::StageError;
use stagebatch::types::ExecutionMode;
use stagebatch_test_utils::builders::ConfigFileBuilder;
use tempfile::NamedTempFile;

fn write_toml(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn full_config_parses() -> anyhow::Result<()> {
    let file = write_toml(
        r##"
[script]
batch_size = 10
num_threads = 4
default_header = "#!/bin/bash"
permissions = "750"
timeout = 30
poll_interval = 5

[cluster]
enabled = true
batch_command = "qsub"
job_header = "#PBS -l procs=4,mem=8gb"
modules = ["python/3.6"]
"##,
    );

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.script.batch_size, 10);
    assert_eq!(cfg.script.num_threads, 4);
    assert_eq!(cfg.script.default_header.as_deref(), Some("#!/bin/bash"));
    assert_eq!(cfg.script.permission_mode(), 0o750);
    assert_eq!(cfg.script.timeout, Some(30));
    assert_eq!(cfg.script.poll_interval, 5);
    assert!(cfg.cluster.enabled);
    assert_eq!(cfg.cluster.directive_prefix, "#PBS");
    assert!(cfg.cluster.validate_params);
    assert_eq!(cfg.cluster.modules, vec!["python/3.6".to_string()]);
    assert_eq!(default_mode(&cfg), ExecutionMode::Cluster);
    Ok(())
}

#[test]
fn empty_config_uses_defaults() -> anyhow::Result<()> {
    let file = write_toml("");
    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.script.batch_size, 0);
    assert_eq!(cfg.script.num_threads, 1);
    assert_eq!(cfg.script.permission_mode(), 0o770);
    assert_eq!(cfg.script.poll_interval, 60);
    assert_eq!(cfg.script.timeout, None);
    assert_eq!(cfg.container.runtime, "docker");
    assert!(!cfg.container.save_on_exit);
    assert_eq!(default_mode(&cfg), ExecutionMode::Local);
    assert_eq!(ExecutionMode::default(), ExecutionMode::Local);
    Ok(())
}

#[test]
fn missing_file_falls_back_to_defaults() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = load_or_default(dir.path().join(DEFAULT_CONFIG_FILE))?;
    assert_eq!(cfg.script.num_threads, 1);
    Ok(())
}

#[test]
fn both_backends_enabled_is_rejected() {
    let file = write_toml(
        r#"
[cluster]
enabled = true
batch_command = "qsub"

[container]
enabled = true
image = "x"
"#,
    );
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, StageError::ConfigFormat(_)), "got {err:?}");
}

#[test]
fn invalid_values_are_rejected() {
    for (toml, what) in [
        ("[script]\nnum_threads = 0\n", "zero threads"),
        ("[script]\npermissions = \"rwx\"\n", "symbolic permissions"),
        ("[script]\npermissions = \"77\"\n", "short permissions"),
        ("[script]\npoll_interval = 0\n", "zero poll interval"),
        ("[cluster]\ndirective_prefix = \"\"\n", "empty directive prefix"),
    ] {
        let file = write_toml(toml);
        let err = load_and_validate(file.path()).unwrap_err();
        assert!(matches!(err, StageError::ConfigFormat(_)), "{what}: got {err:?}");
    }
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_toml("[script\nbatch_size = ");
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, StageError::TomlError(_)), "got {err:?}");
}

#[test]
fn stage_file_resolves_against_config() -> anyhow::Result<()> {
    let file = write_toml(
        r#"
name = "Trimmer"
index = 3
stage_dir = "/pipelines/run1/03_Trimmer"
num_threads = 2
functions = ["function hi() { echo hi; }"]

[[mounts]]
host = "/data/db"
container = "/mnt/efs/db"
read_only = true

[[unit]]
commands = ["trim a.fq", "mv a.trim.fq out/"]

[[unit]]
commands = ["trim b.fq"]
"#,
    );

    let cfg = ConfigFileBuilder::new().batch_size(7).build();
    let (stage, units, batch_size) = load_stage_file(file.path())?.resolve(&cfg)?;

    assert_eq!(stage.name, "Trimmer");
    assert_eq!(stage.index, 3);
    assert_eq!(stage.stage_dir, Path::new("/pipelines/run1/03_Trimmer"));
    assert_eq!(stage.num_threads, 2);
    assert_eq!(stage.mode, ExecutionMode::Local);
    assert_eq!(stage.helper_functions.len(), 1);
    assert_eq!(stage.mounts.len(), 1);
    assert!(stage.mounts[0].read_only);
    assert_eq!(units.len(), 2);
    assert_eq!(units[0].commands(), ["trim a.fq", "mv a.trim.fq out/"]);
    assert_eq!(batch_size, 7);
    Ok(())
}

#[test]
fn stage_file_overrides_batch_size_and_mode() -> anyhow::Result<()> {
    let file = write_toml(
        r#"
name = "Classify"
stage_dir = "/p/02_Classify"
batch_size = 2
mode = "cluster"

[[unit]]
commands = ["kraken2 a"]
"#,
    );
    let (stage, _, batch_size) = load_stage_file(file.path())?.resolve(&ConfigFile::default())?;
    assert_eq!(stage.mode, ExecutionMode::Cluster);
    assert_eq!(batch_size, 2);
    Ok(())
}

#[test]
fn stage_file_without_units_or_with_empty_unit_is_rejected() -> anyhow::Result<()> {
    let no_units = write_toml("name = \"X\"\nstage_dir = \"/p/01_X\"\n");
    let err = load_stage_file(no_units.path())?
        .resolve(&ConfigFile::default())
        .unwrap_err();
    assert!(matches!(err, StageError::EmptyInput(_)), "got {err:?}");

    let empty_unit = write_toml("name = \"X\"\nstage_dir = \"/p/01_X\"\n\n[[unit]]\ncommands = []\n");
    let err = load_stage_file(empty_unit.path())?
        .resolve(&ConfigFile::default())
        .unwrap_err();
    assert!(matches!(err, StageError::EmptyInput(_)), "got {err:?}");
    Ok(())
}
