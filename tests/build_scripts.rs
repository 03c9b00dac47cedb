use std::path::Path;

use stagebatch::config::ConfigFile;
use stagebatch::engine::{build_scripts, ScriptBuilder};
use stagebatch::errors::StageError;
use stagebatch::fs::mock::MockFileSystem;
use stagebatch::fs::{FileSystem, RealFileSystem};
use stagebatch::sentinel::{marker_path, Marker};
use stagebatch::types::ExecutionMode;
use stagebatch_test_utils::builders::{echo_units, ConfigFileBuilder, StageSpecBuilder};
use stagebatch_test_utils::faulty_fs::FaultyFs;
use stagebatch_test_utils::init_tracing;

#[test]
fn writes_main_and_worker_scripts() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let stage = StageSpecBuilder::new(dir.path(), 1, "Trim").build();
    let cfg = ConfigFile::default();

    let out = build_scripts(&RealFileSystem, &cfg, &stage, echo_units(5), 2)?;

    assert_eq!(out.plan.len(), 2);
    assert_eq!(out.worker_scripts.len(), 2);
    assert_eq!(out.main_script, stage.main_script_path());
    assert!(out.main_script.is_file());

    let first = std::fs::read_to_string(&out.worker_scripts[0])?;
    assert!(first.contains("execute \"echo unit-0\""));
    assert!(first.contains("execute \"echo unit-1\""));
    let last = std::fs::read_to_string(&out.worker_scripts[1])?;
    assert!(last.contains("execute \"echo unit-4\""));

    let main = std::fs::read_to_string(&out.main_script)?;
    for worker in &out.worker_scripts {
        assert!(main.contains(&worker.display().to_string()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&out.main_script)?.permissions().mode();
        assert_eq!(mode & 0o777, 0o770);
    }
    Ok(())
}

#[test]
fn configured_permissions_are_applied() -> anyhow::Result<()> {
    let fs = MockFileSystem::new();
    let stage = StageSpecBuilder::new("/p", 1, "Trim").build();
    let cfg = ConfigFileBuilder::new().permissions("750").build();

    let out = ScriptBuilder::new(&fs, &cfg).build_scripts(&stage, echo_units(2), 0)?;

    assert_eq!(fs.mode_of(&out.main_script), Some(0o750));
    assert_eq!(fs.mode_of(&out.worker_scripts[0]), Some(0o750));
    Ok(())
}

#[test]
fn rebuild_clears_stale_markers() -> anyhow::Result<()> {
    let fs = MockFileSystem::new();
    let stage = StageSpecBuilder::new("/p", 1, "Trim").build();
    let cfg = ConfigFile::default();

    let worker = stage.worker_script_path("0");
    let main = stage.main_script_path();
    for marker in Marker::ALL {
        fs.add_file(marker_path(&worker, marker), "old");
        fs.add_file(marker_path(&main, marker), "old");
    }

    build_scripts(&fs, &cfg, &stage, echo_units(1), 0)?;

    for marker in Marker::ALL {
        assert!(!fs.exists(&marker_path(&worker, marker)), "{marker:?} left on worker");
        assert!(!fs.exists(&marker_path(&main, marker)), "{marker:?} left on main");
    }
    assert!(fs.exists(&worker));
    Ok(())
}

#[test]
fn invalid_cluster_header_writes_nothing() {
    let fs = MockFileSystem::new();
    let stage = StageSpecBuilder::new("/p", 1, "Trim")
        .mode(ExecutionMode::Cluster)
        .num_threads(4)
        .build();
    let cfg = ConfigFileBuilder::new()
        .with_cluster("qsub", "#PBS -l procs=2")
        .build();

    let err = build_scripts(&fs, &cfg, &stage, echo_units(4), 2).unwrap_err();
    assert!(matches!(err, StageError::ConfigFormat(_)), "got {err:?}");
    assert!(fs.file_paths().is_empty());
}

#[test]
fn assembly_failure_writes_nothing() {
    let fs = MockFileSystem::new();
    let stage = StageSpecBuilder::new("/p", 1, "Trim").build();
    let units = stagebatch_test_utils::builders::units(&[&["echo ok"], &["echo a\necho b"]]);

    let err = build_scripts(&fs, &ConfigFile::default(), &stage, units, 1).unwrap_err();
    assert!(matches!(err, StageError::ScriptAssembly { .. }), "got {err:?}");
    assert!(fs.file_paths().is_empty());
}

#[test]
fn failed_write_removes_partial_build() {
    init_tracing();
    let fs = FaultyFs::new(MockFileSystem::new()).fail_writes_after(2);
    let stage = StageSpecBuilder::new("/p", 1, "Trim").build();

    // Three workers and a main script; the third write fails.
    let err = build_scripts(&fs, &ConfigFile::default(), &stage, echo_units(6), 2).unwrap_err();

    match err {
        StageError::ScriptAssembly { path, reason } => {
            assert_eq!(path, stage.worker_script_path("2"));
            assert!(reason.contains("disk full"), "{reason}");
        }
        other => panic!("expected ScriptAssembly, got {other:?}"),
    }
    assert!(fs.inner().file_paths().is_empty(), "left: {:?}", fs.inner().file_paths());
    assert!(!fs.exists(Path::new("/p/01_Trim/script/MAIN_01_Trim.sh")));
}

#[test]
fn failed_permissions_remove_the_written_script_too() {
    init_tracing();
    let fs = FaultyFs::new(MockFileSystem::new()).fail_set_mode_on("MAIN_");
    let stage = StageSpecBuilder::new("/p", 1, "Trim").build();

    // Every worker is written, then the main script is written but its
    // mode cannot be applied.
    let err = build_scripts(&fs, &ConfigFile::default(), &stage, echo_units(4), 2).unwrap_err();

    match err {
        StageError::ScriptAssembly { path, reason } => {
            assert_eq!(path, stage.main_script_path());
            assert!(reason.contains("EPERM"), "{reason}");
        }
        other => panic!("expected ScriptAssembly, got {other:?}"),
    }
    assert!(fs.inner().file_paths().is_empty(), "left: {:?}", fs.inner().file_paths());
}

#[test]
fn rebuild_with_fewer_batches_removes_stale_workers() -> anyhow::Result<()> {
    let fs = MockFileSystem::new();
    let stage = StageSpecBuilder::new("/p", 1, "Trim").build();
    let cfg = ConfigFile::default();

    let first = build_scripts(&fs, &cfg, &stage, echo_units(4), 1)?;
    assert_eq!(first.worker_scripts.len(), 4);
    for worker in &first.worker_scripts {
        fs.add_file(marker_path(worker, Marker::Started), "");
        fs.add_file(marker_path(worker, Marker::Success), "");
    }
    fs.add_file(stage.script_dir().join("notes.txt"), "kept");

    let second = build_scripts(&fs, &cfg, &stage, echo_units(4), 0)?;
    assert_eq!(second.worker_scripts, vec![stage.worker_script_path("0")]);

    let mut expected = vec![
        stage.main_script_path(),
        stage.worker_script_path("0"),
        stage.script_dir().join("notes.txt"),
    ];
    expected.sort();
    assert_eq!(fs.file_paths(), expected);
    Ok(())
}
