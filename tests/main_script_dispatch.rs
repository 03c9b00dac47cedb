use stagebatch::batch::partition;
use stagebatch::config::ConfigFile;
use stagebatch::errors::StageError;
use stagebatch::exec::{Dispatcher, VolumeMount};
use stagebatch::script::worker::BuildContext;
use stagebatch::script::{assemble_worker, build_main_script, ScriptText};
use stagebatch::stage::StageSpec;
use stagebatch::types::ExecutionMode;
use stagebatch_test_utils::builders::{echo_units, ConfigFileBuilder, StageSpecBuilder};

fn main_and_first_worker(
    stage: &StageSpec,
    cfg: &ConfigFile,
    n: usize,
    batch_size: i64,
) -> stagebatch::errors::Result<(ScriptText, ScriptText)> {
    let dispatcher = Dispatcher::resolve(stage, cfg)?;
    let plan = partition(echo_units(n), batch_size, stage.mode)?;
    let ctx = BuildContext {
        stage,
        cfg,
        dispatcher: &dispatcher,
        batch_size: plan.batch_size(),
    };
    let worker = assemble_worker(&plan.batches()[0], &ctx)?;
    Ok((build_main_script(&plan, &ctx), worker))
}

fn container_cfg() -> ConfigFileBuilder {
    ConfigFileBuilder::new().with_container("biolockj/trimmer:1.0", "/data/in", "/data/pipelines", "/data/config")
}

#[test]
fn local_main_invokes_each_batch_in_order() -> anyhow::Result<()> {
    let stage = StageSpecBuilder::new("/p", 1, "Trim").build();
    let (main, _) = main_and_first_worker(&stage, &ConfigFile::default(), 6, 2)?;

    let main_path = "/p/01_Trim/script/MAIN_01_Trim.sh";
    let lines = main.lines();
    assert!(lines[0].starts_with("#stagebatch."));
    assert!(lines[0].ends_with(&format!("{main_path} | batch size = 2")));
    assert_eq!(lines[1], format!("touch {main_path}_STARTED"));
    assert_eq!(lines[2], format!("failLog=\"{main_path}_FAILURES\""));

    let invocations: Vec<&String> = lines.iter().filter(|l| l.starts_with("execute ")).collect();
    assert_eq!(
        invocations,
        vec![
            "execute \"/p/01_Trim/script/01.0.01_Trim.sh\" 12",
            "execute \"/p/01_Trim/script/01.1.01_Trim.sh\" 13",
            "execute \"/p/01_Trim/script/01.2.01_Trim.sh\" 14",
        ]
    );
    assert_eq!(lines.last().unwrap(), &format!("touch {main_path}_SUCCESS"));
    assert!(!main.render().contains("runJob"));
    assert!(!main.render().contains("spawnContainer"));
    Ok(())
}

#[test]
fn cluster_main_submits_through_run_job() -> anyhow::Result<()> {
    let stage = StageSpecBuilder::new("/p", 4, "Classify")
        .mode(ExecutionMode::Cluster)
        .build();
    let cfg = ConfigFileBuilder::new()
        .with_cluster("qsub", "#PBS -l procs=1")
        .build();
    let (main, worker) = main_and_first_worker(&stage, &cfg, 4, 2)?;

    let lines = main.lines();
    let fn_start = lines.iter().position(|l| l == "function runJob() {").unwrap();
    assert_eq!(lines[fn_start + 1], "    qsub $1");
    assert_eq!(lines[fn_start + 2], "}");
    assert!(lines.iter().any(|l| l.starts_with("execute \"runJob /p/04_Classify/script/04.0.04_Classify.sh\" ")));
    assert!(lines.iter().any(|l| l.starts_with("execute \"runJob /p/04_Classify/script/04.1.04_Classify.sh\" ")));

    // Job header goes on workers only.
    assert!(!lines.iter().any(|l| l.starts_with("#PBS")));
    assert_eq!(worker.lines()[0], "#PBS -l procs=1");
    Ok(())
}

#[test]
fn cluster_without_batch_command_is_rejected() {
    let stage = StageSpecBuilder::new("/p", 1, "Trim")
        .mode(ExecutionMode::Cluster)
        .build();
    let err = Dispatcher::resolve(&stage, &ConfigFile::default()).unwrap_err();
    assert!(matches!(err, StageError::ConfigMissing(_)), "got {err:?}");
}

#[test]
fn container_main_spawns_one_container() -> anyhow::Result<()> {
    let stage = StageSpecBuilder::new("/data/pipelines/run1", 2, "Humann")
        .mode(ExecutionMode::Container)
        .mount(VolumeMount::read_only("/data/db", "/mnt/efs/db"))
        .build();
    let cfg = container_cfg().build();
    let (main, worker) = main_and_first_worker(&stage, &cfg, 5, 2)?;

    let lines = main.lines();
    let fn_start = lines
        .iter()
        .position(|l| l == "function spawnContainer() {")
        .unwrap();
    assert_eq!(
        lines[fn_start + 1],
        "    docker run --rm -e \"COMPUTE_SCRIPT=$1\" \
         -v /var/run/docker.sock:/var/run/docker.sock \
         -v /data/in:/mnt/efs/input:ro \
         -v /data/pipelines:/mnt/efs/pipelines \
         -v /data/config:/mnt/efs/config:ro \
         -v /data/db:/mnt/efs/db:ro \
         biolockj/trimmer:1.0 /bin/bash \"$1\""
    );

    // Batch size is ignored in container mode: one batch.
    let invocations: Vec<&String> = lines.iter().filter(|l| l.starts_with("execute ")).collect();
    assert_eq!(invocations.len(), 1);
    assert!(invocations[0].starts_with(
        "execute \"spawnContainer /mnt/efs/pipelines/run1/02_Humann/script/02.0.02_Humann.sh\""
    ));

    // The worker refers to its markers by container path.
    assert_eq!(
        worker.lines()[1],
        "touch /mnt/efs/pipelines/run1/02_Humann/script/02.0.02_Humann.sh_STARTED"
    );
    Ok(())
}

#[test]
fn container_save_on_exit_keeps_container() -> anyhow::Result<()> {
    let stage = StageSpecBuilder::new("/data/pipelines/run1", 1, "Trim")
        .mode(ExecutionMode::Container)
        .build();
    let cfg = container_cfg().save_on_exit(true).build();
    let (main, _) = main_and_first_worker(&stage, &cfg, 1, 0)?;
    assert!(!main.render().contains("--rm"));
    Ok(())
}

#[test]
fn container_requires_image_and_dirs() {
    let stage = StageSpecBuilder::new("/data/pipelines/run1", 1, "Trim")
        .mode(ExecutionMode::Container)
        .build();

    let err = Dispatcher::resolve(&stage, &ConfigFile::default()).unwrap_err();
    assert!(matches!(err, StageError::ConfigMissing(_)), "got {err:?}");

    let mut cfg = container_cfg().build();
    cfg.container.config_dir = None;
    let err = Dispatcher::resolve(&stage, &cfg).unwrap_err();
    assert!(matches!(err, StageError::ConfigMissing(ref m) if m.contains("config_dir")), "got {err:?}");
}

#[test]
fn stage_image_overrides_configured_image() -> anyhow::Result<()> {
    let stage = StageSpecBuilder::new("/data/pipelines/run1", 1, "Trim")
        .mode(ExecutionMode::Container)
        .image("custom/image:2")
        .build();
    match Dispatcher::resolve(&stage, &container_cfg().build())? {
        Dispatcher::Container(spawn) => assert_eq!(spawn.image(), "custom/image:2"),
        other => panic!("expected container dispatcher, got {other:?}"),
    }
    Ok(())
}
