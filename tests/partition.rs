use std::path::Path;

use stagebatch::batch::partition;
use stagebatch::errors::StageError;
use stagebatch::types::ExecutionMode;
use stagebatch_test_utils::builders::{echo_units, StageSpecBuilder};

fn sizes(plan: &stagebatch::batch::BatchPlan) -> Vec<usize> {
    plan.batches().iter().map(|b| b.units.len()).collect()
}

fn ids(plan: &stagebatch::batch::BatchPlan) -> Vec<&str> {
    plan.batches().iter().map(|b| b.id.as_str()).collect()
}

#[test]
fn last_batch_absorbs_remainder() -> anyhow::Result<()> {
    let plan = partition(echo_units(5), 2, ExecutionMode::Local)?;

    assert_eq!(plan.len(), 2);
    assert_eq!(sizes(&plan), vec![2, 3]);
    assert_eq!(ids(&plan), vec!["0", "1"]);
    assert_eq!(plan.batch_size(), 2);
    Ok(())
}

#[test]
fn even_split() -> anyhow::Result<()> {
    let plan = partition(echo_units(6), 2, ExecutionMode::Local)?;
    assert_eq!(sizes(&plan), vec![2, 2, 2]);
    Ok(())
}

#[test]
fn fewer_units_than_batch_size_gives_one_batch() -> anyhow::Result<()> {
    let plan = partition(echo_units(3), 10, ExecutionMode::Cluster)?;
    assert_eq!(sizes(&plan), vec![3]);
    assert_eq!(ids(&plan), vec!["0"]);
    Ok(())
}

#[test]
fn non_positive_batch_size_means_single_batch() -> anyhow::Result<()> {
    for bs in [0, -1, -100] {
        let plan = partition(echo_units(7), bs, ExecutionMode::Local)?;
        assert_eq!(sizes(&plan), vec![7], "batch_size = {bs}");
        assert_eq!(plan.batch_size(), 7);
    }
    Ok(())
}

#[test]
fn container_mode_ignores_batch_size() -> anyhow::Result<()> {
    let plan = partition(echo_units(9), 2, ExecutionMode::Container)?;
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.unit_count(), 9);
    Ok(())
}

#[test]
fn ids_are_padded_to_widest_id() -> anyhow::Result<()> {
    let plan = partition(echo_units(12), 1, ExecutionMode::Local)?;
    let ids = ids(&plan);
    assert_eq!(ids.first(), Some(&"00"));
    assert_eq!(ids.last(), Some(&"11"));
    assert!(ids.iter().all(|id| id.len() == 2));

    let plan = partition(echo_units(101), 1, ExecutionMode::Local)?;
    assert_eq!(plan.batches()[7].id, "007");
    assert_eq!(plan.batches()[100].id, "100");
    Ok(())
}

#[test]
fn units_keep_their_order() -> anyhow::Result<()> {
    let plan = partition(echo_units(5), 2, ExecutionMode::Local)?;
    let flat: Vec<String> = plan
        .batches()
        .iter()
        .flat_map(|b| b.units.iter())
        .map(|u| u.commands()[0].clone())
        .collect();
    let expected: Vec<String> = (0..5).map(|i| format!("echo unit-{i}")).collect();
    assert_eq!(flat, expected);
    Ok(())
}

#[test]
fn empty_input_is_rejected() {
    let err = partition(Vec::new(), 2, ExecutionMode::Local).unwrap_err();
    assert!(matches!(err, StageError::EmptyInput(_)), "got {err:?}");
}

#[test]
fn script_paths_follow_naming_scheme() -> anyhow::Result<()> {
    let stage = StageSpecBuilder::new("/pipelines/run1", 1, "Trimmer").build();
    let plan = partition(echo_units(4), 2, ExecutionMode::Local)?;

    let paths = plan.script_paths(&stage);
    assert_eq!(
        paths,
        vec![
            Path::new("/pipelines/run1/01_Trimmer/script/01.0.01_Trimmer.sh").to_path_buf(),
            Path::new("/pipelines/run1/01_Trimmer/script/01.1.01_Trimmer.sh").to_path_buf(),
        ]
    );
    assert_eq!(
        stage.main_script_path(),
        Path::new("/pipelines/run1/01_Trimmer/script/MAIN_01_Trimmer.sh")
    );
    assert!(stage.is_main_script(&stage.main_script_path()));
    Ok(())
}

#[test]
fn partition_is_deterministic() -> anyhow::Result<()> {
    let stage = StageSpecBuilder::new("/p", 2, "Align").build();
    let a = partition(echo_units(23), 4, ExecutionMode::Cluster)?;
    let b = partition(echo_units(23), 4, ExecutionMode::Cluster)?;
    assert_eq!(a, b);
    assert_eq!(a.script_paths(&stage), b.script_paths(&stage));
    Ok(())
}
