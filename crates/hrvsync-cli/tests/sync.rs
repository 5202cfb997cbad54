use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::error::Error;
use std::path::PathBuf;

#[derive(Deserialize)]
struct SyncOutput {
    correlation: f64,
    phase_sync_index: f64,
    sync_strength: f64,
}

#[derive(Deserialize)]
struct MatrixOutput {
    size: usize,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct SummaryOutput {
    participant_count: usize,
    average_score: f64,
    phase: String,
}

fn data_path(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join("test_data")
        .join(name)
        .to_string_lossy()
        .to_string()
}

fn run_sync(a: &str, b: &str) -> Result<SyncOutput, Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("hrvsync");
    cmd.args(["sync", "--a", &data_path(a), "--b", &data_path(b)]);
    let out = cmd.assert().success().get_output().stdout.clone();
    Ok(serde_json::from_slice(&out)?)
}

#[test]
fn same_file_is_fully_synchronized() -> Result<(), Box<dyn Error>> {
    let value = run_sync("participant_a.txt", "participant_a.txt")?;
    assert_eq!(value.correlation, 1.0);
    assert_eq!(value.phase_sync_index, 1.0);
    assert_eq!(value.sync_strength, 1.0);
    Ok(())
}

#[test]
fn sync_is_order_independent() -> Result<(), Box<dyn Error>> {
    let ab = run_sync("participant_a.txt", "participant_c.txt")?;
    let ba = run_sync("participant_c.txt", "participant_a.txt")?;
    assert!((ab.sync_strength - ba.sync_strength).abs() < 1e-12);
    assert!((ab.correlation - ba.correlation).abs() < 1e-12);
    Ok(())
}

#[test]
fn group_matrix_is_symmetric_with_unit_diagonal() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("hrvsync");
    cmd.args([
        "group-matrix",
        "--input",
        &data_path("participant_a.txt"),
        "--input",
        &data_path("participant_b.txt"),
        "--input",
        &data_path("participant_c.txt"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let matrix: MatrixOutput = serde_json::from_slice(&out)?;
    let n = matrix.size;
    assert_eq!(n, 3);
    let at = |i: usize, j: usize| matrix.values[i * n + j];
    for i in 0..n {
        assert_eq!(at(i, i), 1.0);
        for j in 0..n {
            assert_eq!(at(i, j), at(j, i));
        }
    }
    assert!(at(0, 1) > 0.9);
    assert!(at(0, 2) < at(0, 1));
    Ok(())
}

#[test]
fn group_summary_averages_scores() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("hrvsync");
    cmd.args(["group-summary", "--scores", &data_path("scores.txt")]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let summary: SummaryOutput = serde_json::from_slice(&out)?;
    assert_eq!(summary.participant_count, 4);
    assert_eq!(summary.average_score, 52.5);
    assert_eq!(summary.phase, "medium");
    Ok(())
}
