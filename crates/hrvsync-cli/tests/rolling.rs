use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::{error::Error, fs, path::PathBuf};
use tempfile::tempdir;

#[derive(Deserialize)]
struct RollingRecord {
    timestamp: usize,
    coherence_score: f64,
    phase: String,
}

#[derive(Deserialize)]
struct RollingOutput {
    window_size: usize,
    step_size: usize,
    records: Vec<RollingRecord>,
}

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .expect("crates dir")
        .parent()
        .expect("workspace root")
        .to_path_buf()
}

fn sample_path(relative: &str) -> String {
    workspace_root()
        .join(relative)
        .to_string_lossy()
        .to_string()
}

#[test]
fn rolling_json_uses_default_window_and_step() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("hrvsync");
    cmd.args(["rolling", "--input", &sample_path("test_data/resonant_rr.txt")]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let series: RollingOutput = serde_json::from_slice(&out)?;
    assert_eq!(series.window_size, 30);
    assert_eq!(series.step_size, 5);
    // floor((120 - 30) / 5) + 1
    assert_eq!(series.records.len(), 19);
    assert_eq!(series.records.last().map(|r| r.timestamp), Some(90));
    assert!(series.records.iter().all(|r| r.phase == "high"));
    assert!(series.records.iter().all(|r| r.coherence_score <= 100.0));
    Ok(())
}

#[test]
fn rolling_respects_config_file() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("hrvsync");
    cmd.args([
        "rolling",
        "--config",
        &sample_path("test_data/analysis.toml"),
        "--input",
        &sample_path("test_data/resonant_rr.txt"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let series: RollingOutput = serde_json::from_slice(&out)?;
    assert_eq!(series.window_size, 40);
    let timestamps: Vec<usize> = series.records.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, vec![0, 20, 40, 60, 80]);
    Ok(())
}

#[test]
fn rolling_csv_has_header_and_rows() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let input = temp.path().join("rr.txt");
    let text = fs::read_to_string(workspace_root().join("test_data/resonant_rr.txt"))?;
    fs::write(&input, text.lines().take(41).collect::<Vec<_>>().join("\n"))?;

    let mut cmd = cargo_bin_cmd!("hrvsync");
    cmd.args([
        "rolling",
        "--input",
        input.to_str().expect("utf8 path"),
        "--format",
        "csv",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let csv = String::from_utf8(out)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "timestamp,coherence_score,peak_power,total_power,coherence_ratio,phase,dominant_frequency"
    );
    // 40 intervals (first line is a comment): windows at 0, 5 and 10.
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("0,"));
    Ok(())
}

#[test]
fn rolling_on_short_input_is_empty() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("hrvsync");
    cmd.args(["rolling", "--input", &sample_path("test_data/short_rr.txt")]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let series: RollingOutput = serde_json::from_slice(&out)?;
    assert!(series.records.is_empty());
    Ok(())
}
