mod common;

use std::path::Path;
use std::process::{Command, Output};

use common::*;
use tempdir::TempDir;

fn smart_rmsd(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_smart-rmsd"))
        .args(args)
        .output()
        .unwrap()
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8(output.stdout.clone())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn write_inputs(dir: &Path) -> (String, String) {
    let reference = write_file(dir, "reference.sdf", &isopropanol("xtal", |p| p));

    let poses = [
        isopropanol_swapped_methyls("pose-1"),
        broken_record("pose-2"),
        isopropanol("pose-3", |[x, y, z]| [x + 1.0, y, z]),
    ]
    .concat();
    let poses = write_file(dir, "poses.sdf", &poses);

    (
        reference.to_str().unwrap().to_string(),
        poses.to_str().unwrap().to_string(),
    )
}

#[test]
fn missing_arguments_are_a_usage_error() {
    let output = smart_rmsd(&[]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(!output.stderr.is_empty());

    let output = smart_rmsd(&["reference.sdf"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn scores_without_fitting() {
    let dir = TempDir::new("smart-rmsd-cli").unwrap();
    let (reference, poses) = write_inputs(dir.path());

    let output = smart_rmsd(&[reference.as_str(), poses.as_str()]);
    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        vec!["POSE\tRMSD_NOFIT", "1\t0.00", "2\tNA", "3\t1.00"]
    );
}

#[test]
fn scores_with_fitting() {
    let dir = TempDir::new("smart-rmsd-cli").unwrap();
    let (reference, poses) = write_inputs(dir.path());

    let output = smart_rmsd(&[reference.as_str(), poses.as_str(), "fit"]);
    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        vec!["POSE\tRMSD_FIT", "1\t0.00", "2\tNA", "3\t0.00"]
    );

    // any other mode token means no fitting
    let output = smart_rmsd(&[reference.as_str(), poses.as_str(), "nofit"]);
    assert_eq!(stdout_lines(&output)[0], "POSE\tRMSD_NOFIT");
}

#[test]
fn json_output() {
    let dir = TempDir::new("smart-rmsd-cli").unwrap();
    let (reference, poses) = write_inputs(dir.path());

    let output = smart_rmsd(&[
        reference.as_str(),
        poses.as_str(),
        "--format",
        "json",
        "--threads",
        "2",
    ]);
    assert!(output.status.success());

    let records: Vec<serde_json::Value> = stdout_lines(&output)
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["pose"], 1);
    assert_eq!(records[0]["name"], "pose-1");
    assert!(records[1]["error"].is_string());
    assert!((records[2]["rmsd"].as_f64().unwrap() - 1.0).abs() < 1e-6);
}

#[test]
fn unreadable_reference_fails() {
    let dir = TempDir::new("smart-rmsd-cli").unwrap();
    let (_, poses) = write_inputs(dir.path());
    let missing = dir.path().join("missing.sdf");

    let output = smart_rmsd(&[missing.to_str().unwrap(), poses.as_str()]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn non_finite_pose_and_trailing_blank_lines() {
    let dir = TempDir::new("smart-rmsd-cli").unwrap();
    let reference = write_file(dir.path(), "reference.sdf", &isopropanol("xtal", |p| p));
    let poses = [
        isopropanol("pose-1", |p| p),
        isopropanol("pose-2", |[x, y, z]| [x * f64::NAN, y, z]),
        "\n\n  \n".to_string(),
    ]
    .concat();
    let poses = write_file(dir.path(), "poses.sdf", &poses);

    let output = smart_rmsd(&[reference.to_str().unwrap(), poses.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        vec!["POSE\tRMSD_NOFIT", "1\t0.00", "2\tNA"]
    );
}
