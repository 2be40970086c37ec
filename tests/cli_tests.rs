use std::path::Path;

use assert_cmd::Command;
use image::{Rgba, RgbaImage};
use predicates::prelude::*;
use tempfile::TempDir;

fn write_png(path: &Path, width: u32, height: u32) {
    RgbaImage::from_pixel(width, height, Rgba([90, 120, 150, 255]))
        .save(path)
        .unwrap();
}

fn unmark(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("unmark").unwrap();
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_process_writes_outputs_and_archive() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("first.png"), 200, 150);
    write_png(&dir.path().join("second.png"), 120, 120);

    unmark(&dir)
        .args([
            "process",
            "first.png",
            "second.png",
            "--output-dir",
            "cleaned",
            "--archive",
            "bundle.zip",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 completed, 0 failed, 0 rejected"));

    let cleaned = image::open(dir.path().join("cleaned/unmarked_first.png")).unwrap();
    assert_eq!((cleaned.width(), cleaned.height()), (200, 150));
    assert!(dir.path().join("cleaned/unmarked_second.png").exists());

    let archive = std::fs::read(dir.path().join("bundle.zip")).unwrap();
    assert_eq!(&archive[..4], b"PK\x03\x04");
}

#[test]
fn test_failed_job_sets_exit_status() {
    let dir = TempDir::new().unwrap();
    let inputs = dir.path().join("inputs");
    std::fs::create_dir(&inputs).unwrap();
    write_png(&inputs.join("good.png"), 100, 100);
    std::fs::write(inputs.join("broken.jpg"), b"not a jpeg").unwrap();
    std::fs::write(inputs.join("notes.txt"), b"skipped by the directory walk").unwrap();

    let output = unmark(&dir)
        .args(["process", "inputs", "--archive", "out.zip", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["batch"]["progress"]["processed"], 2);
    assert_eq!(report["batch"]["progress"]["total"], 2);
    assert_eq!(report["archive"]["entries"].as_array().unwrap().len(), 1);
    assert_eq!(report["archive"]["entries"][0]["name"], "unmarked_good.png");

    let failed: Vec<&serde_json::Value> = report["batch"]["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|job| job["status"] == "failed")
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["file_name"], "broken.jpg");
    assert_eq!(failed[0]["error"]["kind"], "decode");

    // Archive only, so nothing is written next to the inputs
    assert!(!dir.path().join("unmarked_good.png").exists());
}

#[test]
fn test_unsupported_input_is_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();

    unmark(&dir)
        .args(["process", "notes.txt"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("REJECTED"));
}

#[test]
fn test_archive_prefix_from_environment() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("photo.png"), 128, 128);

    unmark(&dir)
        .env("UNMARK_ARCHIVE_PREFIX", "clean")
        .args(["process", "photo.png", "--output-dir", "out"])
        .assert()
        .success();
    assert!(dir.path().join("out/clean_photo.png").exists());
}

#[test]
fn test_inspect_reports_watermark_geometry() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("frame.png"), 800, 600);

    unmark(&dir)
        .args(["inspect", "frame.png"])
        .assert()
        .success()
        .stdout(predicate::str::contains("800x600"))
        .stdout(predicate::str::contains("48px at (720, 520)"));
}

#[test]
fn test_inspect_json() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("large.png"), 2048, 1536);

    let output = unmark(&dir)
        .args(["inspect", "large.png", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["kind"], "image");
    assert_eq!(report["watermark"]["size"], 96);
    assert_eq!(report["watermark"]["position"]["x"], 1888);
}

#[test]
fn test_invalid_concurrency_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("photo.png"), 64, 64);

    unmark(&dir)
        .args(["--concurrency", "0", "process", "photo.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("concurrency"));
}
