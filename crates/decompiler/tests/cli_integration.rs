//! Integration tests for the z80-decompile CLI.

use decompiler as _;
use decompiler_core as _;
use env_logger as _;
use log as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror as _;

fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.join("z80-decompile")
}

fn create_image(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

// header byte, then LD HL,6007; CALL 6007; JR 6006; RET
const PROGRAM: [u8; 10] = [0xff, 0x21, 0x07, 0x60, 0xcd, 0x07, 0x60, 0x18, 0xfe, 0xc9];

#[test]
fn prints_listing_to_stdout() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = create_image(temp_dir.path(), "prog.tap", &PROGRAM);

    let output = Command::new(binary_path())
        .args([
            input.to_str().unwrap(),
            "--load-point",
            "0x6000",
            "--start-offset",
            "1",
        ])
        .output()
        .expect("failed to run z80-decompile");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    assert_eq!(
        stdout,
        "6000: LD HL, 6007\n6003: CALL 6007\n6006: JR 6006\n6007: RET\n"
    );
}

#[test]
fn writes_stamped_listing_into_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = create_image(temp_dir.path(), "prog.tap", &PROGRAM);
    let out_dir = temp_dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();

    let status = Command::new(binary_path())
        .args([
            input.to_str().unwrap(),
            "--load-point",
            "6000h",
            "--start-offset",
            "1",
            "-o",
            out_dir.to_str().unwrap(),
            "--stamp-version",
        ])
        .status()
        .expect("failed to run z80-decompile");

    assert!(status.success());
    let expected = out_dir.join(format!("prog.v{}.txt", env!("CARGO_PKG_VERSION")));
    let listing = fs::read_to_string(&expected).unwrap();
    assert!(listing.starts_with("6000: LD HL, 6007\n"));
    assert!(listing.ends_with("6007: RET\n"));
}

#[test]
fn refuses_to_overwrite_existing_output() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = create_image(temp_dir.path(), "prog.tap", &[0xc9]);
    let target = create_image(temp_dir.path(), "listing.txt", b"keep me");

    let output = Command::new(binary_path())
        .args([
            input.to_str().unwrap(),
            "--load-point",
            "0",
            "-o",
            target.to_str().unwrap(),
        ])
        .output()
        .expect("failed to run z80-decompile");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already exists"));
    assert_eq!(fs::read_to_string(&target).unwrap(), "keep me");
}

#[test]
fn decode_failure_prints_partial_listing_and_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = create_image(temp_dir.path(), "bad.tap", &[0x00, 0xcb, 0x30]);

    let output = Command::new(binary_path())
        .args([input.to_str().unwrap(), "--load-point", "0x8000"])
        .output()
        .expect("failed to run z80-decompile");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stdout, "8000: NOP\n");
    assert!(stderr.contains("error"));
    assert!(stderr.contains("cb 30"));
}

#[test]
fn warns_about_non_tap_input() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = create_image(temp_dir.path(), "prog.bin", &[0xc9]);

    let output = Command::new(binary_path())
        .args([input.to_str().unwrap(), "--load-point", "0"])
        .output()
        .expect("failed to run z80-decompile");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(".tap"));
}

#[test]
fn help_shows_usage() {
    let result = Command::new(binary_path())
        .args(["--help"])
        .output()
        .expect("failed to run z80-decompile");

    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(result.status.success());
    assert!(stdout.contains("--load-point"));
    assert!(stdout.contains("--stamp-version"));
}

#[test]
fn missing_load_point_fails() {
    let result = Command::new(binary_path())
        .args(["prog.tap"])
        .output()
        .expect("failed to run z80-decompile");

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("missing --load-point"));
    assert!(stderr.contains("Usage:"));
}
