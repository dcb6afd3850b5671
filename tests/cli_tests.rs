//! Integration tests for the treesync CLI. These run the actual binary
//! and verify its behavior.

use std::process::Command;

#[test]
fn test_cli_help() {
    let output = Command::new("cargo")
        .args(["run", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("check"));
    assert!(stdout.contains("stop"));
}

#[test]
fn test_cli_version() {
    let output = Command::new("cargo")
        .args(["run", "--", "--version"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("treesync"));
}

#[test]
fn test_check_reports_a_fresh_local_endpoint() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("tree");
    std::fs::create_dir_all(&root).unwrap();

    let output = Command::new("cargo")
        .args(["run", "--", "check", root.to_str().unwrap()])
        .env("HOME", temp.path())
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("branch=localhost-"));
    assert!(stdout.contains("engine=missing"));
    assert!(stdout.contains("repo=none"));
}

#[test]
fn test_stop_succeeds_when_nothing_was_recorded() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("tree");
    std::fs::create_dir_all(&root).unwrap();

    let output = Command::new("cargo")
        .args(["run", "--", "stop", root.to_str().unwrap()])
        .env("HOME", temp.path())
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
}

#[test]
fn test_check_rejects_malformed_addresses() {
    let output = Command::new("cargo")
        .args(["run", "--", "check", ""])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}
