//! Basic CLI E2E tests.
//!
//! Each test points the binary at its own data directory.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_pomotick"))
        .args(args)
        .env("POMOTICK_DATA_DIR", data_dir.path())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Run `pomotick run --plain` feeding `input` on stdin.
fn run_interactive(data_dir: &TempDir, input: &str) -> (String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_pomotick"))
        .args(["run", "--plain"])
        .env("POMOTICK_DATA_DIR", data_dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn test_config_list_shows_defaults() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["config", "list"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["workDuration"], 25);
    assert_eq!(json["shortBreakDuration"], 5);
    assert_eq!(json["longBreakDuration"], 15);
    assert_eq!(json["sessionsBeforeLongBreak"], 4);
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["config", "set", "workDuration", "30"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("ok"));

    let (stdout, _, code) = run_cli(&dir, &["config", "get", "work_duration"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "30");

    let record = std::fs::read_to_string(dir.path().join("pomodoroConfig.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&record).unwrap();
    assert_eq!(json["workDuration"], 30);
    assert_eq!(json["shortBreakDuration"], 5);
}

#[test]
fn test_config_set_rejects_invalid_values() {
    let dir = TempDir::new().unwrap();
    for value in ["0", "-4", "abc", "500"] {
        let (_, stderr, code) = run_cli(&dir, &["config", "set", "workDuration", value]);
        assert_ne!(code, 0, "value {value} was accepted");
        assert!(stderr.contains("error"));
    }
    let (stdout, _, _) = run_cli(&dir, &["config", "get", "workDuration"]);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_config_reset() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, &["config", "set", "cadence", "2"]);
    let (_, _, code) = run_cli(&dir, &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&dir, &["config", "get", "sessionsBeforeLongBreak"]);
    assert_eq!(stdout.trim(), "4");
}

#[test]
fn test_corrupt_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("pomodoroConfig.json"), "not json").unwrap();
    let (stdout, _, code) = run_cli(&dir, &["status"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["remainingSeconds"], 1500);
    assert_eq!(json["lifecycle"], "idle");
}

#[test]
fn test_status_reflects_config() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, &["config", "set", "work", "30"]);
    let (stdout, _, code) = run_cli(&dir, &["status"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["sessionType"], "work");
    assert_eq!(json["remainingSeconds"], 1800);
}

#[test]
fn test_run_switch_and_quit() {
    let dir = TempDir::new().unwrap();
    let (stdout, code) = run_interactive(&dir, "switch long\nstatus\nquit\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("[Long Break] 15:00"));
    assert!(stdout.contains("\"sessionType\": \"longBreak\""));
    assert!(stdout.contains("\"remainingSeconds\": 900"));
}

#[test]
fn test_run_set_persists() {
    let dir = TempDir::new().unwrap();
    let (stdout, code) = run_interactive(&dir, "set short 10\nset short 0\nquit\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("[Work] 25:00"));

    let (stdout, _, _) = run_cli(&dir, &["config", "get", "shortBreakDuration"]);
    assert_eq!(stdout.trim(), "10");
}

#[test]
fn test_run_reports_only_rejected_commands() {
    let dir = TempDir::new().unwrap();
    let (stdout, code) = run_interactive(&dir, "set work 25\ndefaults\npause\nquit\n");
    assert_eq!(code, 0);
    assert_eq!(stdout.matches("(nothing to do while idle)").count(), 1);
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("pomotick"));
}
