//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against an isolated data
//! directory and verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command against `data_dir` and return (stdout, stderr, code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "focusguard-cli", "--quiet", "--"])
        .args(args)
        .env("FOCUSGUARD_DATA_DIR", data_dir)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn timer_status_reports_idle_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0, "timer status failed");
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(v["ok"], true);
    assert_eq!(v["state"]["focusing"], false);
}

#[test]
fn timer_start_then_stop() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["timer", "start", "--minutes", "5"]);
    assert_eq!(code, 0, "timer start failed");
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(v["ok"], true);
    assert!(v["endsAt"].as_i64().unwrap() > 0);

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0);
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(v["state"]["sessionType"], "focus");

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "stop"]);
    assert_eq!(code, 0, "timer stop failed");
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(v["ok"], true);
}

#[test]
fn block_add_list_remove() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["block", "add", "https://www.Example.com/x"]);
    assert_eq!(code, 0, "block add failed");
    assert!(stdout.contains("Added example.com"));

    // Set semantics: adding again does not duplicate.
    let (stdout, _, _) = run_cli(dir.path(), &["block", "add", "example.com"]);
    assert!(stdout.contains("already in the blocklist"));

    let (stdout, _, code) = run_cli(dir.path(), &["block", "list", "--json"]);
    assert_eq!(code, 0);
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(v.as_array().unwrap().len(), 1);

    let (stdout, _, code) = run_cli(dir.path(), &["block", "remove", "example.com"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Removed"));
}

#[test]
fn rules_appear_only_during_focus() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["block", "add", "example.com"]);

    let (stdout, _, code) = run_cli(dir.path(), &["rules", "list"]);
    assert_eq!(code, 0, "rules list failed");
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(v.as_array().unwrap().is_empty());

    run_cli(dir.path(), &["timer", "start", "--minutes", "5"]);
    let (stdout, _, _) = run_cli(dir.path(), &["rules", "list"]);
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(v.as_array().unwrap().len(), 1);
    assert_eq!(v[0]["url_filter"], "example.com");
}

#[test]
fn config_get_set_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "focus-minutes"]);
    assert_eq!(code, 0, "config get failed");
    assert_eq!(stdout.trim(), "25");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "loop-enabled", "true"]);
    assert_eq!(code, 0, "config set failed");

    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "loop-enabled"]);
    assert_eq!(stdout.trim(), "true");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "focus-minutes", "0"]);
    assert_ne!(code, 0, "zero minutes must be rejected");
}

#[test]
fn msg_handles_unknown_message() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["msg", r#"{"type":"NOT_A_COMMAND"}"#]);
    assert_eq!(code, 0, "msg failed");
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(v["ok"], false);
    assert_eq!(v["error"], "UNKNOWN_MESSAGE");
}

#[test]
fn msg_get_state_matches_wire_shape() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["msg", r#"{"type":"GET_STATE"}"#]);
    assert_eq!(code, 0);
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(v["ok"], true);
    assert!(v["state"]["endsAt"].is_null());
    assert!(v["state"]["blocklist"].is_array());
}
