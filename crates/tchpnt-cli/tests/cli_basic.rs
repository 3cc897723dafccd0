//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_tchpnt"))
        .args(args)
        .env("TCHPNT_DATA_DIR", data_dir)
        .env_remove("TCHPNT_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

fn list_json(data_dir: &Path, extra: &[&str]) -> Vec<serde_json::Value> {
    let mut args = vec!["list", "--json"];
    args.extend_from_slice(extra);
    let stdout = run_ok(data_dir, &args);
    serde_json::from_str::<serde_json::Value>(&stdout)
        .expect("list --json is valid JSON")
        .as_array()
        .cloned()
        .expect("list --json is an array")
}

fn add(data_dir: &Path, args: &[&str]) -> String {
    let mut full = vec!["add"];
    full.extend_from_slice(args);
    full.push("--json");
    let stdout = run_ok(data_dir, &full);
    let record: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    record["id"].as_str().unwrap().to_string()
}

#[test]
fn test_empty_list() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run_ok(dir.path(), &["list"]);
    assert!(stdout.contains("No touchpoints"));
    assert!(list_json(dir.path(), &[]).is_empty());
}

#[test]
fn test_add_and_rank() {
    let dir = tempfile::tempdir().unwrap();
    add(
        dir.path(),
        &["Jane Smith", "--channel", "+15550101", "--cadence", "weekly", "--last-contact", "2025-01-01"],
    );
    add(
        dir.path(),
        &["Bob Lee", "--channel", "+15550102", "--cadence", "30", "--last-contact", "2025-01-01"],
    );

    let ranked = list_json(dir.path(), &["--at", "2025-01-09"]);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["name"], "Jane Smith");
    assert_eq!(ranked[0]["urgency_days"], 1);
    assert_eq!(ranked[0]["label"], "Overdue by 1 day");
    assert_eq!(ranked[0]["severity"], "overdue");
    assert_eq!(ranked[1]["name"], "Bob Lee");
    assert_eq!(ranked[1]["urgency_days"], -22);
}

#[test]
fn test_add_rejects_bad_cadence() {
    let dir = tempfile::tempdir().unwrap();
    for cadence in ["0", "400", "fortnightly"] {
        let (_, stderr, code) = run_cli(
            dir.path(),
            &["add", "Jane", "--channel", "+1555", "--cadence", cadence],
        );
        assert_ne!(code, 0);
        assert!(!stderr.is_empty());
    }
    assert!(list_json(dir.path(), &[]).is_empty());
}

#[test]
fn test_add_rejects_duplicate_channel() {
    let dir = tempfile::tempdir().unwrap();
    add(dir.path(), &["Jane", "--channel", "+1555"]);
    let (_, stderr, code) = run_cli(dir.path(), &["add", "Janet", "--channel", "+1555"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_category_filter() {
    let dir = tempfile::tempdir().unwrap();
    add(dir.path(), &["Jane", "--channel", "1", "--category", "personal"]);
    add(dir.path(), &["Bob", "--channel", "2", "--category", "business"]);
    add(dir.path(), &["Chris", "--channel", "3"]);

    let business = list_json(dir.path(), &["--category", "business"]);
    assert_eq!(business.len(), 1);
    assert_eq!(business[0]["name"], "Bob");
    assert_eq!(list_json(dir.path(), &[]).len(), 3);
}

#[test]
fn test_contact_with_reset() {
    let dir = tempfile::tempdir().unwrap();
    let id = add(
        dir.path(),
        &["Jane", "--channel", "+1555", "--action", "call", "--last-contact", "2020-01-01"],
    );

    let stdout = run_ok(dir.path(), &["contact", &id[..8], "--yes", "--no-dispatch"]);
    assert!(stdout.contains("Reset: Jane"));

    let ranked = list_json(dir.path(), &[]);
    assert_eq!(ranked[0]["urgency_days"], -7);
}

#[test]
fn test_contact_without_reset() {
    let dir = tempfile::tempdir().unwrap();
    let id = add(
        dir.path(),
        &["Jane", "--channel", "+1555", "--action", "meetup", "--last-contact", "2020-01-01"],
    );

    let stdout = run_ok(dir.path(), &["contact", &id, "--no-reset", "--no-dispatch"]);
    assert!(stdout.contains("Not reset"));
    let ranked = list_json(dir.path(), &[]);
    assert!(ranked[0]["urgency_days"].as_i64().unwrap() > 0);
}

#[test]
fn test_reset_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let id = add(
        dir.path(),
        &["Jane", "--channel", "+1555", "--cadence", "daily", "--last-contact", "2020-01-01"],
    );
    run_ok(dir.path(), &["reset", &id]);

    let stdout = run_ok(dir.path(), &["show", &id, "--json"]);
    let shown: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(shown["urgency_days"], -1);
    assert_eq!(shown["status"]["kind"], "due_in");
}

#[test]
fn test_delete_requires_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let id = add(dir.path(), &["Jane", "--channel", "+1555"]);

    // No stdin: the prompt reads EOF and declines.
    let stdout = run_ok(dir.path(), &["delete", &id]);
    assert!(stdout.contains("Kept: Jane"));
    assert_eq!(list_json(dir.path(), &[]).len(), 1);

    run_ok(dir.path(), &["delete", &id, "--yes"]);
    assert!(list_json(dir.path(), &[]).is_empty());
}

#[test]
fn test_unknown_id_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["reset", "does-not-exist"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_commands() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        run_ok(dir.path(), &["config", "get", "touchpoints.default_cadence_days"]).trim(),
        "7"
    );
    run_ok(dir.path(), &["config", "set", "touchpoints.default_cadence_days", "14"]);
    let id = add(dir.path(), &["Jane", "--channel", "+1555"]);
    let stdout = run_ok(dir.path(), &["show", &id, "--json"]);
    let shown: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(shown["cadence_days"], 14);

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "touchpoints.default_cadence_days", "0"]);
    assert_ne!(code, 0);
    let (_, _, code) = run_cli(dir.path(), &["config", "get", "nope"]);
    assert_ne!(code, 0);

    run_ok(dir.path(), &["config", "reset"]);
    let listed: serde_json::Value =
        serde_json::from_str(&run_ok(dir.path(), &["config", "list"])).unwrap();
    assert_eq!(listed["touchpoints"]["default_cadence_days"], 7);
}
