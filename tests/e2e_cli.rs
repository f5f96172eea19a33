// CrashWatch - tests/e2e_cli.rs
//
// End-to-end tests for the command-line front end: exit codes and the
// files each command leaves behind. Every test runs the built binary
// against its own temporary log directory and an empty config file.

use crashwatch::app::store::LogStore;
use crashwatch::core::model::SessionId;
use crashwatch::platform::config::LogPaths;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

fn logs_dir(dir: &Path) -> PathBuf {
    dir.join("logs")
}

fn crashwatch(dir: &Path, args: &[&str]) -> Output {
    let config = dir.join("config.toml");
    if !config.exists() {
        std::fs::write(&config, "").unwrap();
    }
    Command::new(env!("CARGO_BIN_EXE_crashwatch"))
        .arg("--log-dir")
        .arg(logs_dir(dir))
        .arg("--config")
        .arg(&config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn exit_code(output: &Output) -> i32 {
    output.status.code().expect("process exited by signal")
}

fn event_log(dir: &Path) -> Option<String> {
    LogStore::open(LogPaths::in_dir(&logs_dir(dir)))
        .read_all()
        .unwrap()
}

fn write_sentinel(dir: &Path, id: &str) {
    let store = LogStore::open(LogPaths::in_dir(&logs_dir(dir)));
    let record = store.sentinel_record("alice", &SessionId::from(id));
    store.append_record(&record).unwrap();
}

// =============================================================================
// check
// =============================================================================

#[test]
fn e2e_cli_check_clean_exits_zero() {
    let dir = TempDir::new().unwrap();
    let output = crashwatch(dir.path(), &["check"]);
    assert_eq!(exit_code(&output), 0);
    assert!(String::from_utf8_lossy(&output.stdout).contains("No abnormal shutdown"));
}

#[test]
fn e2e_cli_check_reports_crash_with_exit_one() {
    let dir = TempDir::new().unwrap();
    write_sentinel(dir.path(), "abc12345");

    let output = crashwatch(dir.path(), &["check", "--json"]);
    assert_eq!(exit_code(&output), 1);

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["abnormal_shutdown"], true);
    assert_eq!(report["orphaned_sessions"], serde_json::json!(["abc12345"]));
}

// =============================================================================
// session
// =============================================================================

#[test]
fn e2e_cli_clean_session_leaves_no_sentinel() {
    let dir = TempDir::new().unwrap();
    let output = crashwatch(dir.path(), &["session", "--actor", "alice"]);
    assert_eq!(exit_code(&output), 0);
    assert_eq!(event_log(dir.path()).as_deref(), Some(""));
    assert_eq!(exit_code(&crashwatch(dir.path(), &["check"])), 0);
}

#[test]
fn e2e_cli_failed_session_leaves_sentinel_with_exit_one() {
    let dir = TempDir::new().unwrap();
    let output = crashwatch(dir.path(), &["session", "--actor", "alice", "--fail", "boom"]);
    assert_eq!(exit_code(&output), 1);

    let log = event_log(dir.path()).unwrap();
    assert!(log.contains("Spontaneous shutdown - Sessão ID: "));
    assert!(log.contains("Message: boom"));
    assert_eq!(exit_code(&crashwatch(dir.path(), &["check"])), 1);
}

/// The child command strips the open delimiter from the event log, so the
/// graceful end finds a damaged block.
#[cfg(unix)]
#[test]
fn e2e_cli_damaged_sentinel_exits_two() {
    let dir = TempDir::new().unwrap();
    let path = LogPaths::in_dir(&logs_dir(dir.path())).event_log;
    let path_arg = path.to_string_lossy().into_owned();
    let script = r#"grep -v '^=== ERROR RECORDED ===$' "$0" > "$0.new"; mv "$0.new" "$0""#;

    let output = crashwatch(
        dir.path(),
        &["session", "--actor", "alice", "--", "sh", "-c", script, &path_arg],
    );
    assert_eq!(exit_code(&output), 2);

    let log = event_log(dir.path()).unwrap();
    assert!(log.contains("Spontaneous shutdown - Sessão ID: "));
    assert!(!log.contains("=== ERROR RECORDED ==="));
}

// =============================================================================
// clear
// =============================================================================

#[test]
fn e2e_cli_clear_requires_confirmation() {
    let dir = TempDir::new().unwrap();
    write_sentinel(dir.path(), "abc12345");

    assert_eq!(exit_code(&crashwatch(dir.path(), &["clear"])), 2);
    assert!(event_log(dir.path()).is_some());

    assert_eq!(exit_code(&crashwatch(dir.path(), &["clear", "--yes"])), 0);
    assert!(event_log(dir.path()).is_none());
    assert_eq!(exit_code(&crashwatch(dir.path(), &["check"])), 0);
}

#[test]
fn e2e_cli_unreadable_config_exits_two() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "this is [not toml").unwrap();
    assert_eq!(exit_code(&crashwatch(dir.path(), &["check"])), 2);
}
