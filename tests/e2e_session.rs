// CrashWatch - tests/e2e_session.rs
//
// End-to-end tests for the sentinel lifecycle.
//
// These tests exercise the real filesystem through the public library
// surface: a tracker is built, dropped, and a fresh tracker over the same
// directory plays the role of the next process start.

use chrono::{Duration, NaiveDate};
use crashwatch::app::fallback::{FallbackSink, FailedWrite, SinkChain};
use crashwatch::app::session::{SessionEnd, SessionTracker};
use crashwatch::app::store::LogStore;
use crashwatch::core::model::SessionId;
use crashwatch::core::record::format_record;
use crashwatch::platform::clock::FixedClock;
use crashwatch::platform::config::LogPaths;
use crashwatch::platform::host::HostInfo;
use crashwatch::util::error::SessionError;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

fn clock() -> Arc<FixedClock> {
    let start = NaiveDate::from_ymd_opt(2025, 9, 30)
        .unwrap()
        .and_hms_opt(17, 45, 10)
        .unwrap();
    Arc::new(FixedClock::new(start))
}

/// A store over `dir`, as a freshly started process would build it.
fn open_store(dir: &Path) -> LogStore {
    LogStore::new(
        LogPaths::in_dir(dir),
        clock(),
        HostInfo::fixed("WS-01", "linux x86_64"),
    )
}

fn open_tracker(dir: &Path) -> SessionTracker {
    SessionTracker::new(open_store(dir))
}

fn event_log(dir: &Path) -> Option<String> {
    open_store(dir).read_all().unwrap()
}

/// Write a sentinel block for `id` directly, as an earlier process would have.
fn write_sentinel(dir: &Path, id: &str) {
    let store = open_store(dir);
    let record = store.sentinel_record("alice", &SessionId::from(id));
    store.append_record(&record).unwrap();
}

// =============================================================================
// Lifecycle
// =============================================================================

/// A clean session leaves the event log byte-identical to before it began.
#[test]
fn e2e_graceful_session_round_trips_event_log() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    store.log_error("bob", "IoError", "disk full", "at save").unwrap();
    let before = event_log(dir.path());

    let mut tracker = open_tracker(dir.path());
    let started = tracker.begin_session("alice");
    assert_ne!(event_log(dir.path()), before);

    let outcome = tracker.end_session("alice").unwrap();
    assert_eq!(outcome, SessionEnd::Removed(started.id));
    assert_eq!(event_log(dir.path()), before);

    let narrative = store.read_narrative().unwrap().unwrap();
    assert!(narrative.contains("Session started - ID: "));
    assert!(narrative.contains("Session ended normally - ID: "));
}

/// A session that is never ended is found by the next process.
#[test]
fn e2e_crashed_session_is_detected_on_next_start() {
    let dir = TempDir::new().unwrap();
    let crashed_id = {
        let mut tracker = open_tracker(dir.path());
        tracker.begin_session("alice").id
        // Tracker dropped without end_session: the process "died".
    };

    let next = open_tracker(dir.path());
    assert!(next.current_session().is_none());
    assert!(next.detect_prior_crash());
    assert_eq!(next.orphaned_sessions().unwrap(), vec![crashed_id]);
}

/// Ending one session leaves other sessions' sentinels untouched.
#[test]
fn e2e_removal_only_touches_target_block() {
    let dir = TempDir::new().unwrap();
    let mut first = open_tracker(dir.path());
    let a = first.begin_session("alice").id;

    let mut second = open_tracker(dir.path());
    let b = second.begin_session("bob").id;
    let store = open_store(dir.path());
    let block_b = format_record(&store.sentinel_record("bob", &b));

    assert_eq!(first.end_session("alice").unwrap(), SessionEnd::Removed(a));
    let remaining = event_log(dir.path()).unwrap();
    assert_eq!(remaining, block_b);
    assert_eq!(second.orphaned_sessions().unwrap(), vec![b]);
}

/// Content without any delimiters yields a structural mismatch and is not modified.
#[test]
fn e2e_damaged_log_is_left_unmodified() {
    let dir = TempDir::new().unwrap();
    let mut tracker = open_tracker(dir.path());
    let id = tracker.begin_session("alice").id;

    let store = open_store(dir.path());
    let damaged = format!("free text mentioning {}\nand nothing else\n", id.marker());
    store.overwrite(&damaged).unwrap();

    let err = tracker.end_session("alice").unwrap_err();
    assert!(matches!(err, SessionError::StructuralMismatch { .. }));
    assert_eq!(event_log(dir.path()).as_deref(), Some(damaged.as_str()));
    assert!(tracker.current_session().is_none());

    // The tracker is idle again and does not retry.
    assert_eq!(tracker.end_session("alice").unwrap(), SessionEnd::NotFound);
}

// =============================================================================
// Detection scenarios
// =============================================================================

#[test]
fn e2e_empty_log_reports_no_crash() {
    let dir = TempDir::new().unwrap();
    assert!(!open_tracker(dir.path()).detect_prior_crash());

    open_store(dir.path()).overwrite("").unwrap();
    assert!(!open_tracker(dir.path()).detect_prior_crash());
}

/// A log holding only the sentinel for `abc12345`: detected, then removed
/// by ending that session, after which nothing is detected.
#[test]
fn e2e_known_sentinel_detect_remove_detect() {
    let dir = TempDir::new().unwrap();
    write_sentinel(dir.path(), "abc12345");

    let checker = open_tracker(dir.path());
    assert!(checker.detect_prior_crash());
    assert_eq!(
        checker.orphaned_sessions().unwrap(),
        vec![SessionId::from("abc12345")]
    );

    let mut tracker = SessionTracker::resume(open_store(dir.path()), SessionId::from("abc12345"));
    assert_eq!(
        tracker.end_session("alice").unwrap(),
        SessionEnd::Removed(SessionId::from("abc12345"))
    );
    assert!(tracker.current_session().is_none());

    assert_eq!(event_log(dir.path()).as_deref(), Some(""));
    assert!(!open_tracker(dir.path()).detect_prior_crash());

    // The log is empty now; ending again finds nothing.
    let mut again = SessionTracker::resume(open_store(dir.path()), SessionId::from("abc12345"));
    assert_eq!(again.end_session("alice").unwrap(), SessionEnd::NotFound);
    assert!(again.current_session().is_none());
}

/// Unrelated records keep their exact bytes, even when they are not UTF-8.
#[test]
fn e2e_graceful_session_preserves_non_utf8_bytes() {
    let dir = TempDir::new().unwrap();
    let path = LogPaths::in_dir(dir.path()).event_log;
    std::fs::write(&path, b"legacy \xC3\x28 bytes\n").unwrap();
    let before = std::fs::read(&path).unwrap();

    let mut tracker = open_tracker(dir.path());
    let started = tracker.begin_session("alice");
    assert_eq!(
        tracker.end_session("alice").unwrap(),
        SessionEnd::Removed(started.id)
    );
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

/// Detection leaves the event log exactly as it found it.
#[test]
fn e2e_detection_never_removes_records() {
    let dir = TempDir::new().unwrap();
    write_sentinel(dir.path(), "aaaa1111");
    write_sentinel(dir.path(), "bbbb2222");
    let before = event_log(dir.path());

    let tracker = open_tracker(dir.path());
    assert!(tracker.detect_prior_crash());
    assert!(tracker.detect_prior_crash());
    assert_eq!(event_log(dir.path()), before);
}

// =============================================================================
// Failure handling
// =============================================================================

struct AlwaysFails;

impl FallbackSink for AlwaysFails {
    fn name(&self) -> &'static str {
        "always fails"
    }
    fn deliver(&self, _write: &FailedWrite<'_>) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "sink down"))
    }
}

/// With the event log unwritable and every fallback failing, a session still
/// starts and the failure is only reported.
#[test]
fn e2e_unwritable_log_does_not_block_session_start() {
    let dir = TempDir::new().unwrap();
    let paths = LogPaths::in_dir(dir.path());
    std::fs::create_dir_all(&paths.event_log).unwrap();

    let store = LogStore::new(paths, clock(), HostInfo::fixed("WS-01", "linux"))
        .with_fallback(SinkChain::new(vec![Box::new(AlwaysFails)]));
    let mut tracker = SessionTracker::new(store);

    let started = tracker.begin_session("alice");
    assert!(started.warning.is_some());
    assert_eq!(tracker.current_session(), Some(&started.id));
}

/// Clearing the logs removes crash evidence; a later check is clean.
#[test]
fn e2e_clear_all_resets_detection() {
    let dir = TempDir::new().unwrap();
    write_sentinel(dir.path(), "abc12345");
    let tracker = open_tracker(dir.path());
    assert!(tracker.detect_prior_crash());

    tracker.store().clear_all().unwrap();
    assert!(event_log(dir.path()).is_none());
    assert!(!tracker.detect_prior_crash());
}

/// Timestamps come from the injected clock.
#[test]
fn e2e_records_use_injected_clock() {
    let dir = TempDir::new().unwrap();
    let fixed = clock();
    let store = LogStore::new(
        LogPaths::in_dir(dir.path()),
        fixed.clone(),
        HostInfo::fixed("WS-01", "linux"),
    );
    store.append_narrative("alice", "first").unwrap();
    fixed.advance(Duration::minutes(5));
    store.append_narrative("alice", "second").unwrap();

    assert_eq!(
        store.read_narrative().unwrap().unwrap(),
        "[30/09/2025 17:45:10] [alice] first\n[30/09/2025 17:50:10] [alice] second\n"
    );
}
