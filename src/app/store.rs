// CrashWatch - app/store.rs
//
// Append-only persistence for the event log (delimited error and sentinel
// records) and the narrative log (one timestamped line per event).
//
// Failure policy:
//   - Appends that fail are handed to the fallback chain (emergency file,
//     then console) and the error is returned for reporting only; callers
//     never abort their primary operation on it.
//   - Reading a log that does not exist yields `None`, never an error.
//   - Appends, overwrites and sentinel removal are serialised by an
//     in-process lock; removal holds it across read, cut and rewrite.
//     Nothing is locked across processes: two instances sharing one event
//     log can lose an update when a sentinel removal races an append.
//   - Sentinel removal works on raw bytes. Text reads decode lossily and are
//     for display only.

use crate::app::fallback::{FailedWrite, SinkChain};
use crate::core::model::{Record, RecordContext, SessionId};
use crate::core::record::{format_narrative_line, format_record, parse_records};
use crate::core::span::{self, BlockSearch};
use crate::platform::clock::{Clock, SystemClock};
use crate::platform::config::LogPaths;
use crate::platform::fs;
use crate::platform::host::HostInfo;
use crate::util::error::StoreError;
use chrono::NaiveDateTime;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const EVENT_STREAM: &str = "event log";
const NARRATIVE_STREAM: &str = "narrative log";

/// Durable storage for both log streams.
#[derive(Debug)]
pub struct LogStore {
    paths: LogPaths,
    clock: Arc<dyn Clock>,
    host: HostInfo,
    fallback: SinkChain,
    write_lock: Mutex<()>,
}

impl LogStore {
    /// Store over `paths` with an injected clock and host description.
    /// Failed appends fall back to the emergency file, then the console.
    pub fn new(paths: LogPaths, clock: Arc<dyn Clock>, host: HostInfo) -> Self {
        let fallback = SinkChain::standard(paths.emergency_log.clone());
        Self {
            paths,
            clock,
            host,
            fallback,
            write_lock: Mutex::new(()),
        }
    }

    /// Store over `paths` using the system clock and detected host info.
    pub fn open(paths: LogPaths) -> Self {
        Self::new(paths, Arc::new(SystemClock), HostInfo::detect())
    }

    /// Replace the fallback chain.
    pub fn with_fallback(mut self, fallback: SinkChain) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn paths(&self) -> &LogPaths {
        &self.paths
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Record construction
    // -------------------------------------------------------------------------

    fn context(&self, detail: &str) -> RecordContext {
        RecordContext {
            detail: detail.to_string(),
            host: self.host.host.clone(),
            os: self.host.os.clone(),
        }
    }

    /// Build an error record stamped with the current time and host.
    pub fn error_record(&self, actor: &str, kind: &str, message: &str, detail: &str) -> Record {
        Record::error(actor, self.now(), kind, message, self.context(detail))
    }

    /// Build the sentinel record for `session`.
    pub fn sentinel_record(&self, actor: &str, session: &SessionId) -> Record {
        Record::sentinel(actor, self.now(), session, self.context(""))
    }

    // -------------------------------------------------------------------------
    // Appends
    // -------------------------------------------------------------------------

    /// Append one record block to the event log.
    pub fn append_record(&self, record: &Record) -> Result<(), StoreError> {
        let block = format_record(record);
        self.append(EVENT_STREAM, &self.paths.event_log, &block)
    }

    /// Append one `[timestamp] [actor] text` line to the narrative log.
    pub fn append_narrative(&self, actor: &str, text: &str) -> Result<(), StoreError> {
        let line = format!("{}\n", format_narrative_line(&self.now(), actor, text));
        self.append(NARRATIVE_STREAM, &self.paths.narrative_log, &line)
    }

    /// Record a failure: an error block in the event log plus an
    /// `ERROR: <message>` line in the narrative log.
    ///
    /// Both writes are attempted; the first failure is returned.
    pub fn log_error(
        &self,
        actor: &str,
        kind: &str,
        message: &str,
        detail: &str,
    ) -> Result<(), StoreError> {
        let record = self.error_record(actor, kind, message, detail);
        let event = self.append_record(&record);
        let narrative = self.append_narrative(actor, &format!("ERROR: {message}"));
        tracing::info!(actor, kind, "Error recorded");
        event.and(narrative)
    }

    fn append(&self, stream: &'static str, path: &Path, text: &str) -> Result<(), StoreError> {
        let result = {
            let _guard = self.lock();
            fs::append_text(path, text)
        };

        result.map_err(|e| {
            self.fallback.deliver(&FailedWrite {
                stream,
                failure: e.to_string(),
                payload: text,
            });
            StoreError::io("append", path, e)
        })
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Full event-log content, or `None` if the file does not exist.
    pub fn read_all(&self) -> Result<Option<String>, StoreError> {
        fs::read_optional(&self.paths.event_log)
            .map_err(|e| StoreError::io("read", &self.paths.event_log, e))
    }

    /// Full narrative-log content, or `None` if the file does not exist.
    pub fn read_narrative(&self) -> Result<Option<String>, StoreError> {
        fs::read_optional(&self.paths.narrative_log)
            .map_err(|e| StoreError::io("read", &self.paths.narrative_log, e))
    }

    /// Every well-formed record in the event log, in file order.
    pub fn read_records(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .read_all()?
            .map(|content| parse_records(&content))
            .unwrap_or_default())
    }

    // -------------------------------------------------------------------------
    // Rewrites
    // -------------------------------------------------------------------------

    /// `content` without the byte range `[start, end)`. Pure.
    ///
    /// Offsets past the end are clamped. An inverted range, or one that
    /// would split a character, leaves the content unchanged.
    pub fn delete_range(content: &str, start: usize, end: usize) -> String {
        String::from_utf8(span::delete_range(content.as_bytes(), start, end))
            .unwrap_or_else(|_| content.to_string())
    }

    /// Replace the whole event log with `content`.
    pub fn overwrite(&self, content: &str) -> Result<(), StoreError> {
        let _guard = self.lock();
        self.write_event_log(content.as_bytes())
    }

    /// Cut the sentinel block of `session` out of the event log.
    ///
    /// Read, locate, cut and rewrite happen under one lock and on raw bytes,
    /// so concurrent in-process appends are not lost and the surrounding
    /// records keep their exact bytes. The file is rewritten only when the
    /// result is `Found`; an absent or empty log yields `MarkerAbsent`.
    pub fn remove_sentinel(&self, session: &SessionId) -> Result<BlockSearch, StoreError> {
        let _guard = self.lock();
        let content = fs::read_bytes_optional(&self.paths.event_log)
            .map_err(|e| StoreError::io("read", &self.paths.event_log, e))?
            .unwrap_or_default();

        let search = span::locate_sentinel_block(&content, session);
        if let BlockSearch::Found(range) = &search {
            let remaining = span::delete_range(&content, range.start, range.end);
            self.write_event_log(&remaining)?;
        }
        Ok(search)
    }

    fn write_event_log(&self, content: &[u8]) -> Result<(), StoreError> {
        fs::write_atomic(&self.paths.event_log, content)
            .map_err(|e| StoreError::io("overwrite", &self.paths.event_log, e))?;
        tracing::debug!(path = %self.paths.event_log.display(), bytes = content.len(), "Event log rewritten");
        Ok(())
    }

    /// Delete every known log file that exists.
    ///
    /// Every file is attempted even after a failure; the first failure is
    /// returned. On success, returns how many files were removed.
    pub fn clear_all(&self) -> Result<usize, StoreError> {
        let _guard = self.lock();
        let mut removed = 0;
        let mut first_error = None;

        for path in self.paths.all() {
            match fs::remove_if_present(path) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to delete log file");
                    first_error.get_or_insert(StoreError::io("delete", path, e));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!(removed, "Log files cleared");
                Ok(removed)
            }
        }
    }
}
