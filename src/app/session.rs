// CrashWatch - app/session.rs
//
// Session sentinel lifecycle and startup crash detection.
//
// At session start a sentinel record is appended to the event log. It reads
// exactly like a captured failure ("Spontaneous shutdown - Sessão ID: <id>")
// so that, if the process dies before cleanup, the sentinel is the evidence.
// A graceful end removes that one block byte-for-byte; anything that skips
// the end (panic, kill, power loss) leaves it behind for the next start to
// find.
//
// Detection never removes anything. A crashed session's sentinel stays in
// the event log until the logs are cleared explicitly.
//
// Single-writer assumption: removal is a read-modify-write of the whole
// event log, serialised only within this process. Two processes ending
// sessions against the same file at the same time can lose an update; run
// one instance per log directory.

use crate::app::store::LogStore;
use crate::core::model::SessionId;
use crate::core::span::{self, BlockSearch};
use crate::util::constants::SYSTEM_ACTOR;
use crate::util::error::{SessionError, StoreError};

/// Result of `SessionTracker::begin_session`.
#[derive(Debug)]
pub struct SessionStarted {
    /// The id of the new, now current, session.
    pub id: SessionId,
    /// Set if the sentinel or narrative line could not be written. The
    /// session is started regardless.
    pub warning: Option<StoreError>,
}

/// Successful outcomes of `SessionTracker::end_session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The session's sentinel block was found and removed.
    Removed(SessionId),
    /// No active session, an empty log, or no sentinel for the session.
    NotFound,
}

/// Owns the current session id and drives the sentinel lifecycle.
#[derive(Debug)]
pub struct SessionTracker {
    store: LogStore,
    current: Option<SessionId>,
}

impl SessionTracker {
    /// Tracker in the idle state.
    pub fn new(store: LogStore) -> Self {
        Self {
            store,
            current: None,
        }
    }

    /// Tracker attached to a session started earlier, for instance by a
    /// host process that kept the id across a restart. No sentinel is
    /// written; `end_session` removes the existing one.
    pub fn resume(store: LogStore, id: SessionId) -> Self {
        tracing::info!(session_id = %id, "Resuming existing session");
        Self {
            store,
            current: Some(id),
        }
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// Id of the active session, if any.
    pub fn current_session(&self) -> Option<&SessionId> {
        self.current.as_ref()
    }

    /// Start a session for `actor` and write its sentinel.
    ///
    /// Starting while another session is active replaces the current id; the
    /// earlier sentinel stays in the log and will be reported as a crash.
    pub fn begin_session(&mut self, actor: &str) -> SessionStarted {
        if let Some(previous) = &self.current {
            tracing::warn!(
                previous = %previous,
                "Session started while another is active; its sentinel is left in place"
            );
        }

        let id = SessionId::generate();
        let sentinel = self.store.sentinel_record(actor, &id);

        let event = self.store.append_record(&sentinel);
        let narrative = self
            .store
            .append_narrative(actor, &format!("Session started - ID: {id}"));
        let warning = event.and(narrative).err();

        match &warning {
            None => tracing::info!(session_id = %id, actor, "Session started; sentinel written"),
            Some(e) => tracing::warn!(
                session_id = %id,
                actor,
                error = %e,
                "Session started but sentinel could not be logged"
            ),
        }

        self.current = Some(id.clone());
        SessionStarted { id, warning }
    }

    /// End the active session gracefully by removing its sentinel block.
    ///
    /// An absent or empty event log, or one without this session's marker,
    /// yields `NotFound`. The session id is cleared on every outcome except
    /// a store failure, which leaves the session active so the caller may
    /// retry.
    pub fn end_session(&mut self, actor: &str) -> Result<SessionEnd, SessionError> {
        let Some(id) = self.current.clone() else {
            tracing::warn!("No active session to end");
            return Ok(SessionEnd::NotFound);
        };

        let range = match self.store.remove_sentinel(&id) {
            Ok(BlockSearch::Found(range)) => range,
            Ok(BlockSearch::MarkerAbsent) => {
                tracing::warn!(session_id = %id, "Session sentinel not found in event log");
                self.current = None;
                return Ok(SessionEnd::NotFound);
            }
            Ok(BlockSearch::Damaged(missing)) => {
                tracing::error!(
                    session_id = %id,
                    missing = %missing,
                    "Sentinel block is damaged; event log left unmodified"
                );
                self.current = None;
                return Err(SessionError::StructuralMismatch {
                    session_id: id.to_string(),
                    missing,
                });
            }
            Err(e) => return Err(self.store_failure(e)),
        };
        tracing::debug!(session_id = %id, start = range.start, end = range.end, "Sentinel block removed");

        if let Err(e) = self
            .store
            .append_narrative(actor, &format!("Session ended normally - ID: {id}"))
        {
            tracing::warn!(error = %e, "Could not record session end in narrative log");
        }

        tracing::info!(session_id = %id, actor, "Session ended; sentinel removed");
        self.current = None;
        Ok(SessionEnd::Removed(id))
    }

    /// Record a store failure during `end_session` as an error record and
    /// hand it back wrapped for the caller.
    fn store_failure(&self, e: StoreError) -> SessionError {
        tracing::error!(error = %e, "Failed to remove session sentinel");
        // Best effort; a second failure is already routed to the fallback chain.
        let _ = self.store.log_error(
            SYSTEM_ACTOR,
            "SessionEndFailure",
            &format!("Failed to remove session sentinel: {e}"),
            "",
        );
        SessionError::Store(e)
    }

    /// True if any session's sentinel is still in the event log, meaning a
    /// previous run ended without `end_session`.
    ///
    /// Read-only with respect to the event log; appends a narrative line when
    /// a crash is detected. A read failure is logged and reported as `false`.
    pub fn detect_prior_crash(&self) -> bool {
        let content = match self.store.read_all() {
            Ok(Some(content)) => content,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read event log for crash detection");
                return false;
            }
        };

        if !span::contains_any_sentinel(&content) {
            return false;
        }

        tracing::warn!(
            sessions = span::sentinel_sessions(&content).len(),
            "Abnormal shutdown detected: spontaneous shutdown records present"
        );
        if let Err(e) = self.store.append_narrative(
            SYSTEM_ACTOR,
            "Abnormal shutdown detected - spontaneous shutdown records in log",
        ) {
            tracing::warn!(error = %e, "Could not record crash detection in narrative log");
        }
        true
    }

    /// Ids of every session whose sentinel is still in the event log, in
    /// file order. Includes the current session's own sentinel if active.
    pub fn orphaned_sessions(&self) -> Result<Vec<SessionId>, StoreError> {
        Ok(self
            .store
            .read_all()?
            .map(|content| span::sentinel_sessions(&content))
            .unwrap_or_default())
    }
}

// =============================================================================
// Unit tests
// =============================================================================
