// CrashWatch - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies. These types are the shared vocabulary across all layers.

use crate::util::constants::{
    SENTINEL_DETAIL, SENTINEL_KIND, SENTINEL_MARKER_PREFIX, SESSION_ID_LEN,
};
use chrono::NaiveDateTime;
use serde::Serialize;

// =============================================================================
// Record (one event-log block)
// =============================================================================

/// A single event-log entry.
///
/// Serialised as a delimited block by `core::record::format_record`. The
/// field order on disk is fixed: actor, timestamp, kind, message, then the
/// context fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Who was acting when the record was written (user name or `System`).
    pub actor: String,

    /// Local wall-clock time at which the record was written.
    pub timestamp: NaiveDateTime,

    /// Failure type name. Sentinels use the same kind as a generic error.
    pub kind: String,

    /// Human-readable failure message.
    pub message: String,

    /// Detail and environment captured with the record.
    pub context: RecordContext,
}

/// Environment fields written after the message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordContext {
    /// Stack trace or free-form detail. May be empty.
    pub detail: String,
    /// Machine name.
    pub host: String,
    /// Operating system description.
    pub os: String,
}

impl Record {
    /// Build a generic error record.
    pub fn error(
        actor: &str,
        timestamp: NaiveDateTime,
        kind: &str,
        message: &str,
        context: RecordContext,
    ) -> Self {
        Self {
            actor: actor.to_string(),
            timestamp,
            kind: kind.to_string(),
            message: message.to_string(),
            context,
        }
    }

    /// Build the sentinel record for `session`.
    ///
    /// `detail` in `context` is replaced with the sentinel detail text.
    pub fn sentinel(
        actor: &str,
        timestamp: NaiveDateTime,
        session: &SessionId,
        context: RecordContext,
    ) -> Self {
        Self {
            actor: actor.to_string(),
            timestamp,
            kind: SENTINEL_KIND.to_string(),
            message: session.marker(),
            context: RecordContext {
                detail: SENTINEL_DETAIL.to_string(),
                ..context
            },
        }
    }

    /// Session id embedded in this record's message, if it is a sentinel.
    pub fn sentinel_session(&self) -> Option<SessionId> {
        let rest = self.message.split_once(SENTINEL_MARKER_PREFIX)?.1;
        SessionId::parse_prefix(rest)
    }
}

// =============================================================================
// SessionId
// =============================================================================

/// Opaque per-session correlation token.
///
/// Used only to find the sentinel block that belongs to a session; it is not
/// a security credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh id from the first hex characters of a random UUIDv4.
    pub fn generate() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(hex[..SESSION_ID_LEN].to_string())
    }

    /// Read an id token from the start of `text`.
    ///
    /// The token runs until the first character that is not ASCII
    /// alphanumeric. Returns `None` for an empty token.
    pub fn parse_prefix(text: &str) -> Option<Self> {
        let end = text
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(text.len());
        if end == 0 {
            None
        } else {
            Some(Self(text[..end].to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact marker text written into this session's sentinel message.
    pub fn marker(&self) -> String {
        format!("{SENTINEL_MARKER_PREFIX}{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
