// CrashWatch - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation. All errors preserve the causal chain
// for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all CrashWatch operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum CrashWatchError {
    /// Log store read/write failed.
    Store(StoreError),

    /// Session sentinel lifecycle failed.
    Session(SessionError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// Output serialisation failed.
    Json(serde_json::Error),
}

impl fmt::Display for CrashWatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "Log store error: {e}"),
            Self::Session(e) => write!(f, "Session error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Json(e) => write!(f, "JSON output error: {e}"),
        }
    }
}

impl std::error::Error for CrashWatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Session(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for CrashWatchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors raised by the log store. Always recoverable: callers report them
/// and carry on with their primary operation.
#[derive(Debug)]
pub enum StoreError {
    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl StoreError {
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation,
            source,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<StoreError> for CrashWatchError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

/// Which block delimiter could not be found around a sentinel marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Open,
    Close,
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("opening"),
            Self::Close => f.write_str("closing"),
        }
    }
}

/// Errors raised while ending a session.
#[derive(Debug)]
pub enum SessionError {
    /// The event log could not be read or rewritten. The session stays active.
    Store(StoreError),

    /// The marker was found but the enclosing block is damaged. The event
    /// log was left unmodified and the session was cleared.
    StructuralMismatch {
        session_id: String,
        missing: Delimiter,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "{e}"),
            Self::StructuralMismatch {
                session_id,
                missing,
            } => write!(
                f,
                "Sentinel for session '{session_id}' has no {missing} delimiter; \
                 event log left unmodified"
            ),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::StructuralMismatch { .. } => None,
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<SessionError> for CrashWatchError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for CrashWatchError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for CrashWatch results.
pub type Result<T> = std::result::Result<T, CrashWatchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_store_error_display_includes_path_and_operation() {
        let err = StoreError::io(
            "append",
            "/tmp/error_log.txt",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let text = err.to_string();
        assert!(text.contains("append"));
        assert!(text.contains("/tmp/error_log.txt"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_structural_mismatch_names_delimiter() {
        let err = SessionError::StructuralMismatch {
            session_id: "abc12345".to_string(),
            missing: Delimiter::Close,
        };
        let text = err.to_string();
        assert!(text.contains("abc12345"));
        assert!(text.contains("closing"));
        assert!(err.source().is_none());
    }

    #[test]
    fn test_top_level_preserves_chain() {
        let inner = StoreError::io(
            "read",
            "x",
            io::Error::new(io::ErrorKind::Other, "boom"),
        );
        let top: CrashWatchError = SessionError::from(inner).into();
        let session = top.source().expect("session layer");
        let store = session.source().expect("store layer");
        assert!(store.source().is_some());
    }
}
