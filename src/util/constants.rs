// CrashWatch - util/constants.rs
//
// Single source of truth for all named constants, literals, and defaults.
// The event-log literals below are part of the on-disk format; changing any
// of them makes existing log files unreadable to sentinel removal.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "CrashWatch";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "CrashWatch";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Event-log block format
// =============================================================================

/// First line of every event-log record.
pub const BLOCK_OPEN: &str = "=== ERROR RECORDED ===";

/// Last line of every event-log record. Must never occur inside `BLOCK_OPEN`.
pub const BLOCK_CLOSE: &str = "========================";

/// Field keys in serialisation order.
pub const FIELD_ACTOR: &str = "Actor";
pub const FIELD_TIMESTAMP: &str = "Timestamp";
pub const FIELD_KIND: &str = "Kind";
pub const FIELD_MESSAGE: &str = "Message";
pub const FIELD_DETAIL: &str = "StackOrDetail";
pub const FIELD_HOST: &str = "Host";
pub const FIELD_OS: &str = "OS";

/// chrono format string used for every timestamp written to either log.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

// =============================================================================
// Session sentinel
// =============================================================================

/// Text that precedes the session id inside a sentinel record's message.
/// Crash detection matches on this prefix alone.
pub const SENTINEL_MARKER_PREFIX: &str = "Spontaneous shutdown - Sessão ID: ";

/// Kind written on sentinel records. Identical to a generic failure so a
/// leftover sentinel reads as the evidence of the crash it represents.
pub const SENTINEL_KIND: &str = "Error";

/// Detail written on sentinel records.
pub const SENTINEL_DETAIL: &str = "session sentinel; removed on graceful shutdown";

/// Number of hex characters kept from the random UUID for a session id.
pub const SESSION_ID_LEN: usize = 8;

/// Actor used for records written by the application itself.
pub const SYSTEM_ACTOR: &str = "System";

// =============================================================================
// File names and defaults
// =============================================================================

/// Default event-log file name.
pub const DEFAULT_EVENT_LOG_FILE: &str = "error_log.txt";

/// Default narrative-log file name.
pub const DEFAULT_NARRATIVE_LOG_FILE: &str = "system_log.txt";

/// Default emergency file used when the primary logs cannot be written.
pub const DEFAULT_EMERGENCY_LOG_FILE: &str = "critical_error.txt";

/// Additional files removed by `clear_all` (login logs written by the host
/// application's collaborators).
pub const DEFAULT_EXTRA_LOG_FILES: &[&str] = &["login_log.txt", "login_attempts.txt"];

/// Suffix of the sibling temp file used during atomic overwrite.
pub const OVERWRITE_TEMP_SUFFIX: &str = "tmp";

/// Maximum number of extra files accepted from config.toml.
pub const MAX_EXTRA_LOG_FILES: usize = 32;

/// Maximum payload characters copied into an emergency notice.
pub const EMERGENCY_PAYLOAD_PREVIEW: usize = 200;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Subdirectory of the platform data directory holding the log files.
pub const LOGS_DIR_NAME: &str = "logs";
