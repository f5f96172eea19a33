// CrashWatch - platform/config.rs
//
// Platform-specific configuration, data directory resolution, and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for CrashWatch data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/crashwatch/ or %APPDATA%\CrashWatch\config\)
    pub config_dir: PathBuf,

    /// Data directory; log files live in its `logs/` subdirectory by default.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }

    /// Default directory for the event, narrative and emergency logs.
    pub fn default_logs_dir(&self) -> PathBuf {
        self.data_dir.join(constants::LOGS_DIR_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[storage]` section.
    pub storage: StorageSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[storage]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory holding all log files.
    pub log_dir: Option<String>,
    /// Event-log file name.
    pub event_log_file: Option<String>,
    /// Narrative-log file name.
    pub narrative_log_file: Option<String>,
    /// Emergency file name.
    pub emergency_log_file: Option<String>,
    /// Additional file names removed by "clear logs".
    pub extra_files: Option<Vec<String>>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Storage --
    /// Log directory override. `None` means the platform default.
    pub log_dir: Option<PathBuf>,
    pub event_log_file: String,
    pub narrative_log_file: String,
    pub emergency_log_file: String,
    pub extra_files: Vec<String>,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            event_log_file: constants::DEFAULT_EVENT_LOG_FILE.to_string(),
            narrative_log_file: constants::DEFAULT_NARRATIVE_LOG_FILE.to_string(),
            emergency_log_file: constants::DEFAULT_EMERGENCY_LOG_FILE.to_string(),
            extra_files: constants::DEFAULT_EXTRA_LOG_FILES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            log_level: None,
        }
    }
}

impl AppConfig {
    /// Resolve concrete log file paths. `default_dir` is used unless the
    /// config names a log directory.
    pub fn log_paths(&self, default_dir: &Path) -> LogPaths {
        let dir = self.log_dir.as_deref().unwrap_or(default_dir);
        LogPaths {
            event_log: dir.join(&self.event_log_file),
            narrative_log: dir.join(&self.narrative_log_file),
            emergency_log: dir.join(&self.emergency_log_file),
            extra: self.extra_files.iter().map(|f| dir.join(f)).collect(),
        }
    }
}

/// Concrete locations of every file the log store manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    pub event_log: PathBuf,
    pub narrative_log: PathBuf,
    pub emergency_log: PathBuf,
    /// Files owned by collaborators that "clear logs" also removes.
    pub extra: Vec<PathBuf>,
}

impl LogPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        AppConfig::default().log_paths(dir)
    }

    /// Every known file, primary logs first.
    pub fn all(&self) -> impl Iterator<Item = &Path> {
        [&self.event_log, &self.narrative_log, &self.emergency_log]
            .into_iter()
            .chain(self.extra.iter())
            .map(PathBuf::as_path)
    }
}

/// A file name is usable if it is a single, non-empty path component.
fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && name.trim() == name
}

/// Validate one file-name field, pushing a warning if it is rejected.
fn apply_file_name(
    field: &str,
    value: &Option<String>,
    target: &mut String,
    warnings: &mut Vec<String>,
) {
    if let Some(name) = value {
        if is_bare_file_name(name) {
            *target = name.clone();
        } else {
            warnings.push(format!(
                "[storage] {field} = \"{name}\" must be a plain file name. Using default ({target}).",
            ));
        }
    }
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first-run).
/// If the file is unreadable or unparseable, returns defaults with a warning
/// so the application still starts but the user is informed.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    match load_config_file(&config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            (AppConfig::default(), vec![msg])
        }
    }
}

/// Load and validate an explicitly named config file.
///
/// Unlike `load_config`, a missing or unparseable file is an error: the user
/// asked for this file by name.
pub fn load_config_file(config_path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
        path: config_path.to_path_buf(),
        source,
    })?;

    let raw: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: config_path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %config_path.display(), "Loaded config file");
    Ok(validate(raw))
}

/// Validate each field, accumulating all warnings.
fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = AppConfig::default();

    // -- Storage: log_dir --
    if let Some(ref dir) = raw.storage.log_dir {
        if dir.trim().is_empty() {
            warnings.push(
                "[storage] log_dir is empty. Using the platform data directory.".to_string(),
            );
        } else {
            config.log_dir = Some(PathBuf::from(dir));
        }
    }

    // -- Storage: file names --
    apply_file_name(
        "event_log_file",
        &raw.storage.event_log_file,
        &mut config.event_log_file,
        &mut warnings,
    );
    apply_file_name(
        "narrative_log_file",
        &raw.storage.narrative_log_file,
        &mut config.narrative_log_file,
        &mut warnings,
    );
    apply_file_name(
        "emergency_log_file",
        &raw.storage.emergency_log_file,
        &mut config.emergency_log_file,
        &mut warnings,
    );

    // -- Storage: extra_files --
    if let Some(ref extra) = raw.storage.extra_files {
        if extra.len() > constants::MAX_EXTRA_LOG_FILES {
            warnings.push(format!(
                "[storage] extra_files lists {} files, maximum is {}. Using default.",
                extra.len(),
                constants::MAX_EXTRA_LOG_FILES,
            ));
        } else {
            let (good, bad): (Vec<&String>, Vec<&String>) =
                extra.iter().partition(|name| is_bare_file_name(name));
            for name in bad {
                warnings.push(format!(
                    "[storage] extra_files entry \"{name}\" must be a plain file name. Ignored.",
                ));
            }
            config.extra_files = good.into_iter().cloned().collect();
        }
    }

    // The three primary names must stay distinct or the stores would share a file.
    if config.event_log_file == config.narrative_log_file
        || config.event_log_file == config.emergency_log_file
        || config.narrative_log_file == config.emergency_log_file
    {
        warnings.push(
            "[storage] event, narrative and emergency file names must differ. Using defaults."
                .to_string(),
        );
        let defaults = AppConfig::default();
        config.event_log_file = defaults.event_log_file;
        config.narrative_log_file = defaults.narrative_log_file;
        config.emergency_log_file = defaults.emergency_log_file;
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}
