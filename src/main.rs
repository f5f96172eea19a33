// CrashWatch - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. Configuration loading and logging initialisation
// 3. Log store and session tracker construction
// 4. Dispatch to the requested command

use clap::{Parser, Subcommand, ValueEnum};
use crashwatch::app::session::{SessionEnd, SessionTracker};
use crashwatch::app::store::LogStore;
use crashwatch::core::model::SessionId;
use crashwatch::platform::config::{self, AppConfig, PlatformPaths};
use crashwatch::util::constants::{APP_NAME, APP_VERSION, SYSTEM_ACTOR};
use crashwatch::util::error::{Result, SessionError};
use crashwatch::util::logging;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

/// CrashWatch - detect abnormal termination of earlier sessions.
///
/// Each session writes a sentinel record to the event log and removes it on
/// a graceful end. A sentinel found at startup means an earlier run died.
#[derive(Parser, Debug)]
#[command(name = "crashwatch", version, about)]
struct Cli {
    /// Directory holding the log files (overrides config.toml).
    #[arg(short = 'l', long = "log-dir", global = true)]
    log_dir: Option<PathBuf>,

    /// Config file to use instead of the platform default.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report whether an earlier session ended abnormally (exit code 1 if so).
    Check {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run one session: write the sentinel, optionally run a command, and
    /// remove the sentinel if everything succeeded.
    Session {
        /// Who is running the session.
        #[arg(short = 'a', long)]
        actor: String,

        /// Simulate an unhandled failure with this message; the sentinel is
        /// left in place.
        #[arg(long, value_name = "MESSAGE", conflicts_with = "command")]
        fail: Option<String>,

        /// Command to run inside the session. A non-zero exit leaves the
        /// sentinel in place.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Append an error record to the event log.
    LogError {
        #[arg(short = 'a', long)]
        actor: String,

        /// Failure type name.
        #[arg(short = 'k', long, default_value = "Error")]
        kind: String,

        #[arg(short = 'm', long)]
        message: String,

        /// Stack trace or free-form detail.
        #[arg(long, default_value = "")]
        detail: String,
    },

    /// Print one of the logs.
    Show {
        #[arg(value_enum)]
        stream: Stream,

        /// Print as JSON (parsed records for the event log, lines for the
        /// narrative log).
        #[arg(long)]
        json: bool,
    },

    /// Delete every log file.
    Clear {
        /// Confirm deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Stream {
    Events,
    Narrative,
}

#[derive(Serialize)]
struct CheckReport {
    abnormal_shutdown: bool,
    orphaned_sessions: Vec<SessionId>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let platform_paths = PlatformPaths::resolve();
    let (mut app_config, warnings) = match &cli.config {
        Some(path) => match config::load_config_file(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::from(2);
            }
        },
        None => config::load_config(&platform_paths.config_dir),
    };

    logging::init(cli.debug, app_config.log_level.as_deref());
    for warning in &warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    tracing::info!(version = APP_VERSION, debug = cli.debug, "{APP_NAME} starting");

    if let Some(dir) = cli.log_dir.clone() {
        app_config.log_dir = Some(dir);
    }

    match run(cli.command, &app_config, &platform_paths) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, app_config: &AppConfig, platform_paths: &PlatformPaths) -> Result<ExitCode> {
    let paths = app_config.log_paths(&platform_paths.default_logs_dir());
    tracing::debug!(event_log = %paths.event_log.display(), "Using log directory");
    let mut tracker = SessionTracker::new(LogStore::open(paths));

    match command {
        Command::Check { json } => check(&tracker, json),
        Command::Session {
            actor,
            fail,
            command,
        } => run_session(&mut tracker, &actor, fail.as_deref(), &command),
        Command::LogError {
            actor,
            kind,
            message,
            detail,
        } => match tracker.store().log_error(&actor, &kind, &message, &detail) {
            Ok(()) => Ok(ExitCode::SUCCESS),
            Err(e) => {
                eprintln!("Warning: error was not written to the event log: {e}");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Show { stream, json } => show(tracker.store(), stream, json),
        Command::Clear { yes } => clear(tracker.store(), yes),
    }
}

fn check(tracker: &SessionTracker, json: bool) -> Result<ExitCode> {
    let report = CheckReport {
        abnormal_shutdown: tracker.detect_prior_crash(),
        orphaned_sessions: tracker.orphaned_sessions()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.abnormal_shutdown {
        println!("Abnormal shutdown detected. Sessions that never ended:");
        for id in &report.orphaned_sessions {
            println!("  {id}");
        }
    } else {
        println!("No abnormal shutdown recorded.");
    }

    Ok(if report.abnormal_shutdown {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_session(
    tracker: &mut SessionTracker,
    actor: &str,
    fail: Option<&str>,
    command: &[String],
) -> Result<ExitCode> {
    if tracker.detect_prior_crash() {
        let orphans = tracker.orphaned_sessions()?;
        eprintln!(
            "Warning: {} earlier session(s) ended abnormally; their records remain in the event log.",
            orphans.len()
        );
    }
    note(tracker.store(), SYSTEM_ACTOR, "System started");

    let started = tracker.begin_session(actor);
    println!("Session {} started for {actor}.", started.id);
    if let Some(e) = &started.warning {
        eprintln!("Warning: session sentinel could not be logged: {e}");
    }

    if let Some(message) = fail {
        return Ok(leave_sentinel(tracker, actor, "CriticalFailure", message));
    }

    if let Some((program, args)) = command.split_first() {
        tracing::info!(program = %program, args = args.len(), "Running command inside session");
        match std::process::Command::new(program).args(args).status() {
            Ok(status) if status.success() => {}
            Ok(status) => {
                let message = format!("'{program}' exited with {status}");
                return Ok(leave_sentinel(tracker, actor, "CommandFailure", &message));
            }
            Err(e) => {
                let message = format!("could not start '{program}': {e}");
                return Ok(leave_sentinel(tracker, actor, "CommandFailure", &message));
            }
        }
    }

    let code = match tracker.end_session(actor) {
        Ok(SessionEnd::Removed(id)) => {
            println!("Session {id} ended normally.");
            ExitCode::SUCCESS
        }
        Ok(SessionEnd::NotFound) => {
            println!("Session sentinel was already gone; nothing to remove.");
            ExitCode::SUCCESS
        }
        Err(e @ SessionError::StructuralMismatch { .. }) => {
            eprintln!("Warning: {e}");
            ExitCode::from(2)
        }
        Err(e) => return Err(e.into()),
    };
    note(tracker.store(), actor, "System shut down normally by user");
    Ok(code)
}

/// Log the failure and return without ending the session, so the sentinel
/// stays behind as evidence of the abnormal termination.
fn leave_sentinel(tracker: &SessionTracker, actor: &str, kind: &str, message: &str) -> ExitCode {
    if let Err(e) = tracker.store().log_error(actor, kind, message, "unhandled failure") {
        eprintln!("Warning: failure was not written to the event log: {e}");
    }
    eprintln!("Critical failure: {message}. Session left open.");
    ExitCode::FAILURE
}

fn show(store: &LogStore, stream: Stream, json: bool) -> Result<ExitCode> {
    match (stream, json) {
        (Stream::Events, true) => {
            println!("{}", serde_json::to_string_pretty(&store.read_records()?)?);
        }
        (Stream::Events, false) => match store.read_all()? {
            Some(content) if !content.is_empty() => print!("{content}"),
            _ => println!("No errors recorded."),
        },
        (Stream::Narrative, true) => {
            let content = store.read_narrative()?.unwrap_or_default();
            let lines: Vec<&str> = content.lines().collect();
            println!("{}", serde_json::to_string_pretty(&lines)?);
        }
        (Stream::Narrative, false) => match store.read_narrative()? {
            Some(content) if !content.is_empty() => print!("{content}"),
            _ => println!("No system events recorded."),
        },
    }
    Ok(ExitCode::SUCCESS)
}

fn clear(store: &LogStore, yes: bool) -> Result<ExitCode> {
    if !yes {
        eprintln!("Refusing to delete logs without --yes.");
        return Ok(ExitCode::from(2));
    }
    let removed = store.clear_all()?;
    println!("Removed {removed} log file(s).");
    note(store, SYSTEM_ACTOR, "Logs cleared by user");
    Ok(ExitCode::SUCCESS)
}

/// Append a narrative line, reporting but not propagating failure.
fn note(store: &LogStore, actor: &str, text: &str) {
    if let Err(e) = store.append_narrative(actor, text) {
        eprintln!("Warning: narrative log not updated: {e}");
    }
}
