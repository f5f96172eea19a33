// CrashWatch - app/fallback.rs
//
// Best-effort delivery of log writes that the primary log files rejected.
//
// The chain is an ordered list of sinks. Each is tried in turn until one
// accepts the notice; a sink that fails is logged and skipped. The chain
// itself never returns an error, so a logging failure cannot reach the
// business operation that triggered it.

use crate::platform::fs;
use crate::util::constants::EMERGENCY_PAYLOAD_PREVIEW;
use std::io::{self, Write};
use std::path::PathBuf;

/// A failed primary write, described for the fallback sinks.
#[derive(Debug, Clone)]
pub struct FailedWrite<'a> {
    /// Which stream the payload was meant for (`event log`, `narrative log`).
    pub stream: &'static str,
    /// Why the primary write failed.
    pub failure: String,
    /// The text that could not be written.
    pub payload: &'a str,
}

impl FailedWrite<'_> {
    /// One-line notice: `CRITICAL: <failure> | ORIGINAL: <payload preview>`.
    pub fn notice(&self) -> String {
        let flat: String = self
            .payload
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let preview: String = flat.chars().take(EMERGENCY_PAYLOAD_PREVIEW).collect();
        format!(
            "CRITICAL ({}): {} | ORIGINAL: {}",
            self.stream, self.failure, preview
        )
    }
}

/// A destination for notices about failed log writes.
pub trait FallbackSink: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    fn deliver(&self, write: &FailedWrite<'_>) -> io::Result<()>;
}

/// Appends notices to a dedicated emergency file.
#[derive(Debug, Clone)]
pub struct EmergencyFileSink {
    path: PathBuf,
}

impl EmergencyFileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl FallbackSink for EmergencyFileSink {
    fn name(&self) -> &'static str {
        "emergency file"
    }

    fn deliver(&self, write: &FailedWrite<'_>) -> io::Result<()> {
        fs::append_text(&self.path, &format!("{}\n", write.notice()))
    }
}

/// Writes notices to stderr. The last resort.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl FallbackSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn deliver(&self, write: &FailedWrite<'_>) -> io::Result<()> {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "LOGGING FAILURE: {}", write.notice())
    }
}

/// Ordered list of fallback sinks.
pub struct SinkChain {
    sinks: Vec<Box<dyn FallbackSink>>,
}

impl SinkChain {
    pub fn new(sinks: Vec<Box<dyn FallbackSink>>) -> Self {
        Self { sinks }
    }

    /// Emergency file first, then the console.
    pub fn standard(emergency_path: PathBuf) -> Self {
        Self::new(vec![
            Box::new(EmergencyFileSink::new(emergency_path)),
            Box::new(ConsoleSink),
        ])
    }

    /// Offer `write` to each sink in order.
    ///
    /// Returns the name of the sink that accepted it, or `None` when every
    /// sink failed and the notice was lost.
    pub fn deliver(&self, write: &FailedWrite<'_>) -> Option<&'static str> {
        for sink in &self.sinks {
            match sink.deliver(write) {
                Ok(()) => {
                    tracing::warn!(
                        sink = sink.name(),
                        stream = write.stream,
                        failure = %write.failure,
                        "Primary log write failed; notice sent to fallback sink"
                    );
                    return Some(sink.name());
                }
                Err(e) => {
                    tracing::error!(
                        sink = sink.name(),
                        stream = write.stream,
                        error = %e,
                        "Fallback sink failed"
                    );
                }
            }
        }
        tracing::error!(
            stream = write.stream,
            failure = %write.failure,
            "All fallback sinks failed; log write lost"
        );
        None
    }
}

impl std::fmt::Debug for SinkChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|s| s.name()))
            .finish()
    }
}
