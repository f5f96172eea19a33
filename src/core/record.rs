// CrashWatch - core/record.rs
//
// Text format of the event log and the narrative log.
// Core layer: works on strings only, never touches the filesystem.
//
// Event-log block layout (one field per line, fixed order):
//
//   === ERROR RECORDED ===
//   Actor: <actor>
//   Timestamp: <dd/mm/yyyy hh:mm:ss>
//   Kind: <kind>
//   Message: <message>
//   StackOrDetail: <detail>
//   Host: <host>
//   OS: <os>
//   ========================
//   <blank line>

use crate::core::model::{Record, RecordContext};
use crate::util::constants::{
    BLOCK_CLOSE, BLOCK_OPEN, FIELD_ACTOR, FIELD_DETAIL, FIELD_HOST, FIELD_KIND, FIELD_MESSAGE,
    FIELD_OS, FIELD_TIMESTAMP, TIMESTAMP_FORMAT,
};
use chrono::NaiveDateTime;
use std::borrow::Cow;

/// Serialise a record as one event-log block, including its trailing
/// blank line.
pub fn format_record(record: &Record) -> String {
    let timestamp = format_timestamp(&record.timestamp);
    let fields: [(&str, &str); 7] = [
        (FIELD_ACTOR, record.actor.as_str()),
        (FIELD_TIMESTAMP, timestamp.as_str()),
        (FIELD_KIND, record.kind.as_str()),
        (FIELD_MESSAGE, record.message.as_str()),
        (FIELD_DETAIL, record.context.detail.as_str()),
        (FIELD_HOST, record.context.host.as_str()),
        (FIELD_OS, record.context.os.as_str()),
    ];

    let mut out = String::with_capacity(256);
    out.push_str(BLOCK_OPEN);
    out.push('\n');
    for (key, value) in fields {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(&single_line(value));
        out.push('\n');
    }
    out.push_str(BLOCK_CLOSE);
    out.push('\n');
    out.push('\n');
    out
}

/// Format one narrative-log line (without the line terminator).
pub fn format_narrative_line(timestamp: &NaiveDateTime, actor: &str, text: &str) -> String {
    format!(
        "[{}] [{}] {}",
        format_timestamp(timestamp),
        single_line(actor),
        single_line(text)
    )
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Replace CR/LF with spaces so a value can never spill onto a line of its
/// own and be mistaken for a delimiter.
fn single_line(value: &str) -> Cow<'_, str> {
    if value.contains(['\r', '\n']) {
        Cow::Owned(value.replace("\r\n", " ").replace(['\r', '\n'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Fields collected between an open and a close delimiter.
#[derive(Default)]
struct PartialRecord {
    actor: Option<String>,
    timestamp: Option<NaiveDateTime>,
    kind: Option<String>,
    message: Option<String>,
    context: RecordContext,
}

impl PartialRecord {
    fn set(&mut self, key: &str, value: &str) {
        match key {
            FIELD_ACTOR => self.actor = Some(value.to_string()),
            FIELD_TIMESTAMP => {
                self.timestamp = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()
            }
            FIELD_KIND => self.kind = Some(value.to_string()),
            FIELD_MESSAGE => self.message = Some(value.to_string()),
            FIELD_DETAIL => self.context.detail = value.to_string(),
            FIELD_HOST => self.context.host = value.to_string(),
            FIELD_OS => self.context.os = value.to_string(),
            _ => {}
        }
    }

    fn finish(self) -> Option<Record> {
        Some(Record {
            actor: self.actor?,
            timestamp: self.timestamp?,
            kind: self.kind?,
            message: self.message?,
            context: self.context,
        })
    }
}

/// Parse every well-formed block out of event-log text.
///
/// Tolerant by design of hand-edited files: text outside blocks is ignored,
/// a block missing actor, timestamp, kind or message is skipped, and an open
/// delimiter inside an unterminated block restarts the block.
pub fn parse_records(content: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current: Option<PartialRecord> = None;
    let mut skipped = 0usize;

    for line in content.lines() {
        if line == BLOCK_OPEN {
            if current.is_some() {
                skipped += 1;
            }
            current = Some(PartialRecord::default());
        } else if line == BLOCK_CLOSE {
            if let Some(partial) = current.take() {
                match partial.finish() {
                    Some(record) => records.push(record),
                    None => skipped += 1,
                }
            }
        } else if let Some(partial) = current.as_mut() {
            if let Some((key, value)) = line.split_once(':') {
                partial.set(key, value.strip_prefix(' ').unwrap_or(value));
            }
        }
    }
    if current.is_some() {
        skipped += 1;
    }

    if skipped > 0 {
        tracing::debug!(parsed = records.len(), skipped, "Skipped malformed event-log blocks");
    }
    records
}
