// CrashWatch - platform/fs.rs
//
// Thin filesystem helpers used by the log store.
// Every helper returns `io::Result` and leaves path context and fallback
// decisions to the caller.

use crate::util::constants::OVERWRITE_TEMP_SUFFIX;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Append `text` to `path` in a single write, creating the file and its
/// parent directory if absent.
pub fn append_text(path: &Path, text: &str) -> io::Result<()> {
    ensure_parent(path)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    file.flush()
}

/// Read the raw bytes of a file, or `None` if it does not exist.
pub fn read_bytes_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Read the full content of a file as text, or `None` if it does not exist.
///
/// Invalid UTF-8 is replaced rather than rejected so a damaged log can
/// still be inspected. Never write this text back over the file; use
/// `read_bytes_optional` for read-modify-write.
pub fn read_optional(path: &Path) -> io::Result<Option<String>> {
    Ok(read_bytes_optional(path)?.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

/// Replace the content of `path` atomically (write temp, rename).
///
/// A crash between write and rename loses the new content but never
/// corrupts the previous file.
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    ensure_parent(path)?;

    let tmp = temp_sibling(path);
    std::fs::write(&tmp, content)?;

    std::fs::rename(&tmp, path).map_err(|e| {
        // Clean up the temp file on failure; ignore any secondary error.
        let _ = std::fs::remove_file(&tmp);
        e
    })
}

/// Delete `path` if it exists. Returns whether a file was removed.
pub fn remove_if_present(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(OVERWRITE_TEMP_SUFFIX);
    path.with_file_name(name)
}
