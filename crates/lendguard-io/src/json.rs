//! JSON documents and plain-text lists given as inputs.

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::IoError;

/// Read and decode a JSON document such as a transaction or borrower record.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::JsonParse`] | Malformed JSON or wrong shape for `T` |
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, IoError> {
    let text = std::fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let value = serde_json::from_str(&text).map_err(|e| IoError::JsonParse {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(bytes = text.len(), "JSON input decoded");
    Ok(value)
}

/// Read a newline-separated list such as wallet addresses.
///
/// Entries are trimmed; blank lines and lines starting with `#` are skipped.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] when the file doesn't exist or is unreadable.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_lines(path: &Path) -> Result<Vec<String>, IoError> {
    let text = std::fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let entries: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect();
    debug!(n_entries = entries.len(), "list input read");
    Ok(entries)
}
