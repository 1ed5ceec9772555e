//! I/O error types for lendguard-io.

use std::path::PathBuf;

use lendguard_tree::{ErrorKind, TreeError};

/// Errors from file I/O, CSV and JSON parsing, result writing and snapshots.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when the header has the wrong number of columns for the reader.
    #[error("{path} has {got} columns, expected {expected}")]
    ColumnCount {
        /// Path to the CSV file.
        path: PathBuf,
        /// Columns the reader requires.
        expected: usize,
        /// Columns in the header.
        got: usize,
    },

    /// Returned when a named column is absent from the header.
    #[error("column \"{column}\" not found in {path}")]
    MissingColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The requested column name.
        column: String,
    },

    /// Returned when a cell value is NaN, Inf, or otherwise not a finite float.
    #[error("non-finite value in {path}: row {row_index}, column {col_index}, raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Zero-based column index.
        col_index: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when a JSON input cannot be decoded.
    #[error("invalid JSON in {path}")]
    JsonParse {
        /// Path to the JSON file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when a result cannot be encoded as JSON.
    #[error("failed to encode {artifact} as JSON")]
    JsonEncode {
        /// Which artifact was being written.
        artifact: &'static str,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a snapshot cannot be encoded.
    #[error("failed to encode snapshot for {path}")]
    SnapshotEncode {
        /// Destination path.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when a snapshot file cannot be decoded.
    #[error("failed to decode snapshot {path}")]
    SnapshotDecode {
        /// Path to the snapshot file.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when a snapshot was written by an incompatible format version.
    #[error("snapshot {path} has format version {found}, expected {expected}")]
    IncompatibleSnapshotVersion {
        /// Path to the snapshot file.
        path: PathBuf,
        /// Version this build reads.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },

    /// Returned when a snapshot holds a different kind of payload.
    #[error("snapshot {path} holds \"{found}\", expected \"{expected}\"")]
    SnapshotKindMismatch {
        /// Path to the snapshot file.
        path: PathBuf,
        /// Payload label requested.
        expected: String,
        /// Payload label in the file.
        found: String,
    },

    /// Wraps a feature vector construction error.
    #[error("feature error: {0}")]
    Feature(#[from] TreeError),
}

impl IoError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            IoError::InvalidExperimentName { .. }
            | IoError::IncompatibleSnapshotVersion { .. }
            | IoError::SnapshotKindMismatch { .. } => ErrorKind::Configuration,
            IoError::Feature(inner) => inner.kind(),
            _ => ErrorKind::InvalidInput,
        }
    }
}
