//! Versioned binary snapshots of trained parameters via bincode.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::IoError;

/// Current binary format version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Leading fields of every snapshot, decodable without knowing the payload type.
#[derive(Deserialize)]
struct SnapshotHeader {
    format_version: u32,
    kind: String,
}

#[derive(Serialize)]
struct SnapshotEnvelope<'a, T> {
    format_version: u32,
    kind: &'a str,
    payload: &'a T,
}

/// A file holding one serialized value tagged with a kind label.
///
/// The label (for example `"risk_ensemble"`) guards against loading a
/// snapshot of one model type as another.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a snapshot file is present.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Encode `value` under `kind` and write it, replacing any previous file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SnapshotEncode`] | bincode encoding failed |
    /// | [`IoError::WriteFile`] | file write failed |
    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    pub fn save<T: Serialize>(&self, kind: &str, value: &T) -> Result<(), IoError> {
        let envelope = SnapshotEnvelope {
            format_version: SNAPSHOT_FORMAT_VERSION,
            kind,
            payload: value,
        };
        let bytes = bincode::serialize(&envelope).map_err(|e| IoError::SnapshotEncode {
            path: self.path.clone(),
            source: e,
        })?;
        std::fs::write(&self.path, &bytes).map_err(|e| IoError::WriteFile {
            path: self.path.clone(),
            source: e,
        })?;

        info!(size_bytes = bytes.len(), "snapshot saved");
        Ok(())
    }

    /// Read a snapshot written with the same `kind`.
    ///
    /// The header is checked before the payload is decoded.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::FileNotFound`] | file read failed |
    /// | [`IoError::SnapshotDecode`] | bincode decoding failed |
    /// | [`IoError::IncompatibleSnapshotVersion`] | format version mismatch |
    /// | [`IoError::SnapshotKindMismatch`] | the file holds another kind |
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load<T: DeserializeOwned>(&self, kind: &str) -> Result<T, IoError> {
        let bytes = std::fs::read(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        let header: SnapshotHeader = bincode::deserialize(&bytes).map_err(|e| self.decode_error(e))?;
        if header.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(IoError::IncompatibleSnapshotVersion {
                path: self.path.clone(),
                expected: SNAPSHOT_FORMAT_VERSION,
                found: header.format_version,
            });
        }
        if header.kind != kind {
            return Err(IoError::SnapshotKindMismatch {
                path: self.path.clone(),
                expected: kind.to_string(),
                found: header.kind,
            });
        }

        // bincode lays structs out as tuples, so the envelope decodes positionally.
        let (_, _, payload): (u32, String, T) =
            bincode::deserialize(&bytes).map_err(|e| self.decode_error(e))?;
        debug!(size_bytes = bytes.len(), "snapshot loaded");
        Ok(payload)
    }

    fn decode_error(&self, e: bincode::Error) -> IoError {
        IoError::SnapshotDecode {
            path: self.path.clone(),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Weights {
        values: Vec<f64>,
        bias: f64,
    }

    fn weights() -> Weights {
        Weights {
            values: vec![0.3, 0.2, 0.15],
            bias: 25.0,
        }
    }

    #[test]
    fn save_then_load_same_kind() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(&dir.path().join("w.bin"));
        assert!(!store.exists());
        store.save("weights", &weights()).unwrap();
        assert!(store.exists());
        let loaded: Weights = store.load("weights").unwrap();
        assert_eq!(loaded, weights());
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(&dir.path().join("w.bin"));
        store.save("weights", &weights()).unwrap();
        let err = store.load::<Weights>("risk_ensemble").unwrap_err();
        assert!(matches!(err, IoError::SnapshotKindMismatch { .. }));
        assert_eq!(err.kind(), lendguard_tree::ErrorKind::Configuration);
    }

    #[test]
    fn future_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("w.bin");
        let envelope = SnapshotEnvelope {
            format_version: SNAPSHOT_FORMAT_VERSION + 1,
            kind: "weights",
            payload: &weights(),
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();
        let err = SnapshotStore::new(&path).load::<Weights>("weights").unwrap_err();
        assert!(matches!(
            err,
            IoError::IncompatibleSnapshotVersion { found: 2, expected: 1, .. }
        ));
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, b"\x01\x00").unwrap();
        let err = SnapshotStore::new(&path).load::<Weights>("weights").unwrap_err();
        assert!(matches!(err, IoError::SnapshotDecode { .. }));
    }

    #[test]
    fn missing_file() {
        let err = SnapshotStore::new(Path::new("/nonexistent/snap.bin"))
            .load::<Weights>("weights")
            .unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
