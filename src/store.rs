use crate::error::StorageError;
use crate::series::MergedSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The persisted state: when the data was last refreshed and the merged
/// series itself. `last_refresh: None` with an empty series is the state
/// before the first sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub last_refresh: Option<NaiveDate>,
    pub series: MergedSeries,
}

/// Keeps the snapshot in a single JSON file. Saves go through a sibling
/// temp file and a rename, so a crash mid-write leaves the previous
/// snapshot readable and a reader never sees a half-written file.
///
/// A single writer is assumed; there is no file locking.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the committed snapshot. A missing file is not an error: an
    /// empty snapshot is written first and returned, so every later save
    /// replaces an existing file.
    pub fn load(&self) -> Result<Snapshot, StorageError> {
        if !self.path.exists() {
            debug!("no snapshot at {}, creating empty", self.path.display());
            let empty = Snapshot::default();
            self.save(&empty)?;
            return Ok(empty);
        }

        let bytes = fs::read(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| StorageError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    /// Replaces the stored snapshot atomically.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(snapshot).map_err(StorageError::Encode)?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes).map_err(|source| StorageError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(
            "committed {} rows to {}",
            snapshot.series.len(),
            self.path.display()
        );
        Ok(())
    }
}
