//! Saved form input between runs.
//!
//! The snapshot lives at `<dir>/appMechanics3.json`. Loading never fails:
//! a missing, unreadable or malformed file means "nothing saved".

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use detscan_types::{InputSnapshot, SNAPSHOT_STORAGE_KEY};
use detscan_utils::{atomic_write, recover_bak_file};
use thiserror::Error;

use crate::config::DetscanConfig;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to create snapshot directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write snapshot {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{SNAPSHOT_STORAGE_KEY}.json")),
        }
    }

    /// `<platform data dir>/detscan`, when the platform has one.
    #[must_use]
    pub fn default_location() -> Option<Self> {
        dirs::data_dir().map(|dir| Self::in_dir(dir.join("detscan")))
    }

    /// Configured `[storage] snapshot_dir`, else the default location.
    #[must_use]
    pub fn from_config(config: &DetscanConfig) -> Option<Self> {
        config
            .snapshot_dir()
            .map(Self::in_dir)
            .or_else(Self::default_location)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn load(&self) -> Option<InputSnapshot> {
        recover_bak_file(&self.path);
        if !self.path.exists() {
            return None;
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to read input snapshot: {e}");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Ignoring malformed input snapshot: {e}");
                None
            }
        }
    }

    pub fn save(&self, snapshot: &InputSnapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| SnapshotError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let bytes = serde_json::to_vec(snapshot)?;
        atomic_write(&self.path, &bytes).map_err(|source| SnapshotError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "Saved input snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use detscan_types::{CellLabel, CoefficientSet, MatrixOrder, Precision};

    use super::*;

    fn sample_snapshot() -> InputSnapshot {
        InputSnapshot {
            coefficients: CoefficientSet::new()
                .with(CellLabel::R11, "phi1(v)")
                .with(CellLabel::R12, "-eta2(v)"),
            size: Some(MatrixOrder::Two),
            approximation: Precision::new(3).ok(),
            fullgraph: Some(false),
        }
    }

    #[test]
    fn file_is_named_after_storage_key() {
        let store = SnapshotStore::in_dir("/data/detscan");
        assert_eq!(store.path(), Path::new("/data/detscan/appMechanics3.json"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::in_dir(dir.path().join("nested"));
        assert_eq!(store.load(), None);

        store.save(&sample_snapshot()).expect("save");
        assert_eq!(store.load(), Some(sample_snapshot()));
    }

    #[test]
    fn malformed_file_reads_as_nothing_saved() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::in_dir(dir.path());
        fs::write(store.path(), "{not json").expect("write");
        assert_eq!(store.load(), None);

        fs::write(store.path(), "null").expect("write");
        assert_eq!(store.load(), None);
    }

    #[test]
    fn config_overrides_directory() {
        let config: DetscanConfig =
            toml::from_str("[storage]\nsnapshot_dir = \"/srv/detscan\"\n").expect("config");
        let store = SnapshotStore::from_config(&config).expect("store");
        assert_eq!(store.path(), Path::new("/srv/detscan/appMechanics3.json"));
    }
}
