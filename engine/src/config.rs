use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use detscan_types::Precision;
use serde::Deserialize;
use thiserror::Error;

use crate::form::FormDefaults;

const DEFAULT_FRAME_MS: u64 = 16;
const MIN_FRAME_MS: u64 = 4;
const MAX_FRAME_MS: u64 = 100;

/// `~/.detscan/config.toml`. Every section and key is optional.
#[derive(Debug, Default, Deserialize)]
pub struct DetscanConfig {
    pub app: Option<AppConfig>,
    pub scan: Option<ScanConfig>,
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
    /// Frame cadence in milliseconds. One scan tick runs per frame.
    pub frame_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScanConfig {
    /// Decimal places of the scan step when no snapshot sets one.
    pub precision: Option<u8>,
    pub full_graph: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the input snapshot, instead of the platform data dir.
    pub snapshot_dir: Option<PathBuf>,
}

/// Rendering switches the TUI reads every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiOptions {
    pub high_contrast: bool,
}

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".detscan").join("config.toml"))
}

impl DetscanConfig {
    /// Load from the default location. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {}: {}", path.display(), err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        UiOptions {
            high_contrast: self.app.as_ref().is_some_and(|app| app.high_contrast),
        }
    }

    /// Frame period, clamped to a usable range.
    #[must_use]
    pub fn frame_duration(&self) -> Duration {
        let ms = self
            .app
            .as_ref()
            .and_then(|app| app.frame_ms)
            .unwrap_or(DEFAULT_FRAME_MS)
            .clamp(MIN_FRAME_MS, MAX_FRAME_MS);
        Duration::from_millis(ms)
    }

    /// Form defaults. An out-of-range precision is ignored with a warning.
    #[must_use]
    pub fn form_defaults(&self) -> FormDefaults {
        let mut defaults = FormDefaults::default();
        let Some(scan) = &self.scan else {
            return defaults;
        };
        if let Some(digits) = scan.precision {
            match Precision::new(digits) {
                Ok(precision) => defaults.precision = precision,
                Err(err) => tracing::warn!("Ignoring [scan] precision: {err}"),
            }
        }
        if let Some(full_graph) = scan.full_graph {
            defaults.full_graph = full_graph;
        }
        defaults
    }

    #[must_use]
    pub fn snapshot_dir(&self) -> Option<&Path> {
        self.storage
            .as_ref()
            .and_then(|storage| storage.snapshot_dir.as_deref())
    }
}
