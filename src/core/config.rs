//! Persisted slicer location.
//!
//! The on-disk record is a flat JSON object. Unknown fields are carried
//! through a save untouched and the older `prusa_path` key is still read.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{Error, ErrorKind};

const LEGACY_PATH_KEY: &str = "prusa_path";

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawConfig")]
pub struct SlicerPathConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slicer_path: Option<PathBuf>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    slicer_path: Option<PathBuf>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

// `prusa_path` is only consulted when `slicer_path` is unset or empty; it
// stays in `extra` otherwise.
impl From<RawConfig> for SlicerPathConfig {
    fn from(raw: RawConfig) -> Self {
        let RawConfig {
            mut slicer_path,
            mut extra,
        } = raw;
        let unset = slicer_path
            .as_deref()
            .is_none_or(|path| path.as_os_str().is_empty());
        if unset {
            match extra.remove(LEGACY_PATH_KEY) {
                Some(Value::String(legacy)) => slicer_path = Some(PathBuf::from(legacy)),
                Some(other) => {
                    extra.insert(LEGACY_PATH_KEY.to_string(), other);
                }
                None => {}
            }
        }
        Self { slicer_path, extra }
    }
}

impl SlicerPathConfig {
    pub fn with_slicer_path(path: impl Into<PathBuf>) -> Self {
        Self {
            slicer_path: Some(path.into()),
            extra: Map::new(),
        }
    }

    /// Stored path, treating an empty string as unset.
    pub fn stored_path(&self) -> Option<&Path> {
        self.slicer_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

pub trait ConfigStore {
    fn load(&self) -> Result<SlicerPathConfig, Error>;
    fn save(&mut self, config: &SlicerPathConfig) -> Result<(), Error>;
}

#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> Result<SlicerPathConfig, Error> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SlicerPathConfig::default());
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "config unreadable; treating as unset");
                return Ok(SlicerPathConfig::default());
            }
        };
        match serde_json::from_slice::<SlicerPathConfig>(&bytes) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "config malformed; treating as unset");
                Ok(SlicerPathConfig::default())
            }
        }
    }

    fn save(&mut self, config: &SlicerPathConfig) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to create config directory")
                    .with_path(parent)
                    .with_source(err)
            })?;
        }
        let mut payload = serde_json::to_string_pretty(config).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode config")
                .with_source(err)
        })?;
        payload.push('\n');
        std::fs::write(&self.path, payload).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write config")
                .with_path(&self.path)
                .with_source(err)
        })?;
        tracing::debug!(path = %self.path.display(), "saved slicer config");
        Ok(())
    }
}
