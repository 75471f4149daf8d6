//! Slicer location precedence without user interaction.
//!
//! Order: environment override, stored value, platform default bundle. The
//! override is taken as-is; the other two must be launchable right now.

use std::ffi::OsString;
use std::path::PathBuf;

use super::config::SlicerPathConfig;
use super::platform::Platform;

/// Environment variable that overrides the stored slicer location.
pub const SLICER_PATH_ENV: &str = "PRUSA_SLICER_PATH";

pub trait Environment {
    fn var(&self, name: &str) -> Option<OsString>;
}

/// Reads the live process environment on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PathSource {
    Env,
    Stored,
    Default,
}

impl PathSource {
    pub fn as_str(self) -> &'static str {
        match self {
            PathSource::Env => "env",
            PathSource::Stored => "stored",
            PathSource::Default => "default",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedSlicer {
    pub path: PathBuf,
    pub source: PathSource,
}

pub fn env_override(env: &dyn Environment) -> Option<PathBuf> {
    env.var(SLICER_PATH_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Returns the first usable location, or `None` when the user must be asked.
pub fn resolve_slicer(
    env: &dyn Environment,
    config: &SlicerPathConfig,
    platform: Platform,
) -> Option<ResolvedSlicer> {
    if let Some(path) = env_override(env) {
        return Some(ResolvedSlicer {
            path,
            source: PathSource::Env,
        });
    }

    if let Some(stored) = config.stored_path() {
        match platform.normalize_slicer_path(stored) {
            Some(path) => {
                return Some(ResolvedSlicer {
                    path,
                    source: PathSource::Stored,
                });
            }
            None => {
                tracing::info!(path = %stored.display(), "stored slicer path is stale");
            }
        }
    }

    platform
        .default_install()
        .and_then(|candidate| platform.normalize_slicer_path(&candidate))
        .map(|path| ResolvedSlicer {
            path,
            source: PathSource::Default,
        })
}
