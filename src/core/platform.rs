//! Platform rules for locating and validating a slicer install.
//!
//! Resolution and launch code take a [`Platform`] explicitly instead of
//! probing `cfg!(target_os)` inline, so bundle handling can be exercised on
//! any host.

use std::path::{Component, Path, PathBuf};

/// Default bundle location used by the Prusa driver installer on macOS.
pub const DEFAULT_MAC_BUNDLE: &str = "/Applications/Original Prusa Drivers/PrusaSlicer.app";

const BUNDLE_SUFFIX: &str = ".app";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Platform {
    Windows,
    MacOs,
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Unix
        }
    }

    /// Platforms where applications ship as `.app` directories opened through
    /// the desktop shell.
    pub fn uses_bundles(self) -> bool {
        matches!(self, Platform::MacOs)
    }

    pub fn is_bundle_path(self, path: &Path) -> bool {
        self.uses_bundles()
            && path
                .to_str()
                .is_some_and(|value| value.to_ascii_lowercase().ends_with(BUNDLE_SUFFIX))
    }

    /// The bundle checked after the stored value and before prompting.
    pub fn default_install(self) -> Option<PathBuf> {
        match self {
            Platform::MacOs => Some(PathBuf::from(DEFAULT_MAC_BUNDLE)),
            Platform::Windows | Platform::Unix => None,
        }
    }

    /// Validates a user-supplied slicer location and returns it expanded and
    /// lexically normalized, or `None` when it cannot be launched.
    pub fn normalize_slicer_path(self, path: &Path) -> Option<PathBuf> {
        if path.as_os_str().is_empty() {
            return None;
        }
        let path = lexical_normalize(&expand_home(path));
        if self.is_bundle_path(&path) {
            return is_valid_bundle(&path).then_some(path);
        }
        is_executable_file(&path).then_some(path)
    }
}

/// Expands a leading `~` to `$HOME` (or `%USERPROFILE%`).
pub fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let home = std::env::var_os("HOME")
                .or_else(|| std::env::var_os("USERPROFILE"))
                .unwrap_or_default();
            PathBuf::from(home).join(components.as_path())
        }
        _ => path.to_path_buf(),
    }
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

pub(crate) fn is_valid_bundle(path: &Path) -> bool {
    path.is_dir() && path.join("Contents").join("MacOS").is_dir()
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}
