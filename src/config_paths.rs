//! Purpose: Config-file location helpers for the CLI.
//! Exports: `default_config_path` and `resolve_config_path`.
//! Role: Keep CLI path semantics in one place.
//! Invariants: Default config file remains `~/.slicer-bridge/config.json`.
//! Invariants: A leading `~` in a user-supplied path expands to the home directory.

use std::path::{Path, PathBuf};

use slicer_bridge::api::expand_home;

pub(crate) fn default_config_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .unwrap_or_default();
    PathBuf::from(home)
        .join(".slicer-bridge")
        .join("config.json")
}

pub(crate) fn resolve_config_path(flag: Option<&Path>) -> PathBuf {
    match flag {
        Some(path) => expand_home(path),
        None => default_config_path(),
    }
}
