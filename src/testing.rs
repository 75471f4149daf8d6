//! Purpose: Recording fakes for every host collaborator of the send action.
//! Exports: `FakeHost` plus one fake per capability trait.
//! Role: Lets unit and integration tests drive `send_to_slicer` without a live host.
//! Invariants: Fakes record every call in order and never touch the real environment.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::core::action::ActionContext;
use crate::core::config::{ConfigStore, SlicerPathConfig};
use crate::core::error::{Error, ErrorKind};
use crate::core::export::InterchangeFormat;
use crate::core::host::{
    BrowseRequest, Exporter, ObjectRef, SelectionProvider, SlicerBrowser, StatusChannel,
};
use crate::core::launch::{LaunchRequest, Launcher};
use crate::core::platform::Platform;
use crate::core::resolve::{Environment, SLICER_PATH_ENV};
use crate::notice::Notice;

#[derive(Clone, Debug, Default)]
pub enum PickBehavior {
    #[default]
    Cancel,
    Confirm(Vec<ObjectRef>),
}

#[derive(Debug, Default)]
pub struct FakeSelection {
    pub current: Vec<ObjectRef>,
    pub pick: PickBehavior,
    pub prompts: Vec<String>,
}

impl SelectionProvider for FakeSelection {
    fn selected(&self) -> Vec<ObjectRef> {
        self.current.clone()
    }

    fn pick(&mut self, prompt: &str) -> Result<Option<Vec<ObjectRef>>, Error> {
        self.prompts.push(prompt.to_string());
        Ok(match &self.pick {
            PickBehavior::Cancel => None,
            PickBehavior::Confirm(objects) => Some(objects.clone()),
        })
    }
}

#[derive(Debug, Default)]
pub struct FakeBrowser {
    /// `None` simulates the user cancelling the dialog.
    pub answer: Option<PathBuf>,
    pub requests: Vec<BrowseRequest>,
}

impl SlicerBrowser for FakeBrowser {
    fn browse(&mut self, request: &BrowseRequest) -> Result<Option<PathBuf>, Error> {
        self.requests.push(request.clone());
        Ok(self.answer.clone())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ExportBehavior {
    /// Writes a small placeholder file at the requested path.
    #[default]
    Write,
    /// Writes a partial file, then reports a host error.
    Fail,
    /// Reports success without writing anything.
    Silent,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExportCall {
    pub objects: Vec<ObjectRef>,
    pub path: PathBuf,
    pub format: InterchangeFormat,
}

#[derive(Debug, Default)]
pub struct FakeExporter {
    pub behavior: ExportBehavior,
    pub calls: Vec<ExportCall>,
}

impl Exporter for FakeExporter {
    fn export(
        &mut self,
        objects: &[ObjectRef],
        path: &Path,
        format: InterchangeFormat,
    ) -> Result<(), Error> {
        self.calls.push(ExportCall {
            objects: objects.to_vec(),
            path: path.to_path_buf(),
            format,
        });
        let write = |contents: &[u8]| {
            std::fs::write(path, contents).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("fake export write failed")
                    .with_path(path)
                    .with_source(err)
            })
        };
        match self.behavior {
            ExportBehavior::Write => write(b"ISO-10303-21;\nEND-ISO-10303-21;\n"),
            ExportBehavior::Fail => {
                write(b"ISO-10303-21;\n")?;
                Err(Error::new(ErrorKind::Internal).with_message("STEP exporter is not licensed"))
            }
            ExportBehavior::Silent => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeLauncher {
    pub fail_with: Option<ErrorKind>,
    pub requests: Vec<LaunchRequest>,
}

impl Launcher for FakeLauncher {
    fn launch(&mut self, request: &LaunchRequest) -> Result<(), Error> {
        self.requests.push(request.clone());
        match self.fail_with {
            Some(kind) => Err(Error::new(kind)
                .with_message("process creation refused")
                .with_path(request.target())),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeStore {
    pub config: SlicerPathConfig,
    pub fail_saves: bool,
    pub saves: usize,
}

impl ConfigStore for FakeStore {
    fn load(&self) -> Result<SlicerPathConfig, Error> {
        Ok(self.config.clone())
    }

    fn save(&mut self, config: &SlicerPathConfig) -> Result<(), Error> {
        if self.fail_saves {
            return Err(Error::new(ErrorKind::Io).with_message("store is read-only"));
        }
        self.saves += 1;
        self.config = config.clone();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeEnv {
    pub vars: HashMap<String, OsString>,
}

impl Environment for FakeEnv {
    fn var(&self, name: &str) -> Option<OsString> {
        self.vars.get(name).cloned()
    }
}

#[derive(Debug, Default)]
pub struct RecordingStatus {
    pub notices: Vec<Notice>,
}

impl StatusChannel for RecordingStatus {
    fn notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// One fake per collaborator, lent out together through [`FakeHost::context`].
#[derive(Debug)]
pub struct FakeHost {
    pub selection: FakeSelection,
    pub browser: FakeBrowser,
    pub exporter: FakeExporter,
    pub launcher: FakeLauncher,
    pub store: FakeStore,
    pub env: FakeEnv,
    pub status: RecordingStatus,
    pub platform: Platform,
    pub export_dir: PathBuf,
}

impl FakeHost {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            selection: FakeSelection::default(),
            browser: FakeBrowser::default(),
            exporter: FakeExporter::default(),
            launcher: FakeLauncher::default(),
            store: FakeStore::default(),
            env: FakeEnv::default(),
            status: RecordingStatus::default(),
            platform: Platform::Unix,
            export_dir: export_dir.into(),
        }
    }

    pub fn with_env_override(mut self, value: impl Into<OsString>) -> Self {
        self.env
            .vars
            .insert(SLICER_PATH_ENV.to_string(), value.into());
        self
    }

    pub fn with_stored(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.config = SlicerPathConfig::with_slicer_path(path);
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn context(&mut self) -> ActionContext<'_> {
        ActionContext {
            selection: &mut self.selection,
            browser: &mut self.browser,
            exporter: &mut self.exporter,
            launcher: &mut self.launcher,
            store: &mut self.store,
            env: &self.env,
            status: &mut self.status,
            platform: self.platform,
            export_dir: self.export_dir.clone(),
            format: InterchangeFormat::Step,
        }
    }
}

/// Creates an executable stand-in for a slicer binary inside `dir`.
#[cfg(unix)]
pub fn fake_slicer_binary(dir: &Path, name: &str) -> std::io::Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, b"#!/bin/sh\nexit 0\n")?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}
