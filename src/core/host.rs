//! Collaborator surfaces supplied by the embedding host.

use std::fmt;
use std::path::{Path, PathBuf};

use super::error::Error;
use super::export::InterchangeFormat;
use super::platform::Platform;
use crate::notice::Notice;

/// Opaque handle to one object in the host document.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ObjectRef(String);

impl ObjectRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait SelectionProvider {
    fn selected(&self) -> Vec<ObjectRef>;

    /// Asks the user to pick objects. `Ok(None)` means cancelled.
    fn pick(&mut self, prompt: &str) -> Result<Option<Vec<ObjectRef>>, Error>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BrowseRequest {
    pub title: String,
    pub filter: String,
    pub platform: Platform,
}

impl BrowseRequest {
    pub fn for_slicer(platform: Platform) -> Self {
        let filter = match platform {
            Platform::Windows => "PrusaSlicer executable (*.exe)|*.exe||",
            Platform::MacOs => "PrusaSlicer (*.app;PrusaSlicer)|*.app;PrusaSlicer||",
            Platform::Unix => "Executable (*.*)|*.*||",
        };
        Self {
            title: "Locate PrusaSlicer".to_string(),
            filter: filter.to_string(),
            platform,
        }
    }
}

pub trait SlicerBrowser {
    /// `Ok(None)` means the user cancelled.
    fn browse(&mut self, request: &BrowseRequest) -> Result<Option<PathBuf>, Error>;
}

pub trait Exporter {
    /// Writes `objects` to `path` without showing any options dialog.
    fn export(
        &mut self,
        objects: &[ObjectRef],
        path: &Path,
        format: InterchangeFormat,
    ) -> Result<(), Error>;
}

pub trait StatusChannel {
    fn notice(&mut self, notice: Notice);
}
