//! Purpose: Terminal-backed collaborators for running the send action from a shell.
//! Exports: `FileSelection`, `PromptBrowser`, `CopyExporter`, `StderrStatus`.
//! Role: Stand in for a modeling host: model files are the selection, stdin is the dialog.
//! Invariants: Prompts only read stdin when it is a terminal; otherwise they cancel.
//! Invariants: Prompt text goes to stderr so stdout stays a clean payload.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use slicer_bridge::api::{
    BrowseRequest, Error, ErrorKind, Exporter, InterchangeFormat, ObjectRef, SelectionProvider,
    SlicerBrowser, StatusChannel, expand_home,
};
use slicer_bridge::notice::Notice;

use super::{ColorMode, emit_notice};

pub(crate) fn stdin_is_interactive() -> bool {
    io::stdin().is_terminal()
}

pub(crate) struct FileSelection {
    models: Vec<PathBuf>,
    interactive: bool,
}

impl FileSelection {
    pub(crate) fn new(models: Vec<PathBuf>, interactive: bool) -> Self {
        Self {
            models,
            interactive,
        }
    }
}

impl SelectionProvider for FileSelection {
    fn selected(&self) -> Vec<ObjectRef> {
        self.models.iter().map(|path| model_ref(path)).collect()
    }

    fn pick(&mut self, prompt: &str) -> Result<Option<Vec<ObjectRef>>, Error> {
        if !self.interactive {
            return Ok(None);
        }
        prompt_line(&format!("{prompt} (one model path per line, blank line to finish):"))?;
        let lines = read_lines_until_blank(&mut io::stdin().lock())?;
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            lines
                .iter()
                .map(|line| model_ref(&expand_home(Path::new(line))))
                .collect(),
        ))
    }
}

pub(crate) struct PromptBrowser {
    interactive: bool,
}

impl PromptBrowser {
    pub(crate) fn new(interactive: bool) -> Self {
        Self { interactive }
    }
}

impl SlicerBrowser for PromptBrowser {
    fn browse(&mut self, request: &BrowseRequest) -> Result<Option<PathBuf>, Error> {
        if !self.interactive {
            return Ok(None);
        }
        let pattern = request.filter.split('|').nth(1).unwrap_or("*");
        prompt_line(&format!("{} [{pattern}] (blank to cancel):", request.title))?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read slicer path")
                .with_source(err)
        })?;
        let answer = line.trim();
        if answer.is_empty() {
            return Ok(None);
        }
        Ok(Some(PathBuf::from(answer)))
    }
}

/// Hands an existing STEP model to the slicer by copying it to the export path.
pub(crate) struct CopyExporter;

impl Exporter for CopyExporter {
    fn export(
        &mut self,
        objects: &[ObjectRef],
        path: &Path,
        format: InterchangeFormat,
    ) -> Result<(), Error> {
        let [object] = objects else {
            return Err(Error::new(ErrorKind::ExportFailed)
                .with_message(format!(
                    "cannot merge {} models into one export",
                    objects.len()
                ))
                .with_hint("Send one model at a time."));
        };
        let source = PathBuf::from(object.as_str());
        let typed = source
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| format.accepts_extension(ext));
        if !typed {
            return Err(Error::new(ErrorKind::ExportFailed)
                .with_message(format!(
                    "model is not a .{} file",
                    format.extension()
                ))
                .with_path(&source));
        }
        std::fs::copy(&source, path).map_err(|err| {
            Error::new(ErrorKind::ExportFailed)
                .with_message("failed to copy model to export path")
                .with_path(&source)
                .with_source(err)
        })?;
        tracing::debug!(from = %source.display(), to = %path.display(), "model copied");
        Ok(())
    }
}

pub(crate) struct StderrStatus {
    color_mode: ColorMode,
}

impl StderrStatus {
    pub(crate) fn new(color_mode: ColorMode) -> Self {
        Self { color_mode }
    }
}

impl StatusChannel for StderrStatus {
    fn notice(&mut self, notice: Notice) {
        emit_notice(&notice, self.color_mode);
    }
}

fn model_ref(path: &Path) -> ObjectRef {
    ObjectRef::new(path.to_string_lossy())
}

fn prompt_line(text: &str) -> Result<(), Error> {
    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{text}")
        .and_then(|_| stderr.flush())
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write prompt")
                .with_source(err)
        })
}

fn read_lines_until_blank(reader: &mut impl BufRead) -> Result<Vec<String>, Error> {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read selection")
                .with_source(err)
        })?;
        let trimmed = line.trim();
        if read == 0 || trimmed.is_empty() {
            return Ok(lines);
        }
        lines.push(trimmed.to_string());
    }
}
