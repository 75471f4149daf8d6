//! The send-to-slicer action and its set-path companion.
//!
//! Every collaborator arrives through [`ActionContext`]; the stored
//! configuration is loaded at the start of each call and written back only
//! when the user picks a new slicer.

use std::path::{Path, PathBuf};

use super::config::ConfigStore;
use super::error::{Error, ErrorKind};
use super::export::{InterchangeFormat, allocate_export_path};
use super::host::{
    BrowseRequest, Exporter, ObjectRef, SelectionProvider, SlicerBrowser, StatusChannel,
};
use super::launch::{LaunchRequest, Launcher};
use super::platform::Platform;
use super::resolve::{Environment, PathSource, ResolvedSlicer, env_override, resolve_slicer};
use crate::notice::Notice;

pub const SELECT_PROMPT: &str = "Select objects to send to PrusaSlicer";

const SET_PATH_HINT: &str = "Run `slicer-bridge set-path` to choose the slicer.";

pub struct ActionContext<'a> {
    pub selection: &'a mut dyn SelectionProvider,
    pub browser: &'a mut dyn SlicerBrowser,
    pub exporter: &'a mut dyn Exporter,
    pub launcher: &'a mut dyn Launcher,
    pub store: &'a mut dyn ConfigStore,
    pub env: &'a dyn Environment,
    pub status: &'a mut dyn StatusChannel,
    pub platform: Platform,
    pub export_dir: PathBuf,
    pub format: InterchangeFormat,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SendReport {
    pub objects: Vec<ObjectRef>,
    pub export_path: PathBuf,
    pub slicer: PathBuf,
    /// `None` when the user was just asked for the location.
    pub source: Option<PathSource>,
    pub launch: LaunchRequest,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlicerStatus {
    pub resolved: Option<ResolvedSlicer>,
    pub env_override: Option<PathBuf>,
    pub stored: Option<PathBuf>,
    pub stored_launchable: bool,
}

pub fn send_to_slicer(ctx: &mut ActionContext<'_>) -> Result<SendReport, Error> {
    let objects = resolve_selection(ctx.selection)?;
    tracing::debug!(count = objects.len(), "selection resolved");

    let config = ctx.store.load()?;
    let (slicer, source) = match resolve_slicer(ctx.env, &config, ctx.platform) {
        Some(resolved) => {
            tracing::debug!(source = resolved.source.as_str(), path = %resolved.path.display(), "slicer resolved");
            (resolved.path, Some(resolved.source))
        }
        None => (prompt_and_remember(ctx)?, None),
    };

    let export_path = allocate_export_path(&ctx.export_dir, ctx.format)?;
    export_selection(ctx, &objects, &export_path)?;

    let launch = LaunchRequest::for_model(ctx.platform, &slicer, &export_path);
    ctx.launcher.launch(&launch).map_err(|err| {
        if err.kind() == ErrorKind::LaunchFailed {
            return err;
        }
        Error::new(ErrorKind::LaunchFailed)
            .with_message("failed to start slicer")
            .with_path(&slicer)
            .with_hint("Run `slicer-bridge set-path` to choose a different slicer.")
            .with_source(err)
    })?;
    tracing::info!(path = %export_path.display(), slicer = %slicer.display(), "handed export to slicer");

    Ok(SendReport {
        objects,
        export_path,
        slicer,
        source,
        launch,
    })
}

/// Stores a new slicer location. With `explicit` unset the user is asked to
/// browse for it; the stored value and env override are not consulted.
pub fn set_slicer_path(
    ctx: &mut ActionContext<'_>,
    explicit: Option<&Path>,
) -> Result<PathBuf, Error> {
    let path = match explicit {
        Some(candidate) => ctx.platform.normalize_slicer_path(candidate).ok_or_else(|| {
            Error::new(ErrorKind::NotFound)
                .with_message("not a launchable slicer")
                .with_path(candidate)
                .with_hint("Pass the slicer executable, or the .app bundle on macOS.")
        })?,
        None => browse_for_slicer(ctx)?,
    };
    remember(ctx.store, &path)?;
    if env_override(ctx.env).is_some() {
        ctx.status.notice(
            Notice::now(
                "env_override",
                "set-path",
                "stored path is shadowed by the environment override",
            )
            .with_detail("stored", path.display().to_string()),
        );
    }
    Ok(path)
}

pub fn slicer_status(
    env: &dyn Environment,
    store: &dyn ConfigStore,
    platform: Platform,
) -> Result<SlicerStatus, Error> {
    let config = store.load()?;
    let stored = config.stored_path().map(Path::to_path_buf);
    let stored_launchable = stored
        .as_deref()
        .is_some_and(|path| platform.normalize_slicer_path(path).is_some());
    Ok(SlicerStatus {
        resolved: resolve_slicer(env, &config, platform),
        env_override: env_override(env),
        stored,
        stored_launchable,
    })
}

fn resolve_selection(selection: &mut dyn SelectionProvider) -> Result<Vec<ObjectRef>, Error> {
    let current = selection.selected();
    if !current.is_empty() {
        return Ok(current);
    }
    match selection.pick(SELECT_PROMPT)? {
        Some(picked) if !picked.is_empty() => Ok(picked),
        _ => Err(Error::new(ErrorKind::NoSelection).with_message("no geometry selected")),
    }
}

fn browse_for_slicer(ctx: &mut ActionContext<'_>) -> Result<PathBuf, Error> {
    let request = BrowseRequest::for_slicer(ctx.platform);
    let Some(chosen) = ctx.browser.browse(&request)? else {
        return Err(Error::new(ErrorKind::NoSlicerConfigured)
            .with_message("slicer path not set")
            .with_hint(SET_PATH_HINT));
    };
    ctx.platform.normalize_slicer_path(&chosen).ok_or_else(|| {
        Error::new(ErrorKind::NoSlicerConfigured)
            .with_message("selected path is not a launchable slicer")
            .with_path(chosen)
            .with_hint(SET_PATH_HINT)
    })
}

fn prompt_and_remember(ctx: &mut ActionContext<'_>) -> Result<PathBuf, Error> {
    let path = browse_for_slicer(ctx)?;
    if let Err(err) = remember(ctx.store, &path) {
        tracing::warn!(error = %err, "could not persist slicer path");
        ctx.status.notice(
            Notice::now("persist_failed", "send", "could not remember the slicer path")
                .with_detail("error", err.to_string()),
        );
    }
    Ok(path)
}

fn remember(store: &mut dyn ConfigStore, path: &Path) -> Result<(), Error> {
    let mut config = store.load()?;
    config.slicer_path = Some(path.to_path_buf());
    store.save(&config)?;
    tracing::info!(path = %path.display(), "stored slicer path");
    Ok(())
}

fn export_selection(
    ctx: &mut ActionContext<'_>,
    objects: &[ObjectRef],
    path: &Path,
) -> Result<(), Error> {
    ctx.exporter
        .export(objects, path, ctx.format)
        .map_err(|err| {
            if err.kind() == ErrorKind::ExportFailed {
                return err;
            }
            Error::new(ErrorKind::ExportFailed)
                .with_message("export failed")
                .with_path(path)
                .with_source(err)
        })?;
    if !path.exists() {
        return Err(Error::new(ErrorKind::ExportFailed)
            .with_message("exporter reported success but wrote no file")
            .with_path(path)
            .with_hint("Check that the STEP exporter is installed and licensed."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{SELECT_PROMPT, send_to_slicer, set_slicer_path, slicer_status};
    use crate::core::error::ErrorKind;
    use crate::core::host::ObjectRef;
    use crate::core::platform::Platform;
    use crate::core::resolve::PathSource;
    use crate::testing::{ExportBehavior, FakeHost, PickBehavior};

    #[test]
    fn current_selection_skips_pick_prompt() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut host = FakeHost::new(temp.path()).with_env_override("/nowhere/slicer");
        host.selection.current = vec![ObjectRef::new("a")];

        let report = send_to_slicer(&mut host.context()).expect("send");
        assert!(host.selection.prompts.is_empty());
        assert_eq!(report.objects, vec![ObjectRef::new("a")]);
        assert_eq!(report.source, Some(PathSource::Env));
    }

    #[test]
    fn empty_pick_is_no_selection() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut host = FakeHost::new(temp.path()).with_env_override("/nowhere/slicer");
        host.selection.pick = PickBehavior::Confirm(Vec::new());

        let err = send_to_slicer(&mut host.context()).expect_err("no selection");
        assert_eq!(err.kind(), ErrorKind::NoSelection);
        assert_eq!(host.selection.prompts, vec![SELECT_PROMPT.to_string()]);
        assert!(host.exporter.calls.is_empty());
        assert!(host.launcher.requests.is_empty());
    }

    #[test]
    fn cancelled_browse_is_no_slicer_configured() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut host = FakeHost::new(temp.path());
        host.selection.current = vec![ObjectRef::new("a")];

        let err = send_to_slicer(&mut host.context()).expect_err("no slicer");
        assert_eq!(err.kind(), ErrorKind::NoSlicerConfigured);
        assert_eq!(host.browser.requests.len(), 1);
        assert!(host.exporter.calls.is_empty());
        assert!(host.store.config.stored_path().is_none());
    }

    #[test]
    fn exporter_that_writes_nothing_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut host = FakeHost::new(temp.path()).with_env_override("/nowhere/slicer");
        host.selection.current = vec![ObjectRef::new("a")];
        host.exporter.behavior = ExportBehavior::Silent;

        let err = send_to_slicer(&mut host.context()).expect_err("export");
        assert_eq!(err.kind(), ErrorKind::ExportFailed);
        assert!(host.launcher.requests.is_empty());
    }

    #[test]
    fn launcher_errors_become_launch_failed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut host = FakeHost::new(temp.path()).with_env_override("/nowhere/slicer");
        host.selection.current = vec![ObjectRef::new("a")];
        host.launcher.fail_with = Some(ErrorKind::Io);

        let err = send_to_slicer(&mut host.context()).expect_err("launch");
        assert_eq!(err.kind(), ErrorKind::LaunchFailed);
        assert_eq!(host.exporter.calls.len(), 1);
        assert_eq!(host.launcher.requests.len(), 1);
    }

    #[test]
    fn cancelled_set_path_browse_stores_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut host = FakeHost::new(temp.path()).with_stored("/opt/slicer/slicer");

        let err = set_slicer_path(&mut host.context(), None).expect_err("cancelled");
        assert_eq!(err.kind(), ErrorKind::NoSlicerConfigured);
        assert_eq!(host.browser.requests.len(), 1);
        assert_eq!(host.store.saves, 0);
        assert_eq!(
            host.store.config.stored_path(),
            Some(std::path::Path::new("/opt/slicer/slicer"))
        );
    }

    #[test]
    fn explicit_set_path_rejects_missing_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut host = FakeHost::new(temp.path());
        let missing = temp.path().join("missing-slicer");

        let err = set_slicer_path(&mut host.context(), Some(&missing)).expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(host.store.saves, 0);
    }

    #[test]
    fn status_reports_env_and_stale_store() {
        let temp = tempfile::tempdir().expect("tempdir");
        let host = FakeHost::new(temp.path())
            .with_env_override("/Apps/Slicer.app")
            .with_stored(temp.path().join("stale"));

        let status = slicer_status(&host.env, &host.store, Platform::Unix).expect("status");
        let resolved = status.resolved.expect("resolved");
        assert_eq!(resolved.source, PathSource::Env);
        assert!(!status.stored_launchable);
        assert_eq!(status.stored, Some(temp.path().join("stale")));
    }
}
