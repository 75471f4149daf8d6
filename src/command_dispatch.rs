//! Purpose: Hold top-level CLI command dispatch for `slicer-bridge`.
//! Exports: `Settings`, `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap; wire terminal collaborators into the action.
//! Invariants: Output envelopes and exit code semantics match `main.rs` helpers.
//! Invariants: The config file is only written by `set-path` or a first-run prompt.

use super::*;

use clap::CommandFactory;
use slicer_bridge::api::{
    ActionContext, InterchangeFormat, JsonFileStore, LaunchRequest, Platform, ProcessEnv,
    SendReport, SlicerStatus, SystemLauncher, send_to_slicer, set_slicer_path, slicer_status,
};

use super::cli_host::{self, CopyExporter, FileSelection, PromptBrowser, StderrStatus};

pub(super) struct Settings {
    pub(super) config_path: PathBuf,
    pub(super) export_dir: PathBuf,
    pub(super) color_mode: ColorMode,
}

pub(super) fn dispatch_command(command: Command, settings: Settings) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "slicer-bridge", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Send { models } => {
            let interactive = cli_host::stdin_is_interactive();
            let mut selection = FileSelection::new(models, interactive);
            let mut browser = PromptBrowser::new(interactive);
            let mut store = JsonFileStore::new(&settings.config_path);
            let mut status = StderrStatus::new(settings.color_mode);
            let mut ctx = ActionContext {
                selection: &mut selection,
                browser: &mut browser,
                exporter: &mut CopyExporter,
                launcher: &mut SystemLauncher,
                store: &mut store,
                env: &ProcessEnv,
                status: &mut status,
                platform: Platform::current(),
                export_dir: settings.export_dir,
                format: InterchangeFormat::Step,
            };
            let report = send_to_slicer(&mut ctx)?;
            emit_send_report(&report);
            Ok(RunOutcome::ok())
        }
        Command::SetPath { path } => {
            let interactive = cli_host::stdin_is_interactive();
            let mut selection = FileSelection::new(Vec::new(), false);
            let mut browser = PromptBrowser::new(interactive);
            let mut store = JsonFileStore::new(&settings.config_path);
            let mut status = StderrStatus::new(settings.color_mode);
            let mut ctx = ActionContext {
                selection: &mut selection,
                browser: &mut browser,
                exporter: &mut CopyExporter,
                launcher: &mut SystemLauncher,
                store: &mut store,
                env: &ProcessEnv,
                status: &mut status,
                platform: Platform::current(),
                export_dir: settings.export_dir,
                format: InterchangeFormat::Step,
            };
            let stored = set_slicer_path(&mut ctx, path.as_deref())?;
            if io::stdout().is_terminal() {
                println!("Stored slicer path: {}", stored.display());
            } else {
                emit_json(json!({
                    "stored": {
                        "path": stored.display().to_string(),
                        "config": settings.config_path.display().to_string(),
                    }
                }));
            }
            Ok(RunOutcome::ok())
        }
        Command::Status { json } => {
            let store = JsonFileStore::new(&settings.config_path);
            let status = slicer_status(&ProcessEnv, &store, Platform::current())?;
            if json || !io::stdout().is_terminal() {
                emit_json(status_json(&status, store.path()));
            } else {
                emit_status_human(&status, store.path());
            }
            Ok(RunOutcome::ok())
        }
    }
}

fn launch_json(request: &LaunchRequest) -> Value {
    let (program, args) = request.argv();
    let mode = match request {
        LaunchRequest::Executable { .. } => "executable",
        LaunchRequest::Bundle { .. } => "bundle",
    };
    json!({
        "mode": mode,
        "program": program.to_string_lossy(),
        "args": args.iter().map(|arg| arg.to_string_lossy()).collect::<Vec<_>>(),
    })
}

fn emit_send_report(report: &SendReport) {
    if io::stdout().is_terminal() {
        let noun = if report.objects.len() == 1 {
            "object"
        } else {
            "objects"
        };
        println!(
            "Exported {} {noun} to {} and launched {}.",
            report.objects.len(),
            report.export_path.display(),
            report.slicer.display()
        );
        return;
    }
    emit_json(json!({
        "sent": {
            "objects": report.objects.iter().map(|o| o.as_str()).collect::<Vec<_>>(),
            "export_path": report.export_path.display().to_string(),
            "slicer": report.slicer.display().to_string(),
            "source": report.source.map(|source| source.as_str()).unwrap_or("prompt"),
            "launch": launch_json(&report.launch),
        }
    }));
}

fn status_json(status: &SlicerStatus, config_path: &std::path::Path) -> Value {
    json!({
        "status": {
            "resolved": status.resolved.as_ref().map(|r| r.path.display().to_string()),
            "source": status.resolved.as_ref().map(|r| r.source.as_str()),
            "env_override": status.env_override.as_ref().map(|p| p.display().to_string()),
            "stored": status.stored.as_ref().map(|p| p.display().to_string()),
            "stored_launchable": status.stored_launchable,
            "config": config_path.display().to_string(),
        }
    })
}

fn emit_status_human(status: &SlicerStatus, config_path: &std::path::Path) {
    match &status.resolved {
        Some(resolved) => println!(
            "slicer: {} ({})",
            resolved.path.display(),
            resolved.source.as_str()
        ),
        None => println!("slicer: not configured (run `slicer-bridge set-path`)"),
    }
    if let Some(path) = &status.env_override {
        println!("PRUSA_SLICER_PATH: {}", path.display());
    }
    match &status.stored {
        Some(path) if status.stored_launchable => println!("stored: {}", path.display()),
        Some(path) => println!("stored: {} (not launchable)", path.display()),
        None => println!("stored: none"),
    }
    println!("config: {}", config_path.display());
}
