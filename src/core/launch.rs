//! Detached slicer process launch.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use super::error::{Error, ErrorKind};
use super::platform::{self, Platform};

const BUNDLE_OPENER: &str = "open";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LaunchRequest {
    /// Run the binary directly.
    Executable { program: PathBuf, args: Vec<PathBuf> },
    /// Hand the bundle to the platform opener, as the desktop shell would.
    Bundle { bundle: PathBuf, args: Vec<PathBuf> },
}

impl LaunchRequest {
    pub fn for_model(platform: Platform, slicer: &Path, model: &Path) -> Self {
        let args = vec![model.to_path_buf()];
        if platform.is_bundle_path(slicer) {
            LaunchRequest::Bundle {
                bundle: slicer.to_path_buf(),
                args,
            }
        } else {
            LaunchRequest::Executable {
                program: slicer.to_path_buf(),
                args,
            }
        }
    }

    pub fn target(&self) -> &Path {
        match self {
            LaunchRequest::Executable { program, .. } => program,
            LaunchRequest::Bundle { bundle, .. } => bundle,
        }
    }

    /// Program and argv actually handed to the OS.
    pub fn argv(&self) -> (OsString, Vec<OsString>) {
        match self {
            LaunchRequest::Executable { program, args } => (
                program.clone().into_os_string(),
                args.iter().map(|arg| arg.clone().into_os_string()).collect(),
            ),
            LaunchRequest::Bundle { bundle, args } => {
                let mut argv = vec![OsString::from("-a"), bundle.clone().into_os_string()];
                argv.extend(args.iter().map(|arg| arg.clone().into_os_string()));
                (OsString::from(BUNDLE_OPENER), argv)
            }
        }
    }
}

pub trait Launcher {
    fn launch(&mut self, request: &LaunchRequest) -> Result<(), Error>;
}

/// Starts the slicer without waiting on it or capturing its output.
///
/// Executables are spawned directly and reaped on a background thread.
/// Bundles are handed to `open`, which returns once the desktop shell has
/// accepted the app, so its exit status is checked.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&mut self, request: &LaunchRequest) -> Result<(), Error> {
        launch_with_opener(request, OsStr::new(BUNDLE_OPENER))
    }
}

fn launch_with_opener(request: &LaunchRequest, opener: &OsStr) -> Result<(), Error> {
    let (program, args) = request.argv();
    match request {
        LaunchRequest::Executable { .. } => {
            let mut command = quiet_command(&program, &args);
            let child = command
                .spawn()
                .map_err(|err| launch_error(request, "failed to start slicer").with_source(err))?;
            tracing::info!(pid = child.id(), program = ?program, "slicer started");
            reap(child);
            Ok(())
        }
        LaunchRequest::Bundle { bundle, .. } => {
            if !platform::is_valid_bundle(bundle) {
                return Err(launch_error(request, "slicer bundle not found"));
            }
            let status = quiet_command(opener, &args)
                .status()
                .map_err(|err| launch_error(request, "failed to run bundle opener").with_source(err))?;
            if !status.success() {
                return Err(launch_error(
                    request,
                    &format!("bundle opener exited with {status}"),
                ));
            }
            tracing::info!(bundle = %bundle.display(), "slicer bundle opened");
            Ok(())
        }
    }
}

fn quiet_command(program: &OsStr, args: &[OsString]) -> Command {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    detach(&mut command);
    command
}

fn launch_error(request: &LaunchRequest, message: &str) -> Error {
    Error::new(ErrorKind::LaunchFailed)
        .with_message(message)
        .with_path(request.target())
        .with_hint("Run `slicer-bridge set-path` to choose a different slicer.")
}

// Waits on the child off-thread so an exited slicer does not linger as a
// zombie in a long-lived host.
fn reap(mut child: Child) {
    let pid = child.id();
    let spawned = std::thread::Builder::new()
        .name(format!("slicer-reaper-{pid}"))
        .spawn(move || match child.wait() {
            Ok(status) => tracing::debug!(pid, %status, "slicer exited"),
            Err(err) => tracing::debug!(pid, error = %err, "slicer wait failed"),
        });
    if let Err(err) = spawned {
        tracing::warn!(pid, error = %err, "could not start reaper thread");
    }
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    // SAFETY: setsid is async-signal-safe and touches no parent state.
    unsafe {
        command.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn detach(_command: &mut Command) {}

#[cfg(test)]
mod tests {
    use super::{LaunchRequest, Launcher, SystemLauncher, launch_with_opener};
    use crate::core::error::ErrorKind;
    use crate::core::platform::Platform;
    use std::ffi::OsString;
    use std::path::{Path, PathBuf};

    #[test]
    fn bundle_routes_through_opener() {
        let request = LaunchRequest::for_model(
            Platform::MacOs,
            Path::new("/Apps/Slicer.app"),
            Path::new("/tmp/model.step"),
        );
        assert!(matches!(request, LaunchRequest::Bundle { .. }));
        let (program, args) = request.argv();
        assert_eq!(program, OsString::from("open"));
        assert_eq!(
            args,
            vec![
                OsString::from("-a"),
                OsString::from("/Apps/Slicer.app"),
                OsString::from("/tmp/model.step"),
            ]
        );
    }

    #[test]
    fn app_suffix_is_plain_executable_off_mac() {
        let request = LaunchRequest::for_model(
            Platform::Unix,
            Path::new("/opt/Slicer.app"),
            Path::new("/tmp/model.step"),
        );
        let (program, args) = request.argv();
        assert_eq!(program, OsString::from("/opt/Slicer.app"));
        assert_eq!(args, vec![OsString::from("/tmp/model.step")]);
    }

    #[test]
    fn missing_program_is_launch_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let request = LaunchRequest::for_model(
            Platform::Unix,
            &temp.path().join("no-such-slicer"),
            Path::new("/tmp/model.step"),
        );
        let err = SystemLauncher.launch(&request).expect_err("spawn fails");
        assert_eq!(err.kind(), ErrorKind::LaunchFailed);
        assert!(err.hint().is_some());
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    fn fake_bundle(dir: &Path) -> PathBuf {
        let bundle = dir.join("Slicer.app");
        std::fs::create_dir_all(bundle.join("Contents").join("MacOS")).expect("bundle");
        bundle
    }

    #[test]
    fn missing_bundle_is_launch_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let request = LaunchRequest::for_model(
            Platform::MacOs,
            &temp.path().join("Missing.app"),
            Path::new("/tmp/model.step"),
        );
        let err = SystemLauncher.launch(&request).expect_err("no bundle");
        assert_eq!(err.kind(), ErrorKind::LaunchFailed);
        assert_eq!(err.path(), Some(temp.path().join("Missing.app").as_path()));
        assert!(err.hint().unwrap().contains("set-path"));
    }

    #[cfg(unix)]
    #[test]
    fn refused_bundle_open_is_launch_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let bundle = fake_bundle(temp.path());
        let opener = script(
            temp.path(),
            "open",
            "echo 'Unable to find application' >&2\nexit 1",
        );
        let request =
            LaunchRequest::for_model(Platform::MacOs, &bundle, Path::new("/tmp/model.step"));

        let err = launch_with_opener(&request, opener.as_os_str()).expect_err("refused");
        assert_eq!(err.kind(), ErrorKind::LaunchFailed);
        assert_eq!(err.path(), Some(bundle.as_path()));
        assert!(err.hint().unwrap().contains("set-path"));
    }

    #[cfg(unix)]
    #[test]
    fn accepted_bundle_open_succeeds() {
        let temp = tempfile::tempdir().expect("tempdir");
        let bundle = fake_bundle(temp.path());
        let marker = temp.path().join("opened");
        let opener = script(
            temp.path(),
            "open",
            &format!("printf '%s\\n' \"$@\" > '{}'", marker.display()),
        );
        let request =
            LaunchRequest::for_model(Platform::MacOs, &bundle, Path::new("/tmp/model.step"));

        launch_with_opener(&request, opener.as_os_str()).expect("opened");
        let argv = std::fs::read_to_string(&marker).expect("marker");
        let lines: Vec<&str> = argv.lines().collect();
        assert_eq!(lines, vec!["-a", bundle.to_str().unwrap(), "/tmp/model.step"]);
    }

    #[cfg(unix)]
    #[test]
    fn executable_launch_does_not_wait_for_slicer() {
        let temp = tempfile::tempdir().expect("tempdir");
        let slicer = script(temp.path(), "slow-slicer", "sleep 5");
        let request =
            LaunchRequest::for_model(Platform::Unix, &slicer, Path::new("/tmp/model.step"));

        let started = std::time::Instant::now();
        SystemLauncher.launch(&request).expect("launch");
        assert!(started.elapsed() < std::time::Duration::from_secs(3));
    }
}
