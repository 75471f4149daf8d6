// CLI integration tests for the send / set-path / status flows.
use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::Value;

fn cmd(config: &Path) -> Command {
    let exe = env!("CARGO_BIN_EXE_slicer-bridge");
    let mut command = Command::new(exe);
    command
        .env_remove("PRUSA_SLICER_PATH")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config)
        .stdin(Stdio::null());
    command
}

fn parse_json(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().next().expect("json line");
    serde_json::from_str(line).expect("valid json")
}

#[cfg(unix)]
#[test]
fn set_path_then_status_reports_stored() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = temp.path().join("cfg").join("config.json");
    let slicer = slicer_bridge::testing::fake_slicer_binary(temp.path(), "prusa").expect("bin");

    let set = cmd(&config)
        .arg("set-path")
        .arg(&slicer)
        .output()
        .expect("set-path");
    assert!(set.status.success());
    let set_json = parse_json(&set.stdout);
    assert_eq!(
        set_json["stored"]["path"].as_str().unwrap(),
        slicer.to_str().unwrap()
    );

    let on_disk: Value =
        serde_json::from_str(&std::fs::read_to_string(&config).expect("config")).expect("json");
    assert_eq!(on_disk["slicer_path"].as_str().unwrap(), slicer.to_str().unwrap());

    let status = cmd(&config)
        .args(["status", "--json"])
        .output()
        .expect("status");
    assert!(status.status.success());
    let status_json = parse_json(&status.stdout);
    assert_eq!(status_json["status"]["source"], "stored");
    assert_eq!(status_json["status"]["stored_launchable"], true);
    assert!(status_json["status"]["env_override"].is_null());
}

#[test]
fn set_path_rejects_missing_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = temp.path().join("config.json");

    let set = cmd(&config)
        .arg("set-path")
        .arg(temp.path().join("nope"))
        .output()
        .expect("set-path");
    assert_eq!(set.status.code().unwrap(), 3);
    assert!(!config.exists());
    let err = parse_json(&set.stderr);
    assert_eq!(err["error"]["kind"], "NotFound");
}

#[test]
fn send_without_models_or_terminal_is_no_selection() {
    let temp = tempfile::tempdir().expect("tempdir");
    let exports = temp.path().join("exports");
    std::fs::create_dir_all(&exports).expect("mkdir");

    let send = cmd(&temp.path().join("config.json"))
        .arg("--export-dir")
        .arg(&exports)
        .arg("send")
        .output()
        .expect("send");
    assert_eq!(send.status.code().unwrap(), 5);
    assert_eq!(std::fs::read_dir(&exports).expect("read_dir").count(), 0);
    let err = parse_json(&send.stderr);
    assert_eq!(err["error"]["kind"], "NoSelection");
}

// macOS falls back to the default PrusaSlicer bundle when it is installed.
#[cfg(not(target_os = "macos"))]
#[test]
fn send_without_slicer_or_terminal_is_not_configured() {
    let temp = tempfile::tempdir().expect("tempdir");
    let model = temp.path().join("part.step");
    std::fs::write(&model, b"ISO-10303-21;").expect("write");

    let send = cmd(&temp.path().join("config.json"))
        .arg("send")
        .arg(&model)
        .output()
        .expect("send");
    assert_eq!(send.status.code().unwrap(), 6);
}

#[test]
fn send_with_bad_override_exports_then_fails_launch() {
    let temp = tempfile::tempdir().expect("tempdir");
    let exports = temp.path().join("exports");
    std::fs::create_dir_all(&exports).expect("mkdir");
    let model = temp.path().join("part.step");
    std::fs::write(&model, b"ISO-10303-21;").expect("write");

    let send = cmd(&temp.path().join("config.json"))
        .env("PRUSA_SLICER_PATH", temp.path().join("missing-slicer"))
        .arg("--export-dir")
        .arg(&exports)
        .arg("send")
        .arg(&model)
        .output()
        .expect("send");
    assert_eq!(send.status.code().unwrap(), 8);

    let err = parse_json(&send.stderr);
    assert_eq!(err["error"]["kind"], "LaunchFailed");
    assert!(err["error"]["hint"].as_str().unwrap().contains("set-path"));

    let exported: Vec<_> = std::fs::read_dir(&exports)
        .expect("read_dir")
        .map(|entry| entry.expect("entry").path())
        .collect();
    assert_eq!(exported.len(), 1);
    assert_eq!(exported[0].extension().unwrap(), "step");
    assert_eq!(std::fs::read(&exported[0]).expect("read"), b"ISO-10303-21;");
}

#[cfg(unix)]
#[test]
fn send_launches_stored_slicer() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = temp.path().join("config.json");
    let exports = temp.path().join("exports");
    std::fs::create_dir_all(&exports).expect("mkdir");
    let slicer = slicer_bridge::testing::fake_slicer_binary(temp.path(), "prusa").expect("bin");
    std::fs::write(
        &config,
        format!("{{\"prusa_path\": {:?}}}", slicer.to_str().unwrap()),
    )
    .expect("config");
    let model = temp.path().join("part.stp");
    std::fs::write(&model, b"ISO-10303-21;").expect("write");

    let send = cmd(&config)
        .arg("--export-dir")
        .arg(&exports)
        .arg("send")
        .arg(&model)
        .output()
        .expect("send");
    assert!(send.status.success());

    let sent = parse_json(&send.stdout);
    assert_eq!(sent["sent"]["source"], "stored");
    assert_eq!(sent["sent"]["launch"]["mode"], "executable");
    let export_path = sent["sent"]["export_path"].as_str().unwrap();
    assert!(export_path.ends_with(".step"));
    assert!(Path::new(export_path).starts_with(&exports));
    assert_eq!(
        sent["sent"]["launch"]["args"][0].as_str().unwrap(),
        export_path
    );
}

#[test]
fn send_rejects_non_step_model() {
    let temp = tempfile::tempdir().expect("tempdir");
    let model = temp.path().join("part.stl");
    std::fs::write(&model, b"solid").expect("write");

    let send = cmd(&temp.path().join("config.json"))
        .env("PRUSA_SLICER_PATH", "/opt/slicer/slicer")
        .arg("--export-dir")
        .arg(temp.path())
        .arg("send")
        .arg(&model)
        .output()
        .expect("send");
    assert_eq!(send.status.code().unwrap(), 7);
}

#[test]
fn usage_exit_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bad = cmd(&temp.path().join("config.json"))
        .arg("frobnicate")
        .output()
        .expect("run");
    assert_eq!(bad.status.code().unwrap(), 2);
}
