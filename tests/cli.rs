//! Exit behaviour of the `voicegen` binary for inputs that never reach the
//! synthesizer.

use std::fs;
use std::process::Command;

fn voicegen() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_voicegen"));
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn presets_lists_every_tier() {
    let output = voicegen().arg("presets").output().expect("run voicegen");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["ultra_fast", "fast", "standard", "high_quality", "custom_optimized"] {
        assert!(stdout.contains(name), "{stdout}");
    }
}

#[test]
fn create_samples_writes_eight_lines() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("sample_texts.txt");
    let status = voicegen()
        .args(["create-samples", file.to_str().unwrap()])
        .status()
        .expect("run voicegen");
    assert!(status.success());
    let content = fs::read_to_string(&file).unwrap();
    assert_eq!(content.lines().count(), 8);
}

#[test]
fn missing_text_file_exits_with_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = voicegen()
        .current_dir(dir.path())
        .args(["batch", "does_not_exist.txt"])
        .output()
        .expect("run voicegen");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"), "{stderr}");
}

#[test]
fn empty_text_file_exits_with_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("empty.txt");
    fs::write(&file, "\n   \n").unwrap();
    let output = voicegen()
        .current_dir(dir.path())
        .args(["batch", file.to_str().unwrap()])
        .output()
        .expect("run voicegen");
    assert!(!output.status.success());
}

#[test]
fn unknown_preset_exits_with_failure_and_lists_presets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("texts.txt");
    fs::write(&file, "Hello\n").unwrap();
    let output = voicegen()
        .current_dir(dir.path())
        .args(["batch", file.to_str().unwrap(), "not-a-real-preset"])
        .output()
        .expect("run voicegen");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not-a-real-preset"), "{stderr}");
    assert!(stderr.contains("custom_optimized"), "{stderr}");
    assert!(!dir.path().join("batch_output").join("001_Hello.wav").exists());
}
