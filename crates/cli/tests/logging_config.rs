use assert_cmd::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_logging_to_file() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let log_file = root.join("wikiport.log");
    let vault = root.join("vault");
    fs::create_dir(&vault).unwrap();
    fs::write(vault.join("a.md"), "[x](b.md)").unwrap();

    let config_path = root.join("config.toml");
    let config_content = format!(
        r#"
version = 1

[logging]
level = "warn"
file_level = "debug"
file = "{}"
"#,
        log_file.display()
    );
    fs::write(&config_path, &config_content).unwrap();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wikiport"));
    cmd.env_remove("RUST_LOG");
    cmd.arg("--config").arg(&config_path).arg(&vault).assert().success();

    assert!(log_file.exists(), "Log file should be created");
    let log = fs::read_to_string(&log_file).unwrap();
    assert!(log.contains("pass links"), "log was: {log}");
}

#[test]
fn test_logging_level_controls_stderr() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let vault = root.join("vault");
    fs::create_dir(&vault).unwrap();
    fs::write(vault.join("a.md"), "[x](b.md)").unwrap();

    let verbose = root.join("verbose.toml");
    fs::write(&verbose, "version = 1\n[logging]\nlevel = \"trace\"\n").unwrap();
    let quiet = root.join("quiet.toml");
    fs::write(&quiet, "version = 1\n[logging]\nlevel = \"warn\"\n").unwrap();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wikiport"));
    cmd.env_remove("RUST_LOG");
    let output = cmd.arg("--config").arg(&verbose).arg(&vault).output().unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Loaded config from"), "stderr was: {stderr}");
    assert!(stderr.contains("Conversion complete"), "stderr was: {stderr}");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wikiport"));
    cmd.env_remove("RUST_LOG");
    let output = cmd.arg("--config").arg(&quiet).arg(&vault).output().unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("Conversion complete"), "stderr was: {stderr}");
}

#[test]
fn test_logs_stay_off_stdout() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let vault = root.join("vault");
    fs::create_dir(&vault).unwrap();
    fs::write(vault.join("a.md"), "[x](b.md)").unwrap();

    let config_path = root.join("config.toml");
    fs::write(&config_path, "version = 1\n[logging]\nlevel = \"debug\"\n").unwrap();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wikiport"));
    cmd.env_remove("RUST_LOG");
    let output = cmd.arg("--config").arg(&config_path).arg(&vault).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1, "stdout was: {stdout}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Conversion complete"), "stderr was: {stderr}");
}
