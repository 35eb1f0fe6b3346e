#![allow(deprecated)] // Command::cargo_bin is deprecated for cross-package binaries

use assert_cmd::Command;
use predicates::str::contains;

// Hermetic command: no ambient STAGEWATCH_* settings, no config file.
fn stagewatch_cmd(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("stagewatch").unwrap();
    cmd.env_remove("STAGEWATCH_HOST")
        .env_remove("STAGEWATCH_CONFIG_DIR")
        .env_remove("STAGEWATCH_TIMEOUT_SECS")
        .env_remove("STAGEWATCH_POLL_FIXED_MS")
        .arg("--config-dir")
        .arg(config_dir);
    cmd
}

#[test]
fn help_lists_subcommands() {
    let tmp = tempfile::tempdir().unwrap();
    stagewatch_cmd(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("watch"))
        .stdout(contains("status"))
        .stdout(contains("publish"))
        .stdout(contains("abort"));
}

#[test]
fn publish_requires_release_key() {
    let tmp = tempfile::tempdir().unwrap();
    stagewatch_cmd(tmp.path())
        .args(["publish", "--path", "/content/sites/demo"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("--release"));
}

#[test]
fn status_against_unreachable_host_fails() {
    let tmp = tempfile::tempdir().unwrap();
    stagewatch_cmd(tmp.path())
        .args([
            "--host",
            "http://127.0.0.1:1",
            "status",
            "--path",
            "/content/sites/demo",
        ])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .failure()
        .stderr(contains("Transport"));
}

#[test]
fn host_from_config_file_is_used() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join("stagewatch.json"),
        r#"{"host": "http://127.0.0.1:1", "timeout_secs": 2}"#,
    )
    .unwrap();

    stagewatch_cmd(tmp.path())
        .args(["abort", "--path", "/content/sites/demo", "--release", "r1"])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .failure()
        .stderr(contains("127.0.0.1:1"));
}
