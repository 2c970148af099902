//! Argument parsing, help, version and pre-flight validation.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn mega_launch() -> (Command, tempfile::TempDir) {
    let home = tempfile::tempdir().expect("tempdir");
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mega-launch"));
    cmd.env("NO_COLOR", "1")
        .env("HOME", home.path())
        .env("MEGA_LAUNCH_CONFIG", home.path().join("absent.yaml"))
        .env_remove("MEGA_LAUNCH_ASYNC_DIR");
    (cmd, home)
}

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    let (mut cmd, _home) = mega_launch();
    cmd.assert().code(2).stderr(predicate::str::contains(
        "Start a service and hold it to its health checks",
    ));
}

#[test]
fn test_cli_help_lists_subcommands() {
    let (mut cmd, _home) = mega_launch();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("launch"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_launch_help_shows_aliases() {
    let (mut cmd, _home) = mega_launch();
    cmd.args(["launch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--wait-timeout"))
        .stdout(predicate::str::contains("service-name"))
        .stdout(predicate::str::contains("port-list"));
}

#[test]
fn test_version_command_shows_version() {
    let (mut cmd, _home) = mega_launch();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!(
            "mega-launch ",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let (mut cmd, _home) = mega_launch();
    let output = cmd.args(["version", "--json"]).output().expect("run");
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_no_color_env_accepts_conventional_values() {
    for value in ["1", "yes", "0", ""] {
        let (mut cmd, _home) = mega_launch();
        cmd.env("NO_COLOR", value)
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains("mega-launch "));
    }
}

#[test]
fn test_no_color_flag_still_works() {
    let (mut cmd, _home) = mega_launch();
    cmd.env_remove("NO_COLOR")
        .args(["--no-color", "version"])
        .assert()
        .success();
}

#[test]
fn test_launch_rejects_glob_name() {
    let (mut cmd, _home) = mega_launch();
    cmd.args(["launch", "--name", "nginx*"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "This tool does not currently support using glob patterns, found [*] in [nginx*] service",
        ));
}

#[test]
fn test_launch_rejects_too_many_required_checks_as_json() {
    let (mut cmd, _home) = mega_launch();
    let output = cmd
        .args(["--json", "launch", "--unit", "xray", "--required-checks", "3"])
        .output()
        .expect("run");
    assert!(!output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(v["code"], "invalid_config");
}

#[test]
fn test_launch_rejects_bad_log_expression() {
    let (mut cmd, _home) = mega_launch();
    cmd.args(["launch", "--name", "xray", "--log-regexp", "("])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid log expression '('"));
}

#[test]
fn test_invalid_config_file_is_reported() {
    let (mut cmd, home) = mega_launch();
    let path = home.path().join("bad.yaml");
    std::fs::write(&path, "launch:\n  required_checks: 5\n").expect("write config");
    cmd.env("MEGA_LAUNCH_CONFIG", &path)
        .args(["launch", "--name", "xray"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid launch configuration"));
}

#[test]
fn test_unknown_scope_is_a_usage_error() {
    let (mut cmd, _home) = mega_launch();
    cmd.args(["launch", "--name", "xray", "--scope", "session"])
        .assert()
        .code(2);
}
