//! Integration tests for the `opnsync` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! offline commands, and error handling without a live router.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

const FAKE_HOME: &str = "/tmp/opnsync-cli-test-nonexistent";

/// Build a [`Command`] for the `opnsync` binary with env isolation.
///
/// Clears all `OPNSYNC_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn opnsync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("opnsync");
    cmd.env("HOME", FAKE_HOME)
        .env("XDG_CONFIG_HOME", FAKE_HOME)
        .env_remove("OPNSYNC_PROFILE")
        .env_remove("OPNSYNC_ROUTER")
        .env_remove("OPNSYNC_API_KEY")
        .env_remove("OPNSYNC_API_SECRET")
        .env_remove("OPNSYNC_OUTPUT")
        .env_remove("OPNSYNC_INSECURE")
        .env_remove("OPNSYNC_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn data_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = opnsync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    opnsync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("OPNsense")
            .and(predicate::str::contains("reservations"))
            .and(predicate::str::contains("aliases"))
            .and(predicate::str::contains("sync")),
    );
}

#[test]
fn test_version_flag() {
    opnsync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("opnsync"));
}

#[test]
fn test_sync_help_lists_flags() {
    opnsync_cmd().args(["sync", "--help"]).assert().success().stdout(
        predicate::str::contains("--dry-run")
            .and(predicate::str::contains("--strategy"))
            .and(predicate::str::contains("--backup-file")),
    );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    opnsync_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    opnsync_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("opnsync"));
}

// ── Router resolution errors ────────────────────────────────────────

#[test]
fn test_no_config_reports_missing_router() {
    let output = opnsync_cmd().args(["reservations", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("No router configured"), "{text}");
}

#[test]
fn test_missing_credentials_exit_code() {
    let output = opnsync_cmd()
        .args(["--router", "https://192.0.2.1", "aliases", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("No API key"));
}

#[test]
fn test_invalid_router_url_is_usage_error() {
    let output = opnsync_cmd()
        .args(["--router", "ftp://fw", "--api-key", "k", "--api-secret", "s"])
        .args(["reservations", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unknown_profile_exit_code() {
    let output = opnsync_cmd()
        .args(["--profile", "nowhere", "reservations", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("nowhere"));
}

#[test]
fn test_find_requires_mac_or_ip() {
    opnsync_cmd()
        .args(["reservations", "find"])
        .assert()
        .code(2);
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_hostname_from_name() {
    opnsync_cmd()
        .args(["hostname", "--mac", "AA-BB-CC-DD-EE-1F", "--name", "Kitchen Plug"])
        .assert()
        .success()
        .stdout(predicate::str::diff("kitchen-plug\n"));
}

#[test]
fn test_hostname_from_template_json() {
    opnsync_cmd()
        .args(["-o", "json-compact", "hostname", "--mac", "aabbccddee1f"])
        .args(["--template", "sh-{mac4}"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""hostname":"sh-ee1f""#)
                .and(predicate::str::contains(r#""mac":"aa:bb:cc:dd:ee:1f""#)),
        );
}

#[test]
fn test_hostname_rejects_bad_mac() {
    opnsync_cmd()
        .args(["hostname", "--mac", "aa:bb:cc"])
        .assert()
        .code(2);
}

#[test]
fn test_classify_plain_lists_shelly_macs() {
    let file = data_file(
        ".json",
        r#"[
            {"mac": "c4:5b:be:00:00:01", "ip": "10.0.0.1", "hostname": "shelly-plug"},
            {"mac": "00:11:22:33:44:55", "ip": "10.0.0.2", "hostname": "printer"}
        ]"#,
    );

    opnsync_cmd()
        .args(["-o", "plain", "classify", "--only-shelly", "--file"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::diff("c4:5b:be:00:00:01\n"));
}

#[test]
fn test_classify_yaml_input_table_output() {
    let file = data_file(
        ".yaml",
        "- mac: 00:11:22:33:44:55\n  ip: 10.0.0.9\n  hostname: garage-shelly1\n",
    );

    opnsync_cmd()
        .args(["classify", "--file"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("garage-shelly1").and(predicate::str::contains("yes")));
}

#[test]
fn test_classify_bad_file_fails() {
    let file = data_file(".json", "{ not json");
    opnsync_cmd()
        .args(["classify", "--file"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid JSON"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_is_isolated() {
    opnsync_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(FAKE_HOME).and(predicate::str::contains("config.toml")));
}

#[test]
fn test_config_show_defaults_as_json() {
    opnsync_cmd()
        .args(["-o", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""default_profile": "default""#));
}

#[test]
fn test_config_set_writes_profile() {
    let home = tempfile::tempdir().unwrap();
    let run = |args: &[&str]| {
        let mut cmd = opnsync_cmd();
        cmd.env("HOME", home.path())
            .env("XDG_CONFIG_HOME", home.path())
            .args(args);
        cmd
    };

    run(&["config", "set", "router", "https://fw.home.arpa"])
        .assert()
        .success();
    run(&["config", "set", "sync.firewall_alias_names", "SHELLY,IOT"])
        .assert()
        .success();

    run(&["config", "show"]).assert().success().stdout(
        predicate::str::contains("router = \"https://fw.home.arpa\"")
            .and(predicate::str::contains("SHELLY")),
    );
    run(&["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));
}
