#![allow(clippy::unwrap_used, clippy::expect_used)]

//! CLI smoke tests for the apim-tools binary.
//!
//! None of these reach Azure: they stop at argument parsing or config
//! validation.

use std::io::Write;
use std::process::{Command, Stdio};

fn run_apim_tools(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_apim-tools"))
        .args(args)
        .env_remove("APIM__RESOURCE_GROUP")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute apim-tools")
}

#[test]
fn test_cli_help_command() {
    let output = run_apim_tools(&["--help"]);
    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    for subcommand in ["show", "discover", "debug-token", "trace", "models"] {
        assert!(stdout.contains(subcommand), "Should list `{subcommand}`");
    }
    assert!(stdout.contains("--config"), "Should mention config option");
}

#[test]
fn test_cli_version_command() {
    let output = run_apim_tools(&["--version"]);
    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("apim-tools"), "Should contain binary name");
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_apim_tools(&["frobnicate"]);
    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unrecognized subcommand") || stderr.contains("error:"),
        "Should report the bad subcommand"
    );
}

#[test]
fn test_cli_missing_config_file() {
    let output = run_apim_tools(&["--config", "/nonexistent/apim.yaml", "show"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config file does not exist"));
}

#[test]
fn test_cli_rejects_config_without_resource_group() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "transport: arm").unwrap();

    let output = run_apim_tools(&["--config", file.path().to_str().unwrap(), "show"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("resource_group must be set"), "stderr: {stderr}");
}
