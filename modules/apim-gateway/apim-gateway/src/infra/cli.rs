//! Command-line invocation of the Azure CLI.

use std::path::PathBuf;
use std::process::Stdio;

use apim_gateway_sdk::ApimError;
use async_trait::async_trait;
use tokio::process::Command;

/// Captured result of one command invocation.
#[derive(Debug, Clone, Default)]
pub struct CliOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CliOutput {
    /// Successful output with the given stdout.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given stderr.
    #[must_use]
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Parse stdout as JSON. Empty or malformed output yields `None`.
    #[must_use]
    pub fn json(&self) -> Option<serde_json::Value> {
        let text = self.stdout.trim();
        if text.is_empty() {
            return None;
        }
        serde_json::from_str(text).ok()
    }

    /// Human-readable failure reason taken from stderr.
    #[must_use]
    pub fn error_message(&self) -> String {
        let text = self.stderr.trim();
        if text.is_empty() {
            "command exited with a failure status".to_owned()
        } else {
            text.to_owned()
        }
    }
}

/// Runs a command-line tool with the given arguments.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Display name used in logs and errors, e.g. `az`.
    fn program(&self) -> &str;

    /// Run once and capture the output.
    ///
    /// # Errors
    ///
    /// Returns [`ApimError::Cli`] only when the process could not be started.
    /// A non-zero exit status is reported through [`CliOutput::success`].
    async fn run(&self, args: &[String]) -> Result<CliOutput, ApimError>;
}

/// `az` runner backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct AzCli {
    program: PathBuf,
    display: String,
}

impl AzCli {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let display = program.to_string_lossy().into_owned();
        Self { program, display }
    }
}

impl Default for AzCli {
    fn default() -> Self {
        Self::new("az")
    }
}

#[async_trait]
impl CommandRunner for AzCli {
    fn program(&self) -> &str {
        &self.display
    }

    async fn run(&self, args: &[String]) -> Result<CliOutput, ApimError> {
        let command_line = command_line(&self.display, args);
        tracing::debug!(command = %command_line, "Running command");

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ApimError::cli(&command_line, format!("failed to spawn: {e}")))?;

        let result = CliOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if result.success {
            tracing::debug!(command = %command_line, "Command succeeded");
        } else {
            tracing::debug!(command = %command_line, status = ?output.status, "Command failed");
        }
        Ok(result)
    }
}

/// Render a command for logs and error messages. Request bodies are elided.
#[must_use]
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut parts = vec![program.to_owned()];
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            parts.push("<body>".to_owned());
            skip_next = false;
            continue;
        }
        skip_next = arg == "--body";
        parts.push(arg.clone());
    }
    parts.join(" ")
}

/// Owned argument list from string slices.
#[must_use]
pub fn args<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}
