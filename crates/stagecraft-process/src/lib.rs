//! External tool invocation for stagecraft.
//!
//! Stage bodies shell out to the tools that do the real work (sass, tsc,
//! prettier, jest, typedoc, zip). This crate runs those processes with
//! output capture and uniform error reporting.
//!
//! # Example
//!
//! ```ignore
//! use stagecraft_process::run_command_in_dir;
//! use std::path::Path;
//!
//! let result = run_command_in_dir("tsc", &["--version"], Path::new(".")).expect("run");
//! assert!(result.success);
//! ```

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Result of a command execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code (if available)
    pub exit_code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Duration of execution
    pub duration_ms: u64,
}

impl CommandResult {
    /// Turn a failed run into an error carrying the exit code and stderr.
    pub fn ok(&self) -> Result<&Self> {
        if self.success {
            Ok(self)
        } else {
            Err(anyhow::anyhow!(
                "command failed with exit code {:?} after {}: {}",
                self.exit_code,
                humantime::format_duration(Duration::from_millis(self.duration_ms)),
                self.stderr.trim()
            ))
        }
    }

    /// Create a result from a process output
    pub fn from_output(output: &Output, duration: Duration) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: duration.as_millis() as u64,
        }
    }
}

/// Render a command line for log messages.
pub fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .map(|part| {
            if part.contains(' ') {
                format!("\"{part}\"")
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a command in a specific directory
pub fn run_command_in_dir(program: &str, args: &[&str], dir: &Path) -> Result<CommandResult> {
    let start = Instant::now();

    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| {
            format!(
                "failed to run command: {} in {}",
                display_command(program, args),
                dir.display()
            )
        })?;

    Ok(CommandResult::from_output(&output, start.elapsed()))
}

/// Run a command in a directory, streaming its output to the terminal.
///
/// Used for tools whose output the user wants to watch (test runners).
/// The captured `stdout`/`stderr` of the result are empty.
pub fn run_command_streaming_in_dir(
    program: &str,
    args: &[&str],
    dir: &Path,
) -> Result<CommandResult> {
    let start = Instant::now();

    let status = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| {
            format!(
                "failed to run command: {} in {}",
                display_command(program, args),
                dir.display()
            )
        })?;

    Ok(CommandResult {
        success: status.success(),
        exit_code: status.code(),
        stdout: String::new(),
        stderr: String::new(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Get the full path to a command
pub fn which(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}
