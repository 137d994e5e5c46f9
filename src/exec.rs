//! Process execution abstraction.
//!
//! All external commands go through the [`Executor`] trait so that code
//! paths touching `sudo` or `id` stay testable without spawning real
//! processes.

use anyhow::{Context, Result, bail};
use std::process::{Command, Output, Stdio};

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured standard output (empty for passthrough runs).
    pub stdout: String,
    /// Captured standard error (empty for passthrough runs).
    pub stderr: String,
    /// Whether the command exited successfully.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over process execution.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command and capture its output. Fails if the command exits
    /// non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command and capture its output, allowing failure (returns the
    /// result without bailing).
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command with stdin, stdout, and stderr inherited from this
    /// process, waiting for it to exit.  Output streams to the console as
    /// the child produces it; the returned result carries only the exit
    /// status.
    fn run_passthrough(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Check if a program is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] implementation that spawns real system processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    fn execute_checked(mut cmd: Command, label: &str) -> Result<ExecResult> {
        let output = cmd
            .output()
            .with_context(|| format!("failed to execute: {label}"))?;
        let result = ExecResult::from(output);
        if !result.success {
            bail!(
                "{label} failed (exit {}): {}",
                result.code.unwrap_or(-1),
                result.stderr.trim()
            );
        }
        Ok(result)
    }
}

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        Self::execute_checked(cmd, program)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }

    fn run_passthrough(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            success: status.success(),
            code: status.code(),
        })
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn run_echo() {
        let result = SystemExecutor.run("echo", &["hello"]).unwrap();
        assert!(result.success, "echo command should succeed");
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn run_failure_bails() {
        let result = SystemExecutor.run("false", &[]);
        assert!(result.is_err(), "non-zero exit should be an error");
    }

    #[test]
    fn run_unchecked_captures_failure() {
        let result = SystemExecutor.run_unchecked("false", &[]).unwrap();
        assert!(!result.success);
        assert_eq!(result.code, Some(1));
    }

    #[test]
    fn run_missing_program_is_error() {
        let result = SystemExecutor.run("definitely-not-a-real-program-xyz", &[]);
        assert!(result.is_err());
    }

    #[test]
    fn run_passthrough_reports_exit_code() {
        let result = SystemExecutor.run_passthrough("true", &[]).unwrap();
        assert!(result.success);
        assert_eq!(result.code, Some(0));
        assert!(result.stdout.is_empty(), "passthrough captures nothing");
    }

    #[test]
    fn which_finds_common_tool() {
        assert!(SystemExecutor.which("sh"), "sh should be on PATH");
    }

    #[test]
    fn which_rejects_missing_tool() {
        assert!(!SystemExecutor.which("definitely-not-a-real-program-xyz"));
    }

    #[test]
    fn exec_result_from_output() {
        let output = Command::new("echo")
            .arg("out")
            .output()
            .unwrap();
        let result = ExecResult::from(output);
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.code, Some(0));
    }

    #[test]
    fn mock_executor_consumes_responses_in_order() {
        use test_helpers::MockExecutor;
        let mock = MockExecutor::with_responses(vec![
            (true, "first".to_string()),
            (false, String::new()),
        ]);
        let first = mock.run("x", &[]).unwrap();
        assert_eq!(first.stdout, "first");
        assert!(mock.run("x", &[]).is_err());
        assert_eq!(mock.call_count(), 2);
    }

    #[test]
    fn mock_executor_which_configurable() {
        use test_helpers::MockExecutor;
        let mock = MockExecutor::ok("").with_which(true);
        assert!(mock.which("sudo"));
    }
}
