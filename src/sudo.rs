//! Privilege escalation for the elevated target group.
//!
//! A non-root run does not process `sudo: true` targets itself; it
//! re-executes the current binary under `sudo` with `--sudo-only` and
//! lets the child print its share of the numbered report lines.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::exec::Executor;
use crate::plan::Options;

/// Whether the current process runs with root privileges.
///
/// Shells out to `id -u` so the check stays behind [`Executor`].
pub fn is_root(executor: &dyn Executor) -> bool {
    executor
        .run("id", &["-u"])
        .is_ok_and(|result| result.stdout.trim() == "0")
}

/// Re-execute this binary under `sudo` for the elevated targets.
///
/// The child inherits the console, prints its own numbered report
/// lines, and exits non-zero if any of its targets failed.
///
/// # Errors
///
/// Fails when `sudo` is not on `PATH`, the current executable cannot
/// be determined, or the child exits non-zero. The caller converts
/// any of these into a `Failed` outcome for every elevated target.
pub fn run_elevated(
    executor: &dyn Executor,
    config_path: &Path,
    options: Options,
    verbose: u8,
    ansi: bool,
) -> Result<()> {
    if !executor.which("sudo") {
        bail!("sudo is not available on PATH");
    }
    let exe = std::env::current_exe().context("cannot determine the running executable")?;
    let exe = exe
        .to_str()
        .context("executable path is not valid UTF-8")?
        .to_string();

    let mut args = vec![exe];
    args.extend(elevation_args(config_path, options, verbose, ansi));
    tracing::trace!("sudo {}", args.join(" "));
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let result = executor.run_passthrough("sudo", &arg_refs)?;
    if result.success {
        Ok(())
    } else {
        bail!("sudo exited with status {}", result.code.unwrap_or(-1))
    }
}

/// The argument list forwarded to the elevated child.
///
/// Color is resolved here rather than left to the child: its stdout is
/// a pipe, so auto-detection would always disable color. Dry runs
/// never spawn a child, so `--dry-run` is not forwarded.
fn elevation_args(config_path: &Path, options: Options, verbose: u8, ansi: bool) -> Vec<String> {
    let mut args = Vec::new();
    for _ in 0..verbose {
        args.push("--verbose".to_string());
    }
    if options.force {
        args.push("--force".to_string());
    }
    if options.show_diff {
        args.push("--diff".to_string());
    }
    args.push("--config-file".to_string());
    args.push(config_path.display().to_string());
    args.push("--color".to_string());
    args.push(if ansi { "always" } else { "never" }.to_string());
    args.push("--sudo-only".to_string());
    args
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;

    #[test]
    fn is_root_for_uid_zero() {
        let mock = MockExecutor::ok("0\n");
        assert!(is_root(&mock));
    }

    #[test]
    fn is_root_rejects_other_uids() {
        let mock = MockExecutor::ok("1000\n");
        assert!(!is_root(&mock));
    }

    #[test]
    fn is_root_false_when_id_fails() {
        let mock = MockExecutor::fail();
        assert!(!is_root(&mock));
    }

    #[test]
    fn elevation_args_forward_flags() {
        let options = Options {
            force: true,
            dry_run: false,
            show_diff: true,
        };
        let args = elevation_args(Path::new("/home/u/dotfiles/config.yml"), options, 2, true);
        assert_eq!(
            args,
            vec![
                "--verbose",
                "--verbose",
                "--force",
                "--diff",
                "--config-file",
                "/home/u/dotfiles/config.yml",
                "--color",
                "always",
                "--sudo-only",
            ]
        );
    }

    #[test]
    fn elevation_args_minimal() {
        let args = elevation_args(Path::new("/c.yml"), Options::default(), 0, false);
        assert_eq!(
            args,
            vec!["--config-file", "/c.yml", "--color", "never", "--sudo-only"]
        );
    }

    #[test]
    fn run_elevated_requires_sudo_on_path() {
        let mock = MockExecutor::ok("");
        let err = run_elevated(&mock, Path::new("/c.yml"), Options::default(), 0, false)
            .expect_err("missing sudo must fail");
        assert!(err.to_string().contains("sudo is not available"));
        assert_eq!(mock.call_count(), 0, "no process may be spawned");
    }

    #[test]
    fn run_elevated_propagates_child_failure() {
        let mock = MockExecutor::with_responses(vec![(false, String::new())]).with_which(true);
        let err = run_elevated(&mock, Path::new("/c.yml"), Options::default(), 0, false)
            .expect_err("child failure must propagate");
        assert!(err.to_string().contains("sudo exited with status"));
    }

    #[test]
    fn run_elevated_succeeds_with_successful_child() {
        let mock = MockExecutor::with_responses(vec![(true, String::new())]).with_which(true);
        run_elevated(&mock, Path::new("/c.yml"), Options::default(), 0, false)
            .expect("successful child");
        assert_eq!(mock.call_count(), 1);
    }
}
