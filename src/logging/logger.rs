//! Per-run report log: numbered target lines, counts, and exit status.
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::{Outcome, TargetEntry};
use super::utils::log_file_path;

/// Collects per-target outcomes and renders them as numbered report lines.
///
/// Lines are emitted through [`tracing`] so they reach both the console and
/// the persistent log file at `$XDG_CACHE_HOME/dotlink/<command>.log`.
/// A run that defers elevated targets to a sudo subprocess lets the child
/// print its own numbered lines; the parent continues the numbering where
/// the child left off via [`advance_to`](Self::advance_to).
#[derive(Debug)]
pub struct RunLog {
    entries: Mutex<Vec<TargetEntry>>,
    next_number: AtomicUsize,
    total: usize,
    elevated_done: AtomicUsize,
    ansi: bool,
    log_file: Option<PathBuf>,
}

impl RunLog {
    /// Create a new run log for `total` targets.
    ///
    /// The log file path is stored for display in the run summary.  The file
    /// itself is created and initialised by
    /// [`init_subscriber`](super::subscriber::init_subscriber); this
    /// constructor does not write to it.
    #[must_use]
    pub fn new(total: usize, ansi: bool, command: &str) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_number: AtomicUsize::new(1),
            total,
            elevated_done: AtomicUsize::new(0),
            ansi,
            log_file: log_file_path(command),
        }
    }

    /// Return the log file path, if available.
    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return the number the next recorded line will carry (test-only).
    #[cfg(test)]
    pub(crate) fn next_number_value(&self) -> usize {
        self.next_number.load(Ordering::SeqCst)
    }

    /// Set the number the next recorded line will carry.
    ///
    /// Used after a sudo subprocess has printed lines `1..=k` so that the
    /// parent's first line is numbered `k + 1`.
    pub fn advance_to(&self, number: usize) {
        self.next_number.store(number, Ordering::SeqCst);
    }

    /// Record a target outcome and print its numbered report line.
    pub fn record(&self, outcome: Outcome, message: &str, sudo: bool) {
        let n = self.next_number.fetch_add(1, Ordering::SeqCst);
        let sudo_suffix = if sudo { " (sudo)" } else { "" };
        let text = format!("[{n}/{total}] {message}{sudo_suffix}", total = self.total);
        let line = if self.ansi {
            let color = match outcome {
                Outcome::Applied => "\x1b[32m",
                Outcome::AlreadyOk => "\x1b[34m",
                Outcome::Skipped | Outcome::WouldChange => "\x1b[33m",
                Outcome::Failed => "\x1b[31m",
            };
            format!("{color}{text}\x1b[0m")
        } else {
            text
        };
        tracing::info!(target: "dotlink::task", "{line}");
        self.store(outcome, message, sudo);
    }

    /// Record a target outcome without printing a report line.
    ///
    /// Used for elevated targets whose lines were already printed by the
    /// sudo subprocess, so they still count toward the exit status.
    pub fn record_silent(&self, outcome: Outcome, message: &str, sudo: bool) {
        self.store(outcome, message, sudo);
    }

    /// Note that `count` elevated targets completed in a sudo subprocess.
    /// They appear in the summary but have no parent-side entries.
    pub fn note_elevated_done(&self, count: usize) {
        self.elevated_done.fetch_add(count, Ordering::SeqCst);
    }

    /// Print a unified diff exactly as rendered, without numbering.
    pub fn print_diff(&self, diff: &str) {
        let trimmed = diff.trim_end_matches('\n');
        if !trimmed.is_empty() {
            tracing::info!(target: "dotlink::task", "{trimmed}");
        }
    }

    fn store(&self, outcome: Outcome, message: &str, sudo: bool) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(TargetEntry {
                message: message.to_string(),
                outcome,
                sudo,
            });
        }
    }

    /// Return a clone of all recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<TargetEntry> {
        self.entries.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Count the recorded targets whose outcome is [`Outcome::Failed`].
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|t| t.outcome == Outcome::Failed)
                .count()
        })
    }

    /// Print the run summary: outcome counts and the log file location.
    pub fn print_summary(&self) {
        let entries = match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };
        let elevated = self.elevated_done.load(Ordering::SeqCst);
        if entries.is_empty() && elevated == 0 {
            return;
        }

        let mut applied = 0usize;
        let mut already_ok = 0usize;
        let mut skipped = 0usize;
        let mut would_change = 0usize;
        let mut failed = 0usize;
        for entry in &entries {
            match entry.outcome {
                Outcome::Applied => applied += 1,
                Outcome::AlreadyOk => already_ok += 1,
                Outcome::Skipped => skipped += 1,
                Outcome::WouldChange => would_change += 1,
                Outcome::Failed => failed += 1,
            }
        }

        let elevated_suffix = if elevated > 0 {
            format!(", {elevated} completed by sudo")
        } else {
            String::new()
        };

        println!();
        let total = self.total;
        if self.ansi {
            tracing::info!(
                "{total} targets: \x1b[32m{applied} applied\x1b[0m, \x1b[34m{already_ok} ok\x1b[0m, \x1b[33m{skipped} skipped\x1b[0m, \x1b[37m{would_change} dry-run\x1b[0m, \x1b[31m{failed} failed\x1b[0m{elevated_suffix}"
            );
        } else {
            tracing::info!(
                "{total} targets: {applied} applied, {already_ok} ok, {skipped} skipped, {would_change} dry-run, {failed} failed{elevated_suffix}"
            );
        }

        if let Some(path) = &self.log_file {
            if self.ansi {
                tracing::info!("\x1b[2mlog: {}\x1b[0m", path.display());
            } else {
                tracing::info!("log: {}", path.display());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::isolated_run_log;
    use std::fs;

    #[test]
    fn run_log_new_is_empty() {
        let (log, _tmp, _guard) = isolated_run_log(3);
        assert!(log.entries().is_empty(), "expected empty entry list");
        assert_eq!(log.next_number_value(), 1);
    }

    #[test]
    fn record_stores_entry() {
        let (log, _tmp, _guard) = isolated_run_log(2);
        log.record(Outcome::Applied, "New link created 'a' -> 'b'", false);
        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "New link created 'a' -> 'b'");
        assert_eq!(entries[0].outcome, Outcome::Applied);
        assert!(!entries[0].sudo);
    }

    #[test]
    fn record_increments_number() {
        let (log, _tmp, _guard) = isolated_run_log(5);
        log.record(Outcome::Applied, "one", false);
        log.record(Outcome::AlreadyOk, "two", false);
        assert_eq!(log.next_number_value(), 3);
    }

    #[test]
    fn advance_to_skips_child_numbers() {
        let (log, _tmp, _guard) = isolated_run_log(5);
        log.advance_to(4);
        log.record(Outcome::Applied, "late", false);
        assert_eq!(log.next_number_value(), 5);
    }

    #[test]
    fn record_silent_stores_without_numbering() {
        let (log, _tmp, _guard) = isolated_run_log(4);
        log.record_silent(Outcome::Failed, "sudo target failed", true);
        assert_eq!(log.entries().len(), 1);
        assert_eq!(log.next_number_value(), 1, "silent records must not consume numbers");
    }

    #[test]
    fn failure_count_returns_correct_count() {
        let (log, _tmp, _guard) = isolated_run_log(4);
        assert_eq!(log.failure_count(), 0);
        log.record(Outcome::Applied, "a", false);
        log.record(Outcome::Failed, "b", false);
        log.record(Outcome::Failed, "c", true);
        log.record(Outcome::Skipped, "d", false);
        assert_eq!(log.failure_count(), 2);
    }

    #[test]
    fn log_file_is_created() {
        let (log, _tmp, _guard) = isolated_run_log(1);
        let path = log.log_path().expect("log path should exist");
        assert!(path.exists(), "log file should be created by the file layer");
    }

    #[test]
    fn task_line_written_to_file_with_numbering() {
        let (log, _tmp, _guard) = isolated_run_log(2);
        let marker = format!("task-marker-{}", std::process::id());
        log.record(Outcome::Applied, &marker, false);
        let path = log.log_path().expect("log path");
        let contents = fs::read_to_string(path).unwrap();
        assert!(
            contents.contains(&format!("[1/2] {marker}")),
            "numbered task line should appear in log file"
        );
    }

    #[test]
    fn sudo_suffix_written_to_file() {
        let (log, _tmp, _guard) = isolated_run_log(1);
        log.record(Outcome::Applied, "New file created 'a' -> 'b'", true);
        let path = log.log_path().expect("log path");
        let contents = fs::read_to_string(path).unwrap();
        assert!(
            contents.contains("New file created 'a' -> 'b' (sudo)"),
            "sudo suffix should appear in log file"
        );
    }

    #[test]
    fn ansi_codes_stripped_in_file() {
        let (log, _tmp, _guard) = isolated_run_log(1);
        log.record(Outcome::Failed, "broken", false);
        let path = log.log_path().expect("log path");
        let contents = fs::read_to_string(path).unwrap();
        assert!(
            !contents.contains('\x1b'),
            "log file must not contain ANSI escapes"
        );
        assert!(contents.contains("[1/1] broken"));
    }

    #[test]
    fn print_diff_written_to_file() {
        let (log, _tmp, _guard) = isolated_run_log(1);
        log.print_diff("--- a\n+++ b\n-old\n+new\n");
        let path = log.log_path().expect("log path");
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("+new"), "diff body should reach log file");
    }

    #[test]
    fn note_elevated_done_accumulates() {
        let (log, _tmp, _guard) = isolated_run_log(6);
        log.note_elevated_done(2);
        log.note_elevated_done(1);
        assert_eq!(log.elevated_done.load(Ordering::SeqCst), 3);
    }
}
