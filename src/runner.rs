//! Run orchestration: two-phase target processing and reporting.
//!
//! Elevated targets always run before the normal group, regardless of
//! where they appear in the config file. A non-root run hands the
//! elevated group to a `sudo` subprocess; the parent picks up the
//! report numbering where the child left off.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{Config, Target};
use crate::exec::Executor;
use crate::logging::{Outcome, RunLog};
use crate::plan::{self, Plan, TargetPlan};
use crate::{sudo, writer};

/// Everything one run needs, resolved once at startup.
#[derive(Debug)]
pub struct Session<'a> {
    /// Loaded and validated configuration.
    pub config: &'a Config,
    /// Planner and writer switches from the CLI.
    pub options: plan::Options,
    /// Process only the elevated group (set in the sudo subprocess).
    pub sudo_only: bool,
    /// Verbosity, forwarded to the sudo subprocess.
    pub verbose: u8,
    /// Colorize report lines.
    pub ansi: bool,
    /// Runs `id` and `sudo`.
    pub executor: &'a dyn Executor,
    /// Set by the interrupt handler; checked between targets.
    pub interrupted: &'a AtomicBool,
}

/// Process every target and return the process exit code.
///
/// The exit code is `1` when any target failed, `0` otherwise.
#[must_use]
pub fn run(session: &Session) -> i32 {
    let command = if session.sudo_only { "sudo" } else { "run" };
    let log = RunLog::new(session.config.targets.len(), session.ansi, command);
    execute(session, &log);
    if !session.sudo_only {
        log.print_summary();
    }
    i32::from(log.failure_count() > 0)
}

fn execute(session: &Session, log: &RunLog) {
    let targets = &session.config.targets;
    let sudo_targets: Vec<&Target> = targets.iter().filter(|t| t.sudo()).collect();
    let normal_targets: Vec<&Target> = targets.iter().filter(|t| !t.sudo()).collect();

    if session.sudo_only {
        tracing::trace!(
            "Executing {} sudo actions (sudo-only mode).",
            sudo_targets.len()
        );
        process(&sudo_targets, session, log);
        return;
    }

    tracing::info!(
        target: "dotlink::stage",
        "Installing dotfiles from {}",
        session.config.path.display()
    );
    if session.options.dry_run {
        tracing::info!(target: "dotlink::dry_run", "No changes will be made");
    }
    tracing::debug!(
        "Executing {} actions, sudo: {}, non-sudo: {}.",
        targets.len(),
        sudo_targets.len(),
        normal_targets.len()
    );

    if !sudo_targets.is_empty() {
        elevated_phase(&sudo_targets, session, log);
    }
    process(&normal_targets, session, log);
}

/// Handle the elevated group.
///
/// Dry runs and root runs keep it in-process; otherwise it goes to a
/// `sudo` subprocess whose report lines take numbers `1..=k`, so the
/// parent continues at `k + 1` whether or not the child succeeded.
fn elevated_phase(sudo_targets: &[&Target], session: &Session, log: &RunLog) {
    if session.options.dry_run || sudo::is_root(session.executor) {
        process(sudo_targets, session, log);
        return;
    }

    tracing::trace!("Starting new process for sudo actions");
    match sudo::run_elevated(
        session.executor,
        &session.config.path,
        session.options,
        session.verbose,
        session.ansi,
    ) {
        Ok(()) => log.note_elevated_done(sudo_targets.len()),
        Err(error) => {
            tracing::error!("{error:#}");
            for target in sudo_targets {
                log.record_silent(
                    Outcome::Failed,
                    &format!("Sudo process failed for {:?}", target.dest()),
                    true,
                );
            }
        }
    }
    log.advance_to(sudo_targets.len() + 1);
}

fn process(targets: &[&Target], session: &Session, log: &RunLog) {
    for target in targets {
        if session.interrupted.load(Ordering::SeqCst) {
            log.record(
                Outcome::Skipped,
                &format!("Interrupted before {:?}", target.dest()),
                target.sudo(),
            );
            continue;
        }
        let computed = match target {
            Target::Create(t) => plan::plan_create(t, &session.config.dir, session.options),
            Target::FileContent(t) => plan::plan_filecontent(t, session.options),
        };
        report(&computed, target.sudo(), session, log);
    }
}

fn report(computed: &TargetPlan, sudo: bool, session: &Session, log: &RunLog) {
    match &computed.plan {
        Plan::NoOpAlreadyCorrect { message } => {
            if !session.options.dry_run
                && let Err(error) = writer::apply(computed)
            {
                log.record(Outcome::Failed, &error.to_string(), sudo);
                return;
            }
            log.record(Outcome::AlreadyOk, message, sudo);
            if !session.options.dry_run {
                warn_symlink_mode(computed);
            }
        }
        Plan::Skip { reason } => log.record(Outcome::Skipped, reason, sudo),
        Plan::Fail { error } => log.record(Outcome::Failed, &error.to_string(), sudo),
        Plan::CreateNew { message, would, .. }
        | Plan::ReplaceExisting { message, would, .. }
        | Plan::RelinkExisting { message, would, .. } => {
            if session.options.dry_run {
                log.record(Outcome::WouldChange, would, sudo);
                if let Some(diff) = &computed.diff {
                    log.print_diff(diff);
                }
                return;
            }
            match writer::apply(computed) {
                Ok(()) => {
                    log.record(Outcome::Applied, message, sudo);
                    warn_symlink_mode(computed);
                    if let Some(diff) = &computed.diff {
                        log.print_diff(diff);
                    }
                }
                Err(error) => log.record(Outcome::Failed, &error.to_string(), sudo),
            }
        }
    }
}

/// Mode changes land on the file a link points to, not the link.
fn warn_symlink_mode(computed: &TargetPlan) {
    if let Some(mode) = &computed.mode
        && mode.warns_symlink
    {
        tracing::warn!(
            "Mode {:03o} applies to the target of the link {:?}, not the link itself",
            mode.bits,
            mode.dest
        );
    }
}
