//! `dotlink` binary entry point.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{CommandFactory as _, Parser as _};

use dotlink::config::Config;
use dotlink::error::ConfigError;
use dotlink::exec::SystemExecutor;
use dotlink::{cli, logging, paths, plan, runner, sudo};

fn main() {
    let args = cli::Cli::parse();

    if let Some(shell) = args.completions {
        let mut command = cli::Cli::command();
        clap_complete::generate(shell, &mut command, "dotlink", &mut std::io::stdout());
        return;
    }

    let ansi = args.color.resolved();
    let command = if args.sudo_only { "sudo" } else { "run" };
    logging::init_subscriber(args.verbose, command, ansi);

    let executor = SystemExecutor;
    if args.sudo_only && !sudo::is_root(&executor) {
        tracing::error!("The '--sudo-only' mode can only be run as root.");
        std::process::exit(1);
    }

    let config = match load_config(&args.config_file) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("{error}");
            std::process::exit(1);
        }
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(error) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        tracing::debug!("Could not install the interrupt handler: {error}");
    }

    let session = runner::Session {
        config: &config,
        options: plan::Options {
            force: args.force,
            dry_run: args.dry_run,
            show_diff: args.diff,
        },
        sudo_only: args.sudo_only,
        verbose: args.verbose,
        ansi,
        executor: &executor,
        interrupted: &interrupted,
    };
    std::process::exit(runner::run(&session));
}

/// Expand `~` and environment variables in the config path, then load.
fn load_config(raw: &str) -> Result<Config, ConfigError> {
    let expanded = paths::expand(raw)?;
    Config::load(Path::new(&expanded))
}
