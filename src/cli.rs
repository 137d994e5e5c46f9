//! Command-line interface definition.
use clap::Parser;

/// Default configuration file location, expanded at load time.
pub const DEFAULT_CONFIG_FILE: &str = "~/dotfiles/config.yml";

/// Top-level CLI entry point for the dotfiles installer.
#[derive(Parser, Debug)]
#[command(
    name = "dotlink",
    about = "Install dotfiles from a declarative YAML configuration",
    version = option_env!("DOTLINK_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
)]
pub struct Cli {
    /// Dotfiles YAML configuration file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: String,

    /// Don't make changes, only show what would be done
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Show the differences in changed files; works great with --dry-run
    #[arg(long)]
    pub diff: bool,

    /// Overwrite existing files by default
    #[arg(short, long)]
    pub force: bool,

    /// Colorize the output
    #[arg(long, value_enum, value_name = "WHEN", default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Verbose mode; repeat the option to increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Process only the sudo-tagged targets (used by the elevated subprocess)
    #[arg(long, hide = true)]
    pub sudo_only: bool,

    /// Generate shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL", hide = true)]
    pub completions: Option<clap_complete::Shell>,
}

/// When to colorize console output.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Always emit ANSI color codes.
    Always,
    /// Emit color codes only when stdout is a terminal.
    Auto,
    /// Never emit color codes.
    Never,
}

impl ColorMode {
    /// Resolve to a concrete on/off decision for the current stdout.
    #[must_use]
    pub fn resolved(self) -> bool {
        use std::io::IsTerminal as _;
        match self {
            Self::Always => true,
            Self::Auto => std::io::stdout().is_terminal(),
            Self::Never => false,
        }
    }
}
