//! Declarative dotfiles installation engine.
//!
//! Installs dotfiles from a YAML configuration: links or copies
//! sources (local files or URL downloads) into place, splices content
//! blocks into existing files, and hands `sudo: true` targets to a
//! privilege-escalated subprocess.
//!
//! The crate is organised as a pipeline:
//!
//! - **[`config`]**: parse and validate the YAML target list
//! - **[`plan`]**: per-target decisions computed from filesystem state
//! - **[`writer`]**: the mutations those decisions call for
//! - **[`runner`]**: two-phase orchestration and per-target reporting
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod fetch;
pub mod logging;
pub mod paths;
pub mod plan;
pub mod runner;
pub mod sudo;
pub mod writer;

#[cfg(test)]
mod test_util;
