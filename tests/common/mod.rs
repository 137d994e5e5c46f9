// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed sandbox holding a config file,
// its source files, and the destinations a run writes to, plus a runner
// that drives the library the same way `main` does.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use dotlink::config::Config;
use dotlink::exec::SystemExecutor;
use dotlink::plan::Options;
use dotlink::runner::{self, Session};

/// An isolated directory tree for one test: config file, sources, and
/// destinations all live under a [`tempfile::TempDir`] root.
pub struct Sandbox {
    root: tempfile::TempDir,
}

impl Sandbox {
    /// Create an empty sandbox.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create sandbox"),
        }
    }

    /// Absolute path of the sandbox root.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Absolute path of `rel` under the sandbox root.
    pub fn join(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    /// Create a directory (and its parents) under the sandbox root.
    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.join(rel);
        std::fs::create_dir_all(&path).expect("create directory");
        path
    }

    /// Write a file under the sandbox root, creating parent directories
    /// as needed.
    pub fn seed(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent directories");
        }
        std::fs::write(&path, content).expect("seed file");
        path
    }

    /// Write `config.yml` under the sandbox root and load it.
    ///
    /// Panics when the config fails validation; tests that expect a
    /// load error call [`Config::load`] directly instead.
    pub fn config(&self, yaml: &str) -> Config {
        let path = self.seed("config.yml", yaml);
        Config::load(&path).expect("valid config")
    }

    /// Load `yaml` and run the full pipeline, returning the exit code.
    pub fn run(&self, yaml: &str, options: Options) -> i32 {
        let config = self.config(yaml);
        self.run_config(&config, options)
    }

    /// Run the full pipeline over an already loaded config.
    pub fn run_config(&self, config: &Config, options: Options) -> i32 {
        let executor = SystemExecutor;
        let interrupted = AtomicBool::new(false);
        let session = Session {
            config,
            options,
            sudo_only: false,
            verbose: 0,
            ansi: false,
            executor: &executor,
            interrupted: &interrupted,
        };
        runner::run(&session)
    }

    /// Timestamped backup artifacts next to `rel`, sorted by name.
    ///
    /// A backup of `dir/file` is named `dir/file.<timestamp>`, so this
    /// lists every sibling whose name extends `rel`'s file name by a
    /// dot-separated suffix.
    pub fn backups_of(&self, rel: &str) -> Vec<PathBuf> {
        let path = self.join(rel);
        let dir = path.parent().expect("backup parent");
        let name = path
            .file_name()
            .expect("backup file name")
            .to_string_lossy()
            .into_owned();
        let prefix = format!("{name}.");
        let mut found: Vec<PathBuf> = std::fs::read_dir(dir)
            .expect("read backup directory")
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with(&prefix))
            })
            .collect();
        found.sort();
        found
    }

    /// Every entry under the sandbox root with its payload, sorted by
    /// path: file content for regular files, the link target for
    /// symlinks, and an empty payload for directories. Two identical
    /// snapshots mean the tree did not change between them.
    pub fn tree(&self) -> Vec<(PathBuf, Vec<u8>)> {
        let mut entries = Vec::new();
        collect(self.root.path(), self.root.path(), &mut entries);
        entries.sort();
        entries
    }
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<(PathBuf, Vec<u8>)>) {
    for entry in std::fs::read_dir(dir).expect("read directory") {
        let path = entry.expect("directory entry").path();
        let rel = path
            .strip_prefix(root)
            .expect("path under root")
            .to_path_buf();
        if path.is_symlink() {
            let target = std::fs::read_link(&path).expect("read link");
            out.push((rel, target.into_os_string().into_encoded_bytes()));
        } else if path.is_dir() {
            collect(root, &path, out);
            out.push((rel, Vec::new()));
        } else {
            out.push((rel, std::fs::read(&path).expect("read file")));
        }
    }
}

/// Options for a plain wet run.
pub fn wet() -> Options {
    Options::default()
}

/// Options for a wet run with `--force`.
pub fn forced() -> Options {
    Options {
        force: true,
        ..Options::default()
    }
}

/// Options for a dry run.
pub fn dry() -> Options {
    Options {
        dry_run: true,
        ..Options::default()
    }
}
