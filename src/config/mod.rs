//! Configuration loading and validation.

mod model;
mod validation;

pub use model::{
    Action, CreateKind, CreateTarget, DestKind, FileContentTarget, Policy, SourceKind, Target,
};
pub(crate) use validation::mode_bits;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// A loaded and validated configuration.
#[derive(Debug)]
pub struct Config {
    /// Absolute path of the config file.
    pub path: PathBuf,
    /// Directory containing the config file; relative `src` paths
    /// resolve against it.
    pub dir: PathBuf,
    /// Every target in file order.
    pub targets: Vec<Target>,
}

impl Config {
    /// Load and validate the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the file cannot be read, is not
    /// valid YAML for the expected schema, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let abs = std::path::absolute(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let text = std::fs::read_to_string(&abs).map_err(|source| ConfigError::Io {
            path: abs.display().to_string(),
            source,
        })?;
        let actions: Vec<Action> =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: abs.display().to_string(),
                source,
            })?;
        let targets = model::flatten(actions);
        validation::validate(&targets)?;
        let dir = abs
            .parent()
            .map_or_else(|| PathBuf::from("/"), Path::to_path_buf);
        Ok(Self {
            path: abs,
            dir,
            targets,
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn write_config(yaml: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yml");
        std::fs::write(&path, yaml).expect("write config");
        (dir, path)
    }

    #[test]
    fn load_minimal_config() {
        let (dir, path) = write_config(
            r"- create:
    - src: bashrc
      dest: /home/u/.bashrc
- filecontent:
    - dest: /etc/hosts
      content: '127.0.0.1 box'
",
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.dir, std::path::absolute(dir.path()).unwrap());
        assert!(config.path.is_absolute());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Config::load(&dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("Cannot read config file"));
    }

    #[test]
    fn load_invalid_yaml_is_parse_error() {
        let (_dir, path) = write_config("- create: [\n");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_unknown_action_is_parse_error() {
        let (_dir, path) = write_config(
            r"- remove:
    - dest: /tmp/x
",
        );
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_runs_validation() {
        let (_dir, path) = write_config(
            r"- create:
    - src: a
      dest: '/etc/*/conf'
      dest_type: glob_multiple
",
        );
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::GlobMultipleUnsupported { .. }));
    }

    #[test]
    fn load_empty_list_is_ok() {
        let (_dir, path) = write_config("[]\n");
        let config = Config::load(&path).unwrap();
        assert!(config.targets.is_empty());
    }
}
