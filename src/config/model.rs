//! Configuration file data model.
//!
//! The configuration is a YAML list of actions. Each action is a single-key
//! map from the action name to the list of targets it applies to:
//!
//! ```yaml
//! - create:
//!     - src: bashrc
//!       dest: ~/.bashrc
//! - filecontent:
//!     - dest: ~/.config/git/config
//!       content: "[user]\n  name = me\n"
//! ```

use serde::Deserialize;

/// One action from the configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Link or copy a source file to a destination path.
    Create(Vec<CreateTarget>),
    /// Ensure a block of content is present in an existing file.
    Filecontent(Vec<FileContentTarget>),
}

/// How the destination is materialized from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateKind {
    /// Symlink, or a copy when the target runs under sudo.
    #[default]
    Auto,
    /// Always a symlink.
    Link,
    /// Always a byte copy.
    Copy,
}

/// How the `src` string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// URL when the string carries a URL scheme, local path otherwise.
    #[default]
    Auto,
    /// Local filesystem path.
    Path,
    /// Remote file fetched over HTTP(S).
    Url,
}

/// How the `dest` string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestKind {
    /// Literal path.
    #[default]
    Normal,
    /// The directory part is a glob pattern that must match exactly one
    /// directory; the file name part stays literal.
    GlobSingle,
    /// Reserved; rejected during validation.
    GlobMultiple,
}

/// When an existing destination may be replaced or relinked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Proceed only in force mode.
    #[default]
    Allow,
    /// Proceed unconditionally.
    Always,
    /// Never proceed.
    Never,
}

/// A single `create` target.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTarget {
    /// Source path or URL. Relative paths resolve against the directory
    /// containing the configuration file.
    pub src: String,
    /// Destination path. May contain environment variables and `~`.
    pub dest: String,
    /// Link, copy, or pick automatically.
    #[serde(rename = "type", default)]
    pub kind: CreateKind,
    /// Source classification override.
    #[serde(default)]
    pub src_type: SourceKind,
    /// Destination classification.
    #[serde(default)]
    pub dest_type: DestKind,
    /// Create missing parent directories of `dest`.
    #[serde(default)]
    pub create_dirs: bool,
    /// Policy for re-pointing an existing symlink at `dest`.
    #[serde(default)]
    pub relink: Policy,
    /// Policy for replacing an existing file at `dest`.
    #[serde(default)]
    pub replace: Policy,
    /// Keep a timestamped backup when replacing a regular file.
    #[serde(default = "default_true")]
    pub backup: bool,
    /// Octal permission string applied to `dest` after creation.
    pub mode: Option<String>,
    /// Run this target in the elevated phase.
    #[serde(default)]
    pub sudo: bool,
}

/// A single `filecontent` target.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileContentTarget {
    /// File to edit. Must already exist.
    pub dest: String,
    /// Content that must be present in the file.
    pub content: String,
    /// Pattern locating an existing span to replace with `content`.
    /// Must itself match `content`.
    pub regex: Option<String>,
    /// Pattern after whose last match `content` is inserted.
    pub after: Option<String>,
    /// Keep a timestamped backup when the file changes.
    #[serde(default = "default_true")]
    pub backup: bool,
    /// Run this target in the elevated phase.
    #[serde(default)]
    pub sudo: bool,
}

const fn default_true() -> bool {
    true
}

/// A single unit of work from the configuration, in file order.
#[derive(Debug, Clone)]
pub enum Target {
    /// A `create` target.
    Create(CreateTarget),
    /// A `filecontent` target.
    FileContent(FileContentTarget),
}

impl Target {
    /// Whether this target runs in the elevated phase.
    #[must_use]
    pub const fn sudo(&self) -> bool {
        match self {
            Self::Create(target) => target.sudo,
            Self::FileContent(target) => target.sudo,
        }
    }

    /// The destination as written in the config, for report lines that
    /// have no planner message to show.
    #[must_use]
    pub fn dest(&self) -> &str {
        match self {
            Self::Create(target) => &target.dest,
            Self::FileContent(target) => &target.dest,
        }
    }
}

/// Flatten parsed actions into one ordered target list.
#[must_use]
pub fn flatten(actions: Vec<Action>) -> Vec<Target> {
    let mut targets = Vec::new();
    for action in actions {
        match action {
            Action::Create(list) => {
                targets.extend(list.into_iter().map(Target::Create));
            }
            Action::Filecontent(list) => {
                targets.extend(list.into_iter().map(Target::FileContent));
            }
        }
    }
    targets
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Vec<Action> {
        serde_yaml::from_str(yaml).expect("valid yaml")
    }

    #[test]
    fn parse_minimal_create() {
        let actions = parse(
            r"- create:
    - src: bashrc
      dest: ~/.bashrc
",
        );
        assert_eq!(actions.len(), 1);
        let Action::Create(targets) = &actions[0] else {
            panic!("expected create action");
        };
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].src, "bashrc");
        assert_eq!(targets[0].dest, "~/.bashrc");
    }

    #[test]
    fn create_defaults() {
        let actions = parse(
            r"- create:
    - src: a
      dest: /b
",
        );
        let Action::Create(targets) = &actions[0] else {
            panic!("expected create action");
        };
        let target = &targets[0];
        assert_eq!(target.kind, CreateKind::Auto);
        assert_eq!(target.src_type, SourceKind::Auto);
        assert_eq!(target.dest_type, DestKind::Normal);
        assert!(!target.create_dirs);
        assert_eq!(target.relink, Policy::Allow);
        assert_eq!(target.replace, Policy::Allow);
        assert!(target.backup);
        assert!(target.mode.is_none());
        assert!(!target.sudo);
    }

    #[test]
    fn create_all_fields() {
        let actions = parse(
            r"- create:
    - src: https://example.com/conf
      dest: /etc/conf
      type: copy
      src_type: url
      dest_type: glob_single
      create_dirs: true
      relink: never
      replace: always
      backup: false
      mode: '0644'
      sudo: true
",
        );
        let Action::Create(targets) = &actions[0] else {
            panic!("expected create action");
        };
        let target = &targets[0];
        assert_eq!(target.kind, CreateKind::Copy);
        assert_eq!(target.src_type, SourceKind::Url);
        assert_eq!(target.dest_type, DestKind::GlobSingle);
        assert!(target.create_dirs);
        assert_eq!(target.relink, Policy::Never);
        assert_eq!(target.replace, Policy::Always);
        assert!(!target.backup);
        assert_eq!(target.mode.as_deref(), Some("0644"));
        assert!(target.sudo);
    }

    #[test]
    fn parse_filecontent() {
        let actions = parse(
            r"- filecontent:
    - dest: /etc/hosts
      content: '127.0.0.1 box'
      regex: '^127\.0\.0\.1 .*$'
      after: '^localhost'
",
        );
        let Action::Filecontent(targets) = &actions[0] else {
            panic!("expected filecontent action");
        };
        let target = &targets[0];
        assert_eq!(target.dest, "/etc/hosts");
        assert_eq!(target.content, "127.0.0.1 box");
        assert!(target.regex.is_some());
        assert!(target.after.is_some());
        assert!(target.backup);
        assert!(!target.sudo);
    }

    #[test]
    fn unknown_action_is_rejected() {
        let result: Result<Vec<Action>, _> = serde_yaml::from_str(
            r"- remove:
    - dest: /tmp/x
",
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result: Result<Vec<Action>, _> = serde_yaml::from_str(
            r"- create:
    - src: a
      dest: /b
      colour: red
",
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let result: Result<Vec<Action>, _> = serde_yaml::from_str(
            r"- create:
    - src: a
",
        );
        assert!(result.is_err());
    }

    #[test]
    fn flatten_preserves_order_across_actions() {
        let actions = parse(
            r"- create:
    - src: a
      dest: /a
    - src: b
      dest: /b
- filecontent:
    - dest: /c
      content: x
- create:
    - src: d
      dest: /d
",
        );
        let targets = flatten(actions);
        assert_eq!(targets.len(), 4);
        assert!(matches!(&targets[0], Target::Create(t) if t.src == "a"));
        assert!(matches!(&targets[1], Target::Create(t) if t.src == "b"));
        assert!(matches!(&targets[2], Target::FileContent(t) if t.dest == "/c"));
        assert!(matches!(&targets[3], Target::Create(t) if t.src == "d"));
    }

    #[test]
    fn target_sudo_flag() {
        let actions = parse(
            r"- create:
    - src: a
      dest: /a
      sudo: true
- filecontent:
    - dest: /c
      content: x
",
        );
        let targets = flatten(actions);
        assert!(targets[0].sudo());
        assert!(!targets[1].sudo());
    }
}
