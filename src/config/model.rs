// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::config::chain::CommandChain;
use crate::exec::LaunchOptions;
use crate::types::ChainPolicy;
use crate::watch::{ExclusionRules, WatchScope};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "chainwatch.json";

/// Minimum time between two accepted triggers.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_secs(3);

/// Pause between killing a superseded run and starting the next one.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Optional JSON config file.
///
/// ```json
/// {
///   "watch": ["go", "c"],
///   "exclude": { "dirs": ["build"], "files": ["*_test.go"] },
///   "cmd": "go build && ./app"
/// }
/// ```
///
/// Every key is optional; unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// File extensions to watch for. `None` means "every file".
    #[serde(default)]
    pub watch: Option<Vec<String>>,

    #[serde(default)]
    pub exclude: ExcludeSection,

    /// Command chain, `&&`-separated. Used only when none is given on the
    /// command line or through a pipe.
    #[serde(default)]
    pub cmd: Option<String>,

    #[serde(default)]
    pub policy: Option<ChainPolicy>,

    #[serde(default)]
    pub shell: Option<bool>,

    /// Also react to changes under hidden files and directories.
    #[serde(default)]
    pub include_hidden: Option<bool>,

    #[serde(default)]
    pub quiet_ms: Option<u64>,

    #[serde(default)]
    pub settle_ms: Option<u64>,

    #[serde(default)]
    pub poll_ms: Option<u64>,
}

/// `exclude` object of the JSON config.
///
/// Directory patterns are anchored at the watched root; file patterns are
/// matched against base names. `*` stands for "anything".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeSection {
    #[serde(default)]
    pub dirs: Vec<String>,

    #[serde(default)]
    pub files: Vec<String>,
}

/// CLI and JSON merged, but not yet compiled or validated.
#[derive(Debug, Clone)]
pub struct RawSettings {
    pub root: PathBuf,
    pub chain: Option<String>,
    pub watch: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub exclude_files: Vec<String>,
    pub include_hidden: bool,
    pub attach_stdin: bool,
    pub shell: bool,
    pub policy: ChainPolicy,
    pub quiet_window: Duration,
    pub settle_delay: Duration,
    pub poll_interval: Option<Duration>,
}

impl RawSettings {
    /// Settings rooted at `root` running `chain`, everything else default.
    pub fn new(root: impl Into<PathBuf>, chain: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            chain: Some(chain.into()),
            watch: Vec::new(),
            exclude_dirs: Vec::new(),
            exclude_files: Vec::new(),
            include_hidden: false,
            attach_stdin: false,
            shell: false,
            policy: ChainPolicy::default(),
            quiet_window: DEFAULT_QUIET_WINDOW,
            settle_delay: DEFAULT_SETTLE_DELAY,
            poll_interval: None,
        }
    }
}

/// Fully resolved configuration the core runs with.
///
/// Built through `Settings::try_from(RawSettings)`, which compiles the watch
/// scope and exclusion rules once and rejects an empty command chain.
#[derive(Debug, Clone)]
pub struct Settings {
    pub root: PathBuf,
    pub chain: CommandChain,
    pub watch: Vec<String>,
    pub scope: WatchScope,
    pub rules: ExclusionRules,
    pub launch: LaunchOptions,
    pub policy: ChainPolicy,
    pub quiet_window: Duration,
    pub settle_delay: Duration,
    pub poll_interval: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_keys_are_all_optional() {
        let cfg: ConfigFile = serde_json::from_str("{}").unwrap();
        assert!(cfg.watch.is_none());
        assert!(cfg.cmd.is_none());
        assert!(cfg.exclude.dirs.is_empty());
    }

    #[test]
    fn json_full_example_parses() {
        let cfg: ConfigFile = serde_json::from_str(
            r#"{
                "watch": ["go"],
                "exclude": { "dirs": ["build"], "files": ["*_test.go"] },
                "cmd": "go build && ./app",
                "policy": "stop-on-failure",
                "poll_ms": 300,
                "comment": "ignored"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.watch, Some(vec!["go".to_string()]));
        assert_eq!(cfg.exclude.files, vec!["*_test.go"]);
        assert_eq!(cfg.policy, Some(ChainPolicy::StopOnFailure));
        assert_eq!(cfg.poll_ms, Some(300));
    }
}
