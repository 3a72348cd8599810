#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use chainwatch::config::{RawSettings, Settings};
use chainwatch::types::ChainPolicy;

/// Builder for `Settings` to simplify test setup.
///
/// Timings default to short test-friendly values rather than the 3 s / 1 s
/// production defaults.
pub struct SettingsBuilder {
    raw: RawSettings,
}

impl SettingsBuilder {
    pub fn new(root: impl Into<PathBuf>, chain: &str) -> Self {
        let mut raw = RawSettings::new(root, chain);
        raw.quiet_window = Duration::from_millis(200);
        raw.settle_delay = Duration::from_millis(50);
        Self { raw }
    }

    pub fn with_watch(mut self, ext: &str) -> Self {
        self.raw.watch.push(ext.to_string());
        self
    }

    pub fn with_exclude_dir(mut self, pattern: &str) -> Self {
        self.raw.exclude_dirs.push(pattern.to_string());
        self
    }

    pub fn with_exclude_file(mut self, pattern: &str) -> Self {
        self.raw.exclude_files.push(pattern.to_string());
        self
    }

    pub fn with_policy(mut self, policy: ChainPolicy) -> Self {
        self.raw.policy = policy;
        self
    }

    pub fn with_shell(mut self, shell: bool) -> Self {
        self.raw.shell = shell;
        self
    }

    pub fn with_quiet_window(mut self, window: Duration) -> Self {
        self.raw.quiet_window = window;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.raw.settle_delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.raw.poll_interval = Some(interval);
        self
    }

    pub fn raw(self) -> RawSettings {
        self.raw
    }

    pub fn build(self) -> Settings {
        Settings::try_from(self.raw).expect("Failed to build valid settings from builder")
    }
}
