// src/config/validate.rs

use crate::config::chain::CommandChain;
use crate::config::model::{RawSettings, Settings};
use crate::errors::{ChainwatchError, Result};
use crate::exec::LaunchOptions;
use crate::watch::{ExclusionRules, WatchScope};

/// Message shown when there is nothing to run.
pub const USAGE: &str = "no command chain given\n\nUsage:\n\tchainwatch 'command1 [&& command ...]'\n\techo 'command1 && command2' | chainwatch\n\tor set \"cmd\" in chainwatch.json\n\nUse --help for more";

impl TryFrom<RawSettings> for Settings {
    type Error = ChainwatchError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        let chain = ensure_has_chain(&raw)?;
        validate_timings(&raw)?;

        let scope = WatchScope::from_extensions(&raw.watch, raw.include_hidden)
            .map_err(|e| ChainwatchError::ConfigError(format!("invalid watch pattern: {e:#}")))?;
        let rules = ExclusionRules::anchored(&raw.root, &raw.exclude_dirs, &raw.exclude_files);

        Ok(Settings {
            root: raw.root,
            chain,
            watch: raw.watch,
            scope,
            rules,
            launch: LaunchOptions {
                attach_stdin: raw.attach_stdin,
                shell: raw.shell,
            },
            policy: raw.policy,
            quiet_window: raw.quiet_window,
            settle_delay: raw.settle_delay,
            poll_interval: raw.poll_interval,
        })
    }
}

fn ensure_has_chain(raw: &RawSettings) -> Result<CommandChain> {
    let chain = raw.chain.as_deref().map(CommandChain::parse).unwrap_or_default();
    if chain.is_empty() {
        return Err(ChainwatchError::ConfigError(USAGE.to_string()));
    }
    Ok(chain)
}

fn validate_timings(raw: &RawSettings) -> Result<()> {
    if raw.poll_interval.is_some_and(|d| d.is_zero()) {
        return Err(ChainwatchError::ConfigError(
            "poll interval must be >= 1ms (got 0)".to_string(),
        ));
    }
    Ok(())
}
