// src/config/loader.rs

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, error};

use crate::cli::CliArgs;
use crate::config::model::{
    ConfigFile, DEFAULT_QUIET_WINDOW, DEFAULT_SETTLE_DELAY, RawSettings, Settings,
};
use crate::errors::{ChainwatchError, Result};
use crate::fs::{FileSystem, RealFileSystem};

/// Resolve the settings for this process.
///
/// Reads a piped command chain from stdin when no command was given on the
/// command line, then delegates to [`load_settings_with`].
pub fn load_settings(args: &CliArgs) -> Result<Settings> {
    let piped = if args.command.is_empty() {
        read_piped_chain()?
    } else {
        None
    };
    load_settings_with(&RealFileSystem, args, piped)
}

/// Resolve settings against an explicit filesystem and piped input.
///
/// - The watched root is the (canonical) working directory.
/// - `args.config` is read relative to it, if present.
/// - CLI, pipe and JSON are merged by [`resolve`] and validated.
pub fn load_settings_with(
    fs: &dyn FileSystem,
    args: &CliArgs,
    piped: Option<String>,
) -> Result<Settings> {
    let cwd = fs.current_dir()?;
    let root = fs.canonicalize(&cwd).unwrap_or(cwd);

    let config_path = {
        let p = PathBuf::from(&args.config);
        if p.is_absolute() { p } else { root.join(p) }
    };
    let file = load_config_file(fs, &config_path)?;

    Settings::try_from(resolve(args, root, file, piped))
}

/// Read the optional JSON config.
///
/// A missing file is not an error; an unreadable or malformed one is.
pub fn load_config_file(fs: &dyn FileSystem, path: &Path) -> Result<Option<ConfigFile>> {
    if !fs.exists(path) {
        debug!(?path, "no config file; using defaults");
        return Ok(None);
    }

    let contents = fs
        .read_to_string(path)
        .map_err(|e| ChainwatchError::ConfigError(format!("{e:#}")))?;

    let cfg: ConfigFile = serde_json::from_str(&contents).inspect_err(|e| {
        error!(?path, error = %e, "failed to parse config file");
    })?;

    debug!(?path, ?cfg, "config file read");
    Ok(Some(cfg))
}

/// Merge CLI arguments, piped input and the JSON file.
///
/// Precedence for the chain: positional CLI command, then piped input, then
/// `cmd` from the file. `--watch` replaces the file's `watch` list; every
/// other flag overrides its JSON key when given.
pub fn resolve(
    args: &CliArgs,
    root: PathBuf,
    file: Option<ConfigFile>,
    piped: Option<String>,
) -> RawSettings {
    let file = file.unwrap_or_default();

    let chain = if !args.command.is_empty() {
        Some(args.command.join(" "))
    } else {
        piped.or(file.cmd)
    };

    let watch = if !args.watch.is_empty() {
        args.watch.clone()
    } else {
        file.watch.unwrap_or_default()
    };

    let millis = |cli: Option<u64>, json: Option<u64>| cli.or(json).map(Duration::from_millis);

    RawSettings {
        root,
        chain,
        watch,
        exclude_dirs: file.exclude.dirs,
        exclude_files: file.exclude.files,
        include_hidden: file.include_hidden.unwrap_or(false),
        attach_stdin: args.stdin,
        shell: args.shell || file.shell.unwrap_or(false),
        policy: args.policy.or(file.policy).unwrap_or_default(),
        quiet_window: millis(args.quiet_ms, file.quiet_ms).unwrap_or(DEFAULT_QUIET_WINDOW),
        settle_delay: millis(args.settle_ms, file.settle_ms).unwrap_or(DEFAULT_SETTLE_DELAY),
        poll_interval: millis(args.poll_ms, file.poll_ms),
    }
}

/// Read a command chain piped into stdin, if stdin is not a terminal.
fn read_piped_chain() -> Result<Option<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buf = String::new();
    stdin.lock().read_to_string(&mut buf)?;

    let chain = buf.trim_end_matches(['\r', '\n']);
    if chain.trim().is_empty() {
        return Ok(None);
    }
    debug!(chain, "read command chain from stdin");
    Ok(Some(chain.to_string()))
}
