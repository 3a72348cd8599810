// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::config::model::DEFAULT_CONFIG_FILE;
use crate::types::ChainPolicy;

/// Command-line arguments for `chainwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "chainwatch",
    version,
    about = "Re-run a chain of commands whenever files under the current directory change.",
    long_about = None
)]
pub struct CliArgs {
    /// Command chain to run, e.g. 'go build && ./app'.
    ///
    /// Overrides piped input and the `cmd` key of the JSON config.
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,

    /// File extensions to watch for, e.g. `-w go,c`.
    ///
    /// Overrides the `watch` key of the JSON config. Default: every file.
    #[arg(short = 'w', long = "watch", value_name = "EXTS", value_delimiter = ',')]
    pub watch: Vec<String>,

    /// Attach the children's stdin to this terminal.
    #[arg(long)]
    pub stdin: bool,

    /// Verbose output (debug logging).
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the optional JSON config file.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// What to do when a command fails to start or exits non-zero.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub policy: Option<ChainPolicy>,

    /// Run each command through the platform shell instead of directly.
    #[arg(long)]
    pub shell: bool,

    /// Minimum time between two accepted triggers, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub quiet_ms: Option<u64>,

    /// Pause after killing the previous run before starting the next, in
    /// milliseconds.
    #[arg(long, value_name = "MS")]
    pub settle_ms: Option<u64>,

    /// Poll the filesystem at this interval (milliseconds) instead of using
    /// native change notifications.
    #[arg(long, value_name = "MS")]
    pub poll_ms: Option<u64>,

    /// Run the chain once, without watching, and exit.
    #[arg(long)]
    pub once: bool,

    /// Resolve and print the configuration, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `--verbose`, `CHAINWATCH_LOG` or a default level is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
