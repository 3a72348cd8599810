// src/engine/mod.rs

//! Process supervision for chainwatch.
//!
//! This module ties together:
//! - the trigger channel (single-slot handoff from the event pump)
//! - the shared [`ActiveProcess`] cell holding the current epoch and the
//!   live child, if any
//! - the [`Supervisor`] loop that kills the previous run and starts a new
//!   epoch for every trigger
//! - the shutdown watcher that kills the live child on SIGINT/SIGTERM/SIGQUIT

use std::path::PathBuf;

use tokio::sync::mpsc;

/// Generation counter; one per accepted trigger.
pub type Epoch = u64;

/// Room for exactly one unconsumed trigger; a second send waits.
pub const TRIGGER_CHANNEL_CAPACITY: usize = 1;

/// "Re-run the command chain now."
///
/// The payload is only used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Initial run when the program starts.
    Startup,
    /// A relevant file changed.
    FileChange(PathBuf),
}

/// Create the trigger channel between the event pump and the supervisor.
pub fn trigger_channel() -> (mpsc::Sender<Trigger>, mpsc::Receiver<Trigger>) {
    mpsc::channel(TRIGGER_CHANNEL_CAPACITY)
}

pub mod active;
pub mod shutdown;
pub mod supervisor;

pub use active::{ActiveProcess, ProcessHandle, StaleEpoch};
pub use shutdown::{watch_for_shutdown, ShutdownSignal};
pub use supervisor::Supervisor;
