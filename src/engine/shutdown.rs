// src/engine/shutdown.rs

use std::fmt;
use std::io;

use tracing::{debug, info, warn};

use crate::engine::ActiveProcess;
use crate::errors::Result;

/// Which termination signal arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
    Quit,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownSignal::Interrupt => "SIGINT",
            ShutdownSignal::Terminate => "SIGTERM",
            ShutdownSignal::Quit => "SIGQUIT",
        };
        f.write_str(name)
    }
}

/// Wait for SIGINT, SIGTERM or SIGQUIT (Ctrl-C only on Windows).
pub async fn wait_for_signal() -> io::Result<ShutdownSignal> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term = signal(SignalKind::terminate())?;
        let mut quit = signal(SignalKind::quit())?;

        tokio::select! {
            res = tokio::signal::ctrl_c() => res.map(|_| ShutdownSignal::Interrupt),
            _ = term.recv() => Ok(ShutdownSignal::Terminate),
            _ = quit.recv() => Ok(ShutdownSignal::Quit),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(ShutdownSignal::Interrupt)
    }
}

/// Resolve on the first termination signal, after killing the live child.
///
/// Handlers stay installed until the process exits, so a second signal
/// during shutdown is swallowed instead of killing us half-way.
pub async fn watch_for_shutdown(active: ActiveProcess) -> Result<ShutdownSignal> {
    let signal = wait_for_signal().await?;
    shutdown(&active, signal);
    Ok(signal)
}

/// Announce shutdown, terminate the active-process cell and kill the live
/// child, if any. The chain it belonged to stops instead of moving on.
pub fn shutdown(active: &ActiveProcess, signal: ShutdownSignal) {
    println!("[chainwatch] exiting..");
    info!(%signal, "shutdown requested");

    match active.terminate() {
        Ok(Some(handle)) => info!(pid = handle.pid, "killed active process"),
        Ok(None) => debug!("no active process to kill"),
        Err(err) => warn!(error = %err, "failed to kill active process"),
    }
}
