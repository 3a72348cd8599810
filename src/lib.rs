// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_settings, Settings};
use crate::engine::{trigger_channel, watch_for_shutdown, ActiveProcess, ShutdownSignal, Supervisor, Trigger};
use crate::exec::{ChainOutcome, ChainRunner};
use crate::watch::{spawn_watcher, Debouncer, EventPump};

pub use crate::errors::{ChainwatchError, Result};

/// Time the supervisor gets, on top of the settle delay, to wind down its
/// chain tasks at exit.
const SUPERVISOR_GRACE: Duration = Duration::from_secs(2);

/// How [`run`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// A termination signal arrived; the live child was killed.
    Shutdown(ShutdownSignal),
    /// `--once`: the single chain run finished.
    Chain(ChainOutcome),
    /// `--dry-run`: nothing was started.
    DryRun,
    /// The filesystem watcher stopped without reporting an error.
    SourceClosed,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Chain(outcome) if !outcome.is_success() => 1,
            RunOutcome::SourceClosed => 1,
            _ => 0,
        }
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings (CLI, piped stdin, JSON file)
/// - the chain runner and the shared active-process cell
/// - (unless `--once`) the file watcher, event pump and supervisor
/// - the shutdown watcher
pub async fn run(args: CliArgs) -> Result<RunOutcome> {
    let settings = load_settings(&args)?;
    info!(
        root = %settings.root.display(),
        chain = %settings.chain,
        policy = ?settings.policy,
        "configuration loaded"
    );

    if args.dry_run {
        print_dry_run(&settings);
        return Ok(RunOutcome::DryRun);
    }

    let active = ActiveProcess::new();
    let runner = ChainRunner::new(
        settings.chain.clone(),
        settings.launch,
        settings.policy,
        active.clone(),
    );

    if args.once {
        return run_once(runner, active).await;
    }

    let shutdown = watch_for_shutdown(active.clone());
    watch_and_rerun(settings, runner, active, shutdown).await
}

async fn run_once(runner: ChainRunner, active: ActiveProcess) -> Result<RunOutcome> {
    let (epoch, _) = active.advance_epoch();

    tokio::select! {
        outcome = runner.run(epoch) => Ok(RunOutcome::Chain(outcome)),
        signal = watch_for_shutdown(active.clone()) => signal.map(RunOutcome::Shutdown),
    }
}

async fn watch_and_rerun<S>(
    settings: Settings,
    runner: ChainRunner,
    active: ActiveProcess,
    shutdown: S,
) -> Result<RunOutcome>
where
    S: Future<Output = Result<ShutdownSignal>>,
{
    let (trigger_tx, trigger_rx) = trigger_channel();

    // Initial run, before any file has changed.
    trigger_tx
        .try_send(Trigger::Startup)
        .map_err(|e| anyhow::anyhow!("queueing startup trigger: {e}"))?;

    // Kept alive until we return; dropping it stops the watcher.
    let (_watcher, events) = spawn_watcher(&settings.root, settings.poll_interval)?;

    let pump = EventPump::new(
        settings.root.clone(),
        settings.scope.clone(),
        Arc::new(settings.rules.clone()),
        Debouncer::new(settings.quiet_window),
        trigger_tx,
    );
    let supervisor = Supervisor::new(Arc::new(runner), active.clone(), settings.settle_delay);

    let mut pump_task = tokio::spawn(pump.run(events));
    let mut supervisor_task = tokio::spawn(supervisor.run(trigger_rx));
    let mut pump_done = false;
    let mut supervisor_done = false;

    let result = tokio::select! {
        signal = shutdown => signal.map(RunOutcome::Shutdown),
        res = &mut pump_task => {
            pump_done = true;
            flatten_join(res).map(|()| RunOutcome::SourceClosed)
        }
        res = &mut supervisor_task => {
            supervisor_done = true;
            flatten_join(res).map(|()| RunOutcome::SourceClosed)
        }
    };

    // No command may start from here on; a no-op if shutdown already did it.
    match active.terminate() {
        Ok(Some(handle)) => debug!(pid = handle.pid, "killed active process on exit"),
        Ok(None) => {}
        Err(err) => warn!(error = %err, "failed to kill active process on exit"),
    }

    // Stopping the pump closes the trigger channel, which lets the
    // supervisor drain its chain tasks and return.
    if !pump_done {
        pump_task.abort();
        let _ = pump_task.await;
    }
    if !supervisor_done {
        let grace = settings.settle_delay + SUPERVISOR_GRACE;
        match tokio::time::timeout(grace, &mut supervisor_task).await {
            Ok(res) => {
                if let Err(err) = flatten_join(res) {
                    warn!(error = %err, "supervisor failed while stopping");
                }
            }
            Err(_) => {
                warn!(?grace, "supervisor did not stop in time; aborting");
                supervisor_task.abort();
                let _ = supervisor_task.await;
            }
        }
    }

    result
}

fn flatten_join<T>(res: std::result::Result<Result<T>, JoinError>) -> Result<T> {
    res.map_err(anyhow::Error::from)?
}

/// Print the resolved settings without running anything.
fn print_dry_run(settings: &Settings) {
    println!("chainwatch dry-run");
    println!("  root = {}", settings.root.display());
    println!("  policy = {:?}", settings.policy);
    println!("  shell = {}", settings.launch.shell);
    println!("  attach_stdin = {}", settings.launch.attach_stdin);
    println!("  quiet_window = {:?}", settings.quiet_window);
    println!("  settle_delay = {:?}", settings.settle_delay);
    match settings.poll_interval {
        Some(interval) => println!("  poll_interval = {interval:?}"),
        None => println!("  poll_interval = native events"),
    }
    println!();

    println!("commands ({}):", settings.chain.len());
    for (i, cmd) in settings.chain.iter().enumerate() {
        println!("  {}. {cmd}", i + 1);
    }

    if settings.watch.is_empty() {
        println!("watch: all files");
    } else {
        println!("watch: {:?}", settings.watch);
    }

    for pat in settings.rules.dir_patterns() {
        println!("exclude dir: {pat}");
    }
    for pat in settings.rules.file_patterns() {
        println!("exclude file: {pat}");
    }

    debug!("dry-run complete (no execution)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(RunOutcome::DryRun.exit_code(), 0);
        assert_eq!(RunOutcome::Shutdown(ShutdownSignal::Interrupt).exit_code(), 0);
        assert_eq!(RunOutcome::Chain(ChainOutcome::Completed { failures: 0 }).exit_code(), 0);
        assert_eq!(RunOutcome::Chain(ChainOutcome::Completed { failures: 2 }).exit_code(), 1);
        assert_eq!(RunOutcome::Chain(ChainOutcome::Halted { index: 0 }).exit_code(), 1);
        assert_eq!(RunOutcome::SourceClosed.exit_code(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shutdown_while_watching_stops_chain_and_supervisor() {
        use tokio::sync::mpsc;

        use crate::config::RawSettings;
        use crate::engine::shutdown::shutdown;
        use crate::exec::{ChainEvent, LaunchOptions};
        use crate::types::ChainPolicy;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let mut raw = RawSettings::new(&root, "sleep 30 && sleep 31");
        raw.poll_interval = Some(Duration::from_millis(50));
        raw.settle_delay = Duration::from_millis(10);
        let settings = Settings::try_from(raw).unwrap();

        let active = ActiveProcess::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let runner = ChainRunner::new(
            settings.chain.clone(),
            LaunchOptions::default(),
            ChainPolicy::ContinueOnFailure,
            active.clone(),
        )
        .with_events(tx);

        let signal_active = active.clone();
        let signal = async move {
            while signal_active.current().is_none() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            shutdown(&signal_active, ShutdownSignal::Terminate);
            Ok::<_, ChainwatchError>(ShutdownSignal::Terminate)
        };

        let outcome = tokio::time::timeout(
            Duration::from_secs(10),
            watch_and_rerun(settings, runner, active.clone(), signal),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(outcome, RunOutcome::Shutdown(ShutdownSignal::Terminate));

        // The supervisor has returned, so every chain task is done.
        let mut started = Vec::new();
        let mut finished = None;
        while let Ok(event) = rx.try_recv() {
            match event {
                ChainEvent::Started { index, .. } => started.push(index),
                ChainEvent::Finished { outcome, .. } => finished = Some(outcome),
                _ => {}
            }
        }
        assert_eq!(started, vec![0]);
        assert_eq!(finished, Some(ChainOutcome::Superseded));
        assert_eq!(active.current(), None);
    }
}
