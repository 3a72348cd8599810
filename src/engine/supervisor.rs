// src/engine/supervisor.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::engine::{ActiveProcess, Epoch, Trigger};
use crate::errors::Result;
use crate::exec::kill::hard_kill;
use crate::exec::runner::{ChainOutcome, ChainRunner};

/// Consumes triggers and restarts the command chain for each one.
///
/// Per trigger:
/// 1. start a new epoch, taking the previous epoch's live child;
/// 2. hard-kill that child (a failed kill is logged, never fatal);
/// 3. if something was killed, wait the settle delay;
/// 4. run the chain for the new epoch in the background.
///
/// Superseded chain tasks are not awaited on restart: their epoch is stale,
/// so they stop at their next check. All chain tasks are owned by the
/// supervisor; dropping it aborts whatever is still running.
#[derive(Debug)]
pub struct Supervisor {
    runner: Arc<ChainRunner>,
    active: ActiveProcess,
    settle_delay: Duration,
    running: JoinSet<ChainOutcome>,
}

impl Supervisor {
    pub fn new(runner: Arc<ChainRunner>, active: ActiveProcess, settle_delay: Duration) -> Self {
        Self {
            runner,
            active,
            settle_delay,
            running: JoinSet::new(),
        }
    }

    /// Handle triggers until every sender is gone, then wait for the chain
    /// tasks still winding down.
    pub async fn run(mut self, mut triggers: mpsc::Receiver<Trigger>) -> Result<()> {
        debug!("supervisor started");
        while let Some(trigger) = triggers.recv().await {
            match self.restart(&trigger).await {
                Some(epoch) => debug!(epoch, ?trigger, "chain scheduled"),
                None => debug!(?trigger, "shutting down; trigger ignored"),
            }
        }
        info!("trigger channel closed; supervisor exiting");

        while let Some(res) = self.running.join_next().await {
            match res {
                Ok(outcome) => debug!(?outcome, "chain task finished"),
                Err(err) => debug!(error = %err, "chain task did not finish"),
            }
        }
        Ok(())
    }

    /// Kill whatever is running and start a fresh epoch.
    ///
    /// Returns the new epoch, or `None` once the active-process cell has been
    /// terminated.
    pub async fn restart(&mut self, trigger: &Trigger) -> Option<Epoch> {
        if self.active.is_terminated() {
            return None;
        }

        let (epoch, previous) = self.active.advance_epoch();

        if let Some(handle) = previous {
            info!(pid = handle.pid, old_epoch = handle.epoch, ?trigger, "killing previous run");
            if let Err(err) = hard_kill(&handle) {
                warn!(pid = handle.pid, error = %err, "failed to kill previous run");
            }
            tokio::time::sleep(self.settle_delay).await;
        }

        while let Some(res) = self.running.try_join_next() {
            if let Ok(outcome) = res {
                debug!(?outcome, "earlier chain task reaped");
            }
        }

        let runner = Arc::clone(&self.runner);
        self.running.spawn(async move { runner.run(epoch).await });
        Some(epoch)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::CommandChain;
    use crate::exec::command::LaunchOptions;
    use crate::exec::runner::ChainEvent;
    use crate::types::ChainPolicy;

    fn supervisor(chain: &[&str]) -> (Supervisor, ActiveProcess, mpsc::UnboundedReceiver<ChainEvent>) {
        let active = ActiveProcess::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let runner = ChainRunner::new(
            CommandChain::new(chain.iter().copied()),
            LaunchOptions::default(),
            ChainPolicy::ContinueOnFailure,
            active.clone(),
        )
        .with_events(tx);
        let sup = Supervisor::new(Arc::new(runner), active.clone(), Duration::from_millis(50));
        (sup, active, rx)
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<ChainEvent>) -> ChainEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn startup_trigger_runs_whole_chain() {
        let (mut sup, _active, mut rx) = supervisor(&["true", "false"]);
        let epoch = sup.restart(&Trigger::Startup).await;
        assert_eq!(epoch, Some(1));

        loop {
            if let ChainEvent::Finished { epoch: e, outcome } = next_event(&mut rx).await {
                assert_eq!(e, 1);
                assert_eq!(outcome, ChainOutcome::Completed { failures: 1 });
                break;
            }
        }
    }

    #[tokio::test]
    async fn new_trigger_kills_running_command_and_restarts() {
        let (mut sup, active, mut rx) = supervisor(&["sleep 30", "echo never"]);
        sup.restart(&Trigger::Startup).await;

        assert!(matches!(next_event(&mut rx).await, ChainEvent::Started { epoch: 1, index: 0, .. }));
        while active.current().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let epoch = sup.restart(&Trigger::FileChange("/proj/a.go".into())).await;
        assert_eq!(epoch, Some(2));

        let mut old_finished = false;
        let mut new_started = false;
        while !(old_finished && new_started) {
            match next_event(&mut rx).await {
                ChainEvent::Started { epoch: 1, index, .. } => {
                    panic!("superseded epoch started command {index}")
                }
                ChainEvent::Finished { epoch: 1, outcome } => {
                    assert_eq!(outcome, ChainOutcome::Superseded);
                    old_finished = true;
                }
                ChainEvent::Started { epoch: 2, index: 0, .. } => new_started = true,
                _ => {}
            }
        }

        let _ = active.terminate();
    }

    #[tokio::test]
    async fn run_returns_when_senders_drop() {
        let (sup, _active, _rx) = supervisor(&["true"]);
        let (tx, rx) = crate::engine::trigger_channel();
        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), sup.run(rx))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn terminated_cell_ignores_triggers() {
        let (mut sup, active, mut rx) = supervisor(&["true"]);
        active.terminate().unwrap();

        assert_eq!(sup.restart(&Trigger::Startup).await, None);
        drop(sup);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn shutdown_mid_chain_drains_without_starting_more() {
        let (sup, active, mut rx) = supervisor(&["sleep 30", "echo never", "echo never again"]);
        let (tx, triggers) = crate::engine::trigger_channel();
        let task = tokio::spawn(sup.run(triggers));
        tx.send(Trigger::Startup).await.unwrap();

        assert!(matches!(next_event(&mut rx).await, ChainEvent::Started { epoch: 1, index: 0, .. }));
        while active.current().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        crate::engine::shutdown::shutdown(&active, crate::engine::ShutdownSignal::Interrupt);
        drop(tx);

        // `run` only returns once the chain task has finished.
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(
            !events.iter().any(|e| matches!(e, ChainEvent::Started { .. })),
            "command started after shutdown: {events:?}"
        );
        assert!(events.contains(&ChainEvent::Finished {
            epoch: 1,
            outcome: ChainOutcome::Superseded
        }));
        assert_eq!(active.current(), None);
    }
}
