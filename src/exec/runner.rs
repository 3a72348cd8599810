// src/exec/runner.rs

//! Runs one epoch of the command chain.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::CommandChain;
use crate::engine::{ActiveProcess, Epoch, ProcessHandle};
use crate::exec::command::{build_command, LaunchOptions};
use crate::exec::kill::hard_kill;
use crate::types::ChainPolicy;

/// How a chain run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Every command was attempted. `failures` counts non-zero exits and
    /// commands that could not be started.
    Completed { failures: usize },
    /// `StopOnFailure` halted the chain at command `index`.
    Halted { index: usize },
    /// A newer epoch started; the rest of the chain was abandoned.
    Superseded,
}

impl ChainOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ChainOutcome::Completed { failures: 0 })
    }
}

/// Progress notifications, mostly for tests and `--once`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    Started {
        epoch: Epoch,
        index: usize,
        command: String,
        pid: u32,
    },
    SpawnFailed {
        epoch: Epoch,
        index: usize,
        error: String,
    },
    Exited {
        epoch: Epoch,
        index: usize,
        code: Option<i32>,
        success: bool,
    },
    Superseded {
        epoch: Epoch,
        index: usize,
    },
    Finished {
        epoch: Epoch,
        outcome: ChainOutcome,
    },
}

enum Step {
    Succeeded,
    Failed,
    Superseded,
}

/// Executes the chain sequentially for a given epoch.
///
/// Before every spawn and after every wait the runner checks that its epoch
/// is still current; once it is not, no further command of that epoch starts.
#[derive(Debug)]
pub struct ChainRunner {
    chain: CommandChain,
    launch: LaunchOptions,
    policy: ChainPolicy,
    active: ActiveProcess,
    events: Option<mpsc::UnboundedSender<ChainEvent>>,
}

impl ChainRunner {
    pub fn new(
        chain: CommandChain,
        launch: LaunchOptions,
        policy: ChainPolicy,
        active: ActiveProcess,
    ) -> Self {
        Self {
            chain,
            launch,
            policy,
            active,
            events: None,
        }
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<ChainEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: ChainEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    pub async fn run(&self, epoch: Epoch) -> ChainOutcome {
        info!(epoch, commands = self.chain.len(), "running command chain");
        let outcome = self.run_chain(epoch).await;
        match outcome {
            ChainOutcome::Superseded => debug!(epoch, "chain superseded"),
            _ => info!(epoch, ?outcome, "chain finished"),
        }
        self.emit(ChainEvent::Finished { epoch, outcome });
        outcome
    }

    async fn run_chain(&self, epoch: Epoch) -> ChainOutcome {
        let mut failures = 0;

        for (index, command) in self.chain.iter().enumerate() {
            if !self.active.is_current(epoch) {
                self.emit(ChainEvent::Superseded { epoch, index });
                return ChainOutcome::Superseded;
            }

            println!("[chainwatch · cmd #{}] {}", index + 1, command);

            match self.run_command(epoch, index, command).await {
                Step::Succeeded => {}
                Step::Failed => {
                    failures += 1;
                    if self.policy == ChainPolicy::StopOnFailure {
                        info!(epoch, index, "stopping chain after failure");
                        return ChainOutcome::Halted { index };
                    }
                }
                Step::Superseded => {
                    self.emit(ChainEvent::Superseded { epoch, index });
                    return ChainOutcome::Superseded;
                }
            }
        }

        ChainOutcome::Completed { failures }
    }

    async fn run_command(&self, epoch: Epoch, index: usize, command: &str) -> Step {
        let spawned = build_command(command, &self.launch).and_then(|mut cmd| cmd.spawn());
        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                warn!(epoch, index, cmd = %command, error = %err, "failed to start command");
                self.emit(ChainEvent::SpawnFailed {
                    epoch,
                    index,
                    error: err.to_string(),
                });
                return Step::Failed;
            }
        };

        let Some(pid) = child.id() else {
            warn!(epoch, index, cmd = %command, "child exited before its pid was read");
            return Step::Failed;
        };

        debug!(epoch, index, pid, cmd = %command, "command started");
        self.emit(ChainEvent::Started {
            epoch,
            index,
            command: command.to_string(),
            pid,
        });

        let handle = ProcessHandle {
            pid,
            process_group: self.launch.process_group(),
            epoch,
        };
        if let Err(stale) = self.active.set_active(handle) {
            debug!(pid, %stale, "superseded while starting; killing own child");
            if let Err(err) = hard_kill(&handle) {
                warn!(pid, error = %err, "failed to kill superseded child");
            }
            let _ = child.wait().await;
            return Step::Superseded;
        }

        let status = child.wait().await;
        self.active.clear_active(pid);

        if !self.active.is_current(epoch) {
            return Step::Superseded;
        }

        match status {
            Ok(status) => {
                self.emit(ChainEvent::Exited {
                    epoch,
                    index,
                    code: status.code(),
                    success: status.success(),
                });
                if status.success() {
                    Step::Succeeded
                } else {
                    info!(epoch, index, pid, %status, "command failed");
                    Step::Failed
                }
            }
            Err(err) => {
                warn!(epoch, index, pid, error = %err, "failed to wait for command");
                Step::Failed
            }
        }
    }
}
