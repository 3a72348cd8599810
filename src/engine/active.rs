// src/engine/active.rs

//! The shared "current child process" cell.
//!
//! Both the supervisor (on every trigger) and the shutdown watcher (on a
//! signal) may kill the live child, and the chain runner records/clears it
//! around every command. All of that goes through one mutex that also owns
//! the epoch counter, so:
//!
//! - advancing the epoch and taking the previous child happen atomically;
//! - a runner can only register a child for the epoch that is still current;
//! - a given child is taken (and therefore killed) at most once;
//! - after `terminate` no epoch is current again, so a chain whose child was
//!   killed at shutdown never starts another command.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::debug;

use crate::engine::Epoch;
use crate::exec::kill::hard_kill;

/// Identity of a running child, enough to hard-kill it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: u32,
    /// The child leads its own process group; kill the whole group.
    pub process_group: bool,
    pub epoch: Epoch,
}

/// Returned when a runner tries to register a child for an epoch that has
/// already been superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("epoch {attempted} was superseded by epoch {current}")]
pub struct StaleEpoch {
    pub attempted: Epoch,
    pub current: Epoch,
}

#[derive(Debug, Default)]
struct Slot {
    epoch: Epoch,
    current: Option<ProcessHandle>,
    terminated: bool,
}

/// Cloneable handle to the shared cell. Epoch 0 means "nothing started yet".
#[derive(Debug, Clone, Default)]
pub struct ActiveProcess {
    slot: Arc<Mutex<Slot>>,
}

impl ActiveProcess {
    pub fn new() -> Self {
        Self::default()
    }

    // The slot is plain data, so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_epoch(&self) -> Epoch {
        self.lock().epoch
    }

    /// Whether `epoch` may still start commands.
    pub fn is_current(&self, epoch: Epoch) -> bool {
        let slot = self.lock();
        !slot.terminated && slot.epoch == epoch
    }

    pub fn is_terminated(&self) -> bool {
        self.lock().terminated
    }

    /// The live child, if any.
    pub fn current(&self) -> Option<ProcessHandle> {
        self.lock().current
    }

    /// Start a new epoch.
    ///
    /// Returns the new epoch and the previous epoch's child (now cleared from
    /// the cell), which the caller is expected to kill.
    pub fn advance_epoch(&self) -> (Epoch, Option<ProcessHandle>) {
        let mut slot = self.lock();
        slot.epoch += 1;
        (slot.epoch, slot.current.take())
    }

    /// Record `handle` as the live child.
    ///
    /// Fails if `handle.epoch` is no longer current (or the cell was
    /// terminated); the caller then owns the child and must kill it itself.
    pub fn set_active(&self, handle: ProcessHandle) -> Result<(), StaleEpoch> {
        let mut slot = self.lock();
        if slot.terminated || slot.epoch != handle.epoch {
            return Err(StaleEpoch {
                attempted: handle.epoch,
                current: slot.epoch,
            });
        }
        if let Some(previous) = slot.current.replace(handle) {
            debug!(?previous, "replacing an uncleared active process");
        }
        Ok(())
    }

    /// Clear the cell if it still refers to `pid`. Returns whether it did.
    pub fn clear_active(&self, pid: u32) -> bool {
        let mut slot = self.lock();
        match slot.current {
            Some(handle) if handle.pid == pid => {
                slot.current = None;
                true
            }
            _ => false,
        }
    }

    /// Shut the cell down: take the live child and hard-kill it.
    ///
    /// Afterwards no epoch is current and no child can be registered, so the
    /// runner waiting on the killed child stops its chain instead of moving
    /// on. The cell is cleared whether or not the kill succeeds. `Ok(None)`
    /// means there was nothing to kill.
    pub fn terminate(&self) -> io::Result<Option<ProcessHandle>> {
        let taken = {
            let mut slot = self.lock();
            slot.terminated = true;
            slot.current.take()
        };
        match taken {
            Some(handle) => {
                hard_kill(&handle)?;
                Ok(Some(handle))
            }
            None => Ok(None),
        }
    }
}
