// src/watch/pump.rs

//! The event pump: filesystem changes in, debounced triggers out.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::Trigger;
use crate::errors::{ChainwatchError, Result};
use crate::watch::debounce::Debouncer;
use crate::watch::filter::is_relevant;
use crate::watch::rules::ExclusionRules;
use crate::watch::scope::WatchScope;
use crate::watch::watcher::{ChangeEvent, SourceMessage};

/// Turns the event source's stream into triggers on the trigger channel.
///
/// Each change goes through, in order: the watch scope, the exclusion rules,
/// then the debouncer. Sending a trigger waits while the channel already
/// holds an unconsumed one.
#[derive(Debug)]
pub struct EventPump {
    root: PathBuf,
    scope: WatchScope,
    rules: Arc<ExclusionRules>,
    debouncer: Debouncer,
    trigger_tx: mpsc::Sender<Trigger>,
}

impl EventPump {
    /// `root` is canonicalised once here (falling back to the path as given)
    /// so symlinked roots such as macOS `/var` temp dirs still match the
    /// paths the watcher reports.
    pub fn new(
        root: impl Into<PathBuf>,
        scope: WatchScope,
        rules: Arc<ExclusionRules>,
        debouncer: Debouncer,
        trigger_tx: mpsc::Sender<Trigger>,
    ) -> Self {
        let root = root.into();
        let root = root.canonicalize().unwrap_or(root);
        Self {
            root,
            scope,
            rules,
            debouncer,
            trigger_tx,
        }
    }

    /// Pump events until the source closes, reports an error, or the
    /// supervisor goes away.
    ///
    /// A source error is fatal and returned as `Err`.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<SourceMessage>) -> Result<()> {
        while let Some(msg) = events.recv().await {
            let event = match msg {
                Ok(event) => event,
                Err(err) => {
                    warn!(error = %err, "file watch error; stopping watch loop");
                    return Err(ChainwatchError::WatchError(err));
                }
            };

            if !self.admit(&event, Instant::now()) {
                continue;
            }

            info!(path = %event.path.display(), kind = ?event.kind, "change detected; triggering re-run");
            if self.trigger_tx.send(Trigger::FileChange(event.path)).await.is_err() {
                debug!("trigger channel closed; stopping event pump");
                return Ok(());
            }
        }

        debug!("event source closed; event pump finished");
        Ok(())
    }

    /// Decide whether `event`, seen at `now`, should become a trigger.
    pub fn admit(&mut self, event: &ChangeEvent, now: Instant) -> bool {
        let rel = relative_to_root(&self.root, &event.path);
        if !self.scope.matches(&rel) {
            return false;
        }
        if !is_relevant(&event.path, &self.rules) {
            debug!(path = %rel, "change excluded by rules");
            return false;
        }
        if !self.debouncer.accept(now) {
            debug!(
                path = %rel,
                window = ?self.debouncer.quiet_window(),
                "change inside quiet window; dropped"
            );
            return false;
        }
        true
    }
}

/// `path` relative to `root` with forward slashes, or the whole path if it
/// is not under `root`.
fn relative_to_root(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
