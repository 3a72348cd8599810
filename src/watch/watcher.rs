// src/watch/watcher.rs

use std::path::PathBuf;
use std::time::Duration;

use notify::{Config, Event, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::info;

use crate::errors::Result;
use crate::types::ChangeKind;

/// A single relevant-kind change reported by the event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// What the event source hands to the pump: a change, or a fatal error.
pub type SourceMessage = std::result::Result<ChangeEvent, notify::Error>;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying notify watcher is kept alive for as
/// long as needed. Dropping this handle stops file watching and closes the
/// event channel.
pub struct WatcherHandle {
    _inner: Box<dyn Watcher + Send>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Start watching `root` recursively.
///
/// - With `poll_interval`, notify's `PollWatcher` scans at that interval;
///   otherwise the platform's native watcher is used.
/// - Only create/write/rename/move changes are forwarded, one
///   [`ChangeEvent`] per affected path.
/// - Errors from the watcher are forwarded as `Err` and are meant to end the
///   watch loop.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    poll_interval: Option<Duration>,
) -> Result<(WatcherHandle, mpsc::UnboundedReceiver<SourceMessage>)> {
    let root = root.into();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SourceMessage>();

    // Called synchronously on notify's own thread.
    let handler = move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let Some(kind) = ChangeKind::from_event_kind(&event.kind) else {
                return;
            };
            for path in event.paths {
                if event_tx.send(Ok(ChangeEvent { path, kind })).is_err() {
                    // Receiver gone; nothing left to notify.
                    return;
                }
            }
        }
        Err(err) => {
            let _ = event_tx.send(Err(err));
        }
    };

    let mut watcher: Box<dyn Watcher + Send> = match poll_interval {
        Some(interval) => Box::new(PollWatcher::new(
            handler,
            Config::default().with_poll_interval(interval),
        )?),
        None => Box::new(RecommendedWatcher::new(handler, Config::default())?),
    };

    watcher.watch(&root, RecursiveMode::Recursive)?;

    match poll_interval {
        Some(interval) => info!(?root, ?interval, "polling for file changes"),
        None => info!(?root, "file watcher started"),
    }

    Ok((WatcherHandle { _inner: watcher }, event_rx))
}
