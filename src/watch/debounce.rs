// src/watch/debounce.rs

use std::time::{Duration, Instant};

/// Gate that lets at most one trigger through per quiet window.
///
/// The window is measured from the last *emitted* trigger, not from the last
/// event seen, so a sustained burst of changes still yields a trigger every
/// `quiet_window`. Events inside the window are dropped, never replayed.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet_window: Duration,
    last_emitted: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet_window: Duration) -> Self {
        Self {
            quiet_window,
            last_emitted: None,
        }
    }

    pub fn quiet_window(&self) -> Duration {
        self.quiet_window
    }

    /// Offer an event seen at `now`. Returns true if a trigger should be
    /// emitted, in which case `now` becomes the start of the next window.
    pub fn accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_emitted {
            if now.saturating_duration_since(last) < self.quiet_window {
                return false;
            }
        }
        self.last_emitted = Some(now);
        true
    }
}
