pub mod builders;

use std::sync::Once;
use std::time::Duration;

use chainwatch::exec::{ChainEvent, ChainOutcome};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Receive chain events until `Finished` for `epoch`, returning everything
/// seen for that epoch (including the `Finished` event) and its outcome.
///
/// Events for other epochs are skipped.
pub async fn collect_epoch(
    rx: &mut mpsc::UnboundedReceiver<ChainEvent>,
    epoch: u64,
) -> (Vec<ChainEvent>, ChainOutcome) {
    let mut seen = Vec::new();
    loop {
        let event = with_timeout(rx.recv())
            .await
            .expect("chain event channel closed");
        if event_epoch(&event) != epoch {
            continue;
        }
        if let ChainEvent::Finished { outcome, .. } = event {
            seen.push(event);
            return (seen, outcome);
        }
        seen.push(event);
    }
}

/// Indices of the commands that were started, in order.
pub fn started_indices(events: &[ChainEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            ChainEvent::Started { index, .. } => Some(*index),
            _ => None,
        })
        .collect()
}

fn event_epoch(event: &ChainEvent) -> u64 {
    match event {
        ChainEvent::Started { epoch, .. }
        | ChainEvent::SpawnFailed { epoch, .. }
        | ChainEvent::Exited { epoch, .. }
        | ChainEvent::Superseded { epoch, .. }
        | ChainEvent::Finished { epoch, .. } => *epoch,
    }
}
