// tests/chain_supervision.rs
#![cfg(unix)]
mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use chainwatch::config::CommandChain;
use chainwatch::engine::shutdown::shutdown;
use chainwatch::engine::{trigger_channel, ActiveProcess, ShutdownSignal, Supervisor, Trigger};
use chainwatch::exec::{ChainEvent, ChainOutcome, ChainRunner, LaunchOptions};
use chainwatch::types::ChainPolicy;
use chainwatch_test_utils::builders::SettingsBuilder;
use chainwatch_test_utils::{collect_epoch, started_indices};
use tokio::sync::mpsc;

use crate::common::{init_tracing, with_timeout, Project};

const SHELL: LaunchOptions = LaunchOptions {
    attach_stdin: false,
    shell: true,
};

fn runner(
    chain: &str,
    policy: ChainPolicy,
) -> (ChainRunner, ActiveProcess, mpsc::UnboundedReceiver<ChainEvent>) {
    let active = ActiveProcess::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let runner = ChainRunner::new(CommandChain::parse(chain), SHELL, policy, active.clone())
        .with_events(tx);
    (runner, active, rx)
}

#[tokio::test]
async fn failing_middle_command_does_not_stop_chain() {
    init_tracing();
    let project = Project::new();
    let out = project.root().join("out.txt");
    let chain = format!(
        "echo A >> {0} && false && echo B >> {0}",
        out.display()
    );

    let (runner, active, mut rx) = runner(&chain, ChainPolicy::ContinueOnFailure);
    let (epoch, _) = active.advance_epoch();

    let outcome = with_timeout(runner.run(epoch)).await;
    assert_eq!(outcome, ChainOutcome::Completed { failures: 1 });
    assert_eq!(fs::read_to_string(&out).unwrap(), "A\nB\n");

    let (events, _) = collect_epoch(&mut rx, epoch).await;
    assert_eq!(started_indices(&events), vec![0, 1, 2]);
}

#[tokio::test]
async fn stop_on_failure_skips_the_rest() {
    init_tracing();
    let project = Project::new();
    let out = project.root().join("out.txt");
    let chain = format!(
        "echo A >> {0} && false && echo B >> {0}",
        out.display()
    );

    let (runner, active, _rx) = runner(&chain, ChainPolicy::StopOnFailure);
    let (epoch, _) = active.advance_epoch();

    assert_eq!(with_timeout(runner.run(epoch)).await, ChainOutcome::Halted { index: 1 });
    assert_eq!(fs::read_to_string(&out).unwrap(), "A\n");
}

#[tokio::test]
async fn trigger_mid_chain_abandons_old_epoch() {
    init_tracing();
    let project = Project::new();
    let out = project.root().join("out.txt");
    let chain = format!(
        "echo start >> {0} && sleep 30 && echo late2 >> {0} && echo late3 >> {0}",
        out.display()
    );

    let (runner, active, mut rx) = runner(&chain, ChainPolicy::ContinueOnFailure);
    let supervisor = Supervisor::new(Arc::new(runner), active.clone(), Duration::from_millis(50));
    let (tx, trigger_rx) = trigger_channel();
    let sup_task = tokio::spawn(supervisor.run(trigger_rx));

    tx.send(Trigger::Startup).await.unwrap();

    // Wait until epoch 1 is inside `sleep 30`.
    with_timeout(async {
        loop {
            if let Some(ChainEvent::Started { epoch: 1, index: 1, .. }) = rx.recv().await {
                break;
            }
        }
    })
    .await;
    with_timeout(async {
        while active.current().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    tx.send(Trigger::FileChange(project.root().join("main.go")))
        .await
        .unwrap();

    let (old_events, old_outcome) = collect_epoch(&mut rx, 1).await;
    assert_eq!(old_outcome, ChainOutcome::Superseded);
    assert!(!started_indices(&old_events).contains(&2));

    // Epoch 2 starts over from the first command.
    with_timeout(async {
        while fs::read_to_string(&out).unwrap_or_default() != "start\nstart\n" {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!fs::read_to_string(&out).unwrap().contains("late"));

    drop(tx);
    if let (_, Some(handle)) = active.advance_epoch() {
        let _ = chainwatch::exec::hard_kill(&handle);
    }
    with_timeout(sup_task).await.unwrap().unwrap();
}

#[tokio::test]
async fn missing_binary_is_logged_and_skipped() {
    init_tracing();
    let active = ActiveProcess::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let runner = ChainRunner::new(
        CommandChain::parse("no-such-binary-for-chainwatch --flag && true"),
        LaunchOptions::default(),
        ChainPolicy::ContinueOnFailure,
        active.clone(),
    )
    .with_events(tx);
    let (epoch, _) = active.advance_epoch();

    let outcome = with_timeout(runner.run(epoch)).await;
    assert_eq!(outcome, ChainOutcome::Completed { failures: 1 });

    let (events, _) = collect_epoch(&mut rx, epoch).await;
    assert!(matches!(events[0], ChainEvent::SpawnFailed { index: 0, .. }));
    assert_eq!(started_indices(&events), vec![1]);
}

#[tokio::test]
async fn shutdown_during_chain_starts_nothing_further() {
    init_tracing();
    let project = Project::new();
    let out = project.root().join("out.txt");
    let settings = SettingsBuilder::new(
        project.root(),
        &format!("sleep 30 && echo after >> {0} && echo after >> {0}", out.display()),
    )
    .with_shell(true)
    .with_settle_delay(Duration::from_millis(20))
    .build();

    let active = ActiveProcess::new();
    let (events_tx, mut rx) = mpsc::unbounded_channel();
    let runner = ChainRunner::new(settings.chain.clone(), settings.launch, settings.policy, active.clone())
        .with_events(events_tx);
    let supervisor = Supervisor::new(Arc::new(runner), active.clone(), settings.settle_delay);
    let (tx, trigger_rx) = trigger_channel();
    let sup_task = tokio::spawn(supervisor.run(trigger_rx));
    tx.send(Trigger::Startup).await.unwrap();

    with_timeout(async {
        while active.current().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    shutdown(&active, ShutdownSignal::Interrupt);
    // Triggers arriving after shutdown are ignored.
    tx.send(Trigger::FileChange(project.root().join("main.go")))
        .await
        .unwrap();
    drop(tx);
    with_timeout(sup_task).await.unwrap().unwrap();

    let (events, outcome) = collect_epoch(&mut rx, 1).await;
    assert_eq!(outcome, ChainOutcome::Superseded);
    assert_eq!(started_indices(&events), vec![0]);
    assert!(rx.try_recv().is_err(), "a later epoch ran after shutdown");
    assert_eq!(active.current(), None);
    assert!(!out.exists());
}
