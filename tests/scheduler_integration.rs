//! Scheduler integration tests: concurrency bound, overlap and drain.

mod common;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use common::{test_config, test_engine, CollectingSink, RecordingJitter};
use keepalive::ping::RoundOutcome;
use keepalive::scheduler::Scheduler;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Tracks how many requests are being served at once.
#[derive(Default)]
struct LoadCounter {
    current: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
    delay_ms: AtomicUsize,
}

async fn slow_ok(State(counter): State<Arc<LoadCounter>>) -> StatusCode {
    let now = counter.current.fetch_add(1, Ordering::SeqCst) + 1;
    counter.peak.fetch_max(now, Ordering::SeqCst);
    counter.total.fetch_add(1, Ordering::SeqCst);

    let delay = counter.delay_ms.load(Ordering::SeqCst) as u64;
    tokio::time::sleep(Duration::from_millis(delay)).await;

    counter.current.fetch_sub(1, Ordering::SeqCst);
    StatusCode::OK
}

/// Serve `slow_ok` on an ephemeral port and return its base URL.
async fn spawn_server(delay_ms: usize) -> (String, Arc<LoadCounter>) {
    let counter = Arc::new(LoadCounter::default());
    counter.delay_ms.store(delay_ms, Ordering::SeqCst);

    let app = Router::new()
        .route("/*path", get(slow_ok))
        .with_state(Arc::clone(&counter));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), counter)
}

fn scheduler_for(targets: Vec<String>, concurrency: usize) -> (Scheduler, Arc<CollectingSink>) {
    let mut config = test_config(targets);
    config.concurrency = concurrency;
    config.max_retries = 0;

    let sink = Arc::new(CollectingSink::default());
    let engine = test_engine(config.clone(), sink.clone(), Arc::new(RecordingJitter::zero()));
    (Scheduler::new(Arc::new(config), engine), sink)
}

#[tokio::test]
async fn test_concurrency_never_exceeds_limit() {
    let (base, counter) = spawn_server(100).await;
    let targets = (0..6).map(|i| format!("{}/t{}", base, i)).collect();
    let (scheduler, sink) = scheduler_for(targets, 2);

    let outcomes = scheduler.run_once(&CancellationToken::new()).await;

    assert_eq!(outcomes.len(), 6);
    assert!(outcomes.iter().all(|(_, o)| o.is_success()));
    assert_eq!(counter.total.load(Ordering::SeqCst), 6);
    assert!(counter.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(counter.peak.load(Ordering::SeqCst), 2);
    assert_eq!(sink.attempts().len(), 6);
    assert_eq!(scheduler.limiter().available(), 2);
}

#[tokio::test]
async fn test_concurrency_one_serializes_targets() {
    let (base, counter) = spawn_server(50).await;
    let targets = (0..3).map(|i| format!("{}/t{}", base, i)).collect();
    let (scheduler, _sink) = scheduler_for(targets, 1);

    scheduler.run_once(&CancellationToken::new()).await;

    assert_eq!(counter.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_shutdown_drains_in_flight_rounds() {
    let (base, counter) = spawn_server(300).await;
    let targets = (0..2).map(|i| format!("{}/t{}", base, i)).collect();
    let (scheduler, sink) = scheduler_for(targets, 2);
    let state = scheduler.state();

    let cancel = CancellationToken::new();
    let handle = scheduler.start(cancel.clone());

    // Let the first round reach the server, then cancel mid-request
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(state.in_flight(), 2);
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("drain should finish")
        .unwrap();

    assert!(state.is_shutting_down());
    assert_eq!(state.in_flight(), 0);

    // In-flight requests were aborted and recorded as cancelled
    let rounds = sink.rounds();
    assert_eq!(rounds.len(), 2);
    assert!(rounds
        .iter()
        .all(|(_, o)| matches!(o, RoundOutcome::Cancelled { attempts: 1 })));

    // Nothing new starts after shutdown
    let seen = counter.total.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(counter.total.load(Ordering::SeqCst), seen);
}

#[tokio::test]
async fn test_cancel_while_waiting_for_slot() {
    let (base, _counter) = spawn_server(300).await;
    let targets = (0..3).map(|i| format!("{}/t{}", base, i)).collect();
    let (scheduler, sink) = scheduler_for(targets, 1);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let outcomes = scheduler.run_once(&cancel).await;
    scheduler.shutdown().await;

    // One round held the slot, the other two never got one
    let never_started = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, RoundOutcome::Cancelled { attempts: 0 }))
        .count();
    assert_eq!(never_started, 2);
    assert_eq!(sink.attempts().len(), 1);
    assert_eq!(scheduler.state().in_flight(), 0);
    assert_eq!(scheduler.limiter().available(), 1);
}

#[tokio::test]
async fn test_rounds_repeat_on_interval() {
    let (base, counter) = spawn_server(0).await;
    let (scheduler, _sink) = scheduler_for(vec![format!("{}/ping", base)], 1);
    let scheduler = scheduler.with_interval(Duration::from_millis(100));

    let cancel = CancellationToken::new();
    let handle = scheduler.start(cancel.clone());

    tokio::time::sleep(Duration::from_millis(350)).await;
    cancel.cancel();
    handle.await.unwrap();

    // First tick fires immediately, then every 100ms
    let total = counter.total.load(Ordering::SeqCst);
    assert!(total >= 3, "expected at least 3 rounds, got {}", total);
}

#[tokio::test]
async fn test_slow_target_never_runs_two_rounds_at_once() {
    let (base, counter) = spawn_server(250).await;
    let (scheduler, sink) = scheduler_for(vec![format!("{}/ping", base)], 4);
    let scheduler = scheduler.with_interval(Duration::from_millis(100));

    let cancel = CancellationToken::new();
    let handle = scheduler.start(cancel.clone());

    tokio::time::sleep(Duration::from_millis(230)).await;
    cancel.cancel();
    handle.await.unwrap();

    // Ticks at 100ms and 200ms found the first round still running
    assert_eq!(counter.peak.load(Ordering::SeqCst), 1);
    assert_eq!(counter.total.load(Ordering::SeqCst), 1);
    assert_eq!(sink.rounds().len(), 1);
}

#[tokio::test]
async fn test_rounds_of_different_targets_overlap() {
    let (base, counter) = spawn_server(250).await;
    let targets = vec![format!("{}/a", base), format!("{}/b", base)];
    let (scheduler, _sink) = scheduler_for(targets, 4);
    let scheduler = scheduler.with_interval(Duration::from_millis(100));

    let cancel = CancellationToken::new();
    let handle = scheduler.start(cancel.clone());

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert_eq!(counter.peak.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_zero_interval_does_not_panic() {
    let (base, counter) = spawn_server(0).await;
    let (scheduler, _sink) = scheduler_for(vec![format!("{}/ping", base)], 1);
    let scheduler = scheduler.with_interval(Duration::ZERO);

    let cancel = CancellationToken::new();
    let handle = scheduler.start(cancel.clone());

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert!(counter.total.load(Ordering::SeqCst) >= 1);
}
