//! End-to-end tests for the offline drain worker.
//!
//! **Purpose**: exercise the critical path from durable queue to network
//! replay and back to the queue.
//!
//! **Coverage:**
//! - Reconnect drains queued actions against the real API client
//! - Server failure leaves the queue intact with attempts recorded
//! - Permanent rejections are discarded instead of retried forever
//!
//! **Infrastructure:**
//! - Real SQLite database (tempdir)
//! - WireMock HTTP server standing in for the collaborator API

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use shiftfence_core::ClockActionQueue;
use shiftfence_domain::ClockActionKind;
use shiftfence_infra::api::{ShiftApiClient, ShiftApiConfig};
use shiftfence_infra::database::SqliteClockActionQueue;
use shiftfence_infra::sync::{ClockActionForwarder, DrainWorker, DrainWorkerConfig};
use support::{init_tracing, pending_action_at, TestDatabase};
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn forwarder_for(server: &MockServer) -> Arc<dyn ClockActionForwarder> {
    let client = ShiftApiClient::new(ShiftApiConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        max_attempts: 1,
    })
    .expect("client built");
    Arc::new(client)
}

fn shift_body(id: &str) -> serde_json::Value {
    json!({
        "shift": {
            "id": id,
            "userId": "user-1",
            "clockInTime": "2025-06-01T09:00:00Z",
            "clockInLatitude": 18.4777,
            "clockInLongitude": 73.8037
        }
    })
}

async fn wait_for_empty_queue(queue: &SqliteClockActionQueue) -> bool {
    for _ in 0..100 {
        if queue.pending(10).await.expect("pending read").is_empty() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn reconnect_replays_queued_actions_in_order() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/shifts/clockin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(shift_body("shift-1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/shifts/clockout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(shift_body("shift-1")))
        .expect(1)
        .mount(&server)
        .await;

    let db = TestDatabase::new();
    let queue = Arc::new(SqliteClockActionQueue::new(Arc::clone(&db.manager)));

    let base = chrono::Utc::now();
    let clock_in = pending_action_at(ClockActionKind::ClockIn, "arrived", base);
    let clock_out = pending_action_at(
        ClockActionKind::ClockOut,
        "left",
        base + chrono::Duration::milliseconds(10),
    );
    queue.enqueue(&clock_in).await.expect("enqueued");
    queue.enqueue(&clock_out).await.expect("enqueued");

    let (online_tx, online_rx) = watch::channel(false);
    let mut worker = DrainWorker::new(
        Arc::clone(&queue) as Arc<dyn ClockActionQueue>,
        forwarder_for(&server),
        DrainWorkerConfig::default(),
        online_rx,
    );
    worker.start().await.expect("started");

    online_tx.send(true).expect("connectivity signal");
    assert!(wait_for_empty_queue(&queue).await, "queue should drain after reconnect");

    worker.stop().await.expect("stopped");
    // Mock expectations verify each endpoint was hit exactly once on drop.
}

#[tokio::test]
async fn server_failure_keeps_actions_queued() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/shifts/clockin"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let db = TestDatabase::new();
    let queue = Arc::new(SqliteClockActionQueue::new(Arc::clone(&db.manager)));

    let base = chrono::Utc::now();
    let clock_in = pending_action_at(ClockActionKind::ClockIn, "arrived", base);
    let clock_out = pending_action_at(
        ClockActionKind::ClockOut,
        "left",
        base + chrono::Duration::milliseconds(10),
    );
    queue.enqueue(&clock_in).await.expect("enqueued");
    queue.enqueue(&clock_out).await.expect("enqueued");

    let queue_trait: Arc<dyn ClockActionQueue> = Arc::clone(&queue) as _;
    let replayed = DrainWorker::drain_once(&queue_trait, &forwarder_for(&server), 10)
        .await
        .expect("pass completed");
    assert_eq!(replayed, 0);

    // The pass stopped at the first retryable failure: the dependent
    // clock-out was never attempted and both entries remain durable.
    let pending = queue.pending(10).await.expect("pending read");
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].attempts, 1);
    assert!(pending[0].last_error.is_some());
    assert_eq!(pending[1].attempts, 0);
}

#[tokio::test]
async fn permanent_rejection_is_discarded() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/shifts/clockin"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "You are outside the designated area"
        })))
        .mount(&server)
        .await;

    let db = TestDatabase::new();
    let queue = Arc::new(SqliteClockActionQueue::new(Arc::clone(&db.manager)));
    queue
        .enqueue(&pending_action_at(ClockActionKind::ClockIn, "arrived", chrono::Utc::now()))
        .await
        .expect("enqueued");

    let queue_trait: Arc<dyn ClockActionQueue> = Arc::clone(&queue) as _;
    let replayed = DrainWorker::drain_once(&queue_trait, &forwarder_for(&server), 10)
        .await
        .expect("pass completed");

    assert_eq!(replayed, 0);
    assert!(queue.pending(10).await.expect("pending read").is_empty());
}

#[tokio::test]
async fn partial_failure_resumes_on_next_pass() {
    init_tracing();
    let server = MockServer::start().await;
    // First pass: clock-in fails with a server error. Second pass: succeeds.
    Mock::given(method("POST"))
        .and(path("/shifts/clockin"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/shifts/clockin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(shift_body("shift-1")))
        .mount(&server)
        .await;

    let db = TestDatabase::new();
    let queue = Arc::new(SqliteClockActionQueue::new(Arc::clone(&db.manager)));
    queue
        .enqueue(&pending_action_at(ClockActionKind::ClockIn, "arrived", chrono::Utc::now()))
        .await
        .expect("enqueued");

    let forwarder = forwarder_for(&server);
    let queue_trait: Arc<dyn ClockActionQueue> = Arc::clone(&queue) as _;

    let replayed =
        DrainWorker::drain_once(&queue_trait, &forwarder, 10).await.expect("first pass");
    assert_eq!(replayed, 0);
    assert_eq!(queue.pending(10).await.expect("pending read").len(), 1);

    let replayed =
        DrainWorker::drain_once(&queue_trait, &forwarder, 10).await.expect("second pass");
    assert_eq!(replayed, 1);
    assert!(queue.pending(10).await.expect("pending read").is_empty());
}
