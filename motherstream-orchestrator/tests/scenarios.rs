//! End-to-end narrative scenarios from `spec.md` §8, run against a real
//! `IngestControl` + `StreamManager` + `JobWorker` wired over mocks.

use motherstream_common::UserRecord;
use motherstream_orchestrator::api::{Decision, IngestControl};
use motherstream_orchestrator::compositor::mock::MockCompositorClient;
use motherstream_orchestrator::core_state::CoreState;
use motherstream_orchestrator::external::mock::{
    MockIngestController, MockNotificationSink, MockRecordingController, MockUserProvider,
};
use motherstream_orchestrator::health::HealthMonitor;
use motherstream_orchestrator::stream_manager::StreamManager;
use motherstream_orchestrator::worker::{JobHandles, JobWorker};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

fn user(id: i64, key: &str) -> UserRecord {
    UserRecord { id, stream_key: key.to_string(), display_name: key.to_string(), timezone: "UTC".to_string() }
}

struct Rig {
    ingest: IngestControl,
    stream_manager: Arc<StreamManager>,
    compositor: Arc<MockCompositorClient>,
}

fn rig(dir: &std::path::Path, users: Vec<UserRecord>, swap_interval: Duration) -> Rig {
    let core = Arc::new(Mutex::new(CoreState::new()));
    let compositor = Arc::new(MockCompositorClient::new());
    let handles = JobHandles {
        compositor: compositor.clone(),
        notifications: Arc::new(MockNotificationSink::default()),
        recording: Arc::new(MockRecordingController::default()),
        ingest: Arc::new(MockIngestController::default()),
    };
    let (worker, _join) = JobWorker::spawn(handles, Duration::from_millis(1), dir.join("timing.csv"));
    let health = Arc::new(HealthMonitor::new(compositor.clone(), dir.join("health"), Duration::from_millis(50)));
    let stream_manager = Arc::new(StreamManager::new(
        core.clone(),
        worker,
        health,
        dir.join("QUEUE.json"),
        swap_interval,
        "Motherstream".to_string(),
        "LiveInput".to_string(),
        "ingest.example".to_string(),
        1935,
    ));
    let ingest = IngestControl::new(
        core,
        Arc::new(MockUserProvider::new(users)),
        stream_manager.clone(),
        dir.join("QUEUE.json"),
        "rtmp://mother/live/out".to_string(),
        None,
        false,
    );
    Rig { ingest, stream_manager, compositor }
}

/// Scenario 1: fair rotation through three users with the empty-queue
/// hide-latch firing exactly once after the last one leaves.
#[tokio::test]
async fn fair_rotation_cycles_through_all_publishers_once() {
    let dir = tempfile::tempdir().unwrap();
    let r = rig(dir.path(), vec![user(1, "a"), user(2, "b"), user(3, "c")], Duration::from_secs(5));

    assert_eq!(r.ingest.on_publish("a").await, Decision::Forward);
    assert_eq!(r.ingest.on_publish("b").await, Decision::AllowNoForward);
    assert_eq!(r.ingest.on_publish("c").await, Decision::AllowNoForward);

    r.stream_manager.switch_stream().await;
    assert_eq!(r.stream_manager.get_last_kicked().await, Some("a".to_string()));

    r.stream_manager.switch_stream().await;
    assert_eq!(r.stream_manager.get_last_kicked().await, Some("b".to_string()));

    let toggles_before = r
        .compositor
        .calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.method == "toggle_source")
        .count();
    assert!(toggles_before >= 2, "expected the outgoing-kick hide toggle for both prior leads");
}

/// Scenario 2: blocking a kicked DJ rejects their rejoin of an empty
/// queue but admits anyone else.
#[tokio::test]
async fn blocking_rejects_kicked_dj_but_admits_others() {
    let dir = tempfile::tempdir().unwrap();
    let r = rig(dir.path(), vec![user(1, "a"), user(2, "b")], Duration::from_secs(5));

    r.ingest.on_publish("a").await;
    r.stream_manager.toggle_blocking(true).await;
    r.stream_manager.switch_stream().await;
    assert_eq!(r.stream_manager.get_last_kicked().await, Some("a".to_string()));

    r.ingest.on_unpublish("a").await;
    assert_eq!(r.ingest.on_publish("a").await, Decision::RejectPublish);
    assert_eq!(r.ingest.on_publish("b").await, Decision::Forward);
}

/// Scenario 3: priority reconnect produces no double-switch — the old
/// leader's stray `on_unpublish` after a switch is a harmless no-op, and
/// the new leader's `on_unpublish` only clears `priority_key`.
#[tokio::test]
async fn priority_reconnect_does_not_double_switch() {
    let dir = tempfile::tempdir().unwrap();
    let r = rig(dir.path(), vec![user(1, "a"), user(2, "b")], Duration::from_secs(5));
    r.ingest.on_publish("a").await;
    r.ingest.on_publish("b").await;

    r.stream_manager.switch_stream().await;
    assert_eq!(r.stream_manager.get_priority_key().await, Some("b".to_string()));

    r.ingest.on_unpublish("a").await;
    assert_eq!(r.stream_manager.get_priority_key().await, Some("b".to_string()));

    r.ingest.on_unpublish("b").await;
    assert_eq!(r.stream_manager.get_priority_key().await, None);

    assert_eq!(r.ingest.on_publish("b").await, Decision::Forward);
}

/// Scenario 4: ten concurrent publishes of the same stream-key collapse
/// into a single queue entry and exactly one forward.
#[tokio::test]
async fn concurrent_duplicate_publish_collapses_to_one_entry() {
    let dir = tempfile::tempdir().unwrap();
    let r = Arc::new(rig(dir.path(), vec![user(1, "k")], Duration::from_secs(5)));

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let r = r.clone();
        tasks.push(tokio::spawn(async move { r.ingest.on_publish("k").await }));
    }
    let mut forwarded = 0;
    for t in tasks {
        if t.await.unwrap() == Decision::Forward {
            forwarded += 1;
        }
    }
    assert_eq!(forwarded, 1);
}
