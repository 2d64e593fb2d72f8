//! P8: for two distinct compositor-class jobs A, B enqueued in order,
//! B's dispatch starts no sooner than `OBS_JOB_DELAY` after A's compositor
//! call returns. Exercised here with a custom compositor double that
//! records wall-clock timestamps per call, rather than the job-kind-identical
//! pair already covered inline in `worker.rs`.

use async_trait::async_trait;
use motherstream_orchestrator::compositor::{CompositorClient, CompositorStats, MediaStatus, OutputStatus};
use motherstream_orchestrator::external::mock::{MockIngestController, MockNotificationSink, MockRecordingController};
use motherstream_orchestrator::worker::{JobHandles, JobKind, JobWorker};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Default)]
struct TimestampingCompositor {
    calls: Mutex<Vec<(&'static str, Instant)>>,
}

#[async_trait]
impl CompositorClient for TimestampingCompositor {
    async fn toggle_source(&self, _scene: &str, _source: &str, _only_off: bool) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(("toggle_source", Instant::now()));
        Ok(())
    }
    async fn restart_media(&self, _input: &str) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(("restart_media", Instant::now()));
        Ok(())
    }
    async fn is_visible(&self, _scene: &str, _source: &str) -> bool {
        false
    }
    async fn media_status(&self, _input: &str) -> Option<MediaStatus> {
        None
    }
    async fn stats(&self) -> Option<CompositorStats> {
        None
    }
    async fn output_status(&self) -> Option<OutputStatus> {
        None
    }
    async fn switch_to_new_source(&self, _rtmp_url: &str, _scene: &str) -> bool {
        true
    }
    async fn force_reconnect(&self) {}
    fn is_healthy(&self) -> bool {
        true
    }
}
#[tokio::test]
async fn distinct_compositor_class_jobs_are_spaced_by_obs_job_delay() {
    let dir = tempfile::tempdir().unwrap();
    let compositor = Arc::new(TimestampingCompositor::default());
    let handles = JobHandles {
        compositor: compositor.clone(),
        notifications: Arc::new(MockNotificationSink::default()),
        recording: Arc::new(MockRecordingController::default()),
        ingest: Arc::new(MockIngestController::default()),
    };
    let delay = Duration::from_millis(80);
    let (worker, _join) = JobWorker::spawn(handles, delay, dir.path().join("timing.csv"));

    worker.enqueue(JobKind::ToggleSource { scene: "s".into(), source: "src".into(), only_off: true });
    worker.enqueue(JobKind::RestartMedia { input: "in".into() });

    tokio::time::sleep(Duration::from_millis(300)).await;

    let calls = compositor.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    let gap = calls[1].1.saturating_duration_since(calls[0].1);
    assert!(gap >= delay, "expected gap >= {delay:?}, got {gap:?}");
}
