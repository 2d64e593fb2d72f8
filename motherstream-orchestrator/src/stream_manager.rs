//! Stream Manager (C6): the state-machine authority for who is on air.
//! Shares `Arc<Mutex<CoreState>>` with [`crate::queue::Queue`] (L-QUEUE);
//! owns a second, independent, non-reentrant try-lock (L-SWITCH) that
//! serializes `switch_stream` itself. See `core_state.rs` for why both
//! components are able to share one mutex without a literal reentrant
//! lock type.

use crate::core_state::CoreState;
use crate::health::HealthMonitor;
use crate::persistence;
use crate::time_manager::TimeManager;
use crate::worker::{JobKind, JobWorker};
use motherstream_common::UserRecord;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// How long a `priority_key` is allowed to sit unconfirmed before the
/// Stream Manager gives up waiting for the expected reconnect and clears
/// it (see `SPEC_FULL.md` §2, supplemented feature / open question (a)).
pub const PRIORITY_KEY_TIMEOUT: Duration = Duration::from_secs(30);

pub struct StreamManager {
    core: Arc<Mutex<CoreState>>,
    switch_lock: Mutex<()>,
    worker: JobWorker,
    health: Arc<HealthMonitor>,
    snapshot_path: PathBuf,
    swap_interval: Duration,
    scene_name: String,
    source_name: String,
    ingest_host: String,
    ingest_rtmp_port: u16,
    priority_timeout: Duration,
}

impl StreamManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        core: Arc<Mutex<CoreState>>,
        worker: JobWorker,
        health: Arc<HealthMonitor>,
        snapshot_path: PathBuf,
        swap_interval: Duration,
        scene_name: String,
        source_name: String,
        ingest_host: String,
        ingest_rtmp_port: u16,
    ) -> Self {
        Self {
            core,
            switch_lock: Mutex::new(()),
            worker,
            health,
            snapshot_path,
            swap_interval,
            scene_name,
            source_name,
            ingest_host,
            ingest_rtmp_port,
            priority_timeout: PRIORITY_KEY_TIMEOUT,
        }
    }

    fn rtmp_url_for(&self, stream_key: &str) -> String {
        format!("rtmp://{}:{}/live/{}", self.ingest_host, self.ingest_rtmp_port, stream_key)
    }

    async fn persist(&self, core: &CoreState) {
        if let Err(e) = persistence::write_queue_snapshot(&self.snapshot_path, &core.snapshot_ids()).await {
            tracing::warn!("failed to persist queue snapshot after switch: {e}");
        }
    }

    /// Already-locked inner method: sets up `time_manager`, clears the
    /// empty-queue latch, enqueues the startup job sequence. Exposed
    /// `pub(crate)` so the Ingest Control Surface can call it while
    /// already holding the same `CoreState` guard (see `api/ingest.rs`).
    pub(crate) async fn start_stream_locked(&self, core: &mut CoreState, user: &UserRecord) {
        core.time_manager = Some(TimeManager::new(self.swap_interval));
        core.obs_turned_off_for_empty_queue = false;
        let rtmp_url = self.rtmp_url_for(&user.stream_key);
        self.health.activate(user.stream_key.clone(), rtmp_url.clone(), self.scene_name.clone()).await;
        self.worker.enqueue(JobKind::StartStream { user: user.clone(), rtmp_url });
    }

    pub async fn start_stream(&self, user: UserRecord) {
        let mut core = self.core.lock().await;
        self.start_stream_locked(&mut core, &user).await;
    }

    /// Non-blocking, idempotent switch. If another `switch_stream` is
    /// already running, returns immediately without executing anything
    /// (L-SWITCH, per `SPEC_FULL.md` §5).
    pub async fn switch_stream(&self) {
        let _switch_guard = match self.switch_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("switch_stream already in progress, skipping");
                return;
            }
        };

        let mut core = self.core.lock().await;

        let old = core.dequeue_head();
        if let Some(old) = &old {
            self.worker.enqueue(JobKind::StopRecording { source: old.stream_key.clone() });
            self.worker.enqueue(JobKind::SendNotification {
                message: format!("{} has left the stream", old.display_name),
            });
            self.worker.enqueue(JobKind::KickPublisher { stream_key: old.stream_key.clone() });
            self.worker.enqueue(JobKind::ToggleSource {
                scene: self.scene_name.clone(),
                source: self.source_name.clone(),
                only_off: true,
            });
            core.time_manager = None;
            core.last_kicked_key = Some(old.stream_key.clone());
            self.health.deactivate(&old.stream_key).await;
        }

        match core.peek_head().cloned() {
            Some(next) => {
                self.start_stream_locked(&mut core, &next).await;
                core.priority_key = Some(next.stream_key.clone());
                self.worker.enqueue(JobKind::KickPublisher { stream_key: next.stream_key.clone() });
                self.spawn_priority_key_timeout(next.stream_key.clone());
            }
            None => {
                core.priority_key = None;
                if !core.obs_turned_off_for_empty_queue {
                    core.obs_turned_off_for_empty_queue = true;
                    self.worker.enqueue(JobKind::ToggleSource {
                        scene: self.scene_name.clone(),
                        source: self.source_name.clone(),
                        only_off: true,
                    });
                }
            }
        }

        self.persist(&core).await;
    }

    /// Spawns a detached timer that clears `priority_key` if it still
    /// equals `expected_key` once `priority_timeout` elapses. Runs outside
    /// the Job Worker on purpose (`SPEC_FULL.md` §2, open question (a)):
    /// the worker is the single compositor-serialization consumer, and a
    /// 30 s sleep sitting in that queue would head-of-line-block every
    /// compositor-class job enqueued after it.
    fn spawn_priority_key_timeout(&self, expected_key: String) {
        let core = self.core.clone();
        let timeout = self.priority_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut core = core.lock().await;
            if core.priority_key.as_deref() == Some(expected_key.as_str()) {
                debug!("priority_key '{}' never reconnected within timeout, clearing", expected_key);
                core.priority_key = None;
            }
        });
    }

    /// Periodic check, meant to be called roughly every 3 s by
    /// [`Self::spawn_tick_loop`]: fires `switch_stream` once the current
    /// lead's swap interval has elapsed.
    pub async fn process_tick(&self) {
        let elapsed = {
            let core = self.core.lock().await;
            core.time_manager.as_ref().map(TimeManager::has_elapsed).unwrap_or(false)
        };
        if elapsed {
            self.switch_stream().await;
        }
    }

    pub fn spawn_tick_loop(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                self.process_tick().await;
            }
        })
    }

    pub async fn get_priority_key(&self) -> Option<String> {
        self.core.lock().await.priority_key.clone()
    }

    pub async fn set_priority_key(&self, key: Option<String>) {
        self.core.lock().await.priority_key = key;
    }

    pub async fn get_last_kicked(&self) -> Option<String> {
        self.core.lock().await.last_kicked_key.clone()
    }

    pub async fn set_last_kicked(&self, key: Option<String>) {
        self.core.lock().await.last_kicked_key = key;
    }

    pub async fn get_blocking(&self) -> bool {
        self.core.lock().await.blocking_last
    }

    pub async fn toggle_blocking(&self, value: bool) {
        self.core.lock().await.blocking_last = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::mock::MockCompositorClient;
    use crate::external::mock::{MockIngestController, MockNotificationSink, MockRecordingController};
    use crate::worker::JobHandles;

    fn user(id: i64, key: &str) -> UserRecord {
        UserRecord { id, stream_key: key.to_string(), display_name: key.to_string(), timezone: "UTC".to_string() }
    }

    fn manager(core: Arc<Mutex<CoreState>>, dir: &std::path::Path) -> StreamManager {
        let compositor = Arc::new(MockCompositorClient::new());
        let handles = JobHandles {
            compositor: compositor.clone(),
            notifications: Arc::new(MockNotificationSink::default()),
            recording: Arc::new(MockRecordingController::default()),
            ingest: Arc::new(MockIngestController::default()),
        };
        let (worker, _join) = JobWorker::spawn(handles, Duration::from_millis(1), dir.join("timing.csv"));
        let health = Arc::new(crate::health::HealthMonitor::new(compositor, dir.join("health"), Duration::from_millis(50)));
        StreamManager::new(
            core,
            worker,
            health,
            dir.join("QUEUE.json"),
            Duration::from_secs(5),
            "Motherstream".to_string(),
            "LiveInput".to_string(),
            "ingest.example".to_string(),
            1935,
        )
    }

    #[tokio::test]
    async fn switch_stream_promotes_next_head_and_sets_priority_key() {
        let dir = tempfile::tempdir().unwrap();
        let core = Arc::new(Mutex::new(CoreState::new()));
        {
            let mut c = core.lock().await;
            c.add_if_absent(user(1, "a"));
            c.add_if_absent(user(2, "b"));
        }
        let sm = manager(core.clone(), dir.path());

        sm.switch_stream().await;

        let c = core.lock().await;
        assert_eq!(c.lead_key(), Some("b".to_string()));
        assert_eq!(c.last_kicked_key, Some("a".to_string()));
        assert_eq!(c.priority_key, Some("b".to_string()));
    }

    #[tokio::test]
    async fn switch_stream_clears_priority_key_when_queue_empties() {
        let dir = tempfile::tempdir().unwrap();
        let core = Arc::new(Mutex::new(CoreState::new()));
        core.lock().await.add_if_absent(user(1, "a"));
        let sm = manager(core.clone(), dir.path());

        sm.switch_stream().await;

        let c = core.lock().await;
        assert!(c.queue.is_empty());
        assert_eq!(c.priority_key, None);
        assert!(c.obs_turned_off_for_empty_queue);
    }

    #[tokio::test]
    async fn concurrent_switch_attempts_only_run_once() {
        let dir = tempfile::tempdir().unwrap();
        let core = Arc::new(Mutex::new(CoreState::new()));
        {
            let mut c = core.lock().await;
            c.add_if_absent(user(1, "a"));
            c.add_if_absent(user(2, "b"));
            c.add_if_absent(user(3, "c"));
        }
        let sm = Arc::new(manager(core.clone(), dir.path()));

        let sm2 = sm.clone();
        let (r1, r2) = tokio::join!(
            async { sm.switch_stream().await },
            async { sm2.switch_stream().await }
        );
        let _ = (r1, r2);

        // Only one switch should have executed: exactly one dequeue happened.
        let c = core.lock().await;
        assert_eq!(c.queue.len(), 2);
        assert_eq!(c.last_kicked_key, Some("a".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn process_tick_only_switches_after_swap_interval_elapses() {
        let dir = tempfile::tempdir().unwrap();
        let core = Arc::new(Mutex::new(CoreState::new()));
        {
            let mut c = core.lock().await;
            c.add_if_absent(user(1, "a"));
            c.add_if_absent(user(2, "b"));
        }
        let sm = manager(core.clone(), dir.path());
        sm.start_stream(user(1, "a")).await;

        sm.process_tick().await;
        assert_eq!(core.lock().await.lead_key(), Some("a".to_string()));

        tokio::time::advance(Duration::from_secs(6)).await;
        sm.process_tick().await;
        assert_eq!(core.lock().await.lead_key(), Some("b".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn priority_key_timeout_clears_only_if_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let core = Arc::new(Mutex::new(CoreState::new()));
        {
            let mut c = core.lock().await;
            c.add_if_absent(user(1, "a"));
            c.add_if_absent(user(2, "b"));
        }
        let sm = manager(core.clone(), dir.path());

        sm.switch_stream().await;
        assert_eq!(sm.get_priority_key().await, Some("b".to_string()));

        // A reconnect confirms "b" before the timeout: the stale timer for
        // "b" must not clear a priority_key that now belongs to someone else.
        sm.set_priority_key(Some("c".to_string())).await;
        tokio::time::advance(PRIORITY_KEY_TIMEOUT + Duration::from_secs(1)).await;
        assert_eq!(sm.get_priority_key().await, Some("c".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn priority_key_timeout_clears_when_still_unreconnected() {
        let dir = tempfile::tempdir().unwrap();
        let core = Arc::new(Mutex::new(CoreState::new()));
        {
            let mut c = core.lock().await;
            c.add_if_absent(user(1, "a"));
            c.add_if_absent(user(2, "b"));
        }
        let sm = manager(core.clone(), dir.path());

        sm.switch_stream().await;
        assert_eq!(sm.get_priority_key().await, Some("b".to_string()));

        tokio::time::advance(PRIORITY_KEY_TIMEOUT + Duration::from_secs(1)).await;
        assert_eq!(sm.get_priority_key().await, None);
    }
}
