//! Top-level wiring: constructs the C1–C7 singletons described in
//! `spec.md` §5 ("Process-wide singletons") from an `Args` and exposes a
//! single `shutdown()` that tears them down in order, the way
//! `wkmp-ap/src/main.rs` calls `engine.stop().await` before exiting.

use crate::api::AppState;
use crate::compositor::CompositorClient;
use crate::config::Args;
use crate::core_state::CoreState;
use crate::error::Result;
use crate::external::http_impls::{HttpIngestController, HttpRecordingController, WebhookNotificationSink};
use crate::external::mock::{MockNotificationSink, MockRecordingController, MockUserProvider};
use crate::external::UserProvider;
use crate::health::HealthMonitor;
use crate::queue::Queue;
use crate::stream_manager::StreamManager;
use crate::worker::{JobHandles, JobWorker};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

/// Roughly every 3 s, per `spec.md` §4.6.
const TICK_PERIOD: Duration = Duration::from_secs(3);

pub struct Orchestrator {
    pub queue: Queue,
    pub stream_manager: Arc<StreamManager>,
    pub compositor: Arc<dyn CompositorClient>,
    pub health: Arc<HealthMonitor>,
    pub app_state: AppState,
    worker_join: tokio::task::JoinHandle<()>,
    tick_join: tokio::task::JoinHandle<()>,
}

impl Orchestrator {
    pub async fn build(args: &Args) -> Result<Self> {
        let core = Arc::new(Mutex::new(CoreState::new()));

        // No concrete user/credential store ships with this crate (spec.md
        // §1 out-of-scope list): a real deployment supplies its own
        // `UserProvider`. The empty mock here means "nobody can publish
        // yet" until one is wired in.
        let user_provider: Arc<dyn UserProvider> = Arc::new(MockUserProvider::default());

        let compositor: Arc<dyn CompositorClient> = crate::compositor::client::shared(
            args.compositor_ws_url(),
            args.compositor_password.clone(),
            args.compositor_max_reconnect_failures,
        );

        let notifications = match &args.notification_webhook_url {
            Some(url) => Arc::new(WebhookNotificationSink::new(url.clone())) as Arc<dyn crate::external::NotificationSink>,
            None => Arc::new(MockNotificationSink::default()),
        };

        let recording = match (&args.recording_host, args.recording_port) {
            (Some(host), Some(port)) => {
                Arc::new(HttpRecordingController::new(host.clone(), port)) as Arc<dyn crate::external::RecordingController>
            }
            _ => Arc::new(MockRecordingController::default()),
        };

        // The ingest server's own control port for kick-publisher is not
        // itemized separately in spec.md §6's environment variable list;
        // we reuse the RTMP host/port pair (documented in DESIGN.md).
        let ingest: Arc<dyn crate::external::IngestController> =
            Arc::new(HttpIngestController::new(args.ingest_host.clone(), args.ingest_rtmp_port));

        let handles = JobHandles { compositor: compositor.clone(), notifications, recording, ingest };
        let (worker, worker_join) = JobWorker::spawn(
            handles,
            Duration::from_millis(args.obs_job_delay_ms),
            args.job_timing_csv_path.clone(),
        );

        let health = Arc::new(HealthMonitor::new(
            compositor.clone(),
            args.health_csv_dir.clone(),
            Duration::from_secs_f64(args.health_poll_interval_secs),
        ));

        let stream_manager = Arc::new(StreamManager::new(
            core.clone(),
            worker,
            health.clone(),
            args.queue_snapshot_path.clone(),
            Duration::from_secs(args.swap_interval_secs),
            args.compositor_scene.clone(),
            args.compositor_source.clone(),
            args.ingest_host.clone(),
            args.ingest_rtmp_port,
        ));
        let tick_join = stream_manager.clone().spawn_tick_loop(TICK_PERIOD);

        let queue = Queue::new(core.clone(), args.queue_snapshot_path.clone(), user_provider.clone());
        queue.load_from_snapshot().await?;

        let motherstream_url = format!("rtmp://{}:{}/motherstream", args.ingest_host, args.ingest_rtmp_port);
        let recording_url = match (&args.recording_host, args.recording_port) {
            (Some(host), Some(port)) => Some(format!("rtmp://{host}:{port}/record")),
            _ => None,
        };

        let ingest_control = Arc::new(crate::api::IngestControl::new(
            core.clone(),
            user_provider,
            stream_manager.clone(),
            args.queue_snapshot_path.clone(),
            motherstream_url,
            recording_url,
            args.also_record,
        ));

        let app_state = AppState {
            ingest: ingest_control,
            stream_manager: stream_manager.clone(),
            queue: queue.clone(),
            compositor: compositor.clone(),
            health: health.clone(),
        };

        Ok(Self { queue, stream_manager, compositor, health, app_state, worker_join, tick_join })
    }

    /// Stops the worker and tick loops, per `spec.md` §5's "torn down at
    /// shutdown" requirement. Outstanding jobs are not drained: compositor
    /// jobs are not assumed idempotent, so a bounded shutdown is preferred
    /// over waiting on an unbounded queue.
    pub async fn shutdown(self) {
        info!("shutting down orchestrator");
        self.tick_join.abort();
        self.worker_join.abort();
        let _ = self.tick_join.await;
        let _ = self.worker_join.await;
    }
}
