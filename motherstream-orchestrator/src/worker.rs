//! Job Worker (C4): the single consumer that serializes every Compositor
//! Client call. This is a hard invariant — nothing else is allowed to
//! call the compositor for control operations.

use crate::compositor::CompositorClient;
use crate::external::{IngestController, NotificationSink, RecordingController};
use motherstream_common::UserRecord;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Payload variants a job can carry. `SwitchStream` is reserved: the
/// switch itself is driven directly by the Stream Manager, not through
/// this queue, but the variant is kept so the job-type vocabulary matches
/// the one real deployments log against.
#[derive(Debug, Clone)]
pub enum JobKind {
    StartStream { user: UserRecord, rtmp_url: String },
    SwitchStream,
    ToggleSource { scene: String, source: String, only_off: bool },
    KickPublisher { stream_key: String },
    RestartMedia { input: String },
    StopRecording { source: String },
    SendNotification { message: String },
    FlashLoading { scene: String, source: String },
    CheckStreamHealth { source: String },
    SwitchDynamicSource { rtmp_url: String, scene: String },
}

impl JobKind {
    /// `true` for the job kinds that must respect `OBS_JOB_DELAY` spacing.
    fn is_compositor_class(&self) -> bool {
        matches!(
            self,
            JobKind::ToggleSource { .. }
                | JobKind::RestartMedia { .. }
                | JobKind::FlashLoading { .. }
                | JobKind::SwitchDynamicSource { .. }
        )
    }

    fn label(&self) -> &'static str {
        match self {
            JobKind::StartStream { .. } => "START_STREAM",
            JobKind::SwitchStream => "SWITCH_STREAM",
            JobKind::ToggleSource { .. } => "TOGGLE_SOURCE",
            JobKind::KickPublisher { .. } => "KICK_PUBLISHER",
            JobKind::RestartMedia { .. } => "RESTART_MEDIA",
            JobKind::StopRecording { .. } => "STOP_RECORDING",
            JobKind::SendNotification { .. } => "SEND_NOTIFICATION",
            JobKind::FlashLoading { .. } => "FLASH_LOADING",
            JobKind::CheckStreamHealth { .. } => "CHECK_STREAM_HEALTH",
            JobKind::SwitchDynamicSource { .. } => "SWITCH_DYNAMIC_SOURCE",
        }
    }
}

#[derive(Debug)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub enqueued_at: Instant,
}

/// Everything a job handler needs to act on the outside world.
pub struct JobHandles {
    pub compositor: Arc<dyn CompositorClient>,
    pub notifications: Arc<dyn NotificationSink>,
    pub recording: Arc<dyn RecordingController>,
    pub ingest: Arc<dyn IngestController>,
}

/// Handle used by producers (Stream Manager, Ingest Control Surface) to
/// enqueue jobs. Cheap to clone; all clones share the same queue.
#[derive(Clone)]
pub struct JobWorker {
    tx: mpsc::UnboundedSender<Job>,
}

impl JobWorker {
    /// Spawn the consumer loop and return a handle producers can enqueue
    /// through, plus the task's `JoinHandle` for shutdown.
    pub fn spawn(
        handles: JobHandles,
        obs_job_delay: Duration,
        timing_csv_path: PathBuf,
    ) -> (Self, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let join = tokio::spawn(run(rx, handles, obs_job_delay, timing_csv_path));
        (Self { tx }, join)
    }

    pub fn enqueue(&self, kind: JobKind) -> Uuid {
        let id = Uuid::new_v4();
        let _ = self.tx.send(Job { id, kind, enqueued_at: Instant::now() });
        id
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Job>,
    handles: JobHandles,
    obs_job_delay: Duration,
    timing_csv_path: PathBuf,
) {
    let mut last_compositor_job_end: Option<Instant> = None;

    while let Some(job) = rx.recv().await {
        if job.kind.is_compositor_class() {
            if let Some(last_end) = last_compositor_job_end {
                let elapsed = last_end.elapsed();
                if elapsed < obs_job_delay {
                    tokio::time::sleep(obs_job_delay - elapsed).await;
                }
            }
        }

        let wait_time = job.enqueued_at.elapsed();
        let exec_start = Instant::now();
        let label = job.kind.label();

        if let Err(e) = dispatch(&handles, job.kind).await {
            error!("job {} ({}) failed: {:#}", job.id, label, e);
        }

        let execution_time = exec_start.elapsed();
        if label == "TOGGLE_SOURCE" || label == "RESTART_MEDIA" || label == "FLASH_LOADING" || label == "SWITCH_DYNAMIC_SOURCE" {
            last_compositor_job_end = Some(Instant::now());
        }

        if let Err(e) = record_timing(&timing_csv_path, label, wait_time, execution_time).await {
            warn!("failed to record job timing for {}: {}", label, e);
        }
    }
}

async fn dispatch(handles: &JobHandles, kind: JobKind) -> anyhow::Result<()> {
    match kind {
        JobKind::StartStream { user, rtmp_url } => {
            handles.notifications.notify(&format!("{} is now live", user.display_name)).await?;
            handles.recording.begin_recording(&user.stream_key).await?;
            handles.compositor.switch_to_new_source(&rtmp_url, "Motherstream").await;
            Ok(())
        }
        JobKind::SwitchStream => {
            debug!("SWITCH_STREAM job reached the worker; this variant is reserved and not dispatched");
            Ok(())
        }
        JobKind::ToggleSource { scene, source, only_off } => {
            handles.compositor.toggle_source(&scene, &source, only_off).await
        }
        JobKind::KickPublisher { stream_key } => handles.ingest.kick_publisher(&stream_key).await,
        JobKind::RestartMedia { input } => handles.compositor.restart_media(&input).await,
        JobKind::StopRecording { source } => handles.recording.stop_recording(&source).await,
        JobKind::SendNotification { message } => handles.notifications.notify(&message).await,
        JobKind::FlashLoading { scene, source } => handles.compositor.toggle_source(&scene, &source, false).await,
        JobKind::CheckStreamHealth { source } => {
            debug!("on-demand health check requested for {source}, handled by the Health Monitor's own sampler");
            Ok(())
        }
        JobKind::SwitchDynamicSource { rtmp_url, scene } => {
            handles.compositor.switch_to_new_source(&rtmp_url, &scene).await;
            Ok(())
        }
    }
}

async fn record_timing(
    path: &PathBuf,
    job_type: &str,
    wait: Duration,
    execution: Duration,
) -> std::io::Result<()> {
    let needs_header = !tokio::fs::try_exists(path).await.unwrap_or(false);
    let path = path.clone();
    let job_type = job_type.to_string();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            writer.write_record(["timestamp", "job_type", "wait_time_ms", "execution_time_ms", "total_time_ms"])?;
        }
        let total = wait + execution;
        writer.write_record([
            chrono::Utc::now().to_rfc3339(),
            job_type,
            wait.as_millis().to_string(),
            execution.as_millis().to_string(),
            total.as_millis().to_string(),
        ])?;
        writer.flush()?;
        Ok(())
    })
    .await
    .expect("timing csv writer task panicked")
}
