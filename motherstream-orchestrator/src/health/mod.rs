//! Health Monitor (C5): periodic sampler of the compositor's view of
//! whichever source is currently on air. One sampler task per active
//! source; state machine `IDLE -> ACTIVE -> IDLE` per `SPEC_FULL.md`/
//! `spec.md` §4.5.

mod csv_writer;
mod sampler;
pub mod score;

pub use csv_writer::HourlyCsv;
pub use sampler::PipelineState;

use crate::compositor::{CompositorClient, MediaState};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const SNAPSHOT_RING_CAPACITY: usize = 500;

/// One row of the hourly CSV; also what the ring buffer holds for the
/// operator-facing live view.
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    pub timestamp: DateTime<Utc>,
    pub source_name: String,
    pub rtmp_url: String,
    pub media_state: MediaState,
    pub media_duration: f64,
    pub media_time: f64,
    pub is_visible: bool,
    pub scene_name: String,
    pub obs_fps: f64,
    pub dropped_frames: u64,
    pub buffer_level: f64,
    pub pipeline_state: PipelineState,
    pub pipeline_healthy: bool,
    pub pipeline_warnings: Vec<String>,
    pub frame_drop_rate: f64,
    pub health_score: u8,
    pub issues: Vec<String>,
    pub poll_count: u64,
    pub visibility_problematic: bool,
    pub visibility_issue_type: Option<String>,
}

struct ActiveSource {
    stop: Arc<AtomicBool>,
    join: tokio::task::JoinHandle<()>,
    ring: Arc<Mutex<VecDeque<HealthSnapshot>>>,
}

/// Registry of currently-active per-source samplers, per
/// `spec.md` §5 "Process-wide singletons".
pub struct HealthMonitor {
    compositor: Arc<dyn CompositorClient>,
    csv: Arc<HourlyCsv>,
    csv_dir: PathBuf,
    poll_interval: Duration,
    sources: Mutex<HashMap<String, ActiveSource>>,
}

impl HealthMonitor {
    pub fn new(compositor: Arc<dyn CompositorClient>, csv_dir: PathBuf, poll_interval: Duration) -> Self {
        Self {
            compositor,
            csv: Arc::new(HourlyCsv::new()),
            csv_dir,
            poll_interval,
            sources: Mutex::new(HashMap::new()),
        }
    }

    /// `IDLE -> ACTIVE`: resets per-stream counters and starts the
    /// sampler. A no-op if the source is already active.
    pub async fn activate(&self, source_name: String, rtmp_url: String, scene_name: String) {
        let mut sources = self.sources.lock().await;
        if sources.contains_key(&source_name) {
            return;
        }
        let stop = Arc::new(AtomicBool::new(false));
        let ring = Arc::new(Mutex::new(VecDeque::with_capacity(SNAPSHOT_RING_CAPACITY)));

        let join = tokio::spawn(sampler::run(sampler::SamplerConfig {
            source_name: source_name.clone(),
            rtmp_url,
            scene_name,
            compositor: self.compositor.clone(),
            csv: self.csv.clone(),
            csv_dir: self.csv_dir.clone(),
            poll_interval: self.poll_interval,
            stop: stop.clone(),
            ring: ring.clone(),
        }));

        sources.insert(source_name, ActiveSource { stop, join, ring });
    }

    /// `ACTIVE -> IDLE`: stops the sampler and drops its ring.
    pub async fn deactivate(&self, source_name: &str) {
        if let Some(active) = self.sources.lock().await.remove(source_name) {
            active.stop.store(true, Ordering::SeqCst);
            let _ = active.join.await;
        }
    }

    pub async fn is_active(&self, source_name: &str) -> bool {
        self.sources.lock().await.contains_key(source_name)
    }

    /// Latest 500 snapshots for a source, for operator dashboards.
    pub async fn snapshots(&self, source_name: &str) -> Vec<HealthSnapshot> {
        match self.sources.lock().await.get(source_name) {
            Some(active) => active.ring.lock().await.iter().cloned().collect(),
            None => Vec::new(),
        }
    }
}
