//! Per-source sampler loop: polls the Compositor Client at `poll_interval`,
//! derives stall/jitter/jump indicators from rolling histories, scores the
//! sample, and appends it to the ring buffer and the shared hourly CSV.

use super::score::{self, ScoreInput};
use super::{HealthSnapshot, HourlyCsv};
use crate::compositor::{CompositorClient, MediaState};
use chrono::Utc;
use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

const HISTORY_CAPACITY: usize = 10;
const FPS_VARIANCE_THRESHOLD: f64 = 5.0;
const FPS_DROP_THRESHOLD: f64 = 24.0;
const TIMESTAMP_JUMP_TOLERANCE_SECS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Playing,
    Buffering,
    Paused,
    Stopped,
    Error,
    Unknown,
}

impl From<MediaState> for PipelineState {
    fn from(m: MediaState) -> Self {
        match m {
            MediaState::Playing => PipelineState::Playing,
            MediaState::Buffering => PipelineState::Buffering,
            MediaState::Paused => PipelineState::Paused,
            MediaState::Stopped => PipelineState::Stopped,
            MediaState::Error => PipelineState::Error,
            MediaState::Unknown => PipelineState::Unknown,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Playing => "PLAYING",
            PipelineState::Buffering => "BUFFERING",
            PipelineState::Paused => "PAUSED",
            PipelineState::Stopped => "STOPPED",
            PipelineState::Error => "ERROR",
            PipelineState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Categorical status used only to decide when to log (spec: "emit a log
/// line only when the categorical status transitions, to avoid spam").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Excellent,
    Good,
    Degraded,
    Poor,
}

impl Status {
    fn from_score(score: u8) -> Self {
        match score {
            90..=100 => Status::Excellent,
            70..=89 => Status::Good,
            40..=69 => Status::Degraded,
            _ => Status::Poor,
        }
    }
}

#[derive(Default)]
struct History {
    media_times: VecDeque<f64>,
    fps_samples: VecDeque<f64>,
    last_dropped_frames: Option<u64>,
    last_sample_at: Option<std::time::Instant>,
    stall_count: u32,
    poll_count: u64,
    last_status: Option<Status>,
}

fn push_capped(q: &mut VecDeque<f64>, v: f64, cap: usize) {
    q.push_back(v);
    if q.len() > cap {
        q.pop_front();
    }
}

pub struct SamplerConfig {
    pub source_name: String,
    pub rtmp_url: String,
    pub scene_name: String,
    pub compositor: Arc<dyn CompositorClient>,
    pub csv: Arc<HourlyCsv>,
    pub csv_dir: PathBuf,
    pub poll_interval: Duration,
    pub stop: Arc<AtomicBool>,
    pub ring: Arc<Mutex<VecDeque<super::HealthSnapshot>>>,
}

pub async fn run(cfg: SamplerConfig) {
    let mut history = History::default();

    loop {
        if cfg.stop.load(Ordering::SeqCst) {
            return;
        }

        let snapshot = sample_once(&cfg, &mut history).await;

        {
            let mut ring = cfg.ring.lock().await;
            ring.push_back(snapshot.clone());
            if ring.len() > super::SNAPSHOT_RING_CAPACITY {
                ring.pop_front();
            }
        }

        if let Err(e) = cfg.csv.append(&cfg.csv_dir, &snapshot).await {
            warn!("failed to append health snapshot for {}: {e}", cfg.source_name);
        }

        let status = Status::from_score(snapshot.health_score);
        if history.last_status != Some(status) {
            info!(
                "source {} health transitioned to {:?} (score {})",
                cfg.source_name, status, snapshot.health_score
            );
            history.last_status = Some(status);
        }

        tokio::time::sleep(cfg.poll_interval).await;
        if cfg.stop.load(Ordering::SeqCst) {
            return;
        }
    }
}

async fn sample_once(cfg: &SamplerConfig, history: &mut History) -> HealthSnapshot {
    history.poll_count += 1;

    let media = cfg.compositor.media_status(&cfg.rtmp_url).await;
    let is_visible = cfg.compositor.is_visible(&cfg.scene_name, &cfg.source_name).await;
    let stats = cfg.compositor.stats().await;

    let media_state = media.as_ref().map(|m| m.media_state).unwrap_or_default();
    let media_time = media.as_ref().map(|m| m.media_time).unwrap_or(0.0);
    let media_duration = media.as_ref().map(|m| m.media_duration).unwrap_or(0.0);
    let obs_fps = stats.as_ref().map(|s| s.render_fps).unwrap_or(0.0);
    let dropped_frames = stats.as_ref().map(|s| s.dropped_frames).unwrap_or(0);

    push_capped(&mut history.fps_samples, obs_fps, HISTORY_CAPACITY);
    let fps_variance_exceeded = history.fps_samples.len() >= 5
        && {
            let max = history.fps_samples.iter().cloned().fold(f64::MIN, f64::max);
            let min = history.fps_samples.iter().cloned().fold(f64::MAX, f64::min);
            max - min > FPS_VARIANCE_THRESHOLD
        };
    let fps_dropped = history.fps_samples.iter().rev().take(3).any(|&f| f < FPS_DROP_THRESHOLD);

    let playback_stalled = {
        let same_as_last_two = history.media_times.iter().rev().take(2).all(|&t| t == media_time);
        let stalled = media_state == MediaState::Playing && history.media_times.len() >= 2 && same_as_last_two;
        if stalled {
            history.stall_count += 1;
        }
        stalled
    };

    let now = std::time::Instant::now();
    let timestamp_jumped = match (history.media_times.back(), history.last_sample_at) {
        (Some(&prev_time), Some(prev_instant)) => {
            let wall_elapsed = now.duration_since(prev_instant).as_secs_f64();
            let media_delta = (media_time - prev_time).abs();
            (media_delta - wall_elapsed).abs() > TIMESTAMP_JUMP_TOLERANCE_SECS
        }
        _ => false,
    };
    history.last_sample_at = Some(now);
    push_capped(&mut history.media_times, media_time, HISTORY_CAPACITY);

    let frame_drop_rate = match history.last_dropped_frames {
        Some(prev) if dropped_frames >= prev => {
            (dropped_frames - prev) as f64 / cfg.poll_interval.as_secs_f64().max(0.001)
        }
        _ => 0.0,
    };
    history.last_dropped_frames = Some(dropped_frames);

    let pipeline_state = PipelineState::from(media_state);
    let visibility_problematic = is_visible && media_state != MediaState::Playing;
    let visibility_issue_type = visibility_problematic.then(|| format!("VISIBLE_WHILE_{pipeline_state}"));

    let score_input = ScoreInput {
        pipeline_state,
        visibility_problematic,
        fps_variance_exceeded,
        fps_dropped,
        playback_stalled,
        timestamp_jumped,
        frame_drop_rate,
    };
    let result = score::compute(&score_input);

    HealthSnapshot {
        timestamp: Utc::now(),
        source_name: cfg.source_name.clone(),
        rtmp_url: cfg.rtmp_url.clone(),
        media_state,
        media_duration,
        media_time,
        is_visible,
        scene_name: cfg.scene_name.clone(),
        obs_fps,
        dropped_frames,
        buffer_level: 0.0,
        pipeline_state,
        pipeline_healthy: pipeline_state == PipelineState::Playing,
        pipeline_warnings: result.warnings,
        frame_drop_rate,
        health_score: result.score,
        issues: result.issues,
        poll_count: history.poll_count,
        visibility_problematic,
        visibility_issue_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::mock::MockCompositorClient;

    fn cfg(compositor: Arc<dyn CompositorClient>) -> (SamplerConfig, Arc<Mutex<VecDeque<HealthSnapshot>>>) {
        let ring = Arc::new(Mutex::new(VecDeque::new()));
        (
            SamplerConfig {
                source_name: "a".to_string(),
                rtmp_url: "rtmp://x/live/a".to_string(),
                scene_name: "Motherstream".to_string(),
                compositor,
                csv: Arc::new(HourlyCsv::new()),
                csv_dir: std::env::temp_dir(),
                poll_interval: Duration::from_millis(10),
                stop: Arc::new(AtomicBool::new(false)),
                ring: ring.clone(),
            },
            ring,
        )
    }

    #[tokio::test]
    async fn visible_while_not_playing_is_flagged_problematic() {
        let mock = Arc::new(MockCompositorClient::new());
        mock.set_media_state(MediaState::Buffering);
        *mock.visible.lock().unwrap() = true;
        let (c, _ring) = cfg(mock);
        let mut history = History::default();
        let snapshot = sample_once(&c, &mut history).await;
        assert!(snapshot.visibility_problematic);
        assert_eq!(snapshot.visibility_issue_type.as_deref(), Some("VISIBLE_WHILE_BUFFERING"));
        assert!(snapshot.health_score <= 50);
    }

    #[tokio::test]
    async fn playing_and_visible_is_healthy() {
        let mock = Arc::new(MockCompositorClient::new());
        mock.set_media_state(MediaState::Playing);
        *mock.visible.lock().unwrap() = true;
        let (c, _ring) = cfg(mock);
        let mut history = History::default();
        let snapshot = sample_once(&c, &mut history).await;
        assert!(!snapshot.visibility_problematic);
        assert_eq!(snapshot.health_score, 100);
    }
}
