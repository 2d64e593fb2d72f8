//! A compositor client double for tests: records every call with its
//! timestamp (for worker-spacing assertions) and returns canned state.

use super::{CompositorClient, CompositorStats, MediaState, MediaStatus, OutputStatus};
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub at: Instant,
}

#[derive(Default)]
pub struct MockCompositorClient {
    pub calls: Mutex<Vec<RecordedCall>>,
    pub media_state: Mutex<MediaState>,
    pub visible: Mutex<bool>,
}

impl MockCompositorClient {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            media_state: Mutex::new(MediaState::Unknown),
            visible: Mutex::new(false),
        }
    }

    fn record(&self, method: &'static str) {
        self.calls.lock().unwrap().push(RecordedCall { method, at: Instant::now() });
    }

    pub fn set_media_state(&self, state: MediaState) {
        *self.media_state.lock().unwrap() = state;
    }
}

#[async_trait]
impl CompositorClient for MockCompositorClient {
    async fn toggle_source(&self, _scene: &str, _source: &str, only_off: bool) -> anyhow::Result<()> {
        self.record("toggle_source");
        *self.visible.lock().unwrap() = !only_off;
        Ok(())
    }

    async fn restart_media(&self, _input: &str) -> anyhow::Result<()> {
        self.record("restart_media");
        Ok(())
    }

    async fn is_visible(&self, _scene: &str, _source: &str) -> bool {
        self.record("is_visible");
        *self.visible.lock().unwrap()
    }

    async fn media_status(&self, _input: &str) -> Option<MediaStatus> {
        self.record("media_status");
        Some(MediaStatus {
            media_state: *self.media_state.lock().unwrap(),
            media_duration: 0.0,
            media_time: 0.0,
        })
    }

    async fn stats(&self) -> Option<CompositorStats> {
        self.record("stats");
        Some(CompositorStats { render_fps: 30.0, dropped_frames: 0 })
    }

    async fn output_status(&self) -> Option<OutputStatus> {
        self.record("output_status");
        Some(OutputStatus { is_live: true, output_fps: 30.0 })
    }

    async fn switch_to_new_source(&self, _rtmp_url: &str, _scene: &str) -> bool {
        self.record("switch_to_new_source");
        true
    }

    async fn force_reconnect(&self) {
        self.record("force_reconnect");
    }

    fn is_healthy(&self) -> bool {
        true
    }
}
