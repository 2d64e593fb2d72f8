//! Compositor Client (C3): a stateless-looking RPC wrapper around the
//! scene compositor. The client is the sole place that names real
//! compositor objects (scene names, source names); everything above it
//! deals only in these trait methods.

pub mod client;
pub mod mock;
pub mod wire;

use async_trait::async_trait;

/// Orchestrator-facing media state, derived from whatever the compositor
/// calls its own playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaState {
    Playing,
    Buffering,
    Paused,
    Stopped,
    Error,
    #[default]
    Unknown,
}

impl MediaState {
    pub fn from_raw(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "playing" => MediaState::Playing,
            "buffering" => MediaState::Buffering,
            "paused" => MediaState::Paused,
            "stopped" | "ended" => MediaState::Stopped,
            "error" => MediaState::Error,
            _ => MediaState::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaStatus {
    pub media_state: MediaState,
    pub media_duration: f64,
    pub media_time: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CompositorStats {
    pub render_fps: f64,
    pub dropped_frames: u64,
}

#[derive(Debug, Clone, Default)]
pub struct OutputStatus {
    pub is_live: bool,
    pub output_fps: f64,
}

/// The contract the Job Worker and Health Monitor call against. See
/// module docs on connection lifecycle and reconnect behavior.
#[async_trait]
pub trait CompositorClient: Send + Sync {
    /// If the source is visible, hides it; if `only_off` is false, then
    /// unhides it again after a short settle pause.
    async fn toggle_source(&self, scene: &str, source: &str, only_off: bool) -> anyhow::Result<()>;

    /// Triggers the media element to reinitialize.
    async fn restart_media(&self, input: &str) -> anyhow::Result<()>;

    /// Returns the current enabled flag, or `false` on any error.
    async fn is_visible(&self, scene: &str, source: &str) -> bool;

    /// Returns `None` on error.
    async fn media_status(&self, input: &str) -> Option<MediaStatus>;

    async fn stats(&self) -> Option<CompositorStats>;

    async fn output_status(&self) -> Option<OutputStatus>;

    /// Creates a fresh input bound to `rtmp_url`, buffers it hidden,
    /// makes it visible once the media state enters "playing", destroys
    /// the previous input. Returns whether the switch succeeded.
    async fn switch_to_new_source(&self, rtmp_url: &str, scene: &str) -> bool;

    /// Operator-triggered recovery path after the client goes unhealthy.
    async fn force_reconnect(&self);

    /// Whether the client is currently accepting calls (false after N
    /// consecutive failed reconnects).
    fn is_healthy(&self) -> bool;
}
