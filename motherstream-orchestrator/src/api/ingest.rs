//! Ingest Control Surface (C7): the one synchronous RPC the ingest RTMP
//! server calls on every publisher event. Decisions are made directly
//! against the shared `CoreState` guard so the read-then-decide-then-write
//! sequence is atomic, per `spec.md` §4.7/§5.

use crate::core_state::CoreState;
use crate::external::UserProvider;
use crate::persistence;
use crate::stream_manager::StreamManager;
use motherstream_common::is_valid_stream_key;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    RejectPublish,
    AllowNoForward,
    Forward,
}

pub struct IngestControl {
    core: Arc<Mutex<CoreState>>,
    user_provider: Arc<dyn UserProvider>,
    stream_manager: Arc<StreamManager>,
    snapshot_path: PathBuf,
    motherstream_url: String,
    recording_url: Option<String>,
    also_record: bool,
}

impl IngestControl {
    pub fn new(
        core: Arc<Mutex<CoreState>>,
        user_provider: Arc<dyn UserProvider>,
        stream_manager: Arc<StreamManager>,
        snapshot_path: PathBuf,
        motherstream_url: String,
        recording_url: Option<String>,
        also_record: bool,
    ) -> Self {
        Self { core, user_provider, stream_manager, snapshot_path, motherstream_url, recording_url, also_record }
    }

    async fn persist(&self, core: &CoreState) {
        if let Err(e) = persistence::write_queue_snapshot(&self.snapshot_path, &core.snapshot_ids()).await {
            warn!("failed to persist queue snapshot from ingest control: {e}");
        }
    }

    pub fn forward_urls(&self) -> Vec<String> {
        let mut urls = vec![self.motherstream_url.clone()];
        if self.also_record {
            if let Some(r) = &self.recording_url {
                urls.push(r.clone());
            }
        }
        urls
    }

    /// §4.7 `on_publish`.
    pub async fn on_publish(&self, stream_key: &str) -> Decision {
        if !is_valid_stream_key(stream_key) {
            return Decision::RejectPublish;
        }
        let user = match self.user_provider.resolve_by_stream_key(stream_key).await {
            Some(u) => u,
            None => return Decision::RejectPublish,
        };

        let mut core = self.core.lock().await;
        let lead_key = core.lead_key();

        let forward = match lead_key {
            None => {
                if core.last_kicked_key.as_deref() == Some(stream_key) && core.blocking_last {
                    return Decision::RejectPublish;
                }
                core.last_kicked_key = None;
                core.add_if_absent(user.clone());
                let became_lead = core.lead_key().as_deref() == Some(stream_key);
                if became_lead {
                    self.stream_manager.start_stream_locked(&mut core, &user).await;
                }
                became_lead
            }
            Some(ref lead) if lead == stream_key => true,
            Some(_) => {
                core.add_if_absent(user.clone());
                false
            }
        };

        self.persist(&core).await;
        if forward {
            Decision::Forward
        } else {
            Decision::AllowNoForward
        }
    }

    /// §4.7 `on_unpublish`.
    pub async fn on_unpublish(&self, stream_key: &str) {
        {
            let mut core = self.core.lock().await;
            if core.priority_key.as_deref() == Some(stream_key) {
                // Expected kick-and-reconnect during a switch; clear and stop.
                core.priority_key = None;
                self.persist(&core).await;
                return;
            }
            if core.lead_key().as_deref() != Some(stream_key) {
                // Neither lead nor priority: either already gone, or a
                // straggler from a switch that already dequeued it. This
                // third arm is a deliberate no-op-safe removal, not a bug
                // (see design notes on the source this was distilled from).
                core.remove_by_key(stream_key);
                self.persist(&core).await;
                return;
            }
        }
        // `stream_key` was the lead: release the lock before switch_stream
        // re-acquires it, then let the Stream Manager own the transition.
        self.stream_manager.switch_stream().await;
    }

    /// §4.7 `on_forward`.
    pub async fn on_forward(&self, stream_key: &str) -> bool {
        self.core.lock().await.lead_key().as_deref() == Some(stream_key)
    }
}
